// src/price_parser.rs
//
// Price text parsing with separator normalization. Accepts the four supported
// currency symbols, tolerates both 1,234.56 and 1.234,56 groupings, and gates
// the parsed value through plausibility bounds.

use log::debug;

use crate::dom::{Document, NodeId};
use crate::element_filter::{has_price_adjacent_context, has_strong_price_indicator, ElementFilter};
use crate::heuristics::{has_currency_symbol, is_time_value, CURRENCY_SYMBOLS};
use crate::metrics;

/// Hard ceiling on any parsed price. Values above this are garbage regardless
/// of context.
pub const MAX_PRICE: f64 = 10_000_000.0;

/// Plausible retail range. Values outside it need currency or strong price
/// context to survive.
pub const PLAUSIBLE_MIN: f64 = 0.01;
pub const PLAUSIBLE_MAX: f64 = 100_000.0;

/// Parse price text attributed to `element`.
///
/// Rejects time values and elements that fail the element-level filter, then
/// delegates to [`parse_price_text`] with the element's context.
pub fn parse_price(
    doc: &Document,
    filter: &ElementFilter,
    element: NodeId,
    text: &str,
) -> Option<f64> {
    if is_time_value(text) {
        metrics::increment_parse_rejected("time_value");
        return None;
    }
    let verdict = filter.is_price_element(doc, element);
    if !verdict.is_valid {
        return None;
    }
    let el = doc.element(element)?;
    parse_price_text(
        text,
        has_price_adjacent_context(el),
        has_strong_price_indicator(el),
    )
}

/// Parse a price out of raw text.
///
/// `price_context` admits bare numbers (no currency symbol); `strong_context`
/// lets values outside the plausible range through, as does a currency symbol.
pub fn parse_price_text(text: &str, price_context: bool, strong_context: bool) -> Option<f64> {
    let currency_present = has_currency_symbol(text);
    if !currency_present && !price_context {
        return None;
    }

    let numeric = extract_numeric_token(text)?;
    let normalized = normalize_separators(&numeric);
    let value: f64 = match normalized.parse() {
        Ok(v) => v,
        Err(_) => {
            debug!("price text '{}' did not parse as a number", text);
            metrics::increment_parse_rejected("not_a_number");
            return None;
        }
    };

    if !value.is_finite() || value < 0.0 || value > MAX_PRICE {
        metrics::increment_parse_rejected("out_of_bounds");
        return None;
    }
    if (value < PLAUSIBLE_MIN || value > PLAUSIBLE_MAX) && !currency_present && !strong_context {
        metrics::increment_parse_rejected("implausible");
        return None;
    }
    if value == 0.0 {
        return None;
    }
    Some(value)
}

/// First run of digits with embedded separators, currency and whitespace
/// already ignored.
fn extract_numeric_token(text: &str) -> Option<String> {
    let cleaned: String = text
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && !c.is_whitespace())
        .collect();
    let start = cleaned.find(|c: char| c.is_ascii_digit())?;
    let token: String = cleaned[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let token = token.trim_end_matches(&['.', ','][..]).to_string();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Resolve ambiguous separators: a separator followed by a run of exactly
/// three digits is a thousands separator and is dropped; any remaining comma
/// is the decimal point.
fn normalize_separators(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let mut out = String::with_capacity(chars.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == '.' || c == ',' {
            let digits_after = chars[i + 1..]
                .iter()
                .take_while(|d| d.is_ascii_digit())
                .count();
            if digits_after == 3 {
                continue; // thousands separator
            }
            out.push('.');
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_us_grouping() {
        assert_eq!(parse_price_text("$1,234.56", false, false), Some(1234.56));
        assert_eq!(parse_price_text("$19.99", false, false), Some(19.99));
        assert_eq!(parse_price_text("$ 5", false, false), Some(5.0));
    }

    #[test]
    fn test_european_grouping() {
        assert_eq!(parse_price_text("€1.234,56", false, false), Some(1234.56));
        assert_eq!(parse_price_text("€9,99", false, false), Some(9.99));
        // "." + three digits reads as a thousands separator
        assert_eq!(parse_price_text("£1.234", false, false), Some(1234.0));
    }

    #[test]
    fn test_bare_numbers_need_context() {
        assert_eq!(parse_price_text("99", false, false), None);
        assert_eq!(parse_price_text("99", true, false), Some(99.0));
    }

    #[test]
    fn test_bounds() {
        assert_eq!(parse_price_text("$99,000,000", false, false), None); // above hard ceiling
        assert_eq!(parse_price_text("$250,000", false, false), Some(250_000.0)); // currency admits it
        assert_eq!(parse_price_text("250000", true, false), None); // implausible without strength
        assert_eq!(parse_price_text("250000", true, true), Some(250_000.0));
        assert_eq!(parse_price_text("$0", false, false), None);
    }

    #[test]
    fn test_embedded_labels() {
        assert_eq!(
            parse_price_text("Price: $1,299.00 (incl. tax)", false, false),
            Some(1299.0)
        );
    }

    #[test]
    fn test_garbage() {
        assert_eq!(parse_price_text("", false, false), None);
        assert_eq!(parse_price_text("$", false, false), None);
        assert_eq!(parse_price_text("free", true, false), None);
    }

    #[test]
    fn test_parse_price_with_element_context() {
        use crate::dom::Document;

        let doc = Document::parse_html(
            r#"<html><body>
                <span id="bare">99</span>
                <span id="priced" class="price">99</span>
                <span id="timer" class="price">2h 30m</span>
            </body></html>"#,
        )
        .unwrap();
        let filter = ElementFilter::new("wagelens-badge");
        let find = |id: &str| {
            doc.elements()
                .find(|&n| doc.element(n).and_then(|e| e.id()) == Some(id))
                .unwrap()
        };

        // a bare number needs a price-adjacent class or attribute
        assert_eq!(parse_price(&doc, &filter, find("bare"), "99"), None);
        assert_eq!(parse_price(&doc, &filter, find("priced"), "99"), Some(99.0));
        // time values never parse, price class or not
        assert_eq!(parse_price(&doc, &filter, find("timer"), "2h 30m"), None);
        assert_eq!(
            parse_price(&doc, &filter, find("priced"), "$1,234.56"),
            Some(1234.56)
        );
    }
}

// src/element_filter.rs
//
// Element-level filtering. Separates genuine price text from the things that
// merely look like it: injected badges, hidden accessibility copy, wrapper
// containers, countdown timers and deal chrome.

use log::debug;

use crate::dom::{Document, Element, NodeId};
use crate::heuristics::{has_currency_symbol, is_time_value, EXCLUSION_KEYWORDS};
use crate::metrics;

/// Class/id substrings that admit a bare number as a price.
const PRICE_ADJACENT_KEYWORDS: [&str; 4] = ["price", "cost", "amount", "value"];

/// Result of filtering one element.
#[derive(Debug, Clone)]
pub struct FilterResult {
    pub is_valid: bool,
    pub rejection_reason: Option<String>,
}

impl FilterResult {
    fn valid() -> Self {
        Self {
            is_valid: true,
            rejection_reason: None,
        }
    }

    fn rejected(reason: &str) -> Self {
        Self {
            is_valid: false,
            rejection_reason: Some(reason.to_string()),
        }
    }
}

/// Strong price indicator: `price` in class/id, or an explicit `data-price`
/// attribute. Overrides exclusion keywords.
pub fn has_strong_price_indicator(el: &Element) -> bool {
    if el.attr("data-price").is_some() {
        return true;
    }
    let class = el.class_attr().to_lowercase();
    let id = el.id().unwrap_or("").to_lowercase();
    class.contains("price") || id.contains("price")
}

/// Price-adjacent context: class/id naming a price-like quantity, or a
/// `data-price` attribute. Admits bare numbers in parsing.
pub fn has_price_adjacent_context(el: &Element) -> bool {
    if el.attr("data-price").is_some() {
        return true;
    }
    let class = el.class_attr().to_lowercase();
    let id = el.id().unwrap_or("").to_lowercase();
    PRICE_ADJACENT_KEYWORDS
        .iter()
        .any(|k| class.contains(k) || id.contains(k))
}

pub struct ElementFilter {
    badge_class: String,
}

impl ElementFilter {
    pub fn new(badge_class: &str) -> Self {
        Self {
            badge_class: badge_class.to_string(),
        }
    }

    /// Run the full check sequence against one element. Checks are ordered
    /// cheapest-first; the first failure wins.
    pub fn is_price_element(&self, doc: &Document, id: NodeId) -> FilterResult {
        let Some(el) = doc.element(id) else {
            metrics::increment_filter_rejected("not_an_element");
            return FilterResult::rejected("not an element");
        };

        // 1. Never re-detect our own output, including anything nested in it
        if el.has_class(&self.badge_class)
            || doc
                .ancestors(id)
                .any(|a| self.is_badge(doc, a))
        {
            metrics::increment_filter_rejected("inside_badge");
            return FilterResult::rejected("inside injected badge");
        }

        // 2. Hidden / offscreen / ARIA-hidden elements
        if doc.is_visibly_hidden(id) {
            metrics::increment_filter_rejected("hidden");
            return FilterResult::rejected("visually hidden");
        }

        // 3. "price-to-pay" containers are wrappers around the price text,
        //    not the price text itself
        let class_lower = el.class_attr().to_lowercase();
        if class_lower.contains("price-to-pay") || class_lower.contains("pricetopay") {
            metrics::increment_filter_rejected("wrapper");
            return FilterResult::rejected("price-to-pay wrapper");
        }

        // 4. Time/deal keywords in class, id or text — unless a price
        //    indicator overrides them
        let id_lower = el.id().unwrap_or("").to_lowercase();
        let text_lower = doc.text_of(id).to_lowercase();
        let has_exclusion_keyword = EXCLUSION_KEYWORDS.iter().any(|k| {
            class_lower.contains(k) || id_lower.contains(k) || text_lower.contains(k)
        });
        if has_exclusion_keyword && !has_strong_price_indicator(el) {
            debug!(
                "element rejected for time/deal context (class='{}', id='{}')",
                class_lower, id_lower
            );
            metrics::increment_filter_rejected("time_deal_context");
            return FilterResult::rejected("time/deal context");
        }

        // 5. Time-looking text inside a navigation/sidebar landmark needs a
        //    strong indicator to survive
        if in_landmark(doc, id)
            && is_time_value(&text_lower)
            && !has_strong_price_indicator(el)
            && !has_currency_symbol(&text_lower)
        {
            metrics::increment_filter_rejected("landmark_time");
            return FilterResult::rejected("time value inside landmark");
        }

        FilterResult::valid()
    }

    fn is_badge(&self, doc: &Document, id: NodeId) -> bool {
        doc.element(id)
            .map(|el| el.has_class(&self.badge_class))
            .unwrap_or(false)
    }
}

/// True when the element or one of its ancestors is a navigation/sidebar
/// landmark.
fn in_landmark(doc: &Document, id: NodeId) -> bool {
    std::iter::once(id)
        .chain(doc.ancestors(id))
        .any(|n| is_landmark_element(doc, n))
}

fn is_landmark_element(doc: &Document, id: NodeId) -> bool {
    let Some(el) = doc.element(id) else {
        return false;
    };
    if matches!(el.tag.as_str(), "nav" | "aside") {
        return true;
    }
    if matches!(
        el.attr("role"),
        Some("navigation") | Some("complementary") | Some("banner")
    ) {
        return true;
    }
    el.classes().any(|c| {
        let c = c.to_lowercase();
        c == "nav" || c == "menu" || c.contains("sidebar") || c.contains("navbar")
    })
}

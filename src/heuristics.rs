// src/heuristics.rs
//
// Text-level classification shared by the extractor and the element filter:
// currency detection, the price-matching pattern, and the time-value heuristic
// that keeps countdown timers out of the candidate set.

use once_cell::sync::Lazy;
use regex::Regex;

/// The four currency symbols the extractor anchors on.
pub const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

/// Currency-anchored price pattern: symbol, then a grouped numeral with
/// optional thousands/decimal separators.
pub static PRICE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[$€£¥]\s*\d+(?:[.,]\d{3})*(?:[.,]\d{1,2})?").unwrap());

/// Compound and qualified time expressions. Order matters only for reading;
/// any single match classifies the text as a time value.
static TIME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // "2h 30m", "2 hrs 30 min", "1 hour 05 minutes"
        Regex::new(r"(?i)\b\d+\s*h(?:(?:ou)?rs?)?\b[\s:]*\d+\s*m(?:in(?:ute)?s?)?\b").unwrap(),
        // "5 min", "5 minutes remaining"
        Regex::new(r"(?i)\b\d+\s*min(?:ute)?s?\b").unwrap(),
        // "30 seconds", "45 sec"
        Regex::new(r"(?i)\b\d+\s*sec(?:ond)?s?\b").unwrap(),
        // "3 days"
        Regex::new(r"(?i)\b\d+\s*days?\b").unwrap(),
        // bare countdown qualifiers
        Regex::new(r"(?i)\b(?:remaining|left|until|expires?|ends?)\b").unwrap(),
    ]
});

/// "2h", "30m", "45s" with nothing else to disambiguate.
static BARE_UNIT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+\s*[hms]\b").unwrap());

/// Keywords whose presence in text marks it as a duration, not a price.
const TIME_TEXT_KEYWORDS: [&str; 4] = ["timer", "countdown", "duration", "hurry"];

/// Keywords that exclude an element (class/id/text) unless a price indicator
/// overrides them.
pub const EXCLUSION_KEYWORDS: [&str; 8] = [
    "time",
    "timer",
    "countdown",
    "duration",
    "deal",
    "remaining",
    "expires",
    "ends",
];

pub fn has_currency_symbol(text: &str) -> bool {
    text.chars().any(|c| CURRENCY_SYMBOLS.contains(&c))
}

/// Classify text as a time/duration value rather than a price.
///
/// Runs before price parsing and again inside the element filter; both checks
/// must pass for a candidate to survive.
pub fn is_time_value(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    if TIME_PATTERNS.iter().any(|p| p.is_match(trimmed)) {
        return true;
    }
    let lower = trimmed.to_lowercase();
    if TIME_TEXT_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return true;
    }
    // "2h" reads as two hours unless a currency symbol says otherwise
    BARE_UNIT_PATTERN.is_match(trimmed) && !has_currency_symbol(trimmed)
}

// src/annotations.rs
//
// The attribute contract written onto detected elements. Downstream consumers
// (a popup UI, user stylesheets) key on these exact names and on the literal
// `"true"` flag value, so they are part of the public interface.

use crate::dom::{Document, NodeId};

/// Detection flag. Value is always the literal [`DETECTED_FLAG`].
pub const ATTR_DETECTED: &str = "data-wagelens-detected";
pub const DETECTED_FLAG: &str = "true";
/// Parsed price value, formatted with two decimals.
pub const ATTR_PRICE: &str = "data-wagelens-price";
/// Ordinal index of the element within the pass, in document order.
pub const ATTR_INDEX: &str = "data-wagelens-index";
/// Computed hours value, or `"null"` when the wage is unset.
pub const ATTR_HOURS: &str = "data-wagelens-hours";
/// Display string for the hours value.
pub const ATTR_HOURS_LABEL: &str = "data-wagelens-hours-label";
/// Set on elements whose text was replaced in place.
pub const ATTR_REPLACED: &str = "data-wagelens-replaced";

const ALL_ATTRS: [&str; 6] = [
    ATTR_DETECTED,
    ATTR_PRICE,
    ATTR_INDEX,
    ATTR_HOURS,
    ATTR_HOURS_LABEL,
    ATTR_REPLACED,
];

/// Write detection metadata. No-op when the element is gone.
pub fn mark_detected(doc: &mut Document, id: NodeId, price: f64, index: usize) {
    if !doc.is_attached(id) {
        return;
    }
    if let Some(el) = doc.element_mut(id) {
        el.set_attr(ATTR_DETECTED, DETECTED_FLAG);
        el.set_attr(ATTR_PRICE, &format!("{:.2}", price));
        el.set_attr(ATTR_INDEX, &index.to_string());
    }
}

/// Write conversion metadata. No-op when the element is gone.
pub fn write_hours(doc: &mut Document, id: NodeId, hours: Option<f64>, label: &str) {
    if !doc.is_attached(id) {
        return;
    }
    if let Some(el) = doc.element_mut(id) {
        match hours {
            Some(h) => el.set_attr(ATTR_HOURS, &format!("{:.2}", h)),
            None => el.set_attr(ATTR_HOURS, "null"),
        }
        el.set_attr(ATTR_HOURS_LABEL, label);
    }
}

pub fn is_detected(doc: &Document, id: NodeId) -> bool {
    doc.element(id)
        .map(|el| el.attr(ATTR_DETECTED) == Some(DETECTED_FLAG))
        .unwrap_or(false)
}

/// Remove every annotation attribute from one element.
pub fn strip(doc: &mut Document, id: NodeId) {
    if let Some(el) = doc.element_mut(id) {
        for attr in ALL_ATTRS {
            el.remove_attr(attr);
        }
    }
}

/// Remove annotation attributes everywhere in the document.
pub fn strip_all(doc: &mut Document) {
    let marked: Vec<NodeId> = doc
        .elements()
        .filter(|&id| {
            doc.element(id)
                .map(|el| ALL_ATTRS.iter().any(|a| el.attr(a).is_some()))
                .unwrap_or(false)
        })
        .collect();
    for id in marked {
        strip(doc, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_strip() {
        let mut doc = Document::parse_html(
            r#"<html><body><span id="p" class="price">$10</span></body></html>"#,
        )
        .unwrap();
        let price = doc
            .elements()
            .find(|&n| doc.element(n).and_then(|e| e.id()) == Some("p"))
            .unwrap();

        mark_detected(&mut doc, price, 10.0, 0);
        write_hours(&mut doc, price, Some(0.5), "0.5h");
        assert!(is_detected(&doc, price));
        let el = doc.element(price).unwrap();
        assert_eq!(el.attr(ATTR_PRICE), Some("10.00"));
        assert_eq!(el.attr(ATTR_HOURS_LABEL), Some("0.5h"));

        strip_all(&mut doc);
        let el = doc.element(price).unwrap();
        assert!(!is_detected(&doc, price));
        assert_eq!(el.attr(ATTR_PRICE), None);
        // non-annotation attributes survive
        assert_eq!(el.attr("class"), Some("price"));
    }
}

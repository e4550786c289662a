// src/selectors.rs
//
// Structural scan selectors, ordered generic to site-specific. When a
// storefront changes its markup, this is the file to update: capture an HTML
// sample, add or adjust an entry, and add a test fixture.

use crate::dom::{Document, NodeId};

/// One structural pattern matched against the document model.
#[derive(Debug, Clone, Copy)]
pub enum SelectorSpec {
    /// `[class*="needle"]`, case-insensitive.
    ClassContains(&'static str),
    /// `[id*="needle"]`, case-insensitive.
    IdContains(&'static str),
    /// `[attr]` — attribute present, any value.
    AttrPresent(&'static str),
    /// `[attr="value"]` — exact attribute value.
    AttrEquals(&'static str, &'static str),
    /// `.ancestor .target` — class-token target under a class-token ancestor.
    ClassUnder {
        ancestor: &'static str,
        target: &'static str,
    },
}

/// The fixed scan order. Generic class/id/attribute probes first, then known
/// e-commerce markup patterns.
pub const STRUCTURAL_SELECTORS: &[SelectorSpec] = &[
    // Generic probes
    SelectorSpec::ClassContains("price"),
    SelectorSpec::IdContains("price"),
    SelectorSpec::AttrPresent("data-price"),
    SelectorSpec::ClassContains("cost"),
    SelectorSpec::ClassContains("amount"),
    // schema.org microdata
    SelectorSpec::AttrEquals("itemprop", "price"),
    // Amazon: accessibility span inside the price widget
    SelectorSpec::ClassUnder {
        ancestor: "a-price",
        target: "a-offscreen",
    },
    // Amazon: visible whole-number part
    SelectorSpec::ClassContains("a-price-whole"),
    // eBay item price block
    SelectorSpec::ClassContains("x-price"),
    // Shopify money spans
    SelectorSpec::ClassContains("money"),
];

impl SelectorSpec {
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Some(el) = doc.element(id) else {
            return false;
        };
        match self {
            SelectorSpec::ClassContains(needle) => {
                el.class_attr().to_lowercase().contains(needle)
            }
            SelectorSpec::IdContains(needle) => el
                .id()
                .map(|i| i.to_lowercase().contains(needle))
                .unwrap_or(false),
            SelectorSpec::AttrPresent(attr) => el.attr(attr).is_some(),
            SelectorSpec::AttrEquals(attr, value) => el.attr(attr) == Some(*value),
            SelectorSpec::ClassUnder { ancestor, target } => {
                el.has_class(target)
                    && doc.ancestors(id).any(|a| {
                        doc.element(a)
                            .map(|ae| ae.has_class(ancestor))
                            .unwrap_or(false)
                    })
            }
        }
    }
}

/// All elements matched by the structural selector list, in scan order.
/// An element matched by several selectors appears once per match; the
/// extractor's dedup map collapses them.
pub fn select(doc: &Document) -> Vec<NodeId> {
    let elements: Vec<NodeId> = doc.elements().collect();
    let mut matched = Vec::new();
    for spec in STRUCTURAL_SELECTORS {
        for &id in &elements {
            if spec.matches(doc, id) {
                matched.push(id);
            }
        }
    }
    matched
}

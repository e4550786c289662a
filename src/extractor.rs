// src/extractor.rs
//
// Price extraction: a structural selector scan plus a textual fallback scan
// over all text nodes, deduplicated per element. Every pass starts from
// scratch; candidates are never carried across passes.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::annotations;
use crate::dom::{Document, NodeId};
use crate::element_filter::ElementFilter;
use crate::heuristics::PRICE_PATTERN;
use crate::metrics;
use crate::price_parser::parse_price;
use crate::selectors;
use crate::settings::Settings;

/// A detected (element, price, text) triple prior to conversion.
#[derive(Debug, Clone)]
pub struct PriceCandidate {
    pub element: NodeId,
    pub price: f64,
    pub original_text: String,
}

pub struct PriceExtractor {
    filter: ElementFilter,
    max_candidates: usize,
    max_text_len: usize,
    max_ancestor_hops: usize,
}

impl PriceExtractor {
    pub fn new(settings: &Settings) -> Self {
        Self {
            filter: ElementFilter::new(&settings.presentation.badge_class),
            max_candidates: settings.extraction.max_candidates,
            max_text_len: settings.extraction.max_text_len,
            max_ancestor_hops: settings.extraction.max_ancestor_hops,
        }
    }

    pub fn filter(&self) -> &ElementFilter {
        &self.filter
    }

    /// Run both scans and return the deduplicated candidate list in document
    /// order. Writes detection metadata onto each surviving element.
    pub fn extract(&self, doc: &mut Document) -> Vec<PriceCandidate> {
        let mut found: IndexMap<NodeId, PriceCandidate> = IndexMap::new();

        self.structural_scan(doc, &mut found);
        self.textual_scan(doc, &mut found);

        // Document order, not discovery order: the ordinal index in the
        // metadata contract follows the page.
        let order: HashMap<NodeId, usize> = doc
            .descendants(doc.root())
            .enumerate()
            .map(|(pos, node)| (node, pos))
            .collect();
        let mut ordered: Vec<PriceCandidate> = found.into_values().collect();
        ordered.sort_by_key(|c| order.get(&c.element).copied().unwrap_or(usize::MAX));

        for (index, candidate) in ordered.iter().enumerate() {
            annotations::mark_detected(doc, candidate.element, candidate.price, index);
            metrics::increment_candidates_detected();
        }
        debug!("extraction pass found {} candidate(s)", ordered.len());
        ordered
    }

    /// Scan 1: fixed selector list, generic to site-specific.
    fn structural_scan(&self, doc: &Document, found: &mut IndexMap<NodeId, PriceCandidate>) {
        for id in selectors::select(doc) {
            if found.len() >= self.max_candidates {
                debug!("candidate cap {} reached, stopping scan", self.max_candidates);
                return;
            }
            let text = doc.text_of(id);
            let text = text.trim();
            if text.is_empty() || text.len() > self.max_text_len {
                continue;
            }
            let Some(price) = parse_price(doc, &self.filter, id, text) else {
                trace!("selector match '{}' did not parse as a price", text);
                continue;
            };
            found.insert(
                id,
                PriceCandidate {
                    element: id,
                    price,
                    original_text: text.to_string(),
                },
            );
        }
    }

    /// Scan 2: currency-anchored regex over every text node, attributed to
    /// the nearest ancestor that passes the element filter.
    fn textual_scan(&self, doc: &Document, found: &mut IndexMap<NodeId, PriceCandidate>) {
        let text_nodes: Vec<NodeId> = doc.text_nodes().collect();
        for text_id in text_nodes {
            if found.len() >= self.max_candidates {
                return;
            }
            let Some(raw) = doc.text_value(text_id) else {
                continue;
            };
            if raw.len() > self.max_text_len * 4 {
                continue;
            }
            let matches: Vec<String> = PRICE_PATTERN
                .find_iter(raw)
                .map(|m| m.as_str().to_string())
                .collect();
            for matched in matches {
                let Some(target) = self.attribute_to_ancestor(doc, text_id) else {
                    continue;
                };
                // The fallback only catches prices the selectors missed: when
                // a different ancestor already carries a candidate covering
                // this text, attributing deeper would double-annotate it.
                let covered = doc
                    .ancestors(text_id)
                    .take(self.max_ancestor_hops)
                    .any(|a| a != target && found.contains_key(&a));
                if covered && !found.contains_key(&target) {
                    continue;
                }
                let Some(price) = parse_price(doc, &self.filter, target, &matched) else {
                    continue;
                };
                // Last write wins: one candidate per element no matter how
                // many scans or matches touched it.
                found.insert(
                    target,
                    PriceCandidate {
                        element: target,
                        price,
                        original_text: matched,
                    },
                );
            }
        }
    }

    /// Walk up from a text node until an element passes the filter.
    fn attribute_to_ancestor(&self, doc: &Document, text_id: NodeId) -> Option<NodeId> {
        doc.ancestors(text_id)
            .take(self.max_ancestor_hops)
            .find(|&anc| self.filter.is_price_element(doc, anc).is_valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{ATTR_DETECTED, ATTR_INDEX, DETECTED_FLAG};

    fn extractor() -> PriceExtractor {
        PriceExtractor::new(&Settings::default())
    }

    fn parse(body: &str) -> Document {
        Document::parse_html(&format!("<html><body>{}</body></html>", body)).unwrap()
    }

    #[test]
    fn test_structural_and_textual_dedup() {
        // The span matches a selector AND its text node matches the regex;
        // it must yield exactly one candidate.
        let mut doc = parse(r#"<span class="price">$19.99</span>"#);
        let candidates = extractor().extract(&mut doc);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].price, 19.99);
    }

    #[test]
    fn test_textual_fallback_without_selector() {
        let mut doc = parse(r#"<p>Only <b>$49</b> this week</p>"#);
        let candidates = extractor().extract(&mut doc);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].price, 49.0);
    }

    #[test]
    fn test_timer_is_not_extracted() {
        let mut doc = parse(
            r#"<span class="countdown-timer">2h 30m</span>
               <span class="price">$10</span>"#,
        );
        let candidates = extractor().extract(&mut doc);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].price, 10.0);
    }

    #[test]
    fn test_metadata_written_in_document_order() {
        let mut doc = parse(
            r#"<span class="price" id="first">$10</span>
               <span class="price" id="second">$20</span>"#,
        );
        let candidates = extractor().extract(&mut doc);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].price, 10.0);

        let first = doc
            .elements()
            .find(|&n| doc.element(n).and_then(|e| e.id()) == Some("first"))
            .unwrap();
        let el = doc.element(first).unwrap();
        assert_eq!(el.attr(ATTR_DETECTED), Some(DETECTED_FLAG));
        assert_eq!(el.attr(ATTR_INDEX), Some("0"));
    }

    #[test]
    fn test_hidden_price_is_skipped() {
        let mut doc = parse(r#"<span class="price" style="display:none">$10</span>"#);
        assert!(extractor().extract(&mut doc).is_empty());
    }
}

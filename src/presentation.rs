// src/presentation.rs
//
// Stateful DOM reconciliation. Two mutually exclusive display modes; tracked
// state per document so repeated passes never duplicate work and a full
// revert is always possible.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::annotations::ATTR_REPLACED;
use crate::dom::{Document, NodeId};
use crate::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    SideBySide,
    Replace,
}

impl DisplayMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayMode::SideBySide => "side-by-side",
            DisplayMode::Replace => "replace",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "side-by-side" => Ok(DisplayMode::SideBySide),
            "replace" => Ok(DisplayMode::Replace),
            other => Err(format!("unknown display mode '{}'", other)),
        }
    }
}

/// Font properties copied onto a badge so it blends into surrounding text.
const FONT_STYLE_PROPS: [&str; 7] = [
    "font-family",
    "font-size",
    "font-weight",
    "font-style",
    "line-height",
    "letter-spacing",
    "color",
];

/// Inline properties replace mode overwrites, snapshotted before the first
/// write.
const REPLACE_STYLE_PROPS: [&str; 4] = ["background-color", "padding", "border-radius", "display"];

/// Fixed visual treatment applied to a replaced price.
const REPLACE_TREATMENT: [(&str, &str); 4] = [
    ("background-color", "#fdf2c9"),
    ("padding", "1px 5px"),
    ("border-radius", "4px"),
    ("display", "inline-block"),
];

/// Everything needed to return a replaced element to its pre-replacement
/// state. Taken once, before the first write, and held until restore.
#[derive(Debug, Clone)]
pub struct OriginalSnapshot {
    pub text: String,
    pub html: String,
    styles: [Option<String>; 4],
    title: Option<String>,
}

/// One converted candidate ready for display.
#[derive(Debug, Clone)]
pub struct PresentedPrice {
    pub element: NodeId,
    pub original_text: String,
    pub formatted_hours: String,
    pub hours: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOutcome {
    pub badges_injected: usize,
    pub badges_updated: usize,
    pub prices_replaced: usize,
}

pub struct PresentationController {
    badge_class: String,
    injected_badges: HashMap<NodeId, NodeId>,
    replaced_prices: HashMap<NodeId, OriginalSnapshot>,
    last_mode: Option<DisplayMode>,
}

impl PresentationController {
    pub fn new(badge_class: &str) -> Self {
        Self {
            badge_class: badge_class.to_string(),
            injected_badges: HashMap::new(),
            replaced_prices: HashMap::new(),
            last_mode: None,
        }
    }

    pub fn badge_class(&self) -> &str {
        &self.badge_class
    }

    pub fn tracked_badges(&self) -> usize {
        self.injected_badges.len()
    }

    pub fn tracked_replacements(&self) -> usize {
        self.replaced_prices.len()
    }

    /// Revert the previous representation ahead of a pass when the mode
    /// changed. Must run before extraction: replaced text no longer reads as
    /// a price, so detection only works against the restored document.
    pub fn prepare_mode(&mut self, doc: &mut Document, mode: DisplayMode) {
        if self.last_mode.is_some() && self.last_mode != Some(mode) {
            self.reset(doc);
            self.last_mode = None;
        }
    }

    /// One presentation cycle. Show-hours off resets and stops; a mode change
    /// resets before reapplying so the two representations never coexist.
    pub fn run(
        &mut self,
        doc: &mut Document,
        items: &[PresentedPrice],
        mode: DisplayMode,
        show_hours: bool,
    ) -> ApplyOutcome {
        if !show_hours {
            self.reset(doc);
            self.last_mode = None;
            return ApplyOutcome::default();
        }
        if self.last_mode != Some(mode) {
            self.reset(doc);
        }
        self.prune_dead_entries(doc);

        let mut outcome = ApplyOutcome::default();
        match mode {
            DisplayMode::SideBySide => self.apply_badges(doc, items, &mut outcome),
            DisplayMode::Replace => self.apply_replacements(doc, items, &mut outcome),
        }
        self.last_mode = Some(mode);
        outcome
    }

    /// Unconditional revert: removes every element bearing the badge class
    /// (the tracked map can desynchronize from manual DOM edits, so the
    /// document-wide sweep is authoritative) and restores every tracked
    /// replacement still attached. Idempotent.
    pub fn reset(&mut self, doc: &mut Document) {
        let stray_badges: Vec<NodeId> = doc
            .elements()
            .filter(|&id| {
                doc.element(id)
                    .map(|el| el.has_class(&self.badge_class))
                    .unwrap_or(false)
            })
            .collect();
        for badge in stray_badges {
            doc.detach(badge);
        }
        self.injected_badges.clear();

        let replaced: Vec<(NodeId, OriginalSnapshot)> = self.replaced_prices.drain().collect();
        for (element, snapshot) in replaced {
            if !doc.is_attached(element) {
                continue;
            }
            self.restore_snapshot(doc, element, &snapshot);
        }
    }

    fn restore_snapshot(&self, doc: &mut Document, element: NodeId, snapshot: &OriginalSnapshot) {
        if let Err(err) = doc.set_inner_html(element, &snapshot.html) {
            warn!("failed to restore original markup, falling back to text: {err}");
            doc.set_text(element, &snapshot.text);
        }
        if let Some(el) = doc.element_mut(element) {
            for (prop, saved) in REPLACE_STYLE_PROPS.iter().zip(snapshot.styles.iter()) {
                match saved {
                    Some(value) => el.set_style(prop, value),
                    None => el.remove_style(prop),
                }
            }
            match &snapshot.title {
                Some(title) => el.set_attr("title", title),
                None => {
                    el.remove_attr("title");
                }
            }
            el.remove_attr(ATTR_REPLACED);
        }
    }

    /// Drop tracking for elements the host page has since detached. A badge
    /// orphaned by its price element's removal is detached too.
    fn prune_dead_entries(&mut self, doc: &mut Document) {
        let dead: Vec<(NodeId, NodeId)> = self
            .injected_badges
            .iter()
            .filter(|(el, _)| !doc.is_attached(**el))
            .map(|(el, badge)| (*el, *badge))
            .collect();
        for (element, badge) in dead {
            if doc.is_attached(badge) {
                doc.detach(badge);
            }
            self.injected_badges.remove(&element);
        }
        self.replaced_prices.retain(|el, _| doc.is_attached(*el));
    }

    fn apply_badges(&mut self, doc: &mut Document, items: &[PresentedPrice], outcome: &mut ApplyOutcome) {
        for item in items {
            if !doc.is_attached(item.element) {
                continue;
            }
            if self.replaced_prices.contains_key(&item.element) {
                // the two representations are mutually exclusive per element
                continue;
            }
            match self.find_existing_badge(doc, item.element) {
                Some(badge) => {
                    if doc.text_of(badge) != item.formatted_hours {
                        doc.set_text(badge, &item.formatted_hours);
                        copy_font_styles(doc, item.element, badge);
                        outcome.badges_updated += 1;
                    }
                    self.injected_badges.insert(item.element, badge);
                }
                None => {
                    if let Some(badge) = self.inject_badge(doc, item) {
                        self.injected_badges.insert(item.element, badge);
                        outcome.badges_injected += 1;
                        metrics::increment_badges_injected();
                    }
                }
            }
        }
    }

    /// A badge may already exist: in the tracked map, as the immediate next
    /// sibling, or elsewhere under a shared price-container ancestor that the
    /// host page re-wrapped.
    fn find_existing_badge(&self, doc: &Document, element: NodeId) -> Option<NodeId> {
        if let Some(&badge) = self.injected_badges.get(&element) {
            if doc.is_attached(badge) && self.is_badge(doc, badge) {
                return Some(badge);
            }
        }
        if let Some(sibling) = doc.next_sibling(element) {
            if self.is_badge(doc, sibling) {
                return Some(sibling);
            }
        }
        let container = doc.ancestors(element).find(|&a| {
            doc.element(a)
                .map(|el| el.class_attr().to_lowercase().contains("price"))
                .unwrap_or(false)
        })?;
        doc.descendants(container).find(|&n| {
            n != element
                && self.is_badge(doc, n)
                && !self.injected_badges.values().any(|&claimed| claimed == n)
        })
    }

    fn inject_badge(&self, doc: &mut Document, item: &PresentedPrice) -> Option<NodeId> {
        let badge = doc.create_element("span");
        {
            let el = doc.element_mut(badge)?;
            el.add_class(&self.badge_class);
            el.set_style("margin-left", "6px");
        }
        doc.set_text(badge, &item.formatted_hours);
        copy_font_styles(doc, item.element, badge);
        if !doc.insert_after(item.element, badge) {
            debug!("price element vanished before badge insertion, skipping");
            return None;
        }
        Some(badge)
    }

    fn apply_replacements(
        &mut self,
        doc: &mut Document,
        items: &[PresentedPrice],
        outcome: &mut ApplyOutcome,
    ) {
        for item in items {
            if !doc.is_attached(item.element) {
                continue;
            }
            if self.replaced_prices.contains_key(&item.element)
                || self.injected_badges.contains_key(&item.element)
            {
                continue;
            }
            let snapshot = match self.take_snapshot(doc, item.element) {
                Some(s) => s,
                None => continue,
            };
            doc.set_text(item.element, &item.formatted_hours);
            if let Some(el) = doc.element_mut(item.element) {
                for (prop, value) in REPLACE_TREATMENT {
                    el.set_style(prop, value);
                }
                el.set_attr(ATTR_REPLACED, "true");
                el.set_attr(
                    "title",
                    &format!(
                        "Original price: {} ({})",
                        item.original_text, item.formatted_hours
                    ),
                );
            }
            self.replaced_prices.insert(item.element, snapshot);
            outcome.prices_replaced += 1;
            metrics::increment_prices_replaced();
        }
    }

    fn take_snapshot(&self, doc: &Document, element: NodeId) -> Option<OriginalSnapshot> {
        let el = doc.element(element)?;
        let styles = [
            el.style(REPLACE_STYLE_PROPS[0]),
            el.style(REPLACE_STYLE_PROPS[1]),
            el.style(REPLACE_STYLE_PROPS[2]),
            el.style(REPLACE_STYLE_PROPS[3]),
        ];
        Some(OriginalSnapshot {
            text: doc.text_of(element),
            html: doc.inner_html(element),
            styles,
            title: el.attr("title").map(str::to_string),
        })
    }

    fn is_badge(&self, doc: &Document, id: NodeId) -> bool {
        doc.element(id)
            .map(|el| el.has_class(&self.badge_class))
            .unwrap_or(false)
    }
}

/// Copy the font properties present on the price element onto the badge.
fn copy_font_styles(doc: &mut Document, from: NodeId, to: NodeId) {
    let values: Vec<(&str, String)> = {
        let Some(src) = doc.element(from) else {
            return;
        };
        FONT_STYLE_PROPS
            .iter()
            .filter_map(|&prop| src.style(prop).map(|v| (prop, v)))
            .collect()
    };
    if let Some(dst) = doc.element_mut(to) {
        for (prop, value) in values {
            dst.set_style(prop, &value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BADGE: &str = "wagelens-badge";

    fn parse(body: &str) -> Document {
        Document::parse_html(&format!("<html><body>{}</body></html>", body)).unwrap()
    }

    fn by_id(d: &Document, id: &str) -> NodeId {
        d.elements()
            .find(|&n| d.element(n).and_then(|e| e.id()) == Some(id))
            .unwrap()
    }

    fn item(element: NodeId, text: &str, formatted: &str) -> PresentedPrice {
        PresentedPrice {
            element,
            original_text: text.to_string(),
            formatted_hours: formatted.to_string(),
            hours: Some(2.0),
        }
    }

    fn count_badges(doc: &Document) -> usize {
        doc.elements()
            .filter(|&id| {
                doc.element(id)
                    .map(|el| el.has_class(BADGE))
                    .unwrap_or(false)
            })
            .count()
    }

    #[test]
    fn test_badges_are_idempotent() {
        let mut doc = parse(r#"<span id="p" style="font-size: 14px">$40</span>"#);
        let price = by_id(&doc, "p");
        let mut ctl = PresentationController::new(BADGE);

        let items = vec![item(price, "$40", "2h")];
        let first = ctl.run(&mut doc, &items, DisplayMode::SideBySide, true);
        assert_eq!(first.badges_injected, 1);
        assert_eq!(count_badges(&doc), 1);

        let second = ctl.run(&mut doc, &items, DisplayMode::SideBySide, true);
        assert_eq!(second.badges_injected, 0);
        assert_eq!(second.badges_updated, 0);
        assert_eq!(count_badges(&doc), 1);

        // badge copied the price element's font size
        let badge = doc.next_sibling(price).unwrap();
        assert_eq!(
            doc.element(badge).unwrap().style("font-size").as_deref(),
            Some("14px")
        );
    }

    #[test]
    fn test_badge_updates_when_hours_change() {
        let mut doc = parse(r#"<span id="p">$40</span>"#);
        let price = by_id(&doc, "p");
        let mut ctl = PresentationController::new(BADGE);

        ctl.run(&mut doc, &[item(price, "$40", "2h")], DisplayMode::SideBySide, true);
        let outcome = ctl.run(&mut doc, &[item(price, "$40", "4h")], DisplayMode::SideBySide, true);
        assert_eq!(outcome.badges_updated, 1);
        assert_eq!(count_badges(&doc), 1);

        let badge = doc.next_sibling(price).unwrap();
        assert_eq!(doc.text_of(badge), "4h");
    }

    #[test]
    fn test_replace_and_restore_are_lossless() {
        let mut doc = parse(
            r#"<span id="p" style="padding: 3px" title="best seller"><b>$40</b> only</span>"#,
        );
        let price = by_id(&doc, "p");
        let original_html = doc.inner_html(price);
        let mut ctl = PresentationController::new(BADGE);

        let outcome = ctl.run(&mut doc, &[item(price, "$40 only", "2h")], DisplayMode::Replace, true);
        assert_eq!(outcome.prices_replaced, 1);
        assert_eq!(doc.text_of(price), "2h");
        let el = doc.element(price).unwrap();
        assert_eq!(el.attr(ATTR_REPLACED), Some("true"));
        assert!(el.attr("title").unwrap().contains("$40 only"));

        // second pass over the same element does not re-snapshot or touch it
        let again = ctl.run(&mut doc, &[item(price, "2h", "2h")], DisplayMode::Replace, true);
        assert_eq!(again.prices_replaced, 0);

        ctl.reset(&mut doc);
        assert_eq!(doc.inner_html(price), original_html);
        let el = doc.element(price).unwrap();
        assert_eq!(el.style("padding").as_deref(), Some("3px"));
        assert_eq!(el.style("background-color"), None);
        assert_eq!(el.attr("title"), Some("best seller"));
        assert_eq!(el.attr(ATTR_REPLACED), None);
    }

    #[test]
    fn test_mode_switch_never_mixes_representations() {
        let mut doc = parse(r#"<span id="p">$40</span>"#);
        let price = by_id(&doc, "p");
        let mut ctl = PresentationController::new(BADGE);
        let items = vec![item(price, "$40", "2h")];

        ctl.run(&mut doc, &items, DisplayMode::SideBySide, true);
        assert_eq!(count_badges(&doc), 1);

        ctl.run(&mut doc, &items, DisplayMode::Replace, true);
        assert_eq!(count_badges(&doc), 0);
        assert_eq!(doc.text_of(price), "2h");
        assert_eq!(ctl.tracked_badges(), 0);
        assert_eq!(ctl.tracked_replacements(), 1);

        // back again: replacement reverted, badge re-injected against the
        // restored original text
        ctl.run(&mut doc, &items, DisplayMode::SideBySide, true);
        assert_eq!(count_badges(&doc), 1);
        assert_eq!(doc.text_of(price).contains("$40"), true);
        assert_eq!(ctl.tracked_replacements(), 0);
    }

    #[test]
    fn test_show_hours_off_resets_only() {
        let mut doc = parse(r#"<span id="p">$40</span>"#);
        let price = by_id(&doc, "p");
        let mut ctl = PresentationController::new(BADGE);
        let items = vec![item(price, "$40", "2h")];

        ctl.run(&mut doc, &items, DisplayMode::SideBySide, true);
        assert_eq!(count_badges(&doc), 1);

        let outcome = ctl.run(&mut doc, &items, DisplayMode::SideBySide, false);
        assert_eq!(outcome.badges_injected, 0);
        assert_eq!(count_badges(&doc), 0);
    }

    #[test]
    fn test_detached_elements_are_pruned() {
        let mut doc = parse(r#"<div id="box"><span id="p">$40</span></div>"#);
        let price = by_id(&doc, "p");
        let container = by_id(&doc, "box");
        let mut ctl = PresentationController::new(BADGE);

        ctl.run(&mut doc, &[item(price, "$40", "2h")], DisplayMode::SideBySide, true);
        assert_eq!(ctl.tracked_badges(), 1);

        doc.detach(container);
        let outcome = ctl.run(&mut doc, &[], DisplayMode::SideBySide, true);
        assert_eq!(outcome.badges_injected, 0);
        assert_eq!(ctl.tracked_badges(), 0);
    }

    #[test]
    fn test_reset_sweeps_stray_badges() {
        // a badge the map does not know about (e.g. restored by the host
        // from cached HTML) is still removed
        let mut doc = parse(r#"<span id="p">$40</span><span class="wagelens-badge">2h</span>"#);
        let mut ctl = PresentationController::new(BADGE);
        ctl.reset(&mut doc);
        assert_eq!(count_badges(&doc), 0);
    }
}

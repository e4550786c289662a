// src/dom.rs
//
// Arena-backed document model. Nodes live in a flat arena and are addressed by
// stable `NodeId` handles; detaching a node never invalidates handles, it only
// makes the liveness check fail. Callers must re-validate liveness before every
// read or write since the host may detach any subtree between passes.

use anyhow::{anyhow, Result};
use indexmap::IndexMap;
use scraper::Html;

/// Stable handle into a `Document` arena.
///
/// A handle stays valid for the lifetime of the document. Whether the node it
/// names is still part of the tree is a separate question — see
/// [`Document::is_attached`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Element data: tag name plus attributes in source order.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag: String,
    attrs: IndexMap<String, String>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: IndexMap::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attrs.insert(name.to_string(), value.to_string());
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attrs.shift_remove(name)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// The raw `class` attribute, or `""` when absent.
    pub fn class_attr(&self) -> &str {
        self.attr("class").unwrap_or("")
    }

    /// Whitespace-split class tokens.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.class_attr().split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            let merged = if self.class_attr().is_empty() {
                class.to_string()
            } else {
                format!("{} {}", self.class_attr(), class)
            };
            self.set_attr("class", &merged);
        }
    }

    /// Read one property out of the inline `style` attribute.
    pub fn style(&self, prop: &str) -> Option<String> {
        let style = self.attr("style")?;
        for decl in style.split(';') {
            let mut parts = decl.splitn(2, ':');
            let name = parts.next()?.trim();
            if name.eq_ignore_ascii_case(prop) {
                return parts.next().map(|v| v.trim().to_string());
            }
        }
        None
    }

    /// Write one property into the inline `style` attribute, replacing any
    /// previous declaration of the same property.
    pub fn set_style(&mut self, prop: &str, value: &str) {
        let mut decls: Vec<(String, String)> = self
            .attr("style")
            .unwrap_or("")
            .split(';')
            .filter_map(|d| {
                let mut parts = d.splitn(2, ':');
                let name = parts.next()?.trim();
                let val = parts.next()?.trim();
                if name.is_empty() {
                    None
                } else {
                    Some((name.to_string(), val.to_string()))
                }
            })
            .filter(|(name, _)| !name.eq_ignore_ascii_case(prop))
            .collect();
        decls.push((prop.to_string(), value.to_string()));
        let rebuilt = decls
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("; ");
        self.set_attr("style", &rebuilt);
    }

    /// Drop one property from the inline `style` attribute; removes the
    /// attribute entirely when no declarations remain.
    pub fn remove_style(&mut self, prop: &str) {
        let decls: Vec<(String, String)> = self
            .attr("style")
            .unwrap_or("")
            .split(';')
            .filter_map(|d| {
                let mut parts = d.splitn(2, ':');
                let name = parts.next()?.trim();
                let val = parts.next()?.trim();
                if name.is_empty() {
                    None
                } else {
                    Some((name.to_string(), val.to_string()))
                }
            })
            .filter(|(name, _)| !name.eq_ignore_ascii_case(prop))
            .collect();
        if decls.is_empty() {
            self.remove_attr("style");
            return;
        }
        let rebuilt = decls
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("; ");
        self.set_attr("style", &rebuilt);
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// A mutable document tree standing in for the live DOM.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Document {
    /// Empty document with a bare `<html>` root.
    pub fn new() -> Self {
        Self::with_root(Element::new("html"))
    }

    fn with_root(root_el: Element) -> Self {
        let nodes = vec![NodeData {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Element(root_el),
        }];
        Self {
            nodes,
            root: NodeId(0),
        }
    }

    /// Parse a full HTML document.
    pub fn parse_html(html: &str) -> Result<Self> {
        let parsed = Html::parse_document(html);
        let src_root = parsed
            .root_element()
            .value()
            .clone();
        let mut doc = Document::with_root(convert_element(&src_root));
        let root = doc.root;
        graft(&mut doc, &parsed, root)?;
        Ok(doc)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id.0)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id)? {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Ancestor chain from the immediate parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// True when walking the parent chain from `id` reaches the root. A
    /// detached node (or a descendant of one) fails this check.
    pub fn is_attached(&self, id: NodeId) -> bool {
        if id == self.root {
            return true;
        }
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if parent == self.root {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Pre-order traversal of `id`'s subtree, `id` included. Document order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: vec![id],
        }
    }

    /// All elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(self.root)
            .filter(|&id| matches!(self.kind(id), Some(NodeKind::Element(_))))
    }

    /// All text nodes in document order.
    pub fn text_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(self.root)
            .filter(|&id| matches!(self.kind(id), Some(NodeKind::Text(_))))
    }

    /// Concatenated text of `id`'s subtree.
    pub fn text_of(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(NodeKind::Text(t)) = self.kind(node) {
                out.push_str(t);
            }
        }
        out
    }

    pub fn text_value(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(t) => Some(t.as_str()),
            NodeKind::Element(_) => None,
        }
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(Element::new(tag)))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    /// Insert `node` as the immediately-following sibling of `reference`.
    /// Fails when the reference is the root or already detached.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> bool {
        let Some(parent) = self.parent(reference) else {
            return false;
        };
        self.detach(node);
        if let Some(n) = self.node_mut(node) {
            n.parent = Some(parent);
        }
        if let Some(p) = self.node_mut(parent) {
            if let Some(pos) = p.children.iter().position(|&c| c == reference) {
                p.children.insert(pos + 1, node);
                return true;
            }
        }
        false
    }

    /// Remove a node from its parent. The node and its subtree stay in the
    /// arena; handles into it remain usable but fail the liveness check.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = None;
        }
    }

    /// Replace `id`'s entire subtree with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            self.detach(child);
        }
        let text_node = self.create_text(text);
        self.append_child(id, text_node);
    }

    /// Serialize `id`'s children (not `id` itself).
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.serialize_node(child, &mut out);
        }
        out
    }

    /// Replace `id`'s subtree with the parse of an HTML fragment.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) -> Result<()> {
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            self.detach(child);
        }
        let parsed = Html::parse_fragment(html);
        graft(self, &parsed, id)
    }

    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.serialize_node(self.root, &mut out);
        out
    }

    fn serialize_node(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(t)) => out.push_str(&escape_text(t)),
            Some(NodeKind::Element(el)) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in el.attrs() {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
                out.push('>');
                if is_void_element(&el.tag) {
                    return;
                }
                for &child in self.children(id) {
                    self.serialize_node(child, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
            None => {}
        }
    }

    /// True when the element itself is hidden: inline `display:none` /
    /// `visibility:hidden`, a hiding class token, the `hidden` attribute, or
    /// `aria-hidden="true"`.
    pub fn is_visibly_hidden(&self, id: NodeId) -> bool {
        let Some(el) = self.element(id) else {
            return false;
        };
        if el.attr("hidden").is_some() {
            return true;
        }
        if el.attr("aria-hidden") == Some("true") {
            return true;
        }
        if let Some(display) = el.style("display") {
            if display.eq_ignore_ascii_case("none") {
                return true;
            }
        }
        if let Some(visibility) = el.style("visibility") {
            if visibility.eq_ignore_ascii_case("hidden") {
                return true;
            }
        }
        const HIDING_CLASSES: [&str; 6] = [
            "hidden",
            "invisible",
            "sr-only",
            "screen-reader-only",
            "visually-hidden",
            "offscreen",
        ];
        el.classes()
            .any(|c| HIDING_CLASSES.iter().any(|h| c.eq_ignore_ascii_case(h)))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        let children = self.doc.children(current);
        for &child in children.iter().rev() {
            self.stack.push(child);
        }
        Some(current)
    }
}

fn convert_element(el: &scraper::node::Element) -> Element {
    let mut out = Element::new(el.name());
    for (name, value) in el.attrs() {
        out.set_attr(name, value);
    }
    out
}

/// Walk a parsed scraper tree and append its content under `parent`.
fn graft(doc: &mut Document, parsed: &Html, parent: NodeId) -> Result<()> {
    let src_root = parsed.root_element();
    if doc.node(parent).is_none() {
        return Err(anyhow!("graft target is not a valid node"));
    }
    let mut stack = Vec::new();
    stack.push((src_root.id(), parent));
    while let Some((src_id, dst_id)) = stack.pop() {
        let Some(src) = parsed.tree.get(src_id) else {
            continue;
        };
        for child in src.children() {
            match child.value() {
                scraper::Node::Element(el) => {
                    let id = doc.push(NodeKind::Element(convert_element(el)));
                    doc.append_child(dst_id, id);
                    stack.push((child.id(), id));
                }
                scraper::Node::Text(t) => {
                    let id = doc.push(NodeKind::Text(t.to_string()));
                    doc.append_child(dst_id, id);
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::parse_html(
            r#"<html><body><div class="price-box"><span class="price" id="p1">$19.99</span></div></body></html>"#,
        )
        .unwrap()
    }

    fn find_by_id(doc: &Document, id: &str) -> NodeId {
        doc.elements()
            .find(|&n| doc.element(n).and_then(Element::id) == Some(id))
            .unwrap()
    }

    #[test]
    fn test_parse_and_text() {
        let doc = sample();
        let price = find_by_id(&doc, "p1");
        assert_eq!(doc.text_of(price), "$19.99");
        assert!(doc.element(price).unwrap().has_class("price"));
    }

    #[test]
    fn test_detach_breaks_liveness_but_not_handles() {
        let mut doc = sample();
        let price = find_by_id(&doc, "p1");
        assert!(doc.is_attached(price));

        doc.detach(price);
        assert!(!doc.is_attached(price));
        // Handle still reads the detached node
        assert_eq!(doc.text_of(price), "$19.99");
    }

    #[test]
    fn test_insert_after_orders_siblings() {
        let mut doc = sample();
        let price = find_by_id(&doc, "p1");
        let badge = doc.create_element("span");
        assert!(doc.insert_after(price, badge));

        assert_eq!(doc.next_sibling(price), Some(badge));
        // Root has no parent, insertion after it must fail
        let orphan = doc.create_element("span");
        assert!(!doc.insert_after(doc.root(), orphan));
    }

    #[test]
    fn test_set_text_replaces_subtree() {
        let mut doc = sample();
        let box_el = doc
            .elements()
            .find(|&n| doc.element(n).map(|e| e.has_class("price-box")) == Some(true))
            .unwrap();
        doc.set_text(box_el, "4h");
        assert_eq!(doc.text_of(box_el), "4h");
        assert_eq!(doc.children(box_el).len(), 1);
    }

    #[test]
    fn test_inner_html_roundtrip() {
        let mut doc = sample();
        let box_el = doc
            .elements()
            .find(|&n| doc.element(n).map(|e| e.has_class("price-box")) == Some(true))
            .unwrap();
        let original = doc.inner_html(box_el);
        doc.set_text(box_el, "replaced");
        doc.set_inner_html(box_el, &original).unwrap();
        assert_eq!(doc.inner_html(box_el), original);
        assert_eq!(doc.text_of(box_el), "$19.99");
    }

    #[test]
    fn test_style_read_write() {
        let mut doc = sample();
        let price = find_by_id(&doc, "p1");
        let el = doc.element_mut(price).unwrap();
        el.set_style("font-size", "14px");
        el.set_style("color", "#333");
        el.set_style("font-size", "16px");
        assert_eq!(el.style("font-size").as_deref(), Some("16px"));
        assert_eq!(el.style("color").as_deref(), Some("#333"));
    }

    #[test]
    fn test_hidden_detection() {
        let doc = Document::parse_html(
            r#"<html><body>
                <span id="a" style="display: none">$5</span>
                <span id="b" aria-hidden="true">$5</span>
                <span id="c" class="sr-only">$5</span>
                <span id="d" class="a-offscreen">$5</span>
            </body></html>"#,
        )
        .unwrap();
        assert!(doc.is_visibly_hidden(find_by_id(&doc, "a")));
        assert!(doc.is_visibly_hidden(find_by_id(&doc, "b")));
        assert!(doc.is_visibly_hidden(find_by_id(&doc, "c")));
        // Amazon's accessibility price span is real price text, not chrome
        assert!(!doc.is_visibly_hidden(find_by_id(&doc, "d")));
    }
}

// src/core/document.rs
//! Parser: markup text in, immutable `Document` out.
//!
//! Tokenizing and tree construction are done by html5ever (through `scraper`),
//! which applies the standard HTML recovery rules: unclosed tags, missing
//! `<tbody>`, stray end tags and the like never fail. The resulting tree is
//! copied into a flat arena whose ids follow depth-first pre-order, so
//! "document order" is simply id order.

use std::borrow::Cow;

use scraper::Html;
use scraper::node::Node as HtmlNode;
use tracing::debug;

use crate::error::{Error, Result};

/// Index of a node inside its `Document`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }

    /// Attribute value; attribute names are matched case-insensitively.
    pub fn attr(&self, name: &str) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attrs(&self) -> &[(String, String)] {
        match &self.kind {
            NodeKind::Element { attrs, .. } => attrs,
            NodeKind::Text(_) => &[],
        }
    }

    /// Whitespace-separated `class` tokens.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }
}

/// Parsed page. Read-only once built.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Synthetic root; holds the top-level nodes (normally just `<html>`).
    pub const ROOT: NodeId = NodeId(0);

    /// Panics if `id` came from another (larger) document; use `get` when
    /// the id's origin is not known.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// All ids in document order, root first.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Ids of the strict descendants of `id`, in document order.
    ///
    /// Pre-order numbering makes the subtree a contiguous id range.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let end = self.subtree_end(id);
        (id.0 + 1..end).map(NodeId)
    }

    /// One past the last id inside `id`'s subtree.
    pub(crate) fn subtree_end(&self, id: NodeId) -> usize {
        let mut cur = id;
        loop {
            match self.nodes[cur.0].children.last() {
                Some(&last) => cur = last,
                None => return cur.0 + 1,
            }
        }
    }

    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        id.0 > ancestor.0 && id.0 < self.subtree_end(ancestor)
    }

    /// Nearest ancestor element with the given tag.
    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let mut cur = self.nodes[id.0].parent;
        while let Some(p) = cur {
            if self.nodes[p.0].tag() == Some(tag) {
                return Some(p);
            }
            cur = self.nodes[p.0].parent;
        }
        None
    }

    /// Element children only.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(|c| self.nodes[c.0].is_element())
    }
}

/* ---------------- Parser ---------------- */

/// Parse markup text. Lenient: only input with no tokens at all is rejected.
pub fn parse(markup: &str) -> Result<Document> {
    if !markup.is_empty() && markup.chars().all(|c| c == '\0') {
        return Err(Error::MalformedMarkup(s!("input holds only NUL characters")));
    }
    let html = Html::parse_document(markup);
    if !html.errors.is_empty() {
        debug!(count = html.errors.len(), "Parse: recovered from markup errors");
    }
    let doc = build(&html);
    debug!(nodes = doc.len(), "Parse: document built");
    Ok(doc)
}

/// Parse raw bytes. Invalid UTF-8 is replaced, not rejected (see `decode`).
pub fn parse_bytes(bytes: &[u8]) -> Result<Document> {
    parse(&decode(bytes))
}

/// Bytes to text. Sequences that are not UTF-8 (a Latin-1 page, say) become
/// U+FFFD so the rest of the page still parses.
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    let text = String::from_utf8_lossy(bytes);
    if let Cow::Owned(_) = text {
        debug!(bytes = bytes.len(), "Parse: invalid UTF-8 replaced");
    }
    text
}

fn build(html: &Html) -> Document {
    let mut nodes = vec![Node {
        kind: NodeKind::Element { tag: s!("#root"), attrs: Vec::new() },
        parent: None,
        children: Vec::new(),
    }];

    // Explicit stack; deep pages would overflow a recursive walk.
    // Children are pushed in reverse so they pop in document order.
    let mut stack = Vec::new();
    for child in html.tree.root().children().collect::<Vec<_>>().into_iter().rev() {
        stack.push((child, Document::ROOT));
    }

    while let Some((node_ref, parent)) = stack.pop() {
        let kind = match node_ref.value() {
            HtmlNode::Element(el) => NodeKind::Element {
                tag: el.name().to_ascii_lowercase(),
                attrs: el.attrs().map(|(k, v)| (s!(k), s!(v))).collect(),
            },
            HtmlNode::Text(t) => NodeKind::Text(s!(&**t)),
            // comments, doctype, processing instructions
            _ => continue,
        };
        let id = NodeId(nodes.len());
        nodes.push(Node { kind, parent: Some(parent), children: Vec::new() });
        nodes[parent.0].children.push(id);

        if matches!(nodes[id.0].kind, NodeKind::Element { .. }) {
            for child in node_ref.children().collect::<Vec<_>>().into_iter().rev() {
                stack.push((child, id));
            }
        }
    }

    Document { nodes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_document_order() {
        let doc = parse("<div id=a><p>one</p><p>two</p></div><div id=b></div>").unwrap();
        let tags: Vec<&str> = doc.ids().filter_map(|id| doc.node(id).tag()).collect();
        assert_eq!(tags, ["#root", "html", "head", "body", "div", "p", "p", "div"]);
    }

    #[test]
    fn recovers_unclosed_tags() {
        let doc = parse("<table><tr><td>1<td>2</table><p>after").unwrap();
        let tds = doc.ids().filter(|&id| doc.node(id).tag() == Some("td")).count();
        assert_eq!(tds, 2);
        assert!(doc.ids().any(|id| doc.node(id).tag() == Some("tbody")));
    }

    #[test]
    fn descendants_are_contiguous() {
        let doc = parse("<ul><li>a</li><li>b<b>c</b></li></ul><p>x</p>").unwrap();
        let ul = doc.ids().find(|&id| doc.node(id).tag() == Some("ul")).unwrap();
        let p = doc.ids().find(|&id| doc.node(id).tag() == Some("p")).unwrap();
        assert!(doc.descendants(ul).all(|d| doc.is_ancestor(ul, d)));
        assert!(!doc.is_ancestor(ul, p));
        assert_eq!(doc.descendants(ul).filter(|&d| doc.node(d).is_element()).count(), 3);
    }

    #[test]
    fn attributes_and_classes() {
        let doc = parse(r#"<span class="short-desc  lead" data-x="1">t</span>"#).unwrap();
        let span = doc.ids().find(|&id| doc.node(id).tag() == Some("span")).unwrap();
        let n = doc.node(span);
        assert!(n.has_class("short-desc"));
        assert!(n.has_class("lead"));
        assert!(!n.has_class("short"));
        assert_eq!(n.attr("DATA-X"), Some("1"));
    }

    #[test]
    fn rejects_untokenizable_input() {
        assert!(matches!(parse("\0\0\0"), Err(Error::MalformedMarkup(_))));
        assert!(matches!(parse_bytes(&[0x00, 0x00]), Err(Error::MalformedMarkup(_))));
        // empty input is still a (trivial) document
        assert!(parse("").is_ok());
    }

    #[test]
    fn latin1_bytes_still_parse() {
        let doc = parse_bytes(b"<table><tr><td>S\xe3o Paulo</td></tr></table>").unwrap();
        let td = doc.ids().find(|&id| doc.node(id).tag() == Some("td")).unwrap();
        let text = doc.node(doc.node(td).children[0]).kind.clone();
        assert_eq!(text, NodeKind::Text(s!("S\u{fffd}o Paulo")));
        assert!(parse_bytes(&[0xff, 0xfe, 0x00]).is_ok());
    }
}

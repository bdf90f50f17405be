// src/core/select.rs
//! Selector: tag-name and class queries over a `Document` or a `NodeSet`.
//!
//! Results are always in document order with each node at most once. An
//! empty result is a normal outcome, not an error.

use std::fmt;

use crate::core::document::{Document, NodeId};
use crate::error::{Error, Result};

/// A node borrowed from its document.
#[derive(Clone, Copy, Debug)]
pub struct NodeRef<'d> {
    pub doc: &'d Document,
    pub id: NodeId,
}

impl<'d> NodeRef<'d> {
    pub fn node(&self) -> &'d crate::core::document::Node {
        self.doc.node(self.id)
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

/// Ordered, duplicate-free set of nodes borrowed from one document.
#[derive(Clone, Debug)]
pub struct NodeSet<'d> {
    doc: &'d Document,
    ids: Vec<NodeId>,
}

impl<'d> NodeSet<'d> {
    pub fn empty(doc: &'d Document) -> Self {
        Self { doc, ids: Vec::new() }
    }

    /// Sorts and dedups `ids` so the set invariant holds.
    pub fn from_ids(doc: &'d Document, mut ids: Vec<NodeId>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        Self { doc, ids }
    }

    /// Keeps the given order verbatim (stride selection of an ordered set).
    pub(crate) fn from_ordered(doc: &'d Document, ids: Vec<NodeId>) -> Self {
        Self { doc, ids }
    }

    pub fn document(&self) -> &'d Document {
        self.doc
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<NodeRef<'d>> {
        self.ids.get(i).map(|&id| NodeRef { doc: self.doc, id })
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'d>> + '_ {
        let doc = self.doc;
        self.ids.iter().map(move |&id| NodeRef { doc, id })
    }

    /// Nested selection: matches among the descendants of this set's nodes.
    pub fn select(&self, query: &Query) -> NodeSet<'d> {
        let mut out = Vec::new();
        // Pre-order ids: a subtree is a contiguous range, so skipping nodes
        // already covered by an earlier range avoids duplicates.
        let mut covered_to = 0usize;
        for &root in &self.ids {
            let end = self.doc.subtree_end(root);
            let start = (root.index() + 1).max(covered_to);
            for i in start..end {
                let id = NodeId(i);
                if query.matches(self.doc, id) {
                    out.push(id);
                }
            }
            covered_to = covered_to.max(end);
        }
        NodeSet::from_ids(self.doc, out)
    }
}

/* ---------------- Query ---------------- */

/// One conjunctive term: optional tag AND every listed class.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Term {
    tag: Option<String>,
    classes: Vec<String>,
}

impl Term {
    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let node = doc.node(id);
        let Some(tag) = node.tag() else { return false };
        if id == Document::ROOT {
            return false;
        }
        if let Some(want) = &self.tag {
            if tag != want {
                return false;
            }
        }
        self.classes.iter().all(|c| node.has_class(c))
    }
}

/// Union of terms. `Query::tag("td").and_class("x").or(Query::tag("th"))`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    terms: Vec<Term>,
}

impl Query {
    pub fn tag(name: &str) -> Self {
        Self { terms: vec![Term { tag: Some(name.to_ascii_lowercase()), classes: Vec::new() }] }
    }

    pub fn class(name: &str) -> Self {
        Self { terms: vec![Term { tag: None, classes: vec![s!(name)] }] }
    }

    /// Every element.
    pub fn any() -> Self {
        Self { terms: vec![Term::default()] }
    }

    /// Adds a required class to every term.
    pub fn and_class(mut self, name: &str) -> Self {
        for t in &mut self.terms {
            t.classes.push(s!(name));
        }
        self
    }

    pub fn or(mut self, other: Query) -> Self {
        self.terms.extend(other.terms);
        self
    }

    /// Compact form: `tag`, `.class`, `tag.c1.c2`, `*`, comma-separated alternatives.
    pub fn parse(text: &str) -> Result<Self> {
        let bad = |reason: &str| Error::InvalidQuery { query: s!(text), reason: s!(reason) };

        let mut terms = Vec::new();
        for alt in text.split(',') {
            let alt = alt.trim();
            if alt.is_empty() {
                return Err(bad("empty alternative"));
            }
            if alt.contains(char::is_whitespace) {
                return Err(bad("combinators are not supported; chain queries instead"));
            }
            let mut parts = alt.split('.');
            let head = parts.next().unwrap_or("");
            let tag = match head {
                "" | "*" => None,
                t if t.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') => Some(t.to_ascii_lowercase()),
                _ => return Err(bad("tag names are alphanumeric")),
            };
            let mut classes = Vec::new();
            for c in parts {
                if c.is_empty() {
                    return Err(bad("empty class name"));
                }
                classes.push(s!(c));
            }
            if tag.is_none() && classes.is_empty() && head != "*" {
                return Err(bad("nothing to match"));
            }
            terms.push(Term { tag, classes });
        }
        Ok(Self { terms })
    }

    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        self.terms.iter().any(|t| t.matches(doc, id))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, t) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match &t.tag {
                Some(tag) => f.write_str(tag)?,
                None if t.classes.is_empty() => f.write_str("*")?,
                None => {}
            }
            for c in &t.classes {
                write!(f, ".{c}")?;
            }
        }
        Ok(())
    }
}

/// Query the whole document.
pub fn select<'d>(doc: &'d Document, query: &Query) -> NodeSet<'d> {
    let ids = doc.ids().filter(|&id| query.matches(doc, id)).collect();
    NodeSet::from_ordered(doc, ids)
}

/// Apply a chain of queries, each nested inside the previous result.
pub fn select_chain<'d>(doc: &'d Document, chain: &[Query]) -> NodeSet<'d> {
    let mut iter = chain.iter();
    let Some(first) = iter.next() else { return NodeSet::empty(doc) };
    iter.fold(select(doc, first), |set, q| set.select(q))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::parse;

    const PAGE: &str = r#"
        <div class="wrap">
          <table id="t1"><tr><td class="n">1</td><td>2</td></tr></table>
          <span class="short-desc"><strong>Jan. 21 </strong>one
            <span class="short-truth"><a href="/a">(why)</a></span></span>
          <table id="t2"><tr><td class="n big">3</td></tr></table>
        </div>"#;

    fn attr_ids(set: &NodeSet, attr: &str) -> Vec<String> {
        set.iter().map(|n| s!(n.node().attr(attr).unwrap_or("-"))).collect()
    }

    #[test]
    fn tag_query_in_document_order() {
        let doc = parse(PAGE).unwrap();
        let tables = select(&doc, &Query::tag("table"));
        assert_eq!(attr_ids(&tables, "id"), ["t1", "t2"]);
    }

    #[test]
    fn repeated_queries_are_identical() {
        let doc = parse(PAGE).unwrap();
        let q = Query::tag("td");
        assert_eq!(select(&doc, &q).ids(), select(&doc, &q).ids());
    }

    #[test]
    fn class_query_and_composition() {
        let doc = parse(PAGE).unwrap();
        assert_eq!(select(&doc, &Query::class("n")).len(), 2);
        assert_eq!(select(&doc, &Query::tag("td").and_class("big")).len(), 1);
        assert_eq!(select(&doc, &Query::class("short")).len(), 0);
    }

    #[test]
    fn nested_selection_dedups_overlapping_roots() {
        let doc = parse(PAGE).unwrap();
        // the outer span contains the inner one; the <a> must appear once
        let spans = select(&doc, &Query::tag("span"));
        assert_eq!(spans.len(), 2);
        let links = spans.select(&Query::tag("a"));
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn parse_compact_queries() {
        let q = Query::parse("strong, span.short-truth").unwrap();
        let doc = parse(PAGE).unwrap();
        let hits = select(&doc, &q);
        let tags: Vec<&str> = hits.iter().filter_map(|n| n.node().tag()).collect();
        assert_eq!(tags, ["strong", "span"]);
        assert_eq!(q.to_string(), "strong, span.short-truth");

        assert!(Query::parse("div p").is_err());
        assert!(Query::parse("td.").is_err());
        assert!(Query::parse("").is_err());
        assert_eq!(Query::parse("*").unwrap(), Query::any());
    }

    #[test]
    fn chain_selects_within_previous() {
        let doc = parse(PAGE).unwrap();
        let chain = [Query::parse("span.short-desc").unwrap(), Query::parse("strong, a").unwrap()];
        let set = select_chain(&doc, &chain);
        let tags: Vec<&str> = set.iter().filter_map(|n| n.node().tag()).collect();
        assert_eq!(tags, ["strong", "a"]);
    }
}

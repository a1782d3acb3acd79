//! Owned, immutable markup tree.
//!
//! Documents are read once, as XML when well-formed and with `scraper`
//! (html5ever) otherwise, and copied into an arena of plain nodes: lowercase
//! tag, lowercase attribute names, and an ordered list of element/text
//! children. Heuristics only ever see [`MarkupElement`] views into this
//! arena, never parser node types.
//!
//! Nothing here recurses per nesting level, so arbitrarily deep markup is
//! safe on small worker stacks.

use scraper::{Html, Node};
use tracing::trace;

use crate::xhtml;

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Index of an element inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum Child {
    Element(NodeId),
    Text(String),
}

#[derive(Debug, Clone)]
struct ElementData {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Child>,
}

/// A parsed markup document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<ElementData>,
    root: NodeId,
    body: Option<NodeId>,
}

impl Document {
    /// Parse markup text. Never fails.
    ///
    /// Well-formed XHTML is read as XML, so self-closing elements such as
    /// `<a id="p5"/>` stay empty. Anything else is repaired by the HTML
    /// parser, and what it cannot make sense of is dropped.
    ///
    /// Documents that never open a `<body>` element (fragments, stray XML)
    /// report no body, even though the HTML parser synthesizes one.
    pub fn parse(markup: &str) -> Self {
        match xhtml::parse(markup) {
            Ok(doc) => doc,
            Err(err) => {
                trace!(error = %err, "not well-formed XML, parsing as HTML");
                Self::parse_html(markup)
            }
        }
    }

    fn parse_html(markup: &str) -> Self {
        let html = Html::parse_document(markup);
        let root = html.root_element();

        let mut builder = TreeBuilder::default();
        builder.open(root.value().name(), html_attrs(root.value()));

        let mut stack = vec![root.children()];
        while let Some(children) = stack.last_mut() {
            let Some(child) = children.next() else {
                stack.pop();
                builder.close();
                continue;
            };
            match child.value() {
                Node::Text(text) => builder.text(text),
                Node::Element(el) => {
                    builder.open(el.name(), html_attrs(el));
                    stack.push(child.children());
                }
                _ => {}
            }
        }

        let mut doc = builder.finish();
        if !xhtml::declares_body(markup) {
            doc.body = None;
        }
        doc
    }

    /// The `<html>` root element.
    pub fn root(&self) -> MarkupElement<'_> {
        self.element(self.root)
    }

    /// The `<body>` element, if the source declared one.
    pub fn body(&self) -> Option<MarkupElement<'_>> {
        self.body.map(|id| self.element(id))
    }

    /// View of the element with the given id.
    pub fn element(&self, id: NodeId) -> MarkupElement<'_> {
        MarkupElement { doc: self, id }
    }

    /// Remove the listed element children from their parents.
    ///
    /// Removed subtrees stay in the arena but become unreachable.
    pub(crate) fn detach(&mut self, removals: &[(NodeId, NodeId)]) {
        for &(parent, child) in removals {
            self.nodes[parent.0]
                .children
                .retain(|c| !matches!(c, Child::Element(id) if *id == child));
        }
    }
}

fn html_attrs(el: &scraper::node::Element) -> Vec<(String, String)> {
    el.attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Event-driven arena construction shared by both parsers.
#[derive(Debug, Default)]
pub(crate) struct TreeBuilder {
    nodes: Vec<ElementData>,
    open: Vec<NodeId>,
    body: Option<NodeId>,
}

impl TreeBuilder {
    /// Start an element as the last child of the innermost open element.
    pub(crate) fn open(&mut self, tag: &str, attrs: Vec<(String, String)>) {
        let id = NodeId(self.nodes.len());
        let tag = tag.to_ascii_lowercase();
        if tag == "body" && self.body.is_none() {
            self.body = Some(id);
        }

        self.nodes.push(ElementData {
            tag,
            attrs: attrs
                .into_iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value))
                .collect(),
            children: Vec::new(),
        });
        if let Some(&parent) = self.open.last() {
            self.nodes[parent.0].children.push(Child::Element(id));
        }
        self.open.push(id);
    }

    pub(crate) fn close(&mut self) {
        self.open.pop();
    }

    /// Append text to the innermost open element, merging adjacent runs.
    /// Text outside the root element is dropped.
    pub(crate) fn text(&mut self, text: &str) {
        let Some(&parent) = self.open.last() else {
            return;
        };
        let children = &mut self.nodes[parent.0].children;
        match children.last_mut() {
            Some(Child::Text(last)) => last.push_str(text),
            _ => children.push(Child::Text(text.to_owned())),
        }
    }

    /// Number of currently open elements.
    pub(crate) fn depth(&self) -> usize {
        self.open.len()
    }

    pub(crate) fn has_root(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// The first element opened becomes the root; an empty `html` root
    /// stands in when nothing was.
    pub(crate) fn finish(mut self) -> Document {
        if self.nodes.is_empty() {
            self.nodes.push(ElementData {
                tag: "html".to_string(),
                attrs: Vec::new(),
                children: Vec::new(),
            });
        }
        Document {
            nodes: self.nodes,
            root: NodeId(0),
            body: self.body,
        }
    }
}

// ---------------------------------------------------------------------------
// Element view
// ---------------------------------------------------------------------------

/// Read-only view of one element in a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct MarkupElement<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl PartialEq for MarkupElement<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for MarkupElement<'_> {}

impl<'a> MarkupElement<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    fn data(&self) -> &'a ElementData {
        &self.doc.nodes[self.id.0]
    }

    /// Lowercase tag name.
    pub fn tag(&self) -> &'a str {
        &self.data().tag
    }

    /// Attribute value by (lowercase) name.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.data()
            .attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Element children, in document order.
    pub fn children(self) -> impl Iterator<Item = MarkupElement<'a>> + 'a {
        let doc = self.doc;
        self.data().children.iter().filter_map(move |child| match child {
            Child::Element(id) => Some(MarkupElement { doc, id: *id }),
            Child::Text(_) => None,
        })
    }

    /// Number of element children.
    pub fn child_count(&self) -> usize {
        self.children().count()
    }

    /// All descendant elements in pre-order, excluding `self`.
    pub fn descendants(&self) -> Descendants<'a> {
        let mut stack: Vec<NodeId> = self.children().map(|c| c.id).collect();
        stack.reverse();
        Descendants {
            doc: self.doc,
            stack,
        }
    }

    /// `self` followed by all its descendants in pre-order.
    pub fn descendants_and_self(&self) -> Descendants<'a> {
        Descendants {
            doc: self.doc,
            stack: vec![self.id],
        }
    }

    /// Full text content, exactly as it appears in the source.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out, false);
        out
    }

    /// Text content with surrounding whitespace trimmed.
    pub fn display_text(&self) -> String {
        self.text().trim().to_string()
    }

    /// Every text run trimmed, then concatenated without separators.
    ///
    /// Used for length measurements so indentation and line breaks between
    /// tags never count as visible text.
    pub fn stripped_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out, true);
        out
    }

    fn collect_text(&self, out: &mut String, strip: bool) {
        let nodes = &self.doc.nodes;
        let mut stack = vec![self.data().children.iter()];
        while let Some(children) = stack.last_mut() {
            match children.next() {
                Some(Child::Text(text)) if strip => out.push_str(text.trim()),
                Some(Child::Text(text)) => out.push_str(text),
                Some(Child::Element(id)) => stack.push(nodes[id.0].children.iter()),
                None => {
                    stack.pop();
                }
            }
        }
    }

    /// Serialize the element and its subtree back to markup.
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        let nodes = &self.doc.nodes;
        let data = self.data();
        if !write_start_tag(out, data) {
            return;
        }

        // Open elements: tag to close, children still to write.
        let mut stack = vec![(data.tag.as_str(), data.children.iter())];
        while let Some((tag, children)) = stack.last_mut() {
            match children.next() {
                Some(Child::Text(text)) => escape_into(out, text, false),
                Some(Child::Element(id)) => {
                    let child = &nodes[id.0];
                    if write_start_tag(out, child) {
                        stack.push((child.tag.as_str(), child.children.iter()));
                    }
                }
                None => {
                    out.push_str("</");
                    out.push_str(tag);
                    out.push('>');
                    stack.pop();
                }
            }
        }
    }
}

/// Write `<tag attrs>`; returns whether the element takes content and an end tag.
fn write_start_tag(out: &mut String, data: &ElementData) -> bool {
    out.push('<');
    out.push_str(&data.tag);
    for (name, value) in &data.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_into(out, value, true);
        out.push('"');
    }
    out.push('>');
    !VOID_ELEMENTS.contains(&data.tag.as_str())
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            other => out.push(other),
        }
    }
}

/// Pre-order iterator over elements.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = MarkupElement<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let el = MarkupElement { doc: self.doc, id };
        let start = self.stack.len();
        self.stack.extend(el.children().map(|c| c.id));
        self.stack[start..].reverse();
        Some(el)
    }
}

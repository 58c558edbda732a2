//! Owned, mutable XML element tree used for SVG surgery.
//!
//! `roxmltree` gives a fast read-only view; the transforms need to edit attributes and swap
//! subtrees, so the document is copied into [`Element`] values. Text is stored the ElementTree
//! way: `text` is the content before the first child element and each child's `tail` is the
//! content between it and the next sibling element. Comments and processing instructions are
//! kept as children too, so a parse/serialize round trip does not lose them.

use crate::Result;
use indexmap::IndexMap;
use std::fmt::Write as _;
use std::ops::Range;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A namespace-qualified name: `(namespace URI or none, local name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub namespace: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(namespace: Option<&str>, local: &str) -> Self {
        Self {
            namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
            local: local.to_string(),
        }
    }

    /// A name without a namespace (plain attribute names like `width`).
    pub fn local(local: &str) -> Self {
        Self::new(None, local)
    }

    pub fn svg(local: &str) -> Self {
        Self::new(Some(SVG_NAMESPACE), local)
    }

    pub fn is(&self, namespace: Option<&str>, local: &str) -> bool {
        self.namespace.as_deref() == namespace && self.local == local
    }
}

/// An `xmlns` / `xmlns:prefix` declaration carried by an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    pub prefix: Option<String>,
    pub uri: String,
}

/// What a tree node is. Comments and processing instructions keep their content in `text`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeKind {
    #[default]
    Element,
    Comment,
    ProcessingInstruction {
        target: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: NodeKind,
    pub name: QName,
    /// Namespace declarations made on this element (not inherited ones).
    pub namespaces: Vec<NamespaceDecl>,
    pub attributes: IndexMap<QName, String>,
    pub text: Option<String>,
    pub tail: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: QName) -> Self {
        Self {
            kind: NodeKind::Element,
            name,
            namespaces: Vec::new(),
            attributes: IndexMap::new(),
            text: None,
            tail: None,
            children: Vec::new(),
        }
    }

    pub fn comment(content: &str) -> Self {
        let mut node = Self::new(QName::local(""));
        node.kind = NodeKind::Comment;
        node.text = Some(content.to_string());
        node
    }

    pub fn processing_instruction(target: &str, value: Option<&str>) -> Self {
        let mut node = Self::new(QName::local(""));
        node.kind = NodeKind::ProcessingInstruction {
            target: target.to_string(),
        };
        node.text = value.map(str::to_string);
        node
    }

    /// False for comment and processing-instruction nodes.
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    pub fn local_name(&self) -> &str {
        &self.name.local
    }

    /// True for `<svg>` in the SVG namespace or in no namespace at all.
    pub fn is_svg_root(&self) -> bool {
        self.name.is(Some(SVG_NAMESPACE), "svg") || self.name.is(None, "svg")
    }

    /// Value of an attribute that has no namespace.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(&QName::local(name))
            .map(String::as_str)
    }

    /// Sets an un-namespaced attribute. Existing attributes keep their position.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(QName::local(name), value.into());
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(&QName::local(name))
    }

    pub fn any_descendant(&self, pred: &impl Fn(&Element) -> bool) -> bool {
        self.children
            .iter()
            .filter(|c| c.is_element())
            .any(|c| pred(c) || c.any_descendant(pred))
    }

    /// Serializes the element and its subtree.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        let mut scope = NamespaceScope::default();
        write_element(&mut out, self, &mut scope);
        out
    }

    /// Serializes only the opening tag: name, namespace declarations and attributes, with no
    /// children and no self-closing slash.
    pub fn opening_tag(&self) -> String {
        let mut out = String::new();
        let mut scope = NamespaceScope::default();
        write_start_tag(&mut out, self, &mut scope);
        scope.leave();
        out.push('>');
        out
    }
}

/// A parsed document element together with where its start tag sits in the source text.
#[derive(Debug, Clone)]
pub struct Document {
    pub root: Element,
    /// Byte range of the root start tag, `<` through `>` (or `/>`).
    pub root_start_tag: Range<usize>,
}

/// Parses XML text into an owned element tree rooted at the document element.
pub fn parse(text: &str) -> Result<Element> {
    parse_document(text).map(|doc| doc.root)
}

pub fn parse_document(text: &str) -> Result<Document> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(text, options)?;
    let root = doc.root_element();
    Ok(Document {
        root_start_tag: start_tag_span(text, root.range().start),
        root: build_element(root),
    })
}

/// Span of the start tag beginning at `start`. A `>` inside a quoted attribute value does not
/// end the tag.
fn start_tag_span(text: &str, start: usize) -> Range<usize> {
    let mut quote = None;
    for (i, b) in text.bytes().enumerate().skip(start) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return start..i + 1,
            None => {}
        }
    }
    start..text.len()
}

fn build_element(node: roxmltree::Node<'_, '_>) -> Element {
    let tag = node.tag_name();
    let mut el = Element::new(QName::new(tag.namespace(), tag.name()));
    el.namespaces = declared_namespaces(node);
    for a in node.attributes() {
        el.attributes
            .insert(QName::new(a.namespace(), a.name()), a.value().to_string());
    }

    for c in node.children() {
        if c.is_element() {
            el.children.push(build_element(c));
        } else if c.is_comment() {
            el.children.push(Element::comment(c.text().unwrap_or_default()));
        } else if let Some(pi) = c.pi() {
            el.children
                .push(Element::processing_instruction(pi.target, pi.value));
        } else if c.is_text() {
            let Some(t) = c.text() else {
                continue;
            };
            let slot = match el.children.last_mut() {
                Some(prev) => &mut prev.tail,
                None => &mut el.text,
            };
            slot.get_or_insert_with(String::new).push_str(t);
        }
    }
    el
}

fn declared_namespaces(node: roxmltree::Node<'_, '_>) -> Vec<NamespaceDecl> {
    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();

    node.namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .map(|ns| NamespaceDecl {
            prefix: ns.name().map(str::to_string),
            uri: ns.uri().to_string(),
        })
        .collect()
}

/// Namespace declarations in scope while writing, innermost frame last.
#[derive(Debug, Default)]
struct NamespaceScope {
    frames: Vec<Vec<NamespaceDecl>>,
}

impl NamespaceScope {
    fn enter(&mut self, declared: &[NamespaceDecl]) {
        self.frames.push(declared.to_vec());
    }

    fn leave(&mut self) {
        self.frames.pop();
    }

    /// Adds a declaration to the innermost frame (the element being written).
    fn declare(&mut self, prefix: Option<String>, uri: &str) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push(NamespaceDecl {
                prefix,
                uri: uri.to_string(),
            });
        }
    }

    fn innermost(&self) -> &[NamespaceDecl] {
        self.frames.last().map(Vec::as_slice).unwrap_or_default()
    }

    /// Resolves the prefix bound to `uri`, skipping prefixes shadowed by an inner declaration.
    /// `Some(None)` means the default namespace.
    fn prefix_for(&self, uri: &str, allow_default: bool) -> Option<Option<&str>> {
        let mut shadowed: Vec<Option<&str>> = Vec::new();
        for decl in self.frames.iter().rev().flat_map(|f| f.iter().rev()) {
            let prefix = decl.prefix.as_deref();
            if shadowed.contains(&prefix) {
                continue;
            }
            if decl.uri == uri && (allow_default || prefix.is_some()) {
                return Some(prefix);
            }
            shadowed.push(prefix);
        }
        None
    }

    fn default_namespace(&self) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .flat_map(|f| f.iter().rev())
            .find(|d| d.prefix.is_none())
            .map(|d| d.uri.as_str())
            .filter(|uri| !uri.is_empty())
    }
}

/// Writes `<name xmlns... attrs...` (without the closing `>`) and returns the qualified name.
/// The element's namespace frame stays on `scope` until the caller leaves it.
fn write_start_tag(out: &mut String, el: &Element, scope: &mut NamespaceScope) -> String {
    scope.enter(&el.namespaces);

    let element_prefix = match el.name.namespace.as_deref() {
        None => {
            if scope.default_namespace().is_some() {
                scope.declare(None, "");
            }
            None
        }
        Some(uri) => match scope.prefix_for(uri, true) {
            Some(prefix) => prefix.map(str::to_string),
            None => {
                scope.declare(None, uri);
                None
            }
        },
    };
    let qualified_name = match element_prefix {
        Some(prefix) => format!("{prefix}:{}", el.name.local),
        None => el.name.local.clone(),
    };

    let mut attrs: Vec<(String, &str)> = Vec::with_capacity(el.attributes.len());
    for (name, value) in &el.attributes {
        let qualified = match name.namespace.as_deref() {
            None => name.local.clone(),
            Some(XML_NAMESPACE) => format!("xml:{}", name.local),
            Some(uri) => {
                let prefix = match scope.prefix_for(uri, false).flatten() {
                    Some(prefix) => prefix.to_string(),
                    None => {
                        let prefix = format!("ns{}", scope.innermost().len());
                        scope.declare(Some(prefix.clone()), uri);
                        prefix
                    }
                };
                format!("{prefix}:{}", name.local)
            }
        };
        attrs.push((qualified, value.as_str()));
    }

    out.push('<');
    out.push_str(&qualified_name);
    for decl in scope.innermost() {
        match decl.prefix.as_deref() {
            Some(prefix) => {
                let _ = write!(out, r#" xmlns:{prefix}=""#);
            }
            None => out.push_str(r#" xmlns=""#),
        }
        escape_attr_into(out, &decl.uri);
        out.push('"');
    }
    for (name, value) in attrs {
        let _ = write!(out, r#" {name}=""#);
        escape_attr_into(out, value);
        out.push('"');
    }
    qualified_name
}

fn write_element(out: &mut String, el: &Element, scope: &mut NamespaceScope) {
    match &el.kind {
        NodeKind::Element => {}
        NodeKind::Comment => {
            let _ = write!(out, "<!--{}-->", el.text.as_deref().unwrap_or_default());
            write_tail(out, el);
            return;
        }
        NodeKind::ProcessingInstruction { target } => {
            match el.text.as_deref().filter(|v| !v.is_empty()) {
                Some(value) => {
                    let _ = write!(out, "<?{target} {value}?>");
                }
                None => {
                    let _ = write!(out, "<?{target}?>");
                }
            }
            write_tail(out, el);
            return;
        }
    }

    let name = write_start_tag(out, el, scope);
    let text = el.text.as_deref().filter(|t| !t.is_empty());
    if text.is_none() && el.children.is_empty() {
        out.push_str("/>");
    } else {
        out.push('>');
        if let Some(text) = text {
            escape_text_into(out, text);
        }
        for child in &el.children {
            write_element(out, child, scope);
        }
        let _ = write!(out, "</{name}>");
    }
    scope.leave();
    write_tail(out, el);
}

fn write_tail(out: &mut String, el: &Element) {
    if let Some(tail) = el.tail.as_deref() {
        escape_text_into(out, tail);
    }
}

pub(crate) fn escape_text_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

pub(crate) fn escape_attr_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests;

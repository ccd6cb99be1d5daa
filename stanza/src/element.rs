// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A small namespace-aware XML tree, targeting the subset of XML useful
//! for XMPP: elements with a resolved namespace, string attributes, and
//! ordered child nodes.  Prefixes are resolved at parse time and never
//! stored; serialisation re-declares namespaces with default `xmlns`
//! attributes wherever a child's namespace differs from its parent's.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::str::FromStr;

use crate::error::Error;
use crate::ns;

/// A child node of an [`Element`]: either a nested element or a text chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A nested element.
    Element(Element),
    /// Some text.
    Text(String),
}

impl From<Element> for Node {
    fn from(elem: Element) -> Node {
        Node::Element(elem)
    }
}

impl From<String> for Node {
    fn from(text: String) -> Node {
        Node::Text(text)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Node {
        Node::Text(text.to_owned())
    }
}

/// A value which can be stored into an attribute; `None` removes the
/// attribute, which lets optional fields serialise themselves.
pub trait IntoAttributeValue {
    /// Turns this into an attribute string, or `None` if it shouldn't be
    /// added.
    fn into_attribute_value(self) -> Option<String>;
}

macro_rules! impl_into_attribute_value {
    ($t:ty) => {
        impl IntoAttributeValue for $t {
            fn into_attribute_value(self) -> Option<String> {
                Some(self.to_string())
            }
        }
    };
}

impl_into_attribute_value!(i8);
impl_into_attribute_value!(u8);
impl_into_attribute_value!(i16);
impl_into_attribute_value!(u16);
impl_into_attribute_value!(i32);
impl_into_attribute_value!(u32);
impl_into_attribute_value!(i64);
impl_into_attribute_value!(u64);

impl IntoAttributeValue for String {
    fn into_attribute_value(self) -> Option<String> {
        Some(self)
    }
}

impl IntoAttributeValue for &String {
    fn into_attribute_value(self) -> Option<String> {
        Some(self.clone())
    }
}

impl IntoAttributeValue for &str {
    fn into_attribute_value(self) -> Option<String> {
        Some(self.to_owned())
    }
}

impl<T: IntoAttributeValue> IntoAttributeValue for Option<T> {
    fn into_attribute_value(self) -> Option<String> {
        self.and_then(IntoAttributeValue::into_attribute_value)
    }
}

impl IntoAttributeValue for jid::Jid {
    fn into_attribute_value(self) -> Option<String> {
        Some(self.to_string())
    }
}

impl IntoAttributeValue for jid::BareJid {
    fn into_attribute_value(self) -> Option<String> {
        Some(self.to_string())
    }
}

impl IntoAttributeValue for jid::FullJid {
    fn into_attribute_value(self) -> Option<String> {
        Some(self.to_string())
    }
}

/// An XML element with a resolved namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    namespace: String,
    attributes: BTreeMap<String, String>,
    nodes: Vec<Node>,
}

impl Element {
    /// Starts building an element with the given name and namespace.
    pub fn builder<N: Into<String>, S: Into<String>>(name: N, namespace: S) -> ElementBuilder {
        ElementBuilder {
            root: Element {
                name: name.into(),
                namespace: namespace.into(),
                attributes: BTreeMap::new(),
                nodes: Vec::new(),
            },
        }
    }

    /// Creates an element with no attributes nor children.
    pub fn bare<N: Into<String>, S: Into<String>>(name: N, namespace: S) -> Element {
        Element {
            name: name.into(),
            namespace: namespace.into(),
            attributes: BTreeMap::new(),
            nodes: Vec::new(),
        }
    }

    /// Returns the local name of this element.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the namespace of this element.
    pub fn ns(&self) -> &str {
        &self.namespace
    }

    /// Checks name and namespace at once.
    pub fn is<'a, N: AsRef<str>, S: AsRef<str>>(&'a self, name: N, namespace: S) -> bool {
        self.name == name.as_ref() && self.namespace == namespace.as_ref()
    }

    /// Reads an attribute by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Sets (or, with a `None` value, removes) an attribute.
    pub fn set_attr<N: Into<String>, V: IntoAttributeValue>(&mut self, name: N, value: V) {
        let name = name.into();
        match value.into_attribute_value() {
            Some(value) => {
                self.attributes.insert(name, value);
            }
            None => {
                self.attributes.remove(&name);
            }
        }
    }

    /// Iterates over the attributes, sorted by name.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterates over all child nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Iterates over the child elements, skipping text.
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Element(elem) => Some(elem),
            Node::Text(_) => None,
        })
    }

    /// Returns the first child matching name and namespace.
    pub fn get_child<N: AsRef<str>, S: AsRef<str>>(
        &self,
        name: N,
        namespace: S,
    ) -> Option<&Element> {
        self.children()
            .find(|child| child.is(name.as_ref(), namespace.as_ref()))
    }

    /// Whether a child with this name and namespace exists.
    pub fn has_child<N: AsRef<str>, S: AsRef<str>>(&self, name: N, namespace: S) -> bool {
        self.get_child(name, namespace).is_some()
    }

    /// Detaches and returns the first child matching name and namespace.
    pub fn take_child<N: AsRef<str>, S: AsRef<str>>(
        &mut self,
        name: N,
        namespace: S,
    ) -> Option<Element> {
        let position = self.nodes.iter().position(|node| match node {
            Node::Element(elem) => elem.is(name.as_ref(), namespace.as_ref()),
            Node::Text(_) => false,
        })?;
        match self.nodes.remove(position) {
            Node::Element(elem) => Some(elem),
            Node::Text(_) => unreachable!(),
        }
    }

    /// Appends a child element, returning a reference to it.
    pub fn append_child(&mut self, child: Element) -> &mut Element {
        self.nodes.push(Node::Element(child));
        match self.nodes.last_mut() {
            Some(Node::Element(elem)) => elem,
            _ => unreachable!(),
        }
    }

    /// Appends a text node.
    pub fn append_text_node<S: Into<String>>(&mut self, text: S) {
        self.nodes.push(Node::Text(text.into()));
    }

    /// Appends any node.
    pub fn append_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Concatenates the direct text children of this element.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            if let Node::Text(text) = node {
                out.push_str(text);
            }
        }
        out
    }

    /// Serialises the element into a writer.
    pub fn write_to<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut out = String::new();
        self.write_xml(&mut out, None);
        writer.write_all(out.as_bytes())
    }

    /// Serialises the element into a string, omitting the `xmlns`
    /// declaration when the namespace matches `parent_ns` (used when the
    /// element is sent as a direct child of an open stream).
    pub fn serialize(&self, parent_ns: Option<&str>) -> String {
        let mut out = String::new();
        self.write_xml(&mut out, parent_ns);
        out
    }

    fn write_xml(&self, out: &mut String, parent_ns: Option<&str>) {
        out.push('<');
        out.push_str(&self.name);
        if parent_ns != Some(self.namespace.as_str()) && !self.namespace.is_empty() {
            out.push_str(" xmlns='");
            escape_into(&self.namespace, out, true);
            out.push('\'');
        }
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("='");
            escape_into(value, out, true);
            out.push('\'');
        }
        if self.nodes.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for node in &self.nodes {
            match node {
                Node::Element(child) => child.write_xml(out, Some(&self.namespace)),
                Node::Text(text) => escape_into(text, out, false),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }

    /// Produces the deterministic canonical form used for entity-capability
    /// hashing: the namespace, name, attributes sorted by name and direct
    /// text, each token `<`-terminated, followed by the child elements
    /// sorted by (namespace, name).
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.canonical_into(&mut out);
        out
    }

    fn canonical_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.namespace.as_bytes());
        out.push(b'<');
        out.extend_from_slice(self.name.as_bytes());
        out.push(b'<');
        for (name, value) in &self.attributes {
            out.extend_from_slice(name.as_bytes());
            out.push(b'=');
            out.extend_from_slice(value.as_bytes());
            out.push(b'<');
        }
        let text = self.text();
        if !text.is_empty() {
            out.extend_from_slice(text.as_bytes());
            out.push(b'<');
        }
        let mut children: Vec<&Element> = self.children().collect();
        children.sort_by(|a, b| (a.ns(), a.name()).cmp(&(b.ns(), b.name())));
        for child in children {
            child.canonical_into(out);
        }
    }
}

fn escape_into(raw: &str, out: &mut String, attribute: bool) {
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' if attribute => out.push_str("&apos;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

/// Builds an [`Element`] from resolved rxml start-event parts.
pub(crate) fn element_from_parts(
    namespace: rxml::Namespace,
    name: rxml::NcName,
    attrs: rxml::AttrMap,
) -> Element {
    let mut elem = Element::bare(name.to_string(), namespace.to_string());
    for ((attr_ns, attr_name), value) in attrs.into_iter() {
        let key = if attr_ns.is_none() {
            attr_name.to_string()
        } else if attr_ns == ns::XML {
            format!("xml:{}", attr_name)
        } else {
            // Foreign-namespaced attributes never carry meaning in the
            // stanzas we handle; resolving a prefix for them would only
            // obscure that.
            log::debug!("dropping namespaced attribute {{{}}}{}", attr_ns, attr_name);
            continue;
        };
        elem.attributes.insert(key, value.to_string());
    }
    elem
}

impl fmt::Display for Element {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let mut out = String::new();
        self.write_xml(&mut out, None);
        fmt.write_str(&out)
    }
}

impl FromStr for Element {
    type Err = Error;

    fn from_str(s: &str) -> Result<Element, Error> {
        let mut reader = rxml::Reader::new(s.as_bytes());
        let mut stack: Vec<Element> = Vec::new();
        for event in &mut reader {
            let event = event.map_err(|e| Error::Xml(e.to_string()))?;
            match event {
                rxml::Event::XmlDeclaration(_, _) => (),
                rxml::Event::StartElement(_, (namespace, name), attrs) => {
                    stack.push(element_from_parts(namespace, name, attrs));
                }
                rxml::Event::Text(_, text) => match stack.last_mut() {
                    Some(elem) => elem.append_text_node(text.to_string()),
                    None => {
                        if !text.trim().is_empty() {
                            return Err(Error::ParseError("Text content before root element."));
                        }
                    }
                },
                rxml::Event::EndElement(_) => {
                    let elem = match stack.pop() {
                        Some(elem) => elem,
                        None => return Err(Error::ParseError("Unbalanced end of element.")),
                    };
                    match stack.last_mut() {
                        Some(parent) => {
                            parent.append_child(elem);
                        }
                        None => return Ok(elem),
                    }
                }
            }
        }
        Err(Error::ParseError("Document ended before the root element."))
    }
}

/// Builder returned by [`Element::builder`].
pub struct ElementBuilder {
    root: Element,
}

impl ElementBuilder {
    /// Adds an attribute.
    pub fn attr<N: Into<String>, V: IntoAttributeValue>(mut self, name: N, value: V) -> Self {
        self.root.set_attr(name, value);
        self
    }

    /// Appends a child node.
    pub fn append<T: Into<Node>>(mut self, node: T) -> Self {
        self.root.nodes.push(node.into());
        self
    }

    /// Appends all nodes from an iterator.
    pub fn append_all<T: Into<Node>, I: IntoIterator<Item = T>>(mut self, iter: I) -> Self {
        for node in iter {
            self.root.nodes.push(node.into());
        }
        self
    }

    /// Finishes the element.
    pub fn build(self) -> Element {
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let elem: Element = "<message xmlns='jabber:client' type='chat'><body>Hello</body></message>"
            .parse()
            .unwrap();
        assert_eq!(elem.name(), "message");
        assert_eq!(elem.ns(), "jabber:client");
        assert_eq!(elem.attr("type"), Some("chat"));
        assert_eq!(elem.attr("id"), None);
        let body = elem.get_child("body", "jabber:client").unwrap();
        assert_eq!(body.text(), "Hello");
    }

    #[test]
    fn test_parse_nested_namespaces() {
        let elem: Element =
            "<iq xmlns='jabber:client' type='get'><query xmlns='jabber:iq:roster'/></iq>"
                .parse()
                .unwrap();
        assert!(elem.get_child("query", "jabber:iq:roster").is_some());
        assert!(elem.get_child("query", "jabber:client").is_none());
    }

    #[test]
    fn test_roundtrip() {
        let elem: Element =
            "<presence xmlns='jabber:client'><show>dnd</show><status>busy &amp; away</status></presence>"
                .parse()
                .unwrap();
        let serialised = elem.to_string();
        let reparsed: Element = serialised.parse().unwrap();
        assert_eq!(elem, reparsed);
    }

    #[test]
    fn test_build_and_query() {
        let elem = Element::builder("query", "jabber:iq:version")
            .attr("node", Some("x"))
            .attr("skipped", None::<String>)
            .append(Element::builder("name", "jabber:iq:version").append("causerie").build())
            .build();
        assert_eq!(elem.attr("node"), Some("x"));
        assert_eq!(elem.attr("skipped"), None);
        assert_eq!(
            elem.get_child("name", "jabber:iq:version").unwrap().text(),
            "causerie"
        );
    }

    #[test]
    fn test_serialize_child_ns() {
        let mut elem = Element::bare("iq", "jabber:client");
        elem.append_child(Element::bare("ping", "urn:xmpp:ping"));
        let s = elem.serialize(Some("jabber:client"));
        assert_eq!(s, "<iq><ping xmlns='urn:xmpp:ping'/></iq>");
    }

    #[test]
    fn test_escaping() {
        let mut elem = Element::bare("body", "jabber:client");
        elem.append_text_node("a < b & c > d");
        let s = elem.serialize(Some("jabber:client"));
        assert_eq!(s, "<body>a &lt; b &amp; c &gt; d</body>");
        let reparsed: Element = elem.to_string().parse().unwrap();
        assert_eq!(reparsed.text(), "a < b & c > d");
    }

    #[test]
    fn test_take_child() {
        let mut elem: Element =
            "<message xmlns='jabber:client'><body>hi</body><active xmlns='http://jabber.org/protocol/chatstates'/></message>"
                .parse()
                .unwrap();
        let active = elem
            .take_child("active", "http://jabber.org/protocol/chatstates")
            .unwrap();
        assert_eq!(active.name(), "active");
        assert!(!elem.has_child("active", "http://jabber.org/protocol/chatstates"));
        assert!(elem.has_child("body", "jabber:client"));
    }

    #[test]
    fn test_xml_lang() {
        let elem: Element = "<status xmlns='jabber:client' xml:lang='en'>gone</status>"
            .parse()
            .unwrap();
        assert_eq!(elem.attr("xml:lang"), Some("en"));
    }

    #[test]
    fn test_canonical_ordering() {
        let a: Element = "<x xmlns='urn:a' b='2' a='1'><z xmlns='urn:b'/><y xmlns='urn:a'/></x>"
            .parse()
            .unwrap();
        let b: Element = "<x xmlns='urn:a' a='1' b='2'><y xmlns='urn:a'/><z xmlns='urn:b'/></x>"
            .parse()
            .unwrap();
        assert_eq!(a.canonical_bytes(), b.canonical_bytes());
    }

    #[test]
    fn test_invalid_xml() {
        assert!("<unclosed xmlns='urn:a'>".parse::<Element>().is_err());
        assert!("plain text".parse::<Element>().is_err());
    }
}

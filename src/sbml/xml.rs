//! Minimal XML element tree used by the SBML reader and writer.
//!
//! The tree is built from `quick-xml` events. Element and attribute names keep their
//! prefix (`fbc:geneProduct`) and lookups are done on the local part, so documents using
//! a different prefix for a known namespace are still understood.
//!
//! Whitespace-only text between the children of element-only content is dropped on
//! parsing and re-created by the indenting `quick-xml` writer. Mixed content is written
//! without any added whitespace. Elements parsed as verbatim (see
//! [`parse_fragment_keeping`]) keep their content as raw markup and are written back
//! byte for byte, so `parse(serialize(tree)) == tree` holds for every parsed tree.

use std::io::{self, Write};

use quick_xml::{
    escape::unescape,
    events::{BytesCData, BytesEnd, BytesStart, BytesText, Event},
    Reader, Writer,
};

use crate::sbml::error::SBMLError;

/// A node of the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
    /// Serialized markup kept exactly as it was read.
    Raw(String),
}

/// An XML element with its attributes and children, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

/// Local part of a possibly prefixed name.
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child appender.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Builder-style text appender.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push_text(&text.into());
        self
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Sets or replaces an attribute by its exact name.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Attribute by exact (possibly prefixed) name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute by local name, whatever its prefix. Unprefixed attributes win.
    pub fn attr_local(&self, local: &str) -> Option<&str> {
        self.attr(local).or_else(|| {
            self.attributes
                .iter()
                .find(|(k, _)| local_name(k) == local)
                .map(|(_, v)| v.as_str())
        })
    }

    /// Non-empty attribute by local name.
    pub fn attr_non_empty(&self, local: &str) -> Option<&str> {
        self.attr_local(local).filter(|v| !v.trim().is_empty())
    }

    /// Child elements, skipping text and comments.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Child elements with the given local name.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.local_name() == local)
    }

    /// First child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.local_name() == local)
    }

    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.local_name() == local)
    }

    /// First descendant (depth first) with the given local name.
    pub fn descendant(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find_map(|e| {
            if e.local_name() == local {
                Some(e)
            } else {
                e.descendant(local)
            }
        })
    }

    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Appends text, merging with a preceding text node.
    pub fn push_text(&mut self, text: &str) {
        if let Some(XmlNode::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(XmlNode::Text(text.to_string()));
        }
    }

    /// Concatenated text of this element and all its descendants.
    pub fn text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
                XmlNode::Comment(_) | XmlNode::Raw(_) => {}
            }
        }
    }

    /// Whether the element holds non-whitespace text next to child elements.
    pub fn is_mixed(&self) -> bool {
        let has_elements = self.elements().next().is_some();
        has_elements
            && self.children.iter().any(|node| match node {
                XmlNode::Text(text) => !text.trim().is_empty(),
                XmlNode::CData(_) | XmlNode::Raw(_) => true,
                _ => false,
            })
    }

    /// Wraps already serialized content, written back exactly as given.
    ///
    /// # Errors
    /// Returns `SBMLError::MalformedXml` if the content is not a well-formed fragment.
    pub fn verbatim(name: impl Into<String>, content: &str) -> Result<Self, SBMLError> {
        parse_fragment(content)?;
        let mut element = XmlElement::new(name);
        if !content.is_empty() {
            element.children.push(XmlNode::Raw(content.to_string()));
        }
        Ok(element)
    }

    /// Serializes the element, indenting element-only content.
    pub fn to_xml_string(&self) -> String {
        serialize(|writer| write_element(writer, self, false))
    }

    /// Serializes the children of the element without the element itself.
    pub fn inner_xml(&self) -> String {
        serialize(|writer| {
            self.children
                .iter()
                .try_for_each(|node| write_node(writer, node, false))
        })
    }
}

/// Runs a write through an indenting `quick-xml` writer and returns the output.
fn serialize<F>(write: F) -> String
where
    F: FnOnce(&mut Writer<Vec<u8>>) -> io::Result<()>,
{
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    if let Err(err) = write(&mut writer) {
        log::error!("Failed to serialize XML: {err}");
    }
    String::from_utf8_lossy(&writer.into_inner()).into_owned()
}

fn write_node<W: Write>(
    writer: &mut Writer<W>,
    node: &XmlNode,
    in_element_list: bool,
) -> io::Result<()> {
    match node {
        XmlNode::Element(element) => write_element(writer, element, in_element_list),
        XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text))),
        XmlNode::CData(text) => writer.write_event(Event::CData(BytesCData::new(text.as_str()))),
        XmlNode::Comment(text) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
        }
        XmlNode::Raw(xml) => writer.write_event(Event::Text(BytesText::from_escaped(xml.as_str()))),
    }
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    element: &XmlElement,
    in_element_list: bool,
) -> io::Result<()> {
    if !element.is_mixed() {
        return write_tags(writer, element);
    }

    // indentation inside mixed content would change the text
    let mut inline = Writer::new(Vec::new());
    write_tags(&mut inline, element)?;
    let inline = String::from_utf8_lossy(&inline.into_inner()).into_owned();
    if in_element_list {
        writer.write_indent()?;
    }
    writer.write_event(Event::Text(BytesText::from_escaped(inline)))
}

fn write_tags<W: Write>(writer: &mut Writer<W>, element: &XmlElement) -> io::Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start));
    }

    writer.write_event(Event::Start(start))?;
    let element_list = !element.is_mixed() && element.elements().next().is_some();
    let mut after_inline = false;
    for child in &element.children {
        if after_inline && matches!(child, XmlNode::Element(_)) {
            writer.write_indent()?;
        }
        write_node(writer, child, element_list)?;
        after_inline = matches!(child, XmlNode::Element(e) if e.is_mixed());
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))
}

fn element_from_start(start: &BytesStart) -> Result<XmlElement, SBMLError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = XmlElement::new(name);

    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| SBMLError::MalformedXml(e.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let raw = String::from_utf8_lossy(&attribute.value);
        let value = unescape(&raw)
            .map_err(|e| SBMLError::MalformedXml(e.to_string()))?
            .into_owned();
        element.attributes.push((key, value));
    }

    Ok(element)
}

/// Resolves a general entity reference (`amp`, `#38`, `#x26`) to its text.
fn resolve_reference(name: &str) -> Option<String> {
    if let Some(code) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        return u32::from_str_radix(code, 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from);
    }
    if let Some(code) = name.strip_prefix('#') {
        return code.parse::<u32>().ok().and_then(char::from_u32).map(String::from);
    }

    let resolved = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        _ => return None,
    };
    Some(resolved.to_string())
}

fn attach(stack: &mut [XmlElement], node: XmlNode) -> Result<(), SBMLError> {
    let parent = stack
        .last_mut()
        .ok_or_else(|| SBMLError::MalformedXml("content outside of the root element".into()))?;

    match node {
        XmlNode::Text(text) => parent.push_text(&text),
        other => parent.children.push(other),
    }
    Ok(())
}

/// Parses a sequence of nodes, as found inside an element.
pub fn parse_fragment(xml: &str) -> Result<Vec<XmlNode>, SBMLError> {
    parse_fragment_keeping(xml, &[])
}

/// Parses a sequence of nodes, keeping the content of the elements whose local name is
/// listed in `verbatim` as a single [`XmlNode::Raw`] node, byte for byte.
pub fn parse_fragment_keeping(xml: &str, verbatim: &[&str]) -> Result<Vec<XmlNode>, SBMLError> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![XmlElement::new("#fragment")];

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let mut element = element_from_start(&start)?;
                if verbatim.contains(&element.local_name()) {
                    let content = reader.read_text(start.name())?;
                    if !content.is_empty() {
                        element.children.push(XmlNode::Raw(content.into_owned()));
                    }
                    attach(&mut stack, XmlNode::Element(element))?;
                } else {
                    stack.push(element);
                }
            }
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                attach(&mut stack, XmlNode::Element(element))?;
            }
            Event::End(_) => {
                let element = match stack.pop() {
                    Some(element) if !stack.is_empty() => element,
                    _ => return Err(SBMLError::MalformedXml("unbalanced closing tag".into())),
                };
                attach(&mut stack, XmlNode::Element(element))?;
            }
            Event::Text(text) => {
                let text = String::from_utf8_lossy(&text).into_owned();
                attach(&mut stack, XmlNode::Text(text))?;
            }
            Event::GeneralRef(reference) => {
                let name = String::from_utf8_lossy(&reference).into_owned();
                let text = resolve_reference(&name).ok_or_else(|| {
                    SBMLError::MalformedXml(format!("unknown entity reference &{name};"))
                })?;
                attach(&mut stack, XmlNode::Text(text))?;
            }
            Event::CData(data) => {
                let data = String::from_utf8_lossy(&data).into_owned();
                attach(&mut stack, XmlNode::CData(data))?;
            }
            Event::Comment(comment) => {
                let comment = String::from_utf8_lossy(&comment).into_owned();
                attach(&mut stack, XmlNode::Comment(comment))?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(SBMLError::MalformedXml(format!(
            "unclosed element <{}>",
            stack.last().map(|e| e.name.as_str()).unwrap_or_default()
        )));
    }

    let mut root = stack.pop().unwrap_or_default();
    strip_layout_whitespace(&mut root);
    Ok(root.children)
}

/// Parses a complete document and returns its root element.
pub fn parse_document(xml: &str) -> Result<XmlElement, SBMLError> {
    parse_document_keeping(xml, &[])
}

/// Like [`parse_document`], with the verbatim elements of [`parse_fragment_keeping`].
pub fn parse_document_keeping(xml: &str, verbatim: &[&str]) -> Result<XmlElement, SBMLError> {
    parse_fragment_keeping(xml, verbatim)?
        .into_iter()
        .find_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
        .ok_or_else(|| SBMLError::MalformedXml("document has no root element".into()))
}

/// Serializes a node list produced by [`parse_fragment`].
pub fn fragment_to_string(nodes: &[XmlNode]) -> String {
    serialize(|writer| nodes.iter().try_for_each(|node| write_node(writer, node, false)))
}

/// Drops the whitespace-only text between the children of element-only content.
///
/// Text inside mixed content, and the text of elements without child elements, is
/// significant and kept as is.
fn strip_layout_whitespace(element: &mut XmlElement) {
    let element_only = element.elements().next().is_some()
        && element.children.iter().all(|node| match node {
            XmlNode::Text(text) => text.trim().is_empty(),
            XmlNode::CData(_) | XmlNode::Raw(_) => false,
            _ => true,
        });

    if element_only {
        element
            .children
            .retain(|node| !matches!(node, XmlNode::Text(_)));
    }

    for child in element.elements_mut() {
        strip_layout_whitespace(child);
    }
}

// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Namespace-resolved XML tree built with quick-xml.
//!
//! RDF/XML interpretation needs random access to children and attributes, so
//! the event stream is folded into a small owned tree first.

use super::ParseError;
use crate::store::vocab;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

/// Deepest element nesting accepted before the document is rejected.
const MAX_DEPTH: usize = 512;

#[derive(Debug, Clone)]
pub struct XmlAttr {
    pub ns: String,
    pub local: String,
    /// The attribute name as written, e.g. `xml:lang`.
    pub qname: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct XmlElement {
    pub ns: String,
    pub local: String,
    pub qname: String,
    pub attrs: Vec<XmlAttr>,
    pub children: Vec<XmlNode>,
}

#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

impl XmlElement {
    /// Expanded name: namespace IRI + local name.
    pub fn iri(&self) -> String {
        format!("{}{}", self.ns, self.local)
    }

    pub fn is(&self, ns: &str, local: &str) -> bool {
        self.ns == ns && self.local == local
    }

    pub fn attr(&self, ns: &str, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.ns == ns && a.local == local)
            .map(|a| a.value.as_str())
    }

    /// Attribute lookup by the name as written (for `xml:` attributes).
    pub fn attr_qname(&self, qname: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.qname == qname)
            .map(|a| a.value.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Concatenated character data of direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Re-serialize the children as markup (used for XML literals).
    pub fn inner_xml(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            write_node(child, &mut out);
        }
        out
    }
}

fn write_node(node: &XmlNode, out: &mut String) {
    match node {
        XmlNode::Text(t) => out.push_str(&escape_text(t)),
        XmlNode::Element(e) => {
            out.push('<');
            out.push_str(&e.qname);
            for a in &e.attrs {
                out.push_str(&format!(" {}=\"{}\"", a.qname, escape_text(&a.value)));
            }
            if e.children.is_empty() {
                out.push_str("/>");
            } else {
                out.push('>');
                for child in &e.children {
                    write_node(child, out);
                }
                out.push_str(&format!("</{}>", e.qname));
            }
        }
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn resolved_ns(result: &ResolveResult) -> String {
    match result {
        ResolveResult::Bound(ns) => String::from_utf8_lossy(ns.as_ref()).into_owned(),
        _ => String::new(),
    }
}

fn build_element(
    reader: &NsReader<&[u8]>,
    ns: String,
    start: &BytesStart,
) -> Result<XmlElement, ParseError> {
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ParseError::Xml(e.to_string()))?;
        let qname = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if qname == "xmlns" || qname.starts_with("xmlns:") {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|e| ParseError::Xml(e.to_string()))?
            .into_owned();
        let (attr_ns, local) = if let Some(local) = qname.strip_prefix("xml:") {
            (vocab::XML.to_string(), local.to_string())
        } else {
            let (result, local) = reader.resolve_attribute(attr.key);
            (
                resolved_ns(&result),
                String::from_utf8_lossy(local.as_ref()).into_owned(),
            )
        };
        attrs.push(XmlAttr {
            ns: attr_ns,
            local,
            qname,
            value,
        });
    }

    Ok(XmlElement {
        ns,
        local: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        qname: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        attrs,
        children: Vec::new(),
    })
}

/// Parse a whole document into its root element.
pub fn parse_document(body: &str) -> Result<XmlElement, ParseError> {
    let mut reader = NsReader::from_str(body);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let (ns, event) = match reader.read_resolved_event() {
            Ok((result, event)) => (resolved_ns(&result), event),
            Err(e) => {
                return Err(ParseError::Xml(format!(
                    "at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
        };

        match event {
            Event::Start(start) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(ParseError::Xml("document nested too deeply".into()));
                }
                let element = build_element(&reader, ns, &start)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = build_element(&reader, ns, &start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ParseError::Xml("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| ParseError::Xml(e.to_string()))?
                    .into_owned();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::Text(text));
                }
            }
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    parent
                        .children
                        .push(XmlNode::Text(String::from_utf8_lossy(&data).into_owned()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ParseError::Xml("unexpected end of document".into()));
    }
    root.ok_or_else(|| ParseError::Xml("document has no root element".into()))
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(ParseError::Xml("more than one root element".into())),
    }
    Ok(())
}

/// Namespace IRI and local name of the root element, without building a tree.
pub fn root_element_name(body: &str) -> Result<(String, String), ParseError> {
    let mut reader = NsReader::from_str(body);
    loop {
        let (ns, event) = match reader.read_resolved_event() {
            Ok((result, event)) => (resolved_ns(&result), event),
            Err(e) => return Err(ParseError::Xml(e.to_string())),
        };
        match event {
            Event::Start(e) | Event::Empty(e) => {
                let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                return Ok((ns, local));
            }
            Event::Eof => return Err(ParseError::Xml("document has no root element".into())),
            _ => {}
        }
    }
}

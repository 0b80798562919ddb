//! Generic XML element tree.
//!
//! Atom payloads and GML geometries are read into this tree before they are
//! mapped onto wire resources. Namespace prefixes are canonicalized while
//! reading, so `m:type` means the OData metadata namespace regardless of the
//! prefix the document chose:
//!
//! | Namespace | Prefix |
//! |---|---|
//! | Atom | (none) |
//! | OData data (V3/V4) | `d` |
//! | OData metadata (V3/V4) | `m` |
//! | GML | `gml` |
//! | Atom Publishing | `app` |
//! | EDMX (V3/V4) | `edmx` |
//! | EDM (all versions) | `edm` |

use std::io::BufRead;

use odata_common::{ODataError, ODataResult, ServiceVersion};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
pub const GML_NS: &str = "http://www.opengis.net/gml";
pub const APP_NS: &str = "http://www.w3.org/2007/app";

const NAMESPACE_PREFIXES: &[(&str, &str)] = &[
    (ATOM_NS, ""),
    ("http://schemas.microsoft.com/ado/2007/08/dataservices", "d"),
    ("http://docs.oasis-open.org/odata/ns/data", "d"),
    ("http://schemas.microsoft.com/ado/2007/08/dataservices/metadata", "m"),
    ("http://docs.oasis-open.org/odata/ns/metadata", "m"),
    (GML_NS, "gml"),
    (APP_NS, "app"),
    ("http://schemas.microsoft.com/ado/2007/06/edmx", "edmx"),
    ("http://docs.oasis-open.org/odata/ns/edmx", "edmx"),
    ("http://schemas.microsoft.com/ado/2006/04/edm", "edm"),
    ("http://schemas.microsoft.com/ado/2007/05/edm", "edm"),
    ("http://schemas.microsoft.com/ado/2008/01/edm", "edm"),
    ("http://schemas.microsoft.com/ado/2008/09/edm", "edm"),
    ("http://schemas.microsoft.com/ado/2009/11/edm", "edm"),
    ("http://docs.oasis-open.org/odata/ns/edm", "edm"),
];

fn canonical_prefix(namespace: &str) -> Option<&'static str> {
    NAMESPACE_PREFIXES
        .iter()
        .find(|(ns, _)| *ns == namespace)
        .map(|(_, prefix)| *prefix)
}

pub(crate) fn xml_err<E: std::fmt::Display>(e: E) -> ODataError {
    ODataError::Xml(e.to_string())
}

/// An XML element with canonical names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(existing) => existing.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Name without prefix.
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Parse a complete document and return its root element.
    pub fn parse(bytes: &[u8]) -> ODataResult<Element> {
        let mut reader = Reader::from_reader(bytes);
        let mut builder = TreeBuilder::default();
        let mut buf = Vec::new();
        match next_subtree(&mut reader, &mut builder, &mut buf, usize::MAX, |_| false)? {
            Cut::Root(root) | Cut::Kept(root) => Ok(root),
            Cut::Eof => Err(ODataError::MalformedPayload(
                "XML document ended before its root element closed".to_string(),
            )),
        }
    }

    /// Serialize as a standalone document.
    pub fn to_xml_bytes(&self) -> ODataResult<Vec<u8>> {
        write_document(std::slice::from_ref(self))
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>) -> ODataResult<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (k, v) in &self.attributes {
            start.push_attribute((k.as_str(), v.as_str()));
        }

        if self.children.is_empty() && self.text.is_empty() {
            return writer.write_event(Event::Empty(start)).map_err(xml_err);
        }

        writer.write_event(Event::Start(start)).map_err(xml_err)?;
        if !self.text.is_empty() {
            writer
                .write_event(Event::Text(BytesText::new(&self.text)))
                .map_err(xml_err)?;
        }
        for child in &self.children {
            child.write_to(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(xml_err)
    }
}

/// Write the given elements back to back after a single XML declaration.
pub fn write_document(roots: &[Element]) -> ODataResult<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(xml_err)?;
    for root in roots {
        root.write_to(&mut writer)?;
    }
    Ok(writer.into_inner())
}

/// Namespace declarations for the root of an outgoing document.
pub fn namespace_declarations(version: ServiceVersion) -> Vec<(String, String)> {
    vec![
        ("xmlns".to_string(), ATOM_NS.to_string()),
        ("xmlns:d".to_string(), version.data_namespace().to_string()),
        ("xmlns:m".to_string(), version.metadata_namespace().to_string()),
        ("xmlns:gml".to_string(), GML_NS.to_string()),
    ]
}

/// Incremental element tree construction from reader events.
///
/// Keeps the namespace scopes of every open element so that subtrees can
/// be cut out of a larger document while it is still being read.
#[derive(Debug, Default)]
pub(crate) struct TreeBuilder {
    scopes: Vec<Vec<(String, String)>>,
    open: Vec<Element>,
}

impl TreeBuilder {
    pub(crate) fn open(&mut self, start: &BytesStart) -> ODataResult<()> {
        let mut declarations = Vec::new();
        let mut raw_attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(xml_err)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(xml_err)?.into_owned();
            if key == "xmlns" {
                declarations.push((String::new(), value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declarations.push((prefix.to_string(), value));
            } else {
                raw_attributes.push((key, value));
            }
        }
        self.scopes.push(declarations);

        let raw_name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let name = self.canonical(&raw_name, true);
        let attributes = raw_attributes
            .into_iter()
            .map(|(k, v)| (self.canonical(&k, false), v))
            .collect();
        self.open.push(Element {
            name,
            attributes,
            text: String::new(),
            children: Vec::new(),
        });
        Ok(())
    }

    pub(crate) fn text(&mut self, text: &str) {
        if let Some(current) = self.open.last_mut() {
            current.text.push_str(text);
        }
    }

    /// Close the innermost open element and hand it back detached.
    pub(crate) fn close(&mut self) -> Option<Element> {
        self.scopes.pop();
        self.open.pop()
    }

    /// Append a detached element to the innermost open element. Returns the
    /// element back when nothing is open (it was the root).
    pub(crate) fn attach(&mut self, element: Element) -> Option<Element> {
        match self.open.last_mut() {
            Some(parent) => {
                parent.children.push(element);
                None
            }
            None => Some(element),
        }
    }

    /// Number of currently open elements.
    pub(crate) fn depth(&self) -> usize {
        self.open.len()
    }

    pub(crate) fn root(&self) -> Option<&Element> {
        self.open.first()
    }

    fn lookup(&self, prefix: &str) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter())
            .find(|(p, _)| p == prefix)
            .map(|(_, ns)| ns.as_str())
    }

    fn canonical(&self, qname: &str, is_element: bool) -> String {
        let (prefix, local) = qname.split_once(':').unwrap_or(("", qname));
        if prefix == "xml" {
            return qname.to_string();
        }
        // unprefixed attributes are in no namespace
        if prefix.is_empty() && !is_element {
            return local.to_string();
        }
        match self.lookup(prefix).and_then(canonical_prefix) {
            Some("") => local.to_string(),
            Some(canonical) => format!("{}:{}", canonical, local),
            None => qname.to_string(),
        }
    }
}

/// Outcome of reading up to the next subtree boundary.
#[derive(Debug)]
pub(crate) enum Cut {
    /// A subtree closed at the requested depth and was kept.
    Kept(Element),
    /// The document root closed.
    Root(Element),
    /// Input ended with elements still open.
    Eof,
}

/// Read events from `reader` into `builder` until a subtree closes at the
/// given depth and `keep` accepts it. Everything else is attached to its
/// parent, so the root accumulates the elements that were not kept.
pub(crate) fn next_subtree<R: BufRead>(
    reader: &mut Reader<R>,
    builder: &mut TreeBuilder,
    buf: &mut Vec<u8>,
    depth: usize,
    mut keep: impl FnMut(&Element) -> bool,
) -> ODataResult<Cut> {
    loop {
        buf.clear();
        let closed = match reader.read_event_into(buf).map_err(xml_err)? {
            Event::Start(e) => {
                builder.open(&e)?;
                None
            }
            Event::Empty(e) => {
                builder.open(&e)?;
                builder.close()
            }
            Event::End(_) => builder.close(),
            Event::Text(t) => {
                builder.text(&t.unescape().map_err(xml_err)?);
                None
            }
            Event::CData(c) => {
                builder.text(&String::from_utf8_lossy(&c.into_inner()));
                None
            }
            Event::Eof => return Ok(Cut::Eof),
            _ => None,
        };

        if let Some(element) = closed {
            if builder.depth() == depth && keep(&element) {
                return Ok(Cut::Kept(element));
            }
            if let Some(root) = builder.attach(element) {
                return Ok(Cut::Root(root));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonicalizes_prefixes() {
        let xml = r#"<?xml version="1.0"?>
            <entry xmlns="http://www.w3.org/2005/Atom"
                   xmlns:data="http://schemas.microsoft.com/ado/2007/08/dataservices"
                   xmlns:meta="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
              <content type="application/xml">
                <meta:properties>
                  <data:Age meta:type="Edm.Int32">42</data:Age>
                </meta:properties>
              </content>
            </entry>"#;
        let root = Element::parse(xml.as_bytes()).unwrap();
        assert_eq!(root.name, "entry");
        let props = root.child("content").unwrap().child("m:properties").unwrap();
        let age = props.child("d:Age").unwrap();
        assert_eq!(age.attribute("m:type"), Some("Edm.Int32"));
        assert_eq!(age.text, "42");
        assert_eq!(age.local_name(), "Age");
        assert_eq!(root.child("content").unwrap().attribute("type"), Some("application/xml"));
    }

    #[test]
    fn test_unknown_namespace_kept() {
        let xml = r#"<x:root xmlns:x="urn:other"><x:leaf/></x:root>"#;
        let root = Element::parse(xml.as_bytes()).unwrap();
        assert_eq!(root.name, "x:root");
        assert!(root.child("x:leaf").is_some());
    }

    #[test]
    fn test_write_and_parse_back() {
        let mut root = Element::new("d:Name").with_text("a < b & c");
        for (k, v) in namespace_declarations(ServiceVersion::V4) {
            root.set_attribute(k, v);
        }
        let bytes = root.to_xml_bytes().unwrap();
        let parsed = Element::parse(&bytes).unwrap();
        assert_eq!(parsed.name, "d:Name");
        assert_eq!(parsed.text, "a < b & c");
    }

    #[test]
    fn test_truncated_document() {
        let result = Element::parse(b"<feed xmlns=\"http://www.w3.org/2005/Atom\"><entry>");
        assert!(result.is_err());
    }

    #[test]
    fn test_xml_base_attribute_kept() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xml:base="http://h/svc/"/>"#;
        let root = Element::parse(xml.as_bytes()).unwrap();
        assert_eq!(root.attribute("xml:base"), Some("http://h/svc/"));
    }
}

//! Wire resource tree.
//!
//! These types mirror the structure of a payload before it is converted to
//! the domain model. Hrefs are kept as written (possibly relative) and type
//! names as declared. Every feed, entry and property remembers the resource
//! family it belongs to; only the [`ResourceFactory`](crate::ResourceFactory)
//! creates them.

use odata_common::LinkKind;

use crate::element::Element;

/// The two wire representations of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceFamily {
    /// Atom/XML documents.
    Atom,
    /// JSON documents.
    Json,
}

/// A feed of entries.
#[derive(Debug, Clone, PartialEq)]
pub struct WireFeed {
    pub(crate) family: ResourceFamily,
    pub base: Option<String>,
    pub context: Option<String>,
    pub metadata_etag: Option<String>,
    pub count: Option<i64>,
    pub next: Option<String>,
    pub entries: Vec<WireEntry>,
}

impl WireFeed {
    pub(crate) fn empty(family: ResourceFamily) -> Self {
        Self {
            family,
            base: None,
            context: None,
            metadata_etag: None,
            count: None,
            next: None,
            entries: Vec::new(),
        }
    }

    pub fn family(&self) -> ResourceFamily {
        self.family
    }
}

/// A single entry.
#[derive(Debug, Clone, PartialEq)]
pub struct WireEntry {
    pub(crate) family: ResourceFamily,
    pub base: Option<String>,
    pub context: Option<String>,
    pub metadata_etag: Option<String>,
    pub type_name: Option<String>,
    pub etag: Option<String>,
    pub edit_link: Option<WireEntryLink>,
    pub self_link: Option<WireEntryLink>,
    pub navigation_links: Vec<WireLink>,
    pub association_links: Vec<WireLink>,
    pub media_edit_links: Vec<WireLink>,
    pub operations: Vec<WireOperation>,
    pub media_entry: bool,
    pub media_content_source: Option<String>,
    pub media_content_type: Option<String>,
    pub properties: Vec<WireProperty>,
}

impl WireEntry {
    pub(crate) fn empty(family: ResourceFamily) -> Self {
        Self {
            family,
            base: None,
            context: None,
            metadata_etag: None,
            type_name: None,
            etag: None,
            edit_link: None,
            self_link: None,
            navigation_links: Vec::new(),
            association_links: Vec::new(),
            media_edit_links: Vec::new(),
            operations: Vec::new(),
            media_entry: false,
            media_content_source: None,
            media_content_type: None,
            properties: Vec::new(),
        }
    }

    pub fn family(&self) -> ResourceFamily {
        self.family
    }
}

/// The edit or self link of an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct WireEntryLink {
    pub title: String,
    pub href: String,
}

/// A link as it appears on the wire.
///
/// The two inline slots are independent fields so that payloads carrying
/// both can be represented and rejected during conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct WireLink {
    pub kind: LinkKind,
    pub rel: String,
    pub title: String,
    pub href: Option<String>,
    pub media_type: Option<String>,
    pub media_etag: Option<String>,
    pub inline_entry: Option<Box<WireEntry>>,
    pub inline_feed: Option<WireFeed>,
}

impl WireLink {
    pub fn new(kind: LinkKind, rel: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind,
            rel: rel.into(),
            title: title.into(),
            href: None,
            media_type: None,
            media_etag: None,
            inline_entry: None,
            inline_feed: None,
        }
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }
}

/// An action or function advertised by an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct WireOperation {
    pub metadata_anchor: String,
    pub title: String,
    pub target: String,
}

/// A named property.
#[derive(Debug, Clone, PartialEq)]
pub struct WireProperty {
    pub(crate) family: ResourceFamily,
    pub name: String,
    pub type_name: Option<String>,
    /// Base URI declared by a standalone property document.
    pub base: Option<String>,
    pub context: Option<String>,
    pub metadata_etag: Option<String>,
    pub value: WireValue,
}

impl WireProperty {
    pub(crate) fn named(family: ResourceFamily, name: impl Into<String>, value: WireValue) -> Self {
        Self {
            family,
            name: name.into(),
            type_name: None,
            base: None,
            context: None,
            metadata_etag: None,
            value,
        }
    }

    pub fn family(&self) -> ResourceFamily {
        self.family
    }
}

/// A property value on the wire. Geospatial values are always carried as a
/// GML element tree, whatever the family.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Null,
    Simple(String),
    Geospatial(Element),
    Complex(Vec<WireProperty>),
    Collection(Vec<WireValue>),
}

/// One resource advertised by a service document.
#[derive(Debug, Clone, PartialEq)]
pub struct WireServiceItem {
    pub name: String,
    pub title: Option<String>,
    pub href: String,
}

/// A service document before its hrefs are resolved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WireServiceDocument {
    pub base: Option<String>,
    pub metadata_context: Option<String>,
    pub entity_sets: Vec<WireServiceItem>,
    pub function_imports: Vec<WireServiceItem>,
    pub singletons: Vec<WireServiceItem>,
}

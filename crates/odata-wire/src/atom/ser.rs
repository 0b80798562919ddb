use odata_common::{ODataResult, ServiceVersion};

use super::*;
use crate::element::{namespace_declarations, write_document, Element};
use crate::resource::{WireEntry, WireFeed, WireLink, WireProperty, WireValue};

/// Writes wire resources as Atom/XML documents.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AtomSerializer {
    version: ServiceVersion,
}

impl AtomSerializer {
    pub(crate) fn new(version: ServiceVersion) -> Self {
        Self { version }
    }

    pub(crate) fn feed(&self, feed: &WireFeed) -> ODataResult<Vec<u8>> {
        self.root(self.feed_element(feed)).to_xml_bytes()
    }

    pub(crate) fn entry(&self, entry: &WireEntry) -> ODataResult<Vec<u8>> {
        self.entries(std::slice::from_ref(entry))
    }

    /// Entries written back to back, each a complete `entry` element.
    pub(crate) fn entries(&self, entries: &[WireEntry]) -> ODataResult<Vec<u8>> {
        let roots: Vec<Element> = entries
            .iter()
            .map(|e| self.root(self.entry_element(e)))
            .collect();
        write_document(&roots)
    }

    pub(crate) fn property(&self, property: &WireProperty) -> ODataResult<Vec<u8>> {
        let mut element = property_element(property, self.version);
        set_optional(&mut element, XML_BASE, &property.base);
        set_optional(&mut element, M_CONTEXT, &property.context);
        set_optional(&mut element, M_METADATA_ETAG, &property.metadata_etag);
        self.root(element).to_xml_bytes()
    }

    /// A link document: `<uri>` in V3, `<m:ref>` in V4.
    pub(crate) fn link(&self, link: &WireLink) -> ODataResult<Vec<u8>> {
        let href = link.href.clone().unwrap_or_default();
        let element = match self.version {
            ServiceVersion::V3 => Element::new("uri")
                .with_attribute("xmlns", self.version.data_namespace())
                .with_text(href),
            ServiceVersion::V4 => Element::new("m:ref")
                .with_attribute("xmlns:m", self.version.metadata_namespace())
                .with_attribute("id", href),
        };
        element.to_xml_bytes()
    }

    fn root(&self, mut element: Element) -> Element {
        let mut attributes = namespace_declarations(self.version);
        attributes.append(&mut element.attributes);
        element.attributes = attributes;
        element
    }

    fn feed_element(&self, feed: &WireFeed) -> Element {
        let mut element = Element::new(FEED);
        set_optional(&mut element, XML_BASE, &feed.base);
        set_optional(&mut element, M_CONTEXT, &feed.context);
        set_optional(&mut element, M_METADATA_ETAG, &feed.metadata_etag);
        if let Some(count) = feed.count {
            element.push(Element::new(M_COUNT).with_text(count.to_string()));
        }
        for entry in &feed.entries {
            element.push(self.entry_element(entry));
        }
        if let Some(next) = &feed.next {
            element.push(
                Element::new(LINK)
                    .with_attribute("rel", REL_NEXT)
                    .with_attribute("href", next.as_str()),
            );
        }
        element
    }

    fn entry_element(&self, entry: &WireEntry) -> Element {
        let mut element = Element::new(ENTRY);
        set_optional(&mut element, XML_BASE, &entry.base);
        set_optional(&mut element, M_CONTEXT, &entry.context);
        set_optional(&mut element, M_METADATA_ETAG, &entry.metadata_etag);
        set_optional(&mut element, M_ETAG, &entry.etag);

        if let Some(type_name) = &entry.type_name {
            element.push(
                Element::new(CATEGORY)
                    .with_attribute("term", self.version.category_term(type_name))
                    .with_attribute("scheme", self.version.type_scheme()),
            );
        }
        for (rel, link) in [(REL_EDIT, &entry.edit_link), (REL_SELF, &entry.self_link)] {
            if let Some(link) = link {
                element.push(
                    Element::new(LINK)
                        .with_attribute("rel", rel)
                        .with_attribute("title", link.title.as_str())
                        .with_attribute("href", link.href.as_str()),
                );
            }
        }
        let links = entry
            .navigation_links
            .iter()
            .chain(&entry.media_edit_links)
            .chain(&entry.association_links);
        for link in links {
            element.push(self.link_element(link));
        }
        for operation in &entry.operations {
            element.push(
                Element::new(M_ACTION)
                    .with_attribute("metadata", operation.metadata_anchor.as_str())
                    .with_attribute("title", operation.title.as_str())
                    .with_attribute("target", operation.target.as_str()),
            );
        }

        let mut properties = Element::new(M_PROPERTIES);
        for property in &entry.properties {
            properties.push(property_element(property, self.version));
        }
        if entry.media_entry {
            let mut content = Element::new(CONTENT);
            set_optional(&mut content, "type", &entry.media_content_type);
            set_optional(&mut content, "src", &entry.media_content_source);
            element.push(content);
            element.push(properties);
        } else {
            element.push(
                Element::new(CONTENT)
                    .with_attribute("type", "application/xml")
                    .with_child(properties),
            );
        }
        element
    }

    fn link_element(&self, link: &WireLink) -> Element {
        let mut element = Element::new(LINK)
            .with_attribute("rel", link.rel.as_str())
            .with_attribute("title", link.title.as_str());
        set_optional(&mut element, "href", &link.href);
        set_optional(&mut element, "type", &link.media_type);
        set_optional(&mut element, M_ETAG, &link.media_etag);

        let mut inline = Element::new(M_INLINE);
        if let Some(entry) = &link.inline_entry {
            inline.push(self.entry_element(entry));
        }
        if let Some(feed) = &link.inline_feed {
            inline.push(self.feed_element(feed));
        }
        if !inline.children.is_empty() {
            element.push(inline);
        }
        element
    }
}

fn property_element(property: &WireProperty, version: ServiceVersion) -> Element {
    let name = if property.name.is_empty() {
        M_VALUE.to_string()
    } else {
        format!("d:{}", property.name)
    };
    let mut element = value_element(name, &property.value, version);
    set_optional(&mut element, M_TYPE, &property.type_name);
    element
}

fn value_element(name: String, value: &WireValue, version: ServiceVersion) -> Element {
    let mut element = Element::new(name);
    match value {
        WireValue::Null => element.set_attribute(M_NULL, "true"),
        WireValue::Simple(text) => element.text = text.clone(),
        WireValue::Geospatial(tree) => element.push(tree.clone()),
        WireValue::Complex(properties) => {
            if properties.is_empty() {
                element.set_attribute(M_TYPE, UNTYPED_COMPLEX);
            }
            for property in properties {
                element.push(property_element(property, version));
            }
        }
        WireValue::Collection(items) => {
            if items.is_empty() {
                element.set_attribute(M_TYPE, UNTYPED_COLLECTION);
            }
            for item in items {
                element.push(value_element(
                    version.collection_item_element().to_string(),
                    item,
                    version,
                ));
            }
        }
    }
    element
}

fn set_optional(element: &mut Element, name: &str, value: &Option<String>) {
    if let Some(value) = value {
        element.set_attribute(name, value.as_str());
    }
}

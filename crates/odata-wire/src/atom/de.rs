use odata_common::{LinkKind, ODataError, ODataResult, ServiceVersion};

use super::*;
use crate::element::Element;
use crate::resource::{
    ResourceFamily, WireEntry, WireEntryLink, WireFeed, WireLink, WireOperation, WireProperty,
    WireValue,
};

const FAMILY: ResourceFamily = ResourceFamily::Atom;

/// Maps Atom/XML element trees onto wire resources.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AtomDeserializer {
    version: ServiceVersion,
}

impl AtomDeserializer {
    pub(crate) fn new(version: ServiceVersion) -> Self {
        Self { version }
    }

    pub(crate) fn feed(&self, bytes: &[u8]) -> ODataResult<WireFeed> {
        let root = Element::parse(bytes)?;
        expect_root(&root, FEED)?;
        self.feed_from(&root)
    }

    pub(crate) fn entry(&self, bytes: &[u8]) -> ODataResult<WireEntry> {
        let root = Element::parse(bytes)?;
        expect_root(&root, ENTRY)?;
        self.entry_from(&root)
    }

    pub(crate) fn property(&self, bytes: &[u8]) -> ODataResult<WireProperty> {
        let root = Element::parse(bytes)?;
        if root.name != M_VALUE && !root.name.starts_with("d:") {
            return Err(ODataError::MalformedPayload(format!(
                "'{}' is not a property element",
                root.name
            )));
        }
        let mut property = property_from(&root);
        if root.name == M_VALUE {
            property.name.clear();
        }
        property.base = root.attribute(XML_BASE).map(str::to_string);
        property.context = root.attribute(M_CONTEXT).map(str::to_string);
        property.metadata_etag = root.attribute(M_METADATA_ETAG).map(str::to_string);
        Ok(property)
    }

    pub(crate) fn feed_from(&self, element: &Element) -> ODataResult<WireFeed> {
        let mut feed = self.feed_header(element);
        for child in element.children_named(ENTRY) {
            feed.entries.push(self.entry_from(child)?);
        }
        Ok(feed)
    }

    /// Everything about a feed except its entries.
    pub(crate) fn feed_header(&self, element: &Element) -> WireFeed {
        let mut feed = WireFeed::empty(FAMILY);
        feed.base = element.attribute(XML_BASE).map(str::to_string);
        feed.context = element.attribute(M_CONTEXT).map(str::to_string);
        feed.metadata_etag = element.attribute(M_METADATA_ETAG).map(str::to_string);
        feed.count = element
            .child(M_COUNT)
            .and_then(|c| c.text.trim().parse().ok());
        feed.next = element
            .children_named(LINK)
            .find(|l| l.attribute("rel") == Some(REL_NEXT))
            .and_then(|l| l.attribute("href"))
            .map(str::to_string);
        feed
    }

    pub(crate) fn entry_from(&self, element: &Element) -> ODataResult<WireEntry> {
        let mut entry = WireEntry::empty(FAMILY);
        entry.base = element.attribute(XML_BASE).map(str::to_string);
        entry.context = element.attribute(M_CONTEXT).map(str::to_string);
        entry.metadata_etag = element.attribute(M_METADATA_ETAG).map(str::to_string);
        entry.etag = element.attribute(M_ETAG).map(str::to_string);

        let scheme = self.version.type_scheme();
        entry.type_name = element
            .children_named(CATEGORY)
            .find(|c| c.attribute("scheme") == Some(scheme))
            .and_then(|c| c.attribute("term"))
            .map(|t| t.trim_start_matches('#').to_string());

        for child in &element.children {
            match child.name.as_str() {
                LINK => self.add_link(&mut entry, child)?,
                M_ACTION | M_FUNCTION => entry.operations.push(WireOperation {
                    metadata_anchor: child.attribute("metadata").unwrap_or_default().to_string(),
                    title: child.attribute("title").unwrap_or_default().to_string(),
                    target: child.attribute("target").unwrap_or_default().to_string(),
                }),
                CONTENT => {
                    if let Some(src) = child.attribute("src") {
                        entry.media_entry = true;
                        entry.media_content_source = Some(src.to_string());
                        entry.media_content_type = child.attribute("type").map(str::to_string);
                    } else if let Some(props) = child.child(M_PROPERTIES) {
                        self.add_properties(&mut entry, props);
                    }
                }
                // media entries carry their properties beside the content
                M_PROPERTIES => self.add_properties(&mut entry, child),
                _ => {}
            }
        }
        Ok(entry)
    }

    fn add_properties(&self, entry: &mut WireEntry, properties: &Element) {
        entry
            .properties
            .extend(properties.children.iter().map(property_from));
    }

    fn add_link(&self, entry: &mut WireEntry, element: &Element) -> ODataResult<()> {
        let rel = element.attribute("rel").unwrap_or_default();
        let title = element.attribute("title").unwrap_or_default();
        let href = element.attribute("href");
        let entry_link = || {
            href.map(|href| WireEntryLink {
                title: title.to_string(),
                href: href.to_string(),
            })
        };

        match rel {
            REL_EDIT => entry.edit_link = entry_link(),
            REL_SELF => entry.self_link = entry_link(),
            _ => {
                let Some(kind) = self.version.link_kind(rel) else {
                    return Ok(());
                };
                let mut link = WireLink::new(kind, rel, title);
                link.href = href.map(str::to_string);
                if link.title.is_empty() {
                    link.title = rel.rsplit('/').next().unwrap_or_default().to_string();
                }
                link.media_type = element.attribute("type").map(str::to_string);
                link.media_etag = element.attribute(M_ETAG).map(str::to_string);
                for inline in element.children_named(M_INLINE) {
                    if let Some(e) = inline.child(ENTRY) {
                        link.inline_entry = Some(Box::new(self.entry_from(e)?));
                    }
                    if let Some(f) = inline.child(FEED) {
                        link.inline_feed = Some(self.feed_from(f)?);
                    }
                }
                match kind {
                    LinkKind::Navigation => entry.navigation_links.push(link),
                    LinkKind::Association => entry.association_links.push(link),
                    LinkKind::MediaEdit => entry.media_edit_links.push(link),
                }
            }
        }
        Ok(())
    }

}

fn property_from(element: &Element) -> WireProperty {
    let declared = element.attribute(M_TYPE).map(|t| t.trim_start_matches('#'));
    let value = value_from(element, declared);
    let mut property = WireProperty::named(FAMILY, element.local_name(), value);
    property.type_name = declared
        .filter(|t| !is_untyped_marker(t))
        .map(str::to_string);
    property
}

fn value_from(element: &Element, type_name: Option<&str>) -> WireValue {
    if element.attribute(M_NULL) == Some("true") {
        return WireValue::Null;
    }

    if let Some(first) = element.children.first() {
        if first.name.starts_with("gml:") {
            return WireValue::Geospatial(first.clone());
        }
        if element.children.iter().all(is_collection_item) {
            return WireValue::Collection(
                element
                    .children
                    .iter()
                    .map(|item| value_from(item, item.attribute(M_TYPE)))
                    .collect(),
            );
        }
        return WireValue::Complex(element.children.iter().map(property_from).collect());
    }

    match type_name {
        Some(UNTYPED_COLLECTION) => WireValue::Collection(Vec::new()),
        Some(UNTYPED_COMPLEX) => WireValue::Complex(Vec::new()),
        Some(t) if t.starts_with("Collection(") => WireValue::Collection(Vec::new()),
        Some(t) if !t.starts_with("Edm.") && t.contains('.') && element.text.trim().is_empty() => {
            WireValue::Complex(Vec::new())
        }
        _ => WireValue::Simple(element.text.clone()),
    }
}

fn is_collection_item(element: &Element) -> bool {
    element.name == D_ELEMENT || element.name == M_ELEMENT
}

fn is_untyped_marker(type_name: &str) -> bool {
    type_name == UNTYPED_COLLECTION || type_name == UNTYPED_COMPLEX
}

fn expect_root(root: &Element, name: &str) -> ODataResult<()> {
    if root.name == name {
        Ok(())
    } else {
        Err(ODataError::MalformedPayload(format!(
            "expected Atom {} but found '{}'",
            name, root.name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const V3_ENTRY: &str = r##"<?xml version="1.0" encoding="utf-8"?>
<entry xml:base="http://h/svc/"
       xmlns="http://www.w3.org/2005/Atom"
       xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
       xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata"
       xmlns:gml="http://www.opengis.net/gml"
       m:etag="W/&quot;1&quot;">
  <category term="NS.Customer" scheme="http://schemas.microsoft.com/ado/2007/08/dataservices/scheme"/>
  <link rel="edit" title="Customer" href="Customers(1)"/>
  <link rel="http://schemas.microsoft.com/ado/2007/08/dataservices/related/Orders"
        type="application/atom+xml;type=feed" title="Orders" href="Customers(1)/Orders">
    <m:inline>
      <feed>
        <m:count>1</m:count>
        <entry><category term="NS.Order" scheme="http://schemas.microsoft.com/ado/2007/08/dataservices/scheme"/></entry>
      </feed>
    </m:inline>
  </link>
  <link rel="http://schemas.microsoft.com/ado/2007/08/dataservices/relatedlinks/Orders"
        type="application/xml" title="Orders" href="Customers(1)/$links/Orders"/>
  <m:action metadata="#NS.Reset" title="Reset" target="Customers(1)/Reset"/>
  <content type="application/xml">
    <m:properties>
      <d:ID m:type="Edm.Int32">1</d:ID>
      <d:Name>Ann</d:Name>
      <d:Nick m:null="true"/>
      <d:Address m:type="NS.Address"><d:City>Oslo</d:City></d:Address>
      <d:Tags m:type="Collection(Edm.String)"><d:element>a</d:element><d:element>b</d:element></d:Tags>
      <d:Home m:type="Edm.GeographyPoint"><gml:Point><gml:pos>1 2</gml:pos></gml:Point></d:Home>
    </m:properties>
  </content>
</entry>"##;

    #[test]
    fn test_entry_structure() {
        let de = AtomDeserializer::new(ServiceVersion::V3);
        let entry = de.entry(V3_ENTRY.as_bytes()).unwrap();
        assert_eq!(entry.family(), ResourceFamily::Atom);
        assert_eq!(entry.base.as_deref(), Some("http://h/svc/"));
        assert_eq!(entry.type_name.as_deref(), Some("NS.Customer"));
        assert_eq!(entry.etag.as_deref(), Some("W/\"1\""));
        assert_eq!(entry.edit_link.as_ref().unwrap().href, "Customers(1)");
        assert_eq!(entry.navigation_links.len(), 1);
        assert_eq!(entry.association_links.len(), 1);
        assert_eq!(entry.operations[0].metadata_anchor, "#NS.Reset");

        let orders = &entry.navigation_links[0];
        let inline = orders.inline_feed.as_ref().unwrap();
        assert_eq!(inline.count, Some(1));
        assert_eq!(inline.entries.len(), 1);
        assert!(orders.inline_entry.is_none());
    }

    #[test]
    fn test_property_shapes() {
        let de = AtomDeserializer::new(ServiceVersion::V3);
        let entry = de.entry(V3_ENTRY.as_bytes()).unwrap();
        let by_name = |n: &str| entry.properties.iter().find(|p| p.name == n).unwrap();

        assert_eq!(by_name("ID").value, WireValue::Simple("1".to_string()));
        assert_eq!(by_name("ID").type_name.as_deref(), Some("Edm.Int32"));
        assert_eq!(by_name("Name").type_name, None);
        assert_eq!(by_name("Nick").value, WireValue::Null);
        match &by_name("Address").value {
            WireValue::Complex(props) => assert_eq!(props[0].name, "City"),
            other => panic!("Expected complex value, got {:?}", other),
        }
        assert_eq!(
            by_name("Tags").value,
            WireValue::Collection(vec![
                WireValue::Simple("a".to_string()),
                WireValue::Simple("b".to_string())
            ])
        );
        match &by_name("Home").value {
            WireValue::Geospatial(tree) => assert_eq!(tree.name, "gml:Point"),
            other => panic!("Expected geospatial value, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_root() {
        let de = AtomDeserializer::new(ServiceVersion::V3);
        let err = de.feed(V3_ENTRY.as_bytes()).unwrap_err();
        assert!(matches!(err, ODataError::MalformedPayload(_)));
    }
}

//! Format dispatch.
//!
//! The [`ResourceFactory`] is the one place that knows there are two
//! resource families: it creates empty wire resources for a family and
//! routes (de)serialization and entry streaming to the family's codec.

use std::io::BufRead;

use odata_common::{Format, MetadataDocument, ODataError, ODataResult, ServerError, ServiceVersion};

use crate::atom::{AtomDeserializer, AtomEntryStream, AtomSerializer};
use crate::edmx;
use crate::json::{JsonDeserializer, JsonEntryStream, JsonSerializer};
use crate::resource::{
    ResourceFamily, WireEntry, WireFeed, WireLink, WireProperty, WireServiceDocument, WireValue,
};
use crate::service;

/// Concrete resource types per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    AtomFeed,
    AtomEntry,
    JsonFeed,
    JsonEntry,
}

impl ResourceType {
    /// Media type of documents holding this resource.
    pub fn media_type(&self) -> &'static str {
        match self {
            ResourceType::AtomFeed => "application/atom+xml;type=feed",
            ResourceType::AtomEntry => "application/atom+xml;type=entry",
            ResourceType::JsonFeed | ResourceType::JsonEntry => "application/json",
        }
    }
}

/// Creates wire resources and dispatches them to their family's codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceFactory {
    version: ServiceVersion,
}

impl ResourceFactory {
    pub fn new(version: ServiceVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> ServiceVersion {
        self.version
    }

    /// The family that carries a payload format. Raw formats have none.
    pub fn family_for(format: Format) -> ODataResult<ResourceFamily> {
        match format {
            Format::Atom | Format::Xml => Ok(ResourceFamily::Atom),
            Format::Json | Format::JsonNoMetadata | Format::JsonFullMetadata => {
                Ok(ResourceFamily::Json)
            }
            Format::Text | Format::Binary => Err(ODataError::UnsupportedFormat(format!(
                "{} payloads have no resource representation",
                format
            ))),
        }
    }

    // === Construction ===

    pub fn new_feed(&self, family: ResourceFamily) -> WireFeed {
        WireFeed::empty(family)
    }

    pub fn new_entry(&self, family: ResourceFamily) -> WireEntry {
        WireEntry::empty(family)
    }

    pub fn new_property(&self, family: ResourceFamily, name: impl Into<String>) -> WireProperty {
        WireProperty::named(family, name, WireValue::Null)
    }

    pub fn family_of(entry: &WireEntry) -> ResourceFamily {
        entry.family
    }

    /// Family of the entries contained in a feed of the given family.
    pub fn entry_family_for(feed_family: ResourceFamily) -> ResourceFamily {
        feed_family
    }

    pub fn feed_type_for(family: ResourceFamily) -> ResourceType {
        match family {
            ResourceFamily::Atom => ResourceType::AtomFeed,
            ResourceFamily::Json => ResourceType::JsonFeed,
        }
    }

    pub fn entry_type_for(family: ResourceFamily) -> ResourceType {
        match family {
            ResourceFamily::Atom => ResourceType::AtomEntry,
            ResourceFamily::Json => ResourceType::JsonEntry,
        }
    }

    // === Deserialization ===

    pub fn deserialize_feed(&self, bytes: &[u8], family: ResourceFamily) -> ODataResult<WireFeed> {
        match family {
            ResourceFamily::Atom => AtomDeserializer::new(self.version).feed(bytes),
            ResourceFamily::Json => JsonDeserializer::new(self.version).feed(bytes),
        }
    }

    pub fn deserialize_entry(&self, bytes: &[u8], family: ResourceFamily) -> ODataResult<WireEntry> {
        match family {
            ResourceFamily::Atom => AtomDeserializer::new(self.version).entry(bytes),
            ResourceFamily::Json => JsonDeserializer::new(self.version).entry(bytes),
        }
    }

    pub fn deserialize_property(
        &self,
        bytes: &[u8],
        family: ResourceFamily,
    ) -> ODataResult<WireProperty> {
        match family {
            ResourceFamily::Atom => AtomDeserializer::new(self.version).property(bytes),
            ResourceFamily::Json => JsonDeserializer::new(self.version).property(bytes),
        }
    }

    pub fn deserialize_service_document(
        &self,
        bytes: &[u8],
        family: ResourceFamily,
    ) -> ODataResult<WireServiceDocument> {
        service::read_service_document(bytes, family, self.version)
    }

    pub fn deserialize_error(&self, bytes: &[u8], family: ResourceFamily) -> ODataResult<ServerError> {
        service::read_error(bytes, family, self.version)
    }

    /// `$metadata` documents only exist as XML.
    pub fn deserialize_metadata(
        &self,
        bytes: &[u8],
        family: ResourceFamily,
    ) -> ODataResult<MetadataDocument> {
        match family {
            ResourceFamily::Atom => edmx::read_metadata(bytes),
            ResourceFamily::Json => Err(ODataError::UnsupportedFormat(
                "metadata documents are only available as XML".to_string(),
            )),
        }
    }

    /// Open a streaming reader over the entries of a feed.
    pub fn entry_stream<R: BufRead + Send + 'static>(
        &self,
        input: R,
        family: ResourceFamily,
    ) -> ODataResult<WireEntryStream<R>> {
        Ok(match family {
            ResourceFamily::Atom => WireEntryStream::Atom(AtomEntryStream::open(input, self.version)?),
            ResourceFamily::Json => WireEntryStream::Json(JsonEntryStream::open(input, self.version)?),
        })
    }

    // === Serialization ===

    pub fn serialize_feed(&self, feed: &WireFeed) -> ODataResult<Vec<u8>> {
        match feed.family {
            ResourceFamily::Atom => AtomSerializer::new(self.version).feed(feed),
            ResourceFamily::Json => JsonSerializer::new(self.version).feed(feed),
        }
    }

    pub fn serialize_entry(&self, entry: &WireEntry) -> ODataResult<Vec<u8>> {
        match entry.family {
            ResourceFamily::Atom => AtomSerializer::new(self.version).entry(entry),
            ResourceFamily::Json => JsonSerializer::new(self.version).entry(entry),
        }
    }

    /// Entries of one family written back to back.
    pub fn serialize_entries(
        &self,
        entries: &[WireEntry],
        family: ResourceFamily,
    ) -> ODataResult<Vec<u8>> {
        if let Some(stray) = entries.iter().find(|e| e.family != family) {
            return Err(ODataError::UnsupportedFormat(format!(
                "cannot write a {:?} entry into a {:?} document",
                stray.family, family
            )));
        }
        match family {
            ResourceFamily::Atom => AtomSerializer::new(self.version).entries(entries),
            ResourceFamily::Json => JsonSerializer::new(self.version).entries(entries),
        }
    }

    pub fn serialize_property(&self, property: &WireProperty) -> ODataResult<Vec<u8>> {
        match property.family {
            ResourceFamily::Atom => AtomSerializer::new(self.version).property(property),
            ResourceFamily::Json => JsonSerializer::new(self.version).property(property),
        }
    }

    pub fn serialize_link(&self, link: &WireLink, family: ResourceFamily) -> ODataResult<Vec<u8>> {
        match family {
            ResourceFamily::Atom => AtomSerializer::new(self.version).link(link),
            ResourceFamily::Json => JsonSerializer::new(self.version).link(link),
        }
    }
}

/// Streaming entry reader of either family.
pub enum WireEntryStream<R: BufRead> {
    Atom(AtomEntryStream<R>),
    Json(JsonEntryStream),
}

impl<R: BufRead> WireEntryStream<R> {
    pub fn next_entry(&mut self) -> ODataResult<Option<WireEntry>> {
        match self {
            WireEntryStream::Atom(s) => s.next_entry(),
            WireEntryStream::Json(s) => s.next_entry(),
        }
    }

    /// Feed-level data read so far.
    pub fn header(&self) -> &WireFeed {
        match self {
            WireEntryStream::Atom(s) => s.header(),
            WireEntryStream::Json(s) => s.header(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_for_format() {
        assert_eq!(ResourceFactory::family_for(Format::Atom).unwrap(), ResourceFamily::Atom);
        assert_eq!(ResourceFactory::family_for(Format::Xml).unwrap(), ResourceFamily::Atom);
        assert_eq!(
            ResourceFactory::family_for(Format::JsonFullMetadata).unwrap(),
            ResourceFamily::Json
        );
        assert!(matches!(
            ResourceFactory::family_for(Format::Text),
            Err(ODataError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_new_resources_carry_family() {
        let factory = ResourceFactory::new(ServiceVersion::V4);
        let entry = factory.new_entry(ResourceFamily::Json);
        assert_eq!(ResourceFactory::family_of(&entry), ResourceFamily::Json);
        assert_eq!(factory.new_feed(ResourceFamily::Atom).family(), ResourceFamily::Atom);
        assert_eq!(
            ResourceFactory::entry_family_for(ResourceFamily::Atom),
            ResourceFamily::Atom
        );
        assert_eq!(ResourceFactory::feed_type_for(ResourceFamily::Json), ResourceType::JsonFeed);
        assert_eq!(
            ResourceFactory::entry_type_for(ResourceFamily::Atom).media_type(),
            "application/atom+xml;type=entry"
        );
    }

    #[test]
    fn test_mixed_families_rejected() {
        let factory = ResourceFactory::new(ServiceVersion::V3);
        let entries = vec![factory.new_entry(ResourceFamily::Json)];
        assert!(factory.serialize_entries(&entries, ResourceFamily::Atom).is_err());
    }

    #[test]
    fn test_metadata_is_xml_only() {
        let factory = ResourceFactory::new(ServiceVersion::V4);
        assert!(matches!(
            factory.deserialize_metadata(b"{}", ResourceFamily::Json),
            Err(ODataError::UnsupportedFormat(_))
        ));
    }
}

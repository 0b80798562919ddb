//! Payload reader.
//!
//! Reads a byte stream in a given format into the requested result shape.
//! Every shape except the streaming iterator consumes the input fully and
//! releases it before returning, whether conversion succeeded or not.
//!
//! The `read_*` methods and [`Reader::parse`] log conversion failures at
//! `warn` and return `None`; the `try_read_*` methods return the error.

use std::io::Read;

use odata_common::uri::{parse_base, resolve};
use odata_common::{
    Entity, EntitySet, Format, MetadataDocument, ODataError, ODataResult, PrimitiveValue,
    Property, ServerError, ServiceDocument, Url,
};
use odata_wire::{ResourceFactory, ResourceFamily};
use tracing::{debug, warn};

use crate::binder::Binder;
use crate::iterator::{EntitySetIterator, PayloadSource};

/// A read payload with the document-level metadata that came with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Container<T> {
    pub context_url: Option<Url>,
    pub metadata_etag: Option<String>,
    pub payload: T,
}

impl<T> Container<T> {
    pub fn new(payload: T) -> Self {
        Self {
            context_url: None,
            metadata_etag: None,
            payload,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Container<U> {
        Container {
            context_url: self.context_url,
            metadata_etag: self.metadata_etag,
            payload: f(self.payload),
        }
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}

/// Result shapes a payload can be read into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadShape {
    EntitySet,
    Entity,
    Property,
    RawValue,
    ErrorPayload,
    Metadata,
    ServiceDocument,
    StreamingEntitySet,
}

impl ReadShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadShape::EntitySet => "entity-set",
            ReadShape::Entity => "entity",
            ReadShape::Property => "property",
            ReadShape::RawValue => "raw-value",
            ReadShape::ErrorPayload => "error",
            ReadShape::Metadata => "metadata",
            ReadShape::ServiceDocument => "service-document",
            ReadShape::StreamingEntitySet => "streaming-entity-set",
        }
    }

    /// Parse a shape name as used on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "entity-set" | "entityset" | "feed" => Some(ReadShape::EntitySet),
            "entity" | "entry" => Some(ReadShape::Entity),
            "property" => Some(ReadShape::Property),
            "raw-value" | "raw" | "value" => Some(ReadShape::RawValue),
            "error" => Some(ReadShape::ErrorPayload),
            "metadata" => Some(ReadShape::Metadata),
            "service-document" | "service" => Some(ReadShape::ServiceDocument),
            "streaming-entity-set" | "stream" => Some(ReadShape::StreamingEntitySet),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReadShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payload of any shape.
#[derive(Debug)]
pub enum Payload {
    EntitySet(EntitySet),
    Entity(Entity),
    Property(Property),
    RawValue(PrimitiveValue),
    Error(ServerError),
    Metadata(MetadataDocument),
    ServiceDocument(ServiceDocument),
    Iterator(EntitySetIterator),
}

/// Reads payloads into domain objects.
#[derive(Debug, Clone)]
pub struct Reader {
    binder: Binder,
    base: Option<Url>,
}

impl Reader {
    pub fn new(binder: Binder) -> Self {
        Self { binder, base: None }
    }

    /// Base URI that overrides whatever base a payload declares.
    pub fn with_base(mut self, base: Option<Url>) -> Self {
        self.base = base;
        self
    }

    pub fn binder(&self) -> &Binder {
        &self.binder
    }

    /// Read any shape, degrading failures to `None`.
    pub fn parse(
        &self,
        input: impl Read + Send + 'static,
        format: Format,
        shape: ReadShape,
    ) -> Option<Container<Payload>> {
        degrade(shape, self.try_parse(input, format, shape))
    }

    pub fn try_parse(
        &self,
        input: impl Read + Send + 'static,
        format: Format,
        shape: ReadShape,
    ) -> ODataResult<Container<Payload>> {
        Ok(match shape {
            ReadShape::EntitySet => self.try_read_entity_set(input, format)?.map(Payload::EntitySet),
            ReadShape::Entity => self.try_read_entity(input, format)?.map(Payload::Entity),
            ReadShape::Property => self.try_read_property(input, format)?.map(Payload::Property),
            ReadShape::RawValue => self.try_read_raw_value(input, format)?.map(Payload::RawValue),
            ReadShape::ErrorPayload => self.try_read_error(input, format)?.map(Payload::Error),
            ReadShape::Metadata => self.try_read_metadata(input, format)?.map(Payload::Metadata),
            ReadShape::ServiceDocument => self
                .try_read_service_document(input, format)?
                .map(Payload::ServiceDocument),
            ReadShape::StreamingEntitySet => {
                Container::new(Payload::Iterator(self.try_read_entity_set_iter(input, format)?))
            }
        })
    }

    // === Entity sets ===

    pub fn read_entity_set(&self, input: impl Read, format: Format) -> Option<Container<EntitySet>> {
        degrade(ReadShape::EntitySet, self.try_read_entity_set(input, format))
    }

    pub fn try_read_entity_set(
        &self,
        input: impl Read,
        format: Format,
    ) -> ODataResult<Container<EntitySet>> {
        let family = resource_family(format, ReadShape::EntitySet)?;
        let bytes = consume(input)?;
        let feed = self.factory().deserialize_feed(&bytes, family)?;
        let base = self.effective_base(feed.base.as_deref())?;
        let set = self.binder.unbind_feed(&feed, base.as_ref())?;
        debug!(entities = set.len(), %format, "Read entity set");
        Ok(Container {
            context_url: context_url(feed.context.as_deref(), base.as_ref())?,
            metadata_etag: feed.metadata_etag,
            payload: set,
        })
    }

    pub fn read_entity_set_iter(
        &self,
        input: impl Read + Send + 'static,
        format: Format,
    ) -> Option<EntitySetIterator> {
        degrade(
            ReadShape::StreamingEntitySet,
            self.try_read_entity_set_iter(input, format),
        )
    }

    /// Open a streaming iterator that takes ownership of the input.
    pub fn try_read_entity_set_iter(
        &self,
        input: impl Read + Send + 'static,
        format: Format,
    ) -> ODataResult<EntitySetIterator> {
        let family = resource_family(format, ReadShape::StreamingEntitySet)?;
        let source: PayloadSource = Box::new(input);
        EntitySetIterator::open(source, family, self.binder, self.base.clone())
    }

    // === Entities ===

    pub fn read_entity(&self, input: impl Read, format: Format) -> Option<Container<Entity>> {
        degrade(ReadShape::Entity, self.try_read_entity(input, format))
    }

    pub fn try_read_entity(&self, input: impl Read, format: Format) -> ODataResult<Container<Entity>> {
        let family = resource_family(format, ReadShape::Entity)?;
        let bytes = consume(input)?;
        let entry = self.factory().deserialize_entry(&bytes, family)?;
        let base = self.effective_base(entry.base.as_deref())?;
        let entity = self.binder.unbind_entry(&entry, base.as_ref())?;
        debug!(type_name = %entity.type_name, %format, "Read entity");
        Ok(Container {
            context_url: context_url(entry.context.as_deref(), base.as_ref())?,
            metadata_etag: entry.metadata_etag,
            payload: entity,
        })
    }

    // === Properties and raw values ===

    pub fn read_property(&self, input: impl Read, format: Format) -> Option<Container<Property>> {
        degrade(ReadShape::Property, self.try_read_property(input, format))
    }

    pub fn try_read_property(
        &self,
        input: impl Read,
        format: Format,
    ) -> ODataResult<Container<Property>> {
        let family = resource_family(format, ReadShape::Property)?;
        let bytes = consume(input)?;
        let wire = self.factory().deserialize_property(&bytes, family)?;
        let base = self.effective_base(wire.base.as_deref())?;
        let property = self.binder.unbind_property(&wire)?;
        debug!(name = %property.name, %format, "Read property");
        Ok(Container {
            context_url: context_url(wire.context.as_deref(), base.as_ref())?,
            metadata_etag: wire.metadata_etag,
            payload: property,
        })
    }

    pub fn read_raw_value(
        &self,
        input: impl Read,
        format: Format,
    ) -> Option<Container<PrimitiveValue>> {
        degrade(ReadShape::RawValue, self.try_read_raw_value(input, format))
    }

    /// A `$value` payload: text becomes a string, binary a stream value.
    pub fn try_read_raw_value(
        &self,
        input: impl Read,
        format: Format,
    ) -> ODataResult<Container<PrimitiveValue>> {
        let value = match format {
            Format::Text => {
                let bytes = consume(input)?;
                let text = String::from_utf8(bytes)
                    .map_err(|e| ODataError::invalid_value("Edm.String", e.to_string()))?;
                PrimitiveValue::string(text)
            }
            Format::Binary => PrimitiveValue::stream(&consume(input)?),
            _ => return Err(unsupported_shape(format, ReadShape::RawValue)),
        };
        Ok(Container::new(value))
    }

    // === Service-level documents ===

    pub fn read_error(&self, input: impl Read, format: Format) -> Option<Container<ServerError>> {
        degrade(ReadShape::ErrorPayload, self.try_read_error(input, format))
    }

    pub fn try_read_error(
        &self,
        input: impl Read,
        format: Format,
    ) -> ODataResult<Container<ServerError>> {
        let family = resource_family(format, ReadShape::ErrorPayload)?;
        let bytes = consume(input)?;
        Ok(Container::new(self.factory().deserialize_error(&bytes, family)?))
    }

    pub fn read_metadata(
        &self,
        input: impl Read,
        format: Format,
    ) -> Option<Container<MetadataDocument>> {
        degrade(ReadShape::Metadata, self.try_read_metadata(input, format))
    }

    pub fn try_read_metadata(
        &self,
        input: impl Read,
        format: Format,
    ) -> ODataResult<Container<MetadataDocument>> {
        let family = resource_family(format, ReadShape::Metadata)?;
        let bytes = consume(input)?;
        Ok(Container::new(self.factory().deserialize_metadata(&bytes, family)?))
    }

    pub fn read_service_document(
        &self,
        input: impl Read,
        format: Format,
    ) -> Option<Container<ServiceDocument>> {
        degrade(
            ReadShape::ServiceDocument,
            self.try_read_service_document(input, format),
        )
    }

    pub fn try_read_service_document(
        &self,
        input: impl Read,
        format: Format,
    ) -> ODataResult<Container<ServiceDocument>> {
        let family = resource_family(format, ReadShape::ServiceDocument)?;
        let bytes = consume(input)?;
        let wire = self.factory().deserialize_service_document(&bytes, family)?;
        let document = self
            .binder
            .unbind_service_document(&wire, self.base.as_ref())?;
        Ok(Container {
            context_url: document.metadata_context.clone(),
            metadata_etag: None,
            payload: document,
        })
    }

    fn factory(&self) -> &ResourceFactory {
        self.binder.factory()
    }

    fn effective_base(&self, declared: Option<&str>) -> ODataResult<Option<Url>> {
        match &self.base {
            Some(base) => Ok(Some(base.clone())),
            None => parse_base(declared),
        }
    }
}

/// Read the whole input and release it.
fn consume(mut input: impl Read) -> ODataResult<Vec<u8>> {
    let mut bytes = Vec::new();
    let result = input.read_to_end(&mut bytes);
    drop(input);
    result?;
    Ok(bytes)
}

fn resource_family(format: Format, shape: ReadShape) -> ODataResult<ResourceFamily> {
    if format.is_raw() {
        return Err(unsupported_shape(format, shape));
    }
    ResourceFactory::family_for(format)
}

fn unsupported_shape(format: Format, shape: ReadShape) -> ODataError {
    ODataError::UnsupportedTargetShape(format!("cannot read a {} from a {} payload", shape, format))
}

fn context_url(context: Option<&str>, base: Option<&Url>) -> ODataResult<Option<Url>> {
    context.map(|c| resolve(base, c)).transpose()
}

fn degrade<T>(shape: ReadShape, result: ODataResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(%shape, error = %e, "Failed to read payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odata_common::ServiceVersion;
    use test_utils::assert_odata_err;
    use test_utils::fixtures::payloads;

    fn v4() -> Reader {
        Reader::new(Binder::new(ServiceVersion::V4))
    }

    #[test]
    fn test_read_entity_set_carries_context() {
        let container = v4()
            .read_entity_set(payloads::V4_JSON_FEED.as_bytes(), Format::Json)
            .unwrap();
        assert_eq!(
            container.context_url.unwrap().as_str(),
            "http://host/service/$metadata#Customers"
        );
        assert_eq!(container.payload.len(), 2);
        assert_eq!(container.payload.count, Some(2));
    }

    #[test]
    fn test_property_context_uses_declared_base() {
        let xml = br#"<d:Name xmlns:d="http://docs.oasis-open.org/odata/ns/data"
            xmlns:m="http://docs.oasis-open.org/odata/ns/metadata"
            xml:base="http://h/svc/"
            m:context="$metadata#Customers(1)/Name">Ada</d:Name>"#;

        let container = v4().try_read_property(&xml[..], Format::Xml).unwrap();
        assert_eq!(
            container.context_url.unwrap().as_str(),
            "http://h/svc/$metadata#Customers(1)/Name"
        );
        assert_eq!(container.payload.name, "Name");

        // The reader's own base still wins
        let reader = v4().with_base(Some(Url::parse("http://other/root/").unwrap()));
        let container = reader.try_read_property(&xml[..], Format::Xml).unwrap();
        assert_eq!(
            container.context_url.unwrap().as_str(),
            "http://other/root/$metadata#Customers(1)/Name"
        );
    }

    #[test]
    fn test_failure_degrades_to_none() {
        assert!(v4().read_entity(&b"{not json"[..], Format::Json).is_none());
        assert!(v4().parse(&b"<broken"[..], Format::Atom, ReadShape::Entity).is_none());
    }

    #[test]
    fn test_raw_value_shapes() {
        let text = v4().read_raw_value(&b"hello"[..], Format::Text).unwrap();
        assert_eq!(text.payload.text(), "hello");

        let binary = v4().read_raw_value(&[0u8, 1, 2][..], Format::Binary).unwrap();
        assert_eq!(binary.payload.as_bytes().unwrap(), vec![0, 1, 2]);

        assert_odata_err!(v4().try_read_raw_value(&b"{}"[..], Format::Json), UnsupportedTargetShape);
        assert_odata_err!(v4().try_read_entity(&b"x"[..], Format::Text), UnsupportedTargetShape);
    }

    #[test]
    fn test_invalid_utf8_text_rejected() {
        assert_odata_err!(v4().try_read_raw_value(&[0xffu8, 0xfe][..], Format::Text), InvalidValue);
    }

    #[test]
    fn test_shape_names() {
        for shape in [
            ReadShape::EntitySet,
            ReadShape::Entity,
            ReadShape::Property,
            ReadShape::RawValue,
            ReadShape::ErrorPayload,
            ReadShape::Metadata,
            ReadShape::ServiceDocument,
            ReadShape::StreamingEntitySet,
        ] {
            assert_eq!(ReadShape::parse(shape.as_str()), Some(shape));
        }
        assert_eq!(ReadShape::parse("feed"), Some(ReadShape::EntitySet));
        assert!(ReadShape::parse("nope").is_none());
    }

    #[test]
    fn test_parse_streaming_shape_returns_iterator() {
        let container = v4()
            .parse(payloads::V4_JSON_FEED.as_bytes(), Format::Json, ReadShape::StreamingEntitySet)
            .unwrap();
        match container.payload {
            Payload::Iterator(iterator) => assert_eq!((&iterator).count(), Some(2)),
            other => panic!("Expected iterator, got {:?}", other),
        }
    }
}

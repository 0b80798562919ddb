//! Payload writer.
//!
//! Binds domain objects to wire resources and serializes them into an
//! in-memory buffer. Each call returns a fresh stream positioned at the
//! start of the buffer. Errors propagate to the caller.

use bytes::buf::Reader as BytesReader;
use bytes::{Buf, Bytes};
use odata_common::{Entity, EntitySet, Format, Link, ODataResult, Property};
use odata_wire::{ResourceFactory, ResourceFamily};
use tracing::debug;

use crate::binder::Binder;

/// Readable output of a write.
pub type WrittenPayload = BytesReader<Bytes>;

#[derive(Debug, Clone)]
pub struct Writer {
    binder: Binder,
}

impl Writer {
    pub fn new(binder: Binder) -> Self {
        Self { binder }
    }

    /// Writing one entity is writing a one-element sequence.
    pub fn write_entity(&self, entity: &Entity, format: Format) -> ODataResult<WrittenPayload> {
        self.write_entities(std::slice::from_ref(entity), format)
    }

    /// Entries written back to back, without a feed around them.
    pub fn write_entities(&self, entities: &[Entity], format: Format) -> ODataResult<WrittenPayload> {
        let family = ResourceFactory::family_for(format)?;
        let entries: Vec<_> = entities
            .iter()
            .map(|e| self.binder.bind_entity(e, family))
            .collect();
        let bytes = self.factory().serialize_entries(&entries, family)?;
        debug!(entities = entries.len(), %format, bytes = bytes.len(), "Wrote entities");
        Ok(into_stream(bytes))
    }

    pub fn write_entity_set(&self, set: &EntitySet, format: Format) -> ODataResult<WrittenPayload> {
        let family = ResourceFactory::family_for(format)?;
        let feed = self.binder.bind_feed(set, family);
        let bytes = self.factory().serialize_feed(&feed)?;
        debug!(entities = set.len(), %format, bytes = bytes.len(), "Wrote entity set");
        Ok(into_stream(bytes))
    }

    pub fn write_property(&self, property: &Property, format: Format) -> ODataResult<WrittenPayload> {
        let family = ResourceFactory::family_for(format)?;
        let wire = self.binder.bind_property(property, family);
        Ok(into_stream(self.factory().serialize_property(&wire)?))
    }

    pub fn write_link(&self, link: &Link, format: Format) -> ODataResult<WrittenPayload> {
        let family: ResourceFamily = ResourceFactory::family_for(format)?;
        let wire = self.binder.bind_link(link, family);
        Ok(into_stream(self.factory().serialize_link(&wire, family)?))
    }

    fn factory(&self) -> &ResourceFactory {
        self.binder.factory()
    }
}

fn into_stream(bytes: Vec<u8>) -> WrittenPayload {
    Bytes::from(bytes).reader()
}

#[cfg(test)]
mod tests {
    use super::*;
    use odata_common::ServiceVersion;
    use std::io::Read;
    use test_utils::{assert_odata_err, customer};

    fn read_all(mut payload: WrittenPayload) -> String {
        let mut text = String::new();
        payload.read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn test_single_entity_matches_one_element_sequence() {
        let writer = Writer::new(Binder::new(ServiceVersion::V4));
        let entity = customer(1);
        let one = read_all(writer.write_entity(&entity, Format::Json).unwrap());
        let many = read_all(writer.write_entities(&[entity], Format::Json).unwrap());
        assert_eq!(one, many);
        assert!(one.starts_with('{'));
    }

    #[test]
    fn test_each_write_starts_at_zero() {
        let writer = Writer::new(Binder::new(ServiceVersion::V3));
        let property = Property::new("Name", odata_common::PrimitiveValue::string("x"));
        let first = read_all(writer.write_property(&property, Format::Atom).unwrap());
        let second = read_all(writer.write_property(&property, Format::Atom).unwrap());
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_raw_formats_rejected() {
        let writer = Writer::new(Binder::new(ServiceVersion::V4));
        assert_odata_err!(writer.write_entity(&customer(1), Format::Text), UnsupportedFormat);
    }
}

//! Version-selected client.

use std::io::Read;

use odata_common::{
    Entity, EntitySet, Link, ODataResult, Property, ServiceVersion, Url,
};
use tracing::info;

use crate::binder::Binder;
use crate::config::ClientConfig;
use crate::iterator::EntitySetIterator;
use crate::reader::{Container, Reader};
use crate::writer::{WrittenPayload, Writer};

/// Entry point that fixes the protocol version and formats once.
///
/// The configured version flows into the binder, and through it into the
/// resource factory; nothing downstream consults the version again.
#[derive(Debug, Clone)]
pub struct ODataClient {
    config: ClientConfig,
    reader: Reader,
    writer: Writer,
}

impl ODataClient {
    pub fn new(config: ClientConfig) -> ODataResult<Self> {
        config
            .validate()
            .map_err(odata_common::ODataError::InvalidConfig)?;
        let binder = Binder::new(config.version).with_types(config.emit_types);
        info!(
            version = %config.version,
            format = %config.format,
            property_format = %config.property_format,
            "Created OData client"
        );
        Ok(Self {
            reader: Reader::new(binder),
            writer: Writer::new(binder),
            config,
        })
    }

    pub fn for_version(version: ServiceVersion) -> ODataResult<Self> {
        Self::new(ClientConfig::for_version(version))
    }

    /// Resolve relative hrefs of every payload against `base` instead of the
    /// base the payload declares.
    pub fn with_base(mut self, base: Option<Url>) -> Self {
        self.reader = self.reader.with_base(base);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn version(&self) -> ServiceVersion {
        self.config.version
    }

    pub fn binder(&self) -> &Binder {
        self.reader.binder()
    }

    pub fn reader(&self) -> &Reader {
        &self.reader
    }

    pub fn writer(&self) -> &Writer {
        &self.writer
    }

    // === Configured-format shortcuts ===

    pub fn read_entity(&self, input: impl Read) -> Option<Container<Entity>> {
        self.reader.read_entity(input, self.config.format)
    }

    pub fn read_entity_set(&self, input: impl Read) -> Option<Container<EntitySet>> {
        self.reader.read_entity_set(input, self.config.format)
    }

    pub fn read_property(&self, input: impl Read) -> Option<Container<Property>> {
        self.reader.read_property(input, self.config.property_format)
    }

    pub fn entity_set_iter(&self, input: impl Read + Send + 'static) -> Option<EntitySetIterator> {
        self.reader.read_entity_set_iter(input, self.config.format)
    }

    pub fn write_entity(&self, entity: &Entity) -> ODataResult<WrittenPayload> {
        self.writer.write_entity(entity, self.config.format)
    }

    pub fn write_entity_set(&self, set: &EntitySet) -> ODataResult<WrittenPayload> {
        self.writer.write_entity_set(set, self.config.format)
    }

    pub fn write_property(&self, property: &Property) -> ODataResult<WrittenPayload> {
        self.writer.write_property(property, self.config.property_format)
    }

    pub fn write_link(&self, link: &Link) -> ODataResult<WrittenPayload> {
        self.writer.write_link(link, self.config.property_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odata_common::Format;
    use test_utils::customer;

    fn assert_send_sync<T: Send + Sync>() {}
    fn assert_send<T: Send>() {}

    #[test]
    fn test_thread_safety() {
        assert_send_sync::<ODataClient>();
        assert_send_sync::<crate::Binder>();
        assert_send_sync::<crate::Reader>();
        assert_send_sync::<crate::Writer>();
        assert_send::<crate::EntitySetIterator>();
    }

    #[test]
    fn test_version_flows_into_binder() {
        let client = ODataClient::for_version(ServiceVersion::V4).unwrap();
        assert_eq!(client.binder().version(), ServiceVersion::V4);
        assert_eq!(client.config().format, Format::Json);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ClientConfig {
            format: Format::Binary,
            ..ClientConfig::default()
        };
        assert!(ODataClient::new(config).is_err());
    }

    #[test]
    fn test_entity_round_trip_through_configured_format() {
        for version in [ServiceVersion::V3, ServiceVersion::V4] {
            let client = ODataClient::for_version(version).unwrap();
            let entity = customer(3);
            let written = client.write_entity(&entity).unwrap();
            let read = client.read_entity(written).unwrap();
            assert_eq!(read.payload, entity, "{}", version);
        }
    }
}

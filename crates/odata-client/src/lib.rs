//! OData client data binding.
//!
//! Converts between the wire resource trees of `odata-wire` and the domain
//! model of `odata-common`:
//!
//! - [`Binder`] maps entities, links, properties and values in both
//!   directions
//! - [`Reader`] turns a byte stream into a requested result shape
//! - [`Writer`] turns domain objects into a readable byte stream
//! - [`EntitySetIterator`] streams the entities of a large feed
//! - [`ODataClient`] ties them together for one configured service version

pub mod binder;
pub mod client;
pub mod config;
pub mod iterator;
pub mod reader;
pub mod writer;

pub use binder::Binder;
pub use client::ODataClient;
pub use config::ClientConfig;
pub use iterator::EntitySetIterator;
pub use reader::{Container, Payload, ReadShape, Reader};
pub use writer::{WrittenPayload, Writer};

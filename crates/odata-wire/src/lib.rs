//! Wire-level OData documents.
//!
//! Turns Atom/XML and JSON payloads into a format-tagged wire resource tree
//! and back, and carries the GML codec used for geospatial values.

mod atom;
mod edmx;
pub mod element;
pub mod factory;
pub mod gml;
mod json;
pub mod resource;
mod service;

pub use atom::AtomEntryStream;
pub use element::Element;
pub use factory::{ResourceFactory, ResourceType, WireEntryStream};
pub use json::JsonEntryStream;
pub use resource::{
    ResourceFamily, WireEntry, WireEntryLink, WireFeed, WireLink, WireOperation, WireProperty,
    WireServiceDocument, WireServiceItem, WireValue,
};

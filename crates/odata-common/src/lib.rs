//! Common types shared across the OData client crates.
//!
//! The domain model here is version-independent: the same entities, links
//! and values are produced from Atom and JSON payloads of V3 and V4 services.

pub mod document;
pub mod edm;
pub mod entity;
pub mod error;
pub mod format;
pub mod geo;
pub mod link;
pub mod uri;
pub mod value;
pub mod version;

pub use document::{MetadataDocument, ServerError, ServiceDocument, ServiceDocumentItem};
pub use edm::EdmPrimitiveType;
pub use entity::{Entity, EntitySet, Operation};
pub use error::{ODataError, ODataResult};
pub use format::Format;
pub use geo::{
    Dimension, GeoShape, GeoValue, Geometry, GeometryCollection, GeospatialType, LineString,
    MultiLineString, MultiPoint, MultiPolygon, Point, Polygon,
};
pub use link::{Inline, Link, LinkKind};
pub use value::{CollectionValue, ComplexValue, PrimitiveValue, Property, Value};
pub use version::ServiceVersion;

pub use url::Url;

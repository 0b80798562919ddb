//! JSON resource family.
//!
//! Entries are JSON objects whose protocol data travels in annotations
//! (`@odata.etag` in V4, `odata.etag` in V3); per-property data uses
//! `Name@odata.<annotation>` keys placed before the property itself.
//! Geospatial values are written as GeoJSON.

mod de;
mod geojson;
mod ser;
mod stream;

pub(crate) use de::JsonDeserializer;
pub(crate) use ser::JsonSerializer;
pub use stream::JsonEntryStream;

pub(crate) const VALUE: &str = "value";

// annotation names, prefixed per version at use
pub(crate) const CONTEXT: &str = "context";
pub(crate) const METADATA_ETAG: &str = "metadataEtag";
pub(crate) const TYPE: &str = "type";
pub(crate) const ETAG: &str = "etag";
pub(crate) const EDIT_LINK: &str = "editLink";
pub(crate) const READ_LINK: &str = "readLink";
pub(crate) const MEDIA_READ_LINK: &str = "mediaReadLink";
pub(crate) const MEDIA_CONTENT_TYPE: &str = "mediaContentType";
pub(crate) const MEDIA_EDIT_LINK: &str = "mediaEditLink";
pub(crate) const MEDIA_ETAG: &str = "mediaEtag";
pub(crate) const COUNT: &str = "count";
pub(crate) const NEXT_LINK: &str = "nextLink";

/// Key of an operation advertised by an entry, e.g. `#NS.Reset`.
pub(crate) fn operation_key(metadata_anchor: &str) -> String {
    match metadata_anchor.find('#') {
        Some(idx) => metadata_anchor[idx..].to_string(),
        None => format!("#{}", metadata_anchor),
    }
}

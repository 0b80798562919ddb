//! Atom/XML resource family.

mod de;
mod ser;
mod stream;

pub(crate) use de::AtomDeserializer;
pub(crate) use ser::AtomSerializer;
pub use stream::AtomEntryStream;

pub(crate) const FEED: &str = "feed";
pub(crate) const ENTRY: &str = "entry";
pub(crate) const LINK: &str = "link";
pub(crate) const CATEGORY: &str = "category";
pub(crate) const CONTENT: &str = "content";
pub(crate) const XML_BASE: &str = "xml:base";

pub(crate) const M_PROPERTIES: &str = "m:properties";
pub(crate) const M_INLINE: &str = "m:inline";
pub(crate) const M_COUNT: &str = "m:count";
pub(crate) const M_TYPE: &str = "m:type";
pub(crate) const M_NULL: &str = "m:null";
pub(crate) const M_ETAG: &str = "m:etag";
pub(crate) const M_CONTEXT: &str = "m:context";
pub(crate) const M_METADATA_ETAG: &str = "m:metadata-etag";
pub(crate) const M_ACTION: &str = "m:action";
pub(crate) const M_FUNCTION: &str = "m:function";
pub(crate) const M_VALUE: &str = "m:value";
pub(crate) const D_ELEMENT: &str = "d:element";
pub(crate) const M_ELEMENT: &str = "m:element";

// Type markers for empty values that carry no type name, so an empty
// collection or complex value does not read back as an empty string.
// Qualified type names always contain a dot, so these never collide.
pub(crate) const UNTYPED_COLLECTION: &str = "Collection";
pub(crate) const UNTYPED_COMPLEX: &str = "Complex";

pub(crate) const REL_EDIT: &str = "edit";
pub(crate) const REL_SELF: &str = "self";
pub(crate) const REL_NEXT: &str = "next";

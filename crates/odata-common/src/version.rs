//! Protocol version vocabulary.
//!
//! V3 and V4 services differ in namespaces, link relation prefixes, JSON
//! annotation spelling and version headers. Everything version-specific in
//! the workspace is looked up here.

use serde::{Deserialize, Serialize};

use crate::link::LinkKind;

const V3_DATA_NS: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices";
const V3_METADATA_NS: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/metadata";
const V4_DATA_NS: &str = "http://docs.oasis-open.org/odata/ns/data";
const V4_METADATA_NS: &str = "http://docs.oasis-open.org/odata/ns/metadata";

/// OData protocol version spoken by a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceVersion {
    #[default]
    V3,
    V4,
}

impl ServiceVersion {
    /// Parse a version string such as "3.0", "4", "v4".
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().trim_start_matches(['v', 'V']) {
            "3" | "3.0" => Some(ServiceVersion::V3),
            "4" | "4.0" | "4.01" => Some(ServiceVersion::V4),
            _ => None,
        }
    }

    /// Version number as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceVersion::V3 => "3.0",
            ServiceVersion::V4 => "4.0",
        }
    }

    /// Name of the protocol version header.
    pub fn version_header(&self) -> &'static str {
        match self {
            ServiceVersion::V3 => "DataServiceVersion",
            ServiceVersion::V4 => "OData-Version",
        }
    }

    /// Name of the maximum protocol version header.
    pub fn max_version_header(&self) -> &'static str {
        match self {
            ServiceVersion::V3 => "MaxDataServiceVersion",
            ServiceVersion::V4 => "OData-MaxVersion",
        }
    }

    /// Namespace of data service (property) elements.
    pub fn data_namespace(&self) -> &'static str {
        match self {
            ServiceVersion::V3 => V3_DATA_NS,
            ServiceVersion::V4 => V4_DATA_NS,
        }
    }

    /// Namespace of metadata elements and attributes.
    pub fn metadata_namespace(&self) -> &'static str {
        match self {
            ServiceVersion::V3 => V3_METADATA_NS,
            ServiceVersion::V4 => V4_METADATA_NS,
        }
    }

    /// Category scheme carrying the entity type.
    pub fn type_scheme(&self) -> &'static str {
        match self {
            ServiceVersion::V3 => "http://schemas.microsoft.com/ado/2007/08/dataservices/scheme",
            ServiceVersion::V4 => "http://docs.oasis-open.org/odata/ns/scheme",
        }
    }

    pub fn navigation_rel_prefix(&self) -> &'static str {
        match self {
            ServiceVersion::V3 => "http://schemas.microsoft.com/ado/2007/08/dataservices/related/",
            ServiceVersion::V4 => "http://docs.oasis-open.org/odata/ns/related/",
        }
    }

    pub fn association_rel_prefix(&self) -> &'static str {
        match self {
            ServiceVersion::V3 => {
                "http://schemas.microsoft.com/ado/2007/08/dataservices/relatedlinks/"
            }
            ServiceVersion::V4 => "http://docs.oasis-open.org/odata/ns/relatedlinks/",
        }
    }

    pub fn media_edit_rel_prefix(&self) -> &'static str {
        match self {
            ServiceVersion::V3 => {
                "http://schemas.microsoft.com/ado/2007/08/dataservices/edit-media/"
            }
            ServiceVersion::V4 => "http://docs.oasis-open.org/odata/ns/edit-media/",
        }
    }

    /// Link relation for a link of the given kind and name.
    pub fn rel_for(&self, kind: LinkKind, name: &str) -> String {
        let prefix = match kind {
            LinkKind::Navigation => self.navigation_rel_prefix(),
            LinkKind::Association => self.association_rel_prefix(),
            LinkKind::MediaEdit => self.media_edit_rel_prefix(),
        };
        format!("{}{}", prefix, name)
    }

    /// Classify a link relation. Returns `None` for relations that are not
    /// entity links (edit, self, next, ...).
    pub fn link_kind(&self, rel: &str) -> Option<LinkKind> {
        if rel.starts_with(self.association_rel_prefix()) {
            Some(LinkKind::Association)
        } else if rel.starts_with(self.navigation_rel_prefix()) {
            Some(LinkKind::Navigation)
        } else if rel.starts_with(self.media_edit_rel_prefix()) {
            Some(LinkKind::MediaEdit)
        } else {
            None
        }
    }

    /// Prefix of JSON instance annotations ("odata." or "@odata.").
    pub fn annotation_prefix(&self) -> &'static str {
        match self {
            ServiceVersion::V3 => "odata.",
            ServiceVersion::V4 => "@odata.",
        }
    }

    /// Full JSON key of an instance annotation, e.g. `@odata.context`.
    pub fn annotation(&self, name: &str) -> String {
        let name = match (self, name) {
            // V3 calls the context URL "metadata"
            (ServiceVersion::V3, "context") => "metadata",
            _ => name,
        };
        format!("{}{}", self.annotation_prefix(), name)
    }

    /// Full JSON key of a property annotation, e.g. `Name@odata.type`.
    pub fn property_annotation(&self, property: &str, name: &str) -> String {
        format!("{}@odata.{}", property, name)
    }

    /// Annotation name used for navigation link URLs.
    pub fn navigation_link_annotation(&self) -> &'static str {
        match self {
            ServiceVersion::V3 => "navigationLinkUrl",
            ServiceVersion::V4 => "navigationLink",
        }
    }

    /// Annotation name used for association link URLs.
    pub fn association_link_annotation(&self) -> &'static str {
        match self {
            ServiceVersion::V3 => "associationLinkUrl",
            ServiceVersion::V4 => "associationLink",
        }
    }

    /// Top-level key of a JSON error document.
    pub fn json_error_key(&self) -> &'static str {
        match self {
            ServiceVersion::V3 => "odata.error",
            ServiceVersion::V4 => "error",
        }
    }

    /// Key of a single link in a JSON `$links`/`$ref` document.
    pub fn json_link_key(&self) -> String {
        match self {
            ServiceVersion::V3 => "url".to_string(),
            ServiceVersion::V4 => self.annotation("id"),
        }
    }

    /// Format a type name for a JSON type annotation value.
    pub fn json_type_value(&self, type_name: &str) -> String {
        match self {
            ServiceVersion::V3 => type_name.to_string(),
            ServiceVersion::V4 => format!("#{}", type_name),
        }
    }

    /// Format a type name for an Atom category term.
    pub fn category_term(&self, type_name: &str) -> String {
        self.json_type_value(type_name)
    }

    /// Element wrapping each item of an Atom/XML collection value.
    pub fn collection_item_element(&self) -> &'static str {
        match self {
            ServiceVersion::V3 => "d:element",
            ServiceVersion::V4 => "m:element",
        }
    }
}

impl std::fmt::Display for ServiceVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_item_element() {
        assert_eq!(ServiceVersion::V3.collection_item_element(), "d:element");
        assert_eq!(ServiceVersion::V4.collection_item_element(), "m:element");
    }

    #[test]
    fn test_parse_versions() {
        assert_eq!(ServiceVersion::parse("3.0"), Some(ServiceVersion::V3));
        assert_eq!(ServiceVersion::parse("v4"), Some(ServiceVersion::V4));
        assert_eq!(ServiceVersion::parse("V3"), Some(ServiceVersion::V3));
        assert_eq!(ServiceVersion::parse("2.0"), None);
    }

    #[test]
    fn test_link_kind_classification() {
        let v = ServiceVersion::V3;
        assert_eq!(
            v.link_kind(&v.rel_for(LinkKind::Association, "Orders")),
            Some(LinkKind::Association)
        );
        assert_eq!(
            v.link_kind(&v.rel_for(LinkKind::Navigation, "Orders")),
            Some(LinkKind::Navigation)
        );
        assert_eq!(
            v.link_kind(&v.rel_for(LinkKind::MediaEdit, "Photo")),
            Some(LinkKind::MediaEdit)
        );
        assert_eq!(v.link_kind("edit"), None);
        // V4 relations are not V3 relations
        assert_eq!(
            v.link_kind(&ServiceVersion::V4.rel_for(LinkKind::Navigation, "Orders")),
            None
        );
    }

    #[test]
    fn test_annotations() {
        assert_eq!(ServiceVersion::V3.annotation("context"), "odata.metadata");
        assert_eq!(ServiceVersion::V4.annotation("context"), "@odata.context");
        assert_eq!(ServiceVersion::V4.annotation("nextLink"), "@odata.nextLink");
        assert_eq!(
            ServiceVersion::V3.property_annotation("Name", "type"),
            "Name@odata.type"
        );
        assert_eq!(ServiceVersion::V4.json_type_value("NS.Customer"), "#NS.Customer");
        assert_eq!(ServiceVersion::V4.json_link_key(), "@odata.id");
    }
}

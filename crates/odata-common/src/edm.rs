//! EDM primitive types.
//!
//! Only name resolution is handled here: facets, type compatibility and
//! schema loading belong to a metadata layer this workspace does not carry.

use crate::error::{ODataError, ODataResult};
use crate::geo::GeospatialType;
use crate::version::ServiceVersion;

/// Namespace of the built-in EDM types.
pub const EDM_NAMESPACE: &str = "Edm";

/// An EDM primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdmPrimitiveType {
    Binary,
    Boolean,
    Byte,
    SByte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    String,
    Guid,
    /// V3 only
    DateTime,
    DateTimeOffset,
    /// V3 only
    Time,
    /// V4 only
    Date,
    /// V4 only
    TimeOfDay,
    /// V4 only
    Duration,
    Stream,
    Geospatial(GeospatialType),
}

const SIMPLE_TYPES: &[(&str, EdmPrimitiveType)] = &[
    ("Binary", EdmPrimitiveType::Binary),
    ("Boolean", EdmPrimitiveType::Boolean),
    ("Byte", EdmPrimitiveType::Byte),
    ("SByte", EdmPrimitiveType::SByte),
    ("Int16", EdmPrimitiveType::Int16),
    ("Int32", EdmPrimitiveType::Int32),
    ("Int64", EdmPrimitiveType::Int64),
    ("Single", EdmPrimitiveType::Single),
    ("Double", EdmPrimitiveType::Double),
    ("Decimal", EdmPrimitiveType::Decimal),
    ("String", EdmPrimitiveType::String),
    ("Guid", EdmPrimitiveType::Guid),
    ("DateTime", EdmPrimitiveType::DateTime),
    ("DateTimeOffset", EdmPrimitiveType::DateTimeOffset),
    ("Time", EdmPrimitiveType::Time),
    ("Date", EdmPrimitiveType::Date),
    ("TimeOfDay", EdmPrimitiveType::TimeOfDay),
    ("Duration", EdmPrimitiveType::Duration),
    ("Stream", EdmPrimitiveType::Stream),
];

impl EdmPrimitiveType {
    /// Name without namespace, e.g. `Int32`.
    pub fn local_name(&self) -> String {
        match self {
            EdmPrimitiveType::Geospatial(geo) => geo.local_name(),
            other => SIMPLE_TYPES
                .iter()
                .find(|(_, t)| t == other)
                .map(|(name, _)| name.to_string())
                .unwrap_or_default(),
        }
    }

    /// Fully qualified name, e.g. `Edm.Int32`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", EDM_NAMESPACE, self.local_name())
    }

    /// Resolve a type name for the given service version.
    ///
    /// Accepts `Edm.X` in both versions and a bare `X` or `#X` in V4, where
    /// the namespace of primitive types may be omitted.
    pub fn from_name(name: &str, version: ServiceVersion) -> ODataResult<Self> {
        let trimmed = name.trim().trim_start_matches('#');
        let local = match trimmed.strip_prefix("Edm.") {
            Some(local) => local,
            None if version == ServiceVersion::V4 => trimmed,
            None => return Err(ODataError::UnknownDeclaredType(name.to_string())),
        };

        let resolved = SIMPLE_TYPES
            .iter()
            .find(|(n, _)| *n == local)
            .map(|(_, t)| *t)
            .or_else(|| GeospatialType::from_local_name(local).map(EdmPrimitiveType::Geospatial))
            .ok_or_else(|| ODataError::UnknownDeclaredType(name.to_string()))?;

        if resolved.supported_by(version) {
            Ok(resolved)
        } else {
            Err(ODataError::UnknownDeclaredType(format!(
                "{} (not defined in OData {})",
                name, version
            )))
        }
    }

    /// Whether the type exists in the given protocol version.
    pub fn supported_by(&self, version: ServiceVersion) -> bool {
        match self {
            EdmPrimitiveType::DateTime | EdmPrimitiveType::Time => version == ServiceVersion::V3,
            EdmPrimitiveType::Date | EdmPrimitiveType::TimeOfDay | EdmPrimitiveType::Duration => {
                version == ServiceVersion::V4
            }
            _ => true,
        }
    }

    pub fn is_geospatial(&self) -> bool {
        matches!(self, EdmPrimitiveType::Geospatial(_))
    }

    pub fn as_geospatial(&self) -> Option<GeospatialType> {
        match self {
            EdmPrimitiveType::Geospatial(geo) => Some(*geo),
            _ => None,
        }
    }

    /// Whether values of this type are written as JSON numbers.
    pub fn is_json_number(&self) -> bool {
        matches!(
            self,
            EdmPrimitiveType::Byte
                | EdmPrimitiveType::SByte
                | EdmPrimitiveType::Int16
                | EdmPrimitiveType::Int32
                | EdmPrimitiveType::Single
                | EdmPrimitiveType::Double
        )
    }
}

impl std::fmt::Display for EdmPrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// Item type of a `Collection(T)` type name.
pub fn collection_item_type(type_name: &str) -> Option<&str> {
    type_name
        .trim_start_matches('#')
        .strip_prefix("Collection(")
        .and_then(|rest| rest.strip_suffix(')'))
}

/// Wrap a type name as `Collection(T)`.
pub fn collection_type(item_type: &str) -> String {
    format!("Collection({})", item_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{Dimension, GeoShape};

    #[test]
    fn test_resolve_qualified_names() {
        assert_eq!(
            EdmPrimitiveType::from_name("Edm.Int32", ServiceVersion::V3).unwrap(),
            EdmPrimitiveType::Int32
        );
        assert_eq!(
            EdmPrimitiveType::from_name("Edm.GeographyPoint", ServiceVersion::V3).unwrap(),
            EdmPrimitiveType::Geospatial(GeospatialType::new(
                Dimension::Geography,
                GeoShape::Point
            ))
        );
    }

    #[test]
    fn test_bare_names_only_in_v4() {
        assert_eq!(
            EdmPrimitiveType::from_name("#Int64", ServiceVersion::V4).unwrap(),
            EdmPrimitiveType::Int64
        );
        assert!(matches!(
            EdmPrimitiveType::from_name("Int64", ServiceVersion::V3),
            Err(ODataError::UnknownDeclaredType(_))
        ));
    }

    #[test]
    fn test_version_specific_types() {
        assert!(EdmPrimitiveType::from_name("Edm.DateTime", ServiceVersion::V3).is_ok());
        assert!(EdmPrimitiveType::from_name("Edm.DateTime", ServiceVersion::V4).is_err());
        assert!(EdmPrimitiveType::from_name("Edm.Date", ServiceVersion::V4).is_ok());
        assert!(EdmPrimitiveType::from_name("Edm.Date", ServiceVersion::V3).is_err());
    }

    #[test]
    fn test_unknown_type() {
        let err = EdmPrimitiveType::from_name("NS.Address", ServiceVersion::V3).unwrap_err();
        assert!(matches!(err, ODataError::UnknownDeclaredType(name) if name == "NS.Address"));
    }

    #[test]
    fn test_names_round_trip() {
        for (name, t) in SIMPLE_TYPES {
            assert_eq!(t.local_name(), *name);
        }
        assert_eq!(EdmPrimitiveType::Double.full_name(), "Edm.Double");
    }

    #[test]
    fn test_collection_type_names() {
        assert_eq!(collection_item_type("Collection(Edm.Int32)"), Some("Edm.Int32"));
        assert_eq!(collection_item_type("#Collection(NS.Address)"), Some("NS.Address"));
        assert_eq!(collection_item_type("Edm.Int32"), None);
        assert_eq!(collection_type("Edm.String"), "Collection(Edm.String)");
    }
}

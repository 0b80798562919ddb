//! The tagged value model: null, primitive, complex, collection and
//! geospatial values, and the named properties that hold them.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::edm::EdmPrimitiveType;
use crate::error::{ODataError, ODataResult};
use crate::geo::GeoValue;

/// A primitive value kept as its canonical wire text.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveValue {
    type_ref: Option<EdmPrimitiveType>,
    text: String,
}

impl PrimitiveValue {
    pub fn new(type_ref: Option<EdmPrimitiveType>, text: impl Into<String>) -> Self {
        Self {
            type_ref,
            text: text.into(),
        }
    }

    /// A value with no declared type.
    pub fn untyped(text: impl Into<String>) -> Self {
        Self::new(None, text)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::new(Some(EdmPrimitiveType::String), s)
    }

    pub fn boolean(b: bool) -> Self {
        Self::new(Some(EdmPrimitiveType::Boolean), b.to_string())
    }

    pub fn byte(v: u8) -> Self {
        Self::new(Some(EdmPrimitiveType::Byte), v.to_string())
    }

    pub fn int16(v: i16) -> Self {
        Self::new(Some(EdmPrimitiveType::Int16), v.to_string())
    }

    pub fn int32(v: i32) -> Self {
        Self::new(Some(EdmPrimitiveType::Int32), v.to_string())
    }

    pub fn int64(v: i64) -> Self {
        Self::new(Some(EdmPrimitiveType::Int64), v.to_string())
    }

    pub fn single(v: f32) -> Self {
        Self::new(Some(EdmPrimitiveType::Single), format_float(v as f64))
    }

    pub fn double(v: f64) -> Self {
        Self::new(Some(EdmPrimitiveType::Double), format_float(v))
    }

    /// Decimals keep their literal text to avoid binary rounding.
    pub fn decimal(literal: impl Into<String>) -> Self {
        Self::new(Some(EdmPrimitiveType::Decimal), literal)
    }

    pub fn guid(id: Uuid) -> Self {
        Self::new(Some(EdmPrimitiveType::Guid), id.hyphenated().to_string())
    }

    pub fn date_time_offset(dt: DateTime<FixedOffset>) -> Self {
        Self::new(Some(EdmPrimitiveType::DateTimeOffset), dt.to_rfc3339())
    }

    /// A V3 `Edm.DateTime` (no offset).
    pub fn date_time(dt: NaiveDateTime) -> Self {
        Self::new(
            Some(EdmPrimitiveType::DateTime),
            dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        )
    }

    /// A V4 `Edm.Date`.
    pub fn date(d: NaiveDate) -> Self {
        Self::new(Some(EdmPrimitiveType::Date), d.format("%Y-%m-%d").to_string())
    }

    pub fn binary(bytes: &[u8]) -> Self {
        Self::new(Some(EdmPrimitiveType::Binary), BASE64.encode(bytes))
    }

    /// Raw media content, base64 encoded like binary.
    pub fn stream(bytes: &[u8]) -> Self {
        Self::new(Some(EdmPrimitiveType::Stream), BASE64.encode(bytes))
    }

    pub fn type_ref(&self) -> Option<EdmPrimitiveType> {
        self.type_ref
    }

    /// Fully qualified declared type name, if any.
    pub fn type_name(&self) -> Option<String> {
        self.type_ref.map(|t| t.full_name())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn as_bool(&self) -> ODataResult<bool> {
        match self.text.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(ODataError::invalid_value("Edm.Boolean", other)),
        }
    }

    pub fn as_i64(&self) -> ODataResult<i64> {
        self.text
            .trim()
            .parse()
            .map_err(|e| ODataError::invalid_value(self.type_label(), format!("{}: {}", self.text, e)))
    }

    pub fn as_f64(&self) -> ODataResult<f64> {
        match self.text.trim() {
            "INF" => Ok(f64::INFINITY),
            "-INF" => Ok(f64::NEG_INFINITY),
            "NaN" => Ok(f64::NAN),
            other => other
                .parse()
                .map_err(|e| ODataError::invalid_value(self.type_label(), format!("{}: {}", other, e))),
        }
    }

    pub fn as_guid(&self) -> ODataResult<Uuid> {
        Uuid::parse_str(self.text.trim())
            .map_err(|e| ODataError::invalid_value("Edm.Guid", format!("{}: {}", self.text, e)))
    }

    pub fn as_date_time_offset(&self) -> ODataResult<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(self.text.trim()).map_err(|e| {
            ODataError::invalid_value("Edm.DateTimeOffset", format!("{}: {}", self.text, e))
        })
    }

    pub fn as_date_time(&self) -> ODataResult<NaiveDateTime> {
        NaiveDateTime::parse_from_str(self.text.trim(), "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(self.text.trim(), "%Y-%m-%dT%H:%M"))
            .map_err(|e| ODataError::invalid_value("Edm.DateTime", format!("{}: {}", self.text, e)))
    }

    pub fn as_date(&self) -> ODataResult<NaiveDate> {
        NaiveDate::parse_from_str(self.text.trim(), "%Y-%m-%d")
            .map_err(|e| ODataError::invalid_value("Edm.Date", format!("{}: {}", self.text, e)))
    }

    pub fn as_bytes(&self) -> ODataResult<Vec<u8>> {
        BASE64
            .decode(self.text.trim())
            .map_err(|e| ODataError::invalid_value(self.type_label(), e.to_string()))
    }

    fn type_label(&self) -> String {
        self.type_name().unwrap_or_else(|| "untyped".to_string())
    }
}

impl std::fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

fn format_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        let inf = if v > 0.0 { "INF" } else { "-INF" };
        inf.to_string()
    } else {
        v.to_string()
    }
}

/// A structured value made of named properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComplexValue {
    pub type_name: Option<String>,
    pub properties: Vec<Property>,
}

impl ComplexValue {
    pub fn new(type_name: Option<String>) -> Self {
        Self {
            type_name,
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// An ordered collection of values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollectionValue {
    pub type_name: Option<String>,
    pub items: Vec<Value>,
}

impl CollectionValue {
    pub fn new(type_name: Option<String>) -> Self {
        Self {
            type_name,
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: impl Into<Value>) -> Self {
        self.items.push(item.into());
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A property value. Exactly one case is ever populated.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Primitive(PrimitiveValue),
    Complex(ComplexValue),
    Collection(CollectionValue),
    Geospatial(GeoValue),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            Value::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<&ComplexValue> {
        match self {
            Value::Complex(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionValue> {
        match self {
            Value::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_geospatial(&self) -> Option<&GeoValue> {
        match self {
            Value::Geospatial(g) => Some(g),
            _ => None,
        }
    }

    /// The type name this value declares about itself. Never inferred.
    pub fn declared_type_name(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Primitive(p) => p.type_name(),
            Value::Complex(c) => c.type_name.clone(),
            Value::Collection(c) => c.type_name.clone(),
            Value::Geospatial(g) => Some(g.kind().full_name()),
        }
    }
}

impl From<PrimitiveValue> for Value {
    fn from(p: PrimitiveValue) -> Self {
        Value::Primitive(p)
    }
}

impl From<ComplexValue> for Value {
    fn from(c: ComplexValue) -> Self {
        Value::Complex(c)
    }
}

impl From<CollectionValue> for Value {
    fn from(c: CollectionValue) -> Self {
        Value::Collection(c)
    }
}

impl From<GeoValue> for Value {
    fn from(g: GeoValue) -> Self {
        Value::Geospatial(g)
    }
}

/// A named value.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: Value,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn null(name: impl Into<String>) -> Self {
        Self::new(name, Value::Null)
    }

    pub fn has_null_value(&self) -> bool {
        self.value.is_null()
    }
}

//! Geospatial value model.
//!
//! A geospatial value is a geometry tree plus the dimension it is interpreted
//! in. The dimension is stored once at the root, so every node of the tree
//! shares it by construction.

use serde::{Deserialize, Serialize};

use crate::error::{ODataError, ODataResult};

/// Whether coordinates are ellipsoidal (earth) or planar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Geography,
    Geometry,
}

impl Dimension {
    /// Type name prefix, also the name of the abstract supertype.
    pub fn prefix(&self) -> &'static str {
        match self {
            Dimension::Geography => "Geography",
            Dimension::Geometry => "Geometry",
        }
    }

    /// Dimension implied by a type name: anything starting with the
    /// geography prefix is Geography, everything else Geometry.
    pub fn of_type_name(name: &str) -> Self {
        let local = name.trim_start_matches('#').trim_start_matches("Edm.");
        if local.starts_with("Geography") {
            Dimension::Geography
        } else {
            Dimension::Geometry
        }
    }
}

/// The concrete geometry shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeoShape {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    Collection,
}

impl GeoShape {
    pub const ALL: [GeoShape; 7] = [
        GeoShape::Point,
        GeoShape::LineString,
        GeoShape::Polygon,
        GeoShape::MultiPoint,
        GeoShape::MultiLineString,
        GeoShape::MultiPolygon,
        GeoShape::Collection,
    ];

    /// Suffix appended to the dimension prefix in EDM type names.
    pub fn suffix(&self) -> &'static str {
        match self {
            GeoShape::Point => "Point",
            GeoShape::LineString => "LineString",
            GeoShape::Polygon => "Polygon",
            GeoShape::MultiPoint => "MultiPoint",
            GeoShape::MultiLineString => "MultiLineString",
            GeoShape::MultiPolygon => "MultiPolygon",
            GeoShape::Collection => "Collection",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        GeoShape::ALL.into_iter().find(|s| s.suffix() == suffix)
    }
}

/// An EDM geospatial type: a dimension plus a shape, or the abstract
/// supertype of the dimension when `shape` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeospatialType {
    pub dimension: Dimension,
    pub shape: Option<GeoShape>,
}

impl GeospatialType {
    pub fn new(dimension: Dimension, shape: GeoShape) -> Self {
        Self {
            dimension,
            shape: Some(shape),
        }
    }

    /// The undifferentiated `Geography` or `Geometry` supertype.
    pub fn abstract_of(dimension: Dimension) -> Self {
        Self {
            dimension,
            shape: None,
        }
    }

    pub fn is_abstract(&self) -> bool {
        self.shape.is_none()
    }

    /// The concrete shape, rejecting the abstract supertypes.
    pub fn concrete(&self) -> ODataResult<GeoShape> {
        self.shape
            .ok_or_else(|| ODataError::NotInstantiableType(self.full_name()))
    }

    /// Name without namespace, e.g. `GeographyPoint`.
    pub fn local_name(&self) -> String {
        match self.shape {
            Some(shape) => format!("{}{}", self.dimension.prefix(), shape.suffix()),
            None => self.dimension.prefix().to_string(),
        }
    }

    /// Fully qualified name, e.g. `Edm.GeographyPoint`.
    pub fn full_name(&self) -> String {
        format!("Edm.{}", self.local_name())
    }

    /// Resolve a local name such as `GeometryMultiPolygon` or `Geography`.
    pub fn from_local_name(name: &str) -> Option<Self> {
        let (dimension, rest) = if let Some(rest) = name.strip_prefix("Geography") {
            (Dimension::Geography, rest)
        } else if let Some(rest) = name.strip_prefix("Geometry") {
            (Dimension::Geometry, rest)
        } else {
            return None;
        };
        if rest.is_empty() {
            return Some(Self::abstract_of(dimension));
        }
        GeoShape::from_suffix(rest).map(|shape| Self::new(dimension, shape))
    }
}

/// A coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineString {
    pub points: Vec<Point>,
}

impl LineString {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }
}

/// A polygon with one exterior and one interior ring, either may be empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Vec<Point>,
    pub interior: Vec<Point>,
}

impl Polygon {
    pub fn new(exterior: Vec<Point>, interior: Vec<Point>) -> Self {
        Self { exterior, interior }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MultiPoint {
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MultiLineString {
    pub lines: Vec<LineString>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MultiPolygon {
    pub polygons: Vec<Polygon>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometryCollection {
    pub members: Vec<Geometry>,
}

/// A geometry tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(Point),
    LineString(LineString),
    Polygon(Polygon),
    MultiPoint(MultiPoint),
    MultiLineString(MultiLineString),
    MultiPolygon(MultiPolygon),
    Collection(GeometryCollection),
}

impl Geometry {
    pub fn shape(&self) -> GeoShape {
        match self {
            Geometry::Point(_) => GeoShape::Point,
            Geometry::LineString(_) => GeoShape::LineString,
            Geometry::Polygon(_) => GeoShape::Polygon,
            Geometry::MultiPoint(_) => GeoShape::MultiPoint,
            Geometry::MultiLineString(_) => GeoShape::MultiLineString,
            Geometry::MultiPolygon(_) => GeoShape::MultiPolygon,
            Geometry::Collection(_) => GeoShape::Collection,
        }
    }

    /// Whether the geometry has no coordinates at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point(_) => false,
            Geometry::LineString(l) => l.points.is_empty(),
            Geometry::Polygon(p) => p.exterior.is_empty() && p.interior.is_empty(),
            Geometry::MultiPoint(m) => m.points.is_empty(),
            Geometry::MultiLineString(m) => m.lines.is_empty(),
            Geometry::MultiPolygon(m) => m.polygons.is_empty(),
            Geometry::Collection(c) => c.members.is_empty(),
        }
    }
}

impl From<Point> for Geometry {
    fn from(p: Point) -> Self {
        Geometry::Point(p)
    }
}

impl From<LineString> for Geometry {
    fn from(l: LineString) -> Self {
        Geometry::LineString(l)
    }
}

impl From<Polygon> for Geometry {
    fn from(p: Polygon) -> Self {
        Geometry::Polygon(p)
    }
}

impl From<MultiPoint> for Geometry {
    fn from(m: MultiPoint) -> Self {
        Geometry::MultiPoint(m)
    }
}

impl From<MultiLineString> for Geometry {
    fn from(m: MultiLineString) -> Self {
        Geometry::MultiLineString(m)
    }
}

impl From<MultiPolygon> for Geometry {
    fn from(m: MultiPolygon) -> Self {
        Geometry::MultiPolygon(m)
    }
}

impl From<GeometryCollection> for Geometry {
    fn from(c: GeometryCollection) -> Self {
        Geometry::Collection(c)
    }
}

/// A geospatial value: a geometry interpreted in a dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoValue {
    pub dimension: Dimension,
    pub srid: Option<u32>,
    pub geometry: Geometry,
}

impl GeoValue {
    pub fn new(dimension: Dimension, geometry: impl Into<Geometry>) -> Self {
        Self {
            dimension,
            srid: None,
            geometry: geometry.into(),
        }
    }

    /// Build a value of an explicitly requested type.
    ///
    /// Fails with `NotInstantiableType` for the abstract supertypes and with
    /// `MalformedGeometry` when the geometry is not of the requested shape.
    pub fn of_type(kind: GeospatialType, geometry: impl Into<Geometry>) -> ODataResult<Self> {
        let shape = kind.concrete()?;
        let geometry = geometry.into();
        if geometry.shape() != shape {
            return Err(ODataError::MalformedGeometry(format!(
                "expected {} but got {:?}",
                kind.full_name(),
                geometry.shape()
            )));
        }
        Ok(Self::new(kind.dimension, geometry))
    }

    pub fn with_srid(mut self, srid: u32) -> Self {
        self.srid = Some(srid);
        self
    }

    pub fn shape(&self) -> GeoShape {
        self.geometry.shape()
    }

    /// The concrete EDM type of this value.
    pub fn kind(&self) -> GeospatialType {
        GeospatialType::new(self.dimension, self.shape())
    }
}

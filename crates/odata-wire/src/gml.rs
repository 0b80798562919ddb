//! GML geometry codec.
//!
//! Converts between [`GeoValue`] and the GML element trees carried by
//! geospatial properties. The root element names the shape; its content is
//! written bare, while members of Multi* and collection containers are
//! wrapped in their own shape element:
//!
//! ```text
//! <gml:Point><gml:pos>1 2</gml:pos></gml:Point>
//! <gml:MultiPoint>
//!   <gml:pointMembers>
//!     <gml:Point><gml:pos>1 2</gml:pos></gml:Point>
//!   </gml:pointMembers>
//! </gml:MultiPoint>
//! ```

use odata_common::{
    Dimension, GeoShape, GeoValue, Geometry, GeometryCollection, GeospatialType, LineString,
    MultiLineString, MultiPoint, MultiPolygon, ODataError, ODataResult, Point, Polygon,
};

use crate::element::Element;

// === Vocabulary ===

pub const GML_POINT: &str = "gml:Point";
pub const GML_POS: &str = "gml:pos";
pub const GML_LINESTRING: &str = "gml:LineString";
pub const GML_POLYGON: &str = "gml:Polygon";
pub const GML_EXTERIOR: &str = "gml:exterior";
pub const GML_INTERIOR: &str = "gml:interior";
pub const GML_LINEARRING: &str = "gml:LinearRing";
pub const GML_MULTIPOINT: &str = "gml:MultiPoint";
pub const GML_POINT_MEMBERS: &str = "gml:pointMembers";
pub const GML_MULTICURVE: &str = "gml:MultiCurve";
pub const GML_CURVE_MEMBERS: &str = "gml:curveMembers";
pub const GML_MULTISURFACE: &str = "gml:MultiSurface";
pub const GML_SURFACE_MEMBERS: &str = "gml:surfaceMembers";
pub const GML_MULTIGEOMETRY: &str = "gml:MultiGeometry";
pub const GML_GEOMETRY_MEMBERS: &str = "gml:geometryMembers";
pub const GML_SRS_NAME: &str = "gml:srsName";

const SRS_PREFIX: &str = "http://www.opengis.net/def/crs/EPSG/0/";

/// Element name of the root of a geometry of the given shape.
pub fn element_name(shape: GeoShape) -> &'static str {
    match shape {
        GeoShape::Point => GML_POINT,
        GeoShape::LineString => GML_LINESTRING,
        GeoShape::Polygon => GML_POLYGON,
        GeoShape::MultiPoint => GML_MULTIPOINT,
        GeoShape::MultiLineString => GML_MULTICURVE,
        GeoShape::MultiPolygon => GML_MULTISURFACE,
        GeoShape::Collection => GML_MULTIGEOMETRY,
    }
}

/// Shape named by a GML element, if it is a geometry element.
pub fn shape_of(tree: &Element) -> Option<GeoShape> {
    GeoShape::ALL
        .into_iter()
        .find(|shape| element_name(*shape) == tree.name)
}

/// The concrete type of a GML tree given an optional declared type.
///
/// A concrete declared type wins. Otherwise the shape is read off the root
/// element and the dimension taken from the declared abstract type, or
/// Geometry when nothing was declared.
pub fn resolve_kind(tree: &Element, declared: Option<GeospatialType>) -> ODataResult<GeospatialType> {
    if let Some(kind) = declared.filter(|k| !k.is_abstract()) {
        return Ok(kind);
    }
    let dimension = declared.map(|k| k.dimension).unwrap_or(Dimension::Geometry);
    let shape = shape_of(tree).ok_or_else(|| {
        ODataError::MalformedGeometry(format!("'{}' is not a geometry element", tree.name))
    })?;
    Ok(GeospatialType::new(dimension, shape))
}

// === Parsing ===

/// Parse a GML tree as a value of the declared kind.
///
/// The abstract `Geography`/`Geometry` kinds are rejected before the tree is
/// looked at.
pub fn parse(tree: &Element, kind: GeospatialType) -> ODataResult<GeoValue> {
    let shape = kind.concrete()?;
    if tree.name != element_name(shape) {
        return Err(ODataError::MalformedGeometry(format!(
            "expected {} for {} but found {}",
            element_name(shape),
            kind.full_name(),
            tree.name
        )));
    }

    let geometry = parse_geometry(tree, shape)?;
    let mut value = GeoValue::new(kind.dimension, geometry);
    if let Some(srid) = tree.attribute(GML_SRS_NAME).and_then(parse_srid) {
        value = value.with_srid(srid);
    }
    Ok(value)
}

fn parse_geometry(tree: &Element, shape: GeoShape) -> ODataResult<Geometry> {
    let geometry = match shape {
        GeoShape::Point => Geometry::Point(point(tree)?),
        GeoShape::LineString => Geometry::LineString(LineString::new(positions(tree)?)),
        GeoShape::Polygon => Geometry::Polygon(polygon(tree)?),
        GeoShape::MultiPoint => Geometry::MultiPoint(MultiPoint {
            points: members(tree, GML_POINT_MEMBERS, GML_POINT, point)?,
        }),
        GeoShape::MultiLineString => Geometry::MultiLineString(MultiLineString {
            lines: members(tree, GML_CURVE_MEMBERS, GML_LINESTRING, |e| {
                positions(e).map(LineString::new)
            })?,
        }),
        GeoShape::MultiPolygon => Geometry::MultiPolygon(MultiPolygon {
            polygons: members(tree, GML_SURFACE_MEMBERS, GML_POLYGON, polygon)?,
        }),
        GeoShape::Collection => {
            let mut collection = GeometryCollection::default();
            if let Some(container) = tree.child(GML_GEOMETRY_MEMBERS) {
                for member in &container.children {
                    let shape = shape_of(member).ok_or_else(|| {
                        ODataError::MalformedGeometry(format!(
                            "unexpected collection member '{}'",
                            member.name
                        ))
                    })?;
                    collection.members.push(parse_geometry(member, shape)?);
                }
            }
            Geometry::Collection(collection)
        }
    };
    Ok(geometry)
}

/// Items of a member container. A missing container means no members.
fn members<T>(
    tree: &Element,
    container: &str,
    item: &str,
    parse_item: impl Fn(&Element) -> ODataResult<T>,
) -> ODataResult<Vec<T>> {
    let Some(container) = tree.child(container) else {
        return Ok(Vec::new());
    };
    container
        .children
        .iter()
        .map(|child| {
            if child.name == item {
                parse_item(child)
            } else {
                Err(ODataError::MalformedGeometry(format!(
                    "expected {} in {} but found {}",
                    item, container.name, child.name
                )))
            }
        })
        .collect()
}

fn point(tree: &Element) -> ODataResult<Point> {
    let mut found = tree.children_named(GML_POS);
    match (found.next(), found.next()) {
        (Some(pos), None) => pos_value(pos),
        (None, _) => Err(ODataError::MalformedGeometry(format!(
            "{} without {}",
            tree.name, GML_POS
        ))),
        (Some(_), Some(_)) => Err(ODataError::MalformedGeometry(format!(
            "{} must hold exactly one {}",
            tree.name, GML_POS
        ))),
    }
}

fn positions(tree: &Element) -> ODataResult<Vec<Point>> {
    tree.children_named(GML_POS).map(pos_value).collect()
}

fn pos_value(pos: &Element) -> ODataResult<Point> {
    let coords = pos
        .text
        .split_whitespace()
        .map(|c| c.parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ODataError::MalformedGeometry(format!("bad coordinate in '{}': {}", pos.text, e)))?;
    match coords.as_slice() {
        [x, y] => Ok(Point::new(*x, *y)),
        _ => Err(ODataError::MalformedGeometry(format!(
            "{} must hold exactly two numbers, got '{}'",
            GML_POS,
            pos.text.trim()
        ))),
    }
}

fn polygon(tree: &Element) -> ODataResult<Polygon> {
    Ok(Polygon::new(ring(tree, GML_EXTERIOR)?, ring(tree, GML_INTERIOR)?))
}

fn ring(tree: &Element, side: &str) -> ODataResult<Vec<Point>> {
    match tree.child(side).and_then(|s| s.child(GML_LINEARRING)) {
        Some(ring) => positions(ring),
        None => Ok(Vec::new()),
    }
}

fn parse_srid(srs_name: &str) -> Option<u32> {
    srs_name
        .rsplit(['/', ':'])
        .next()
        .and_then(|code| code.trim().parse().ok())
}

// === Serialization ===

/// Serialize a value as a GML tree rooted at its shape element.
pub fn serialize(value: &GeoValue) -> Element {
    let mut root = Element::new(element_name(value.shape()));
    if let Some(srid) = value.srid {
        root.set_attribute(GML_SRS_NAME, format!("{}{}", SRS_PREFIX, srid));
    }
    write_geometry(&mut root, &value.geometry);
    root
}

fn write_geometry(parent: &mut Element, geometry: &Geometry) {
    match geometry {
        Geometry::Point(p) => parent.push(pos(p)),
        Geometry::LineString(line) => write_positions(parent, &line.points),
        Geometry::Polygon(polygon) => write_polygon(parent, polygon),
        Geometry::MultiPoint(multi) => {
            let mut container = Element::new(GML_POINT_MEMBERS);
            for p in &multi.points {
                container.push(wrapped(&Geometry::Point(*p)));
            }
            parent.push(container);
        }
        Geometry::MultiLineString(multi) => {
            let mut container = Element::new(GML_CURVE_MEMBERS);
            for line in &multi.lines {
                let mut member = Element::new(GML_LINESTRING);
                write_positions(&mut member, &line.points);
                container.push(member);
            }
            parent.push(container);
        }
        Geometry::MultiPolygon(multi) => {
            let mut container = Element::new(GML_SURFACE_MEMBERS);
            for polygon in &multi.polygons {
                let mut member = Element::new(GML_POLYGON);
                write_polygon(&mut member, polygon);
                container.push(member);
            }
            parent.push(container);
        }
        Geometry::Collection(collection) => {
            let mut container = Element::new(GML_GEOMETRY_MEMBERS);
            for member in &collection.members {
                container.push(wrapped(member));
            }
            parent.push(container);
        }
    }
}

fn wrapped(geometry: &Geometry) -> Element {
    let mut element = Element::new(element_name(geometry.shape()));
    write_geometry(&mut element, geometry);
    element
}

fn write_polygon(parent: &mut Element, polygon: &Polygon) {
    for (side, points) in [(GML_EXTERIOR, &polygon.exterior), (GML_INTERIOR, &polygon.interior)] {
        if points.is_empty() {
            continue;
        }
        let mut ring = Element::new(GML_LINEARRING);
        write_positions(&mut ring, points);
        parent.push(Element::new(side).with_child(ring));
    }
}

fn write_positions(parent: &mut Element, points: &[Point]) {
    for p in points {
        parent.push(pos(p));
    }
}

fn pos(p: &Point) -> Element {
    Element::new(GML_POS).with_text(format!("{} {}", p.x, p.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geography(shape: GeoShape) -> GeospatialType {
        GeospatialType::new(Dimension::Geography, shape)
    }

    #[test]
    fn test_point_round_trip() {
        let value = GeoValue::new(Dimension::Geography, Point::new(-122.25, 47.5)).with_srid(4326);
        let tree = serialize(&value);
        assert_eq!(tree.name, GML_POINT);
        assert_eq!(
            tree.attribute(GML_SRS_NAME),
            Some("http://www.opengis.net/def/crs/EPSG/0/4326")
        );
        assert_eq!(tree.child(GML_POS).unwrap().text, "-122.25 47.5");
        assert_eq!(parse(&tree, geography(GeoShape::Point)).unwrap(), value);
    }

    #[test]
    fn test_polygon_without_interior() {
        let exterior = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 0.0),
        ];
        let value = GeoValue::new(Dimension::Geometry, Polygon::new(exterior, Vec::new()));
        let tree = serialize(&value);
        assert!(tree.child(GML_INTERIOR).is_none());
        let ring = tree.child(GML_EXTERIOR).unwrap().child(GML_LINEARRING).unwrap();
        assert_eq!(ring.children_named(GML_POS).count(), 4);
    }

    #[test]
    fn test_multipoint_members_are_wrapped() {
        let value = GeoValue::new(
            Dimension::Geometry,
            MultiPoint {
                points: vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)],
            },
        );
        let tree = serialize(&value);
        let members = tree.child(GML_POINT_MEMBERS).unwrap();
        assert_eq!(members.children_named(GML_POINT).count(), 2);
    }

    #[test]
    fn test_missing_member_container_is_empty() {
        let tree = Element::new(GML_MULTISURFACE);
        let value = parse(&tree, geography(GeoShape::MultiPolygon)).unwrap();
        assert_eq!(value.geometry, Geometry::MultiPolygon(MultiPolygon::default()));
    }

    #[test]
    fn test_abstract_kind_rejected() {
        let tree = serialize(&GeoValue::new(Dimension::Geography, Point::new(1.0, 2.0)));
        let err = parse(&tree, GeospatialType::abstract_of(Dimension::Geography)).unwrap_err();
        assert!(matches!(err, ODataError::NotInstantiableType(n) if n == "Edm.Geography"));
    }

    #[test]
    fn test_malformed_pos() {
        let tree = Element::new(GML_POINT).with_child(Element::new(GML_POS).with_text("1 2 3"));
        let err = parse(&tree, geography(GeoShape::Point)).unwrap_err();
        assert!(matches!(err, ODataError::MalformedGeometry(_)));

        let empty = Element::new(GML_POINT);
        assert!(matches!(
            parse(&empty, geography(GeoShape::Point)),
            Err(ODataError::MalformedGeometry(_))
        ));
    }

    #[test]
    fn test_unknown_collection_member() {
        let tree = Element::new(GML_MULTIGEOMETRY)
            .with_child(Element::new(GML_GEOMETRY_MEMBERS).with_child(Element::new("gml:Curve")));
        assert!(matches!(
            parse(&tree, geography(GeoShape::Collection)),
            Err(ODataError::MalformedGeometry(_))
        ));
    }

    #[test]
    fn test_resolve_kind() {
        let tree = Element::new(GML_LINESTRING);
        let kind = resolve_kind(&tree, None).unwrap();
        assert_eq!(kind, GeospatialType::new(Dimension::Geometry, GeoShape::LineString));

        let kind =
            resolve_kind(&tree, Some(GeospatialType::abstract_of(Dimension::Geography))).unwrap();
        assert_eq!(kind, geography(GeoShape::LineString));

        let declared = geography(GeoShape::Point);
        assert_eq!(resolve_kind(&tree, Some(declared)).unwrap(), declared);
    }
}

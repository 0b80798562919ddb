//! Geometry generators for codec tests.
//!
//! These generators create predictable, verifiable geometries of every
//! concrete shape. Coordinates are small binary fractions so they survive
//! text round trips exactly.

use odata_common::{
    Dimension, GeoShape, GeoValue, Geometry, GeometryCollection, LineString, MultiLineString,
    MultiPoint, MultiPolygon, Point, Polygon,
};

/// Creates `n` points along a diagonal starting at `origin`.
///
/// Point `i` is `(origin.x + i * 0.5, origin.y + i * 0.25)`.
///
/// # Example
///
/// ```
/// use odata_common::Point;
/// use test_utils::create_points;
///
/// let points = create_points(Point::new(1.0, 1.0), 3);
/// assert_eq!(points[2], Point::new(2.0, 1.5));
/// ```
pub fn create_points(origin: Point, n: usize) -> Vec<Point> {
    (0..n)
        .map(|i| Point::new(origin.x + i as f64 * 0.5, origin.y + i as f64 * 0.25))
        .collect()
}

/// A closed square ring: four corners plus the repeated first corner.
pub fn square_ring(origin: Point, size: f64) -> Vec<Point> {
    vec![
        origin,
        Point::new(origin.x + size, origin.y),
        Point::new(origin.x + size, origin.y + size),
        Point::new(origin.x, origin.y + size),
        origin,
    ]
}

/// A square polygon with a square hole in the middle.
pub fn square_with_hole(origin: Point, size: f64) -> Polygon {
    let inner = Point::new(origin.x + size / 4.0, origin.y + size / 4.0);
    Polygon::new(square_ring(origin, size), square_ring(inner, size / 2.0))
}

/// A populated geometry of the given shape.
///
/// Collections hold one member of each simple shape, including a nested
/// collection, so members of every kind are exercised.
pub fn create_geometry(shape: GeoShape) -> Geometry {
    let origin = Point::new(1.0, 2.0);
    match shape {
        GeoShape::Point => origin.into(),
        GeoShape::LineString => LineString::new(create_points(origin, 3)).into(),
        GeoShape::Polygon => square_with_hole(origin, 4.0).into(),
        GeoShape::MultiPoint => MultiPoint {
            points: create_points(origin, 2),
        }
        .into(),
        GeoShape::MultiLineString => MultiLineString {
            lines: vec![
                LineString::new(create_points(origin, 2)),
                LineString::new(create_points(Point::new(-3.0, 0.5), 4)),
            ],
        }
        .into(),
        GeoShape::MultiPolygon => MultiPolygon {
            polygons: vec![
                square_with_hole(origin, 4.0),
                Polygon::new(square_ring(Point::new(10.0, 10.0), 1.0), Vec::new()),
            ],
        }
        .into(),
        GeoShape::Collection => GeometryCollection {
            members: vec![
                origin.into(),
                LineString::new(create_points(origin, 2)).into(),
                square_with_hole(origin, 2.0).into(),
                GeometryCollection {
                    members: vec![Point::new(0.5, 0.5).into()],
                }
                .into(),
            ],
        }
        .into(),
    }
}

/// The empty form of a shape: no points, no rings, no members.
///
/// A point has no empty form and is returned at the origin.
pub fn empty_geometry(shape: GeoShape) -> Geometry {
    match shape {
        GeoShape::Point => Point::default().into(),
        GeoShape::LineString => LineString::default().into(),
        GeoShape::Polygon => Polygon::default().into(),
        GeoShape::MultiPoint => MultiPoint::default().into(),
        GeoShape::MultiLineString => MultiLineString::default().into(),
        GeoShape::MultiPolygon => MultiPolygon::default().into(),
        GeoShape::Collection => GeometryCollection::default().into(),
    }
}

/// Every concrete shape in both dimensions, populated.
pub fn all_geo_values() -> Vec<GeoValue> {
    [Dimension::Geography, Dimension::Geometry]
        .into_iter()
        .flat_map(|dimension| {
            GeoShape::ALL
                .into_iter()
                .map(move |shape| GeoValue::new(dimension, create_geometry(shape)))
        })
        .collect()
}

/// Every concrete shape in both dimensions, empty.
pub fn all_empty_geo_values() -> Vec<GeoValue> {
    [Dimension::Geography, Dimension::Geometry]
        .into_iter()
        .flat_map(|dimension| {
            GeoShape::ALL
                .into_iter()
                .map(move |shape| GeoValue::new(dimension, empty_geometry(shape)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_points() {
        let points = create_points(Point::new(0.0, 0.0), 4);
        assert_eq!(points.len(), 4);
        assert_eq!(points[3], Point::new(1.5, 0.75));
    }

    #[test]
    fn test_square_ring_is_closed() {
        let ring = square_ring(Point::new(1.0, 1.0), 2.0);
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn test_shapes_match() {
        for shape in GeoShape::ALL {
            assert_eq!(create_geometry(shape).shape(), shape);
            assert_eq!(empty_geometry(shape).shape(), shape);
        }
        assert_eq!(all_geo_values().len(), 14);
        assert_eq!(all_empty_geo_values().len(), 14);
    }
}

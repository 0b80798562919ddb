//! GeoJSON rendering of geospatial values.

use odata_common::{
    Dimension, GeoValue, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint,
    MultiPolygon, ODataError, ODataResult, Point, Polygon,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A GeoJSON geometry object with an optional named CRS.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct GeoJson {
    #[serde(flatten)]
    geometry: GeoJsonGeometry,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    crs: Option<Crs>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
enum GeoJsonGeometry {
    Point {
        coordinates: [f64; 2],
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
    MultiLineString {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJsonGeometry>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Crs {
    #[serde(rename = "type")]
    type_: String,
    properties: CrsProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct CrsProperties {
    name: String,
}

const TYPES: &[&str] = &[
    "Point",
    "LineString",
    "Polygon",
    "MultiPoint",
    "MultiLineString",
    "MultiPolygon",
    "GeometryCollection",
];

/// Whether a JSON object looks like a GeoJSON geometry.
pub(crate) fn is_geojson(object: &Map<String, Value>) -> bool {
    let typed = object
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|t| TYPES.contains(&t));
    typed && (object.contains_key("coordinates") || object.contains_key("geometries"))
}

pub(crate) fn to_json(value: &GeoValue) -> ODataResult<Value> {
    let geojson = GeoJson {
        geometry: geometry_to(&value.geometry),
        crs: value.srid.map(|srid| Crs {
            type_: "name".to_string(),
            properties: CrsProperties {
                name: format!("EPSG:{}", srid),
            },
        }),
    };
    Ok(serde_json::to_value(geojson)?)
}

pub(crate) fn from_json(value: &Value, dimension: Dimension) -> ODataResult<GeoValue> {
    let geojson: GeoJson = serde_json::from_value(value.clone())
        .map_err(|e| ODataError::MalformedGeometry(format!("invalid GeoJSON: {}", e)))?;
    let mut geo = GeoValue::new(dimension, geometry_from(geojson.geometry)?);
    let srid = geojson
        .crs
        .and_then(|crs| crs.properties.name.rsplit(':').next()?.parse().ok());
    if let Some(srid) = srid {
        geo = geo.with_srid(srid);
    }
    Ok(geo)
}

fn pair(p: &Point) -> [f64; 2] {
    [p.x, p.y]
}

fn pairs(points: &[Point]) -> Vec<[f64; 2]> {
    points.iter().map(pair).collect()
}

fn points(pairs: Vec<[f64; 2]>) -> Vec<Point> {
    pairs.into_iter().map(|[x, y]| Point::new(x, y)).collect()
}

fn rings_to(polygon: &Polygon) -> Vec<Vec<[f64; 2]>> {
    if !polygon.interior.is_empty() {
        vec![pairs(&polygon.exterior), pairs(&polygon.interior)]
    } else if !polygon.exterior.is_empty() {
        vec![pairs(&polygon.exterior)]
    } else {
        Vec::new()
    }
}

fn rings_from(rings: Vec<Vec<[f64; 2]>>) -> ODataResult<Polygon> {
    if rings.len() > 2 {
        return Err(ODataError::MalformedGeometry(format!(
            "polygon with {} rings, at most 2 supported",
            rings.len()
        )));
    }
    let mut rings = rings.into_iter();
    let exterior = rings.next().map(points).unwrap_or_default();
    let interior = rings.next().map(points).unwrap_or_default();
    Ok(Polygon::new(exterior, interior))
}

fn geometry_to(geometry: &Geometry) -> GeoJsonGeometry {
    match geometry {
        Geometry::Point(p) => GeoJsonGeometry::Point {
            coordinates: pair(p),
        },
        Geometry::LineString(line) => GeoJsonGeometry::LineString {
            coordinates: pairs(&line.points),
        },
        Geometry::Polygon(polygon) => GeoJsonGeometry::Polygon {
            coordinates: rings_to(polygon),
        },
        Geometry::MultiPoint(multi) => GeoJsonGeometry::MultiPoint {
            coordinates: pairs(&multi.points),
        },
        Geometry::MultiLineString(multi) => GeoJsonGeometry::MultiLineString {
            coordinates: multi.lines.iter().map(|l| pairs(&l.points)).collect(),
        },
        Geometry::MultiPolygon(multi) => GeoJsonGeometry::MultiPolygon {
            coordinates: multi.polygons.iter().map(rings_to).collect(),
        },
        Geometry::Collection(collection) => GeoJsonGeometry::GeometryCollection {
            geometries: collection.members.iter().map(geometry_to).collect(),
        },
    }
}

fn geometry_from(geometry: GeoJsonGeometry) -> ODataResult<Geometry> {
    let geometry = match geometry {
        GeoJsonGeometry::Point { coordinates: [x, y] } => Geometry::Point(Point::new(x, y)),
        GeoJsonGeometry::LineString { coordinates } => {
            Geometry::LineString(LineString::new(points(coordinates)))
        }
        GeoJsonGeometry::Polygon { coordinates } => Geometry::Polygon(rings_from(coordinates)?),
        GeoJsonGeometry::MultiPoint { coordinates } => Geometry::MultiPoint(MultiPoint {
            points: points(coordinates),
        }),
        GeoJsonGeometry::MultiLineString { coordinates } => {
            Geometry::MultiLineString(MultiLineString {
                lines: coordinates
                    .into_iter()
                    .map(|c| LineString::new(points(c)))
                    .collect(),
            })
        }
        GeoJsonGeometry::MultiPolygon { coordinates } => Geometry::MultiPolygon(MultiPolygon {
            polygons: coordinates
                .into_iter()
                .map(rings_from)
                .collect::<ODataResult<_>>()?,
        }),
        GeoJsonGeometry::GeometryCollection { geometries } => {
            Geometry::Collection(GeometryCollection {
                members: geometries
                    .into_iter()
                    .map(geometry_from)
                    .collect::<ODataResult<_>>()?,
            })
        }
    };
    Ok(geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_point_with_crs() {
        let value = GeoValue::new(Dimension::Geography, Point::new(10.5, -3.0)).with_srid(4326);
        let json = to_json(&value).unwrap();
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"], json!([10.5, -3.0]));
        assert_eq!(json["crs"]["properties"]["name"], "EPSG:4326");
        assert_eq!(from_json(&json, Dimension::Geography).unwrap(), value);
    }

    #[test]
    fn test_polygon_rings() {
        let polygon = Polygon::new(
            vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(0.0, 4.0)],
            Vec::new(),
        );
        let value = GeoValue::new(Dimension::Geometry, polygon);
        let json = to_json(&value).unwrap();
        assert_eq!(json["coordinates"].as_array().unwrap().len(), 1);
        assert_eq!(from_json(&json, Dimension::Geometry).unwrap(), value);
    }

    #[test]
    fn test_detection() {
        let point = json!({"type": "Point", "coordinates": [1.0, 2.0]});
        assert!(is_geojson(point.as_object().unwrap()));
        let complex = json!({"type": "Home", "Street": "Main"});
        assert!(!is_geojson(complex.as_object().unwrap()));
    }

    #[test]
    fn test_too_many_rings() {
        let json = json!({"type": "Polygon", "coordinates": [[], [], []]});
        assert!(matches!(
            from_json(&json, Dimension::Geometry),
            Err(ODataError::MalformedGeometry(_))
        ));
    }
}

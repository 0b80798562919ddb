//! Geometry codec round trips.
//!
//! Every concrete shape in both dimensions goes through the GML codec on its
//! own, through an XML document, and through Atom and JSON property
//! documents.

use odata_common::{Dimension, GeoShape, GeoValue, GeospatialType, Point, Polygon, ServiceVersion};
use odata_wire::element::GML_NS;
use odata_wire::gml::{self, GML_EXTERIOR, GML_INTERIOR, GML_LINEARRING, GML_POS};
use odata_wire::{Element, ResourceFactory, ResourceFamily, WireValue};
use test_utils::{
    all_empty_geo_values, all_geo_values, assert_approx_eq, assert_odata_err, square_ring,
};

fn through_gml(value: &GeoValue) -> GeoValue {
    let tree = gml::serialize(value);
    gml::parse(&tree, value.kind()).unwrap()
}

fn through_xml(value: &GeoValue) -> GeoValue {
    let mut tree = gml::serialize(value);
    tree.set_attribute("xmlns:gml", GML_NS);
    let bytes = tree.to_xml_bytes().unwrap();
    let parsed = Element::parse(&bytes).unwrap();
    gml::parse(&parsed, value.kind()).unwrap()
}

fn through_property(value: &GeoValue, family: ResourceFamily, version: ServiceVersion) -> GeoValue {
    let factory = ResourceFactory::new(version);
    let mut property = factory.new_property(family, "Shape");
    property.type_name = Some(value.kind().full_name());
    property.value = WireValue::Geospatial(gml::serialize(value));

    let bytes = factory.serialize_property(&property).unwrap();
    let read = factory.deserialize_property(&bytes, family).unwrap();
    let declared = read
        .type_name
        .as_deref()
        .and_then(|t| t.strip_prefix("Edm."))
        .and_then(GeospatialType::from_local_name);
    match &read.value {
        WireValue::Geospatial(tree) => {
            let kind = gml::resolve_kind(tree, declared).unwrap();
            gml::parse(tree, kind).unwrap()
        }
        other => panic!("Expected geospatial value, got {:?}", other),
    }
}

// ============================================================================
// GML tree round trips
// ============================================================================

#[test]
fn test_all_shapes_round_trip() {
    for value in all_geo_values() {
        assert_eq!(through_gml(&value), value, "{}", value.kind().full_name());
    }
}

#[test]
fn test_empty_shapes_round_trip() {
    for value in all_empty_geo_values() {
        assert_eq!(through_gml(&value), value, "{}", value.kind().full_name());
    }
}

#[test]
fn test_srid_survives() {
    for value in all_geo_values() {
        let value = value.with_srid(4326);
        assert_eq!(through_gml(&value).srid, Some(4326));
    }
}

#[test]
fn test_all_shapes_through_xml_document() {
    for value in all_geo_values().into_iter().chain(all_empty_geo_values()) {
        assert_eq!(through_xml(&value), value, "{}", value.kind().full_name());
    }
}

// ============================================================================
// Polygon layout
// ============================================================================

#[test]
fn test_polygon_without_interior() {
    let ring = square_ring(Point::new(0.0, 0.0), 1.0)[..4].to_vec();
    let value = GeoValue::new(Dimension::Geometry, Polygon::new(ring, Vec::new()));
    let tree = gml::serialize(&value);

    assert!(tree.child(GML_INTERIOR).is_none());
    let linear_ring = tree
        .child(GML_EXTERIOR)
        .and_then(|e| e.child(GML_LINEARRING))
        .unwrap();
    assert_eq!(linear_ring.children_named(GML_POS).count(), 4);
}

#[test]
fn test_polygon_coordinates_parse_as_numbers() {
    let xml = br#"<gml:Polygon xmlns:gml="http://www.opengis.net/gml">
        <gml:exterior><gml:LinearRing>
          <gml:pos>  1.25   -2.5 </gml:pos><gml:pos>3 4</gml:pos>
        </gml:LinearRing></gml:exterior>
      </gml:Polygon>"#;
    let tree = Element::parse(xml).unwrap();
    let value = gml::parse(&tree, GeospatialType::new(Dimension::Geometry, GeoShape::Polygon)).unwrap();
    match value.geometry {
        odata_common::Geometry::Polygon(p) => {
            assert_approx_eq!(p.exterior[0].x, 1.25, 1e-12);
            assert_approx_eq!(p.exterior[0].y, -2.5, 1e-12);
            assert!(p.interior.is_empty());
        }
        other => panic!("Expected polygon, got {:?}", other),
    }
}

#[test]
fn test_point_pos_count_enforced() {
    let kind = GeospatialType::new(Dimension::Geometry, GeoShape::Point);

    let two = br#"<gml:Point xmlns:gml="http://www.opengis.net/gml">
        <gml:pos>1 2</gml:pos><gml:pos>3 4</gml:pos>
      </gml:Point>"#;
    let tree = Element::parse(two).unwrap();
    assert_odata_err!(gml::parse(&tree, kind), MalformedGeometry);

    let none = br#"<gml:Point xmlns:gml="http://www.opengis.net/gml"/>"#;
    let tree = Element::parse(none).unwrap();
    assert_odata_err!(gml::parse(&tree, kind), MalformedGeometry);

    // Same rule for points inside a MultiPoint
    let multi = br#"<gml:MultiPoint xmlns:gml="http://www.opengis.net/gml">
        <gml:pointMembers>
          <gml:Point><gml:pos>1 2</gml:pos><gml:pos>3 4</gml:pos></gml:Point>
        </gml:pointMembers>
      </gml:MultiPoint>"#;
    let tree = Element::parse(multi).unwrap();
    assert_odata_err!(
        gml::parse(&tree, GeospatialType::new(Dimension::Geometry, GeoShape::MultiPoint)),
        MalformedGeometry
    );
}

// ============================================================================
// Abstract kinds
// ============================================================================

#[test]
fn test_abstract_kinds_rejected() {
    let tree = gml::serialize(&GeoValue::new(Dimension::Geography, Point::new(1.0, 2.0)));
    for dimension in [Dimension::Geography, Dimension::Geometry] {
        assert_odata_err!(
            gml::parse(&tree, GeospatialType::abstract_of(dimension)),
            NotInstantiableType
        );
    }
}

#[test]
fn test_resolve_kind_reads_root_element() {
    for value in all_geo_values() {
        let tree = gml::serialize(&value);
        let declared = GeospatialType::abstract_of(value.dimension);
        assert_eq!(gml::resolve_kind(&tree, Some(declared)).unwrap(), value.kind());
    }
}

// ============================================================================
// Property documents
// ============================================================================

#[test]
fn test_atom_property_documents() {
    for version in [ServiceVersion::V3, ServiceVersion::V4] {
        for value in all_geo_values().into_iter().chain(all_empty_geo_values()) {
            let value = value.with_srid(4326);
            assert_eq!(through_property(&value, ResourceFamily::Atom, version), value);
        }
    }
}

#[test]
fn test_json_property_documents() {
    for version in [ServiceVersion::V3, ServiceVersion::V4] {
        for value in all_geo_values().into_iter().chain(all_empty_geo_values()) {
            let value = value.with_srid(4326);
            assert_eq!(through_property(&value, ResourceFamily::Json, version), value);
        }
    }
}

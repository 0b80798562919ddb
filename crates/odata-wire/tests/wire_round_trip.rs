//! Wire-level round trips and streaming equivalence.
//!
//! Payloads are read into wire trees, written back and read again; feeds
//! are read both whole and entry by entry.

use odata_common::{LinkKind, ServiceVersion};
use odata_wire::{ResourceFactory, ResourceFamily, WireEntry, WireFeed, WireValue};
use test_utils::fixtures::payloads;

fn stream_all(
    factory: &ResourceFactory,
    bytes: &[u8],
    family: ResourceFamily,
) -> (WireFeed, Vec<WireEntry>) {
    let mut stream = factory
        .entry_stream(std::io::Cursor::new(bytes.to_vec()), family)
        .unwrap();
    let mut entries = Vec::new();
    while let Some(entry) = stream.next_entry().unwrap() {
        entries.push(entry);
    }
    (stream.header().clone(), entries)
}

// ============================================================================
// Atom
// ============================================================================

#[test]
fn test_atom_entry_round_trip() {
    let factory = ResourceFactory::new(ServiceVersion::V3);
    let entry = factory
        .deserialize_entry(payloads::V3_ATOM_ENTRY.as_bytes(), ResourceFamily::Atom)
        .unwrap();
    assert_eq!(entry.base.as_deref(), Some("http://host/service/"));
    assert_eq!(entry.etag.as_deref(), Some("W/\"3\""));
    assert_eq!(entry.type_name.as_deref(), Some("NS.Customer"));
    assert_eq!(entry.navigation_links.len(), 1);
    assert_eq!(entry.navigation_links[0].kind, LinkKind::Navigation);

    let bytes = factory.serialize_entry(&entry).unwrap();
    let again = factory.deserialize_entry(&bytes, ResourceFamily::Atom).unwrap();
    assert_eq!(again, entry);
}

#[test]
fn test_atom_collection_property_has_no_synthetic_names() {
    let factory = ResourceFactory::new(ServiceVersion::V3);
    let entry = factory
        .deserialize_entry(payloads::V3_ATOM_ENTRY.as_bytes(), ResourceFamily::Atom)
        .unwrap();
    let tags = entry.properties.iter().find(|p| p.name == "Tags").unwrap();
    assert_eq!(
        tags.value,
        WireValue::Collection(vec![
            WireValue::Simple("a".to_string()),
            WireValue::Simple("b".to_string()),
        ])
    );
}

#[test]
fn test_atom_feed_streaming_matches_whole_feed() {
    let factory = ResourceFactory::new(ServiceVersion::V3);
    let bytes = payloads::V3_ATOM_RELATIVE_NEXT.as_bytes();
    let feed = factory.deserialize_feed(bytes, ResourceFamily::Atom).unwrap();
    let (header, entries) = stream_all(&factory, bytes, ResourceFamily::Atom);

    assert_eq!(entries, feed.entries);
    assert_eq!(header.base, feed.base);
    assert_eq!(header.count, Some(1));
    assert_eq!(header.next.as_deref(), Some("./p2"));
    assert_eq!(feed.next.as_deref(), Some("./p2"));
}

#[test]
fn test_atom_feed_round_trip() {
    let factory = ResourceFactory::new(ServiceVersion::V3);
    let feed = factory
        .deserialize_feed(payloads::V3_ATOM_RELATIVE_NEXT.as_bytes(), ResourceFamily::Atom)
        .unwrap();
    let bytes = factory.serialize_feed(&feed).unwrap();
    assert_eq!(factory.deserialize_feed(&bytes, ResourceFamily::Atom).unwrap(), feed);
}

// ============================================================================
// JSON
// ============================================================================

#[test]
fn test_json_feed_streaming_matches_whole_feed() {
    let factory = ResourceFactory::new(ServiceVersion::V4);
    let bytes = payloads::V4_JSON_FEED.as_bytes();
    let feed = factory.deserialize_feed(bytes, ResourceFamily::Json).unwrap();
    let (header, entries) = stream_all(&factory, bytes, ResourceFamily::Json);

    assert_eq!(entries.len(), 2);
    assert_eq!(entries, feed.entries);
    assert_eq!(header.count, feed.count);
    assert_eq!(header.next, feed.next);
    assert_eq!(header.base.as_deref(), Some("http://host/service/"));
}

#[test]
fn test_json_inline_feed_and_geometry() {
    let factory = ResourceFactory::new(ServiceVersion::V4);
    let feed = factory
        .deserialize_feed(payloads::V4_JSON_FEED.as_bytes(), ResourceFamily::Json)
        .unwrap();

    let orders = &feed.entries[0].navigation_links[0];
    assert_eq!(orders.title, "Orders");
    assert_eq!(orders.inline_feed.as_ref().unwrap().entries.len(), 1);
    assert!(orders.inline_entry.is_none());

    let location = feed.entries[1]
        .properties
        .iter()
        .find(|p| p.name == "Location")
        .unwrap();
    match &location.value {
        WireValue::Geospatial(tree) => assert_eq!(tree.name, "gml:Point"),
        other => panic!("Expected geospatial value, got {:?}", other),
    }
}

#[test]
fn test_json_feed_round_trip() {
    let factory = ResourceFactory::new(ServiceVersion::V4);
    let feed = factory
        .deserialize_feed(payloads::V4_JSON_FEED.as_bytes(), ResourceFamily::Json)
        .unwrap();
    let bytes = factory.serialize_feed(&feed).unwrap();
    assert_eq!(factory.deserialize_feed(&bytes, ResourceFamily::Json).unwrap(), feed);
}

// ============================================================================
// Cross-family
// ============================================================================

#[test]
fn test_entries_written_back_to_back() {
    let factory = ResourceFactory::new(ServiceVersion::V4);
    let feed = factory
        .deserialize_feed(payloads::V4_JSON_FEED.as_bytes(), ResourceFamily::Json)
        .unwrap();
    let bytes = factory
        .serialize_entries(&feed.entries, ResourceFamily::Json)
        .unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.starts_with('{'));
    assert!(text.contains("}{"));
}

#[test]
fn test_service_document_and_error() {
    let factory = ResourceFactory::new(ServiceVersion::V4);
    let service = factory
        .deserialize_service_document(payloads::V4_JSON_SERVICE.as_bytes(), ResourceFamily::Json)
        .unwrap();
    assert_eq!(service.entity_sets.len(), 1);
    assert_eq!(service.singletons[0].name, "Me");
    assert_eq!(service.function_imports[0].title.as_deref(), Some("Top"));

    let error = factory
        .deserialize_error(payloads::V4_JSON_ERROR.as_bytes(), ResourceFamily::Json)
        .unwrap();
    assert_eq!(error.code, "404");
    assert_eq!(error.target.as_deref(), Some("Customers(9)"));
}

#[test]
fn test_metadata_summary() {
    let factory = ResourceFactory::new(ServiceVersion::V3);
    let metadata = factory
        .deserialize_metadata(payloads::V3_METADATA.as_bytes(), ResourceFamily::Atom)
        .unwrap();
    assert_eq!(metadata.schema("NS").unwrap().complex_types, vec!["Address"]);
}

//! Common test fixtures for OData client tests.
//!
//! This module provides pre-defined domain objects and literal payloads
//! that represent the usual shapes a service sends: keyed entities with
//! typed properties, inline expansions, media entities and paged feeds.

use chrono::DateTime;
use odata_common::{
    CollectionValue, ComplexValue, Dimension, Entity, EntitySet, GeoValue, Link, Operation, Point,
    PrimitiveValue, Property, ServiceVersion, Url,
};
use uuid::Uuid;

/// Service URLs used throughout the fixtures.
pub mod urls {
    /// Service root, with trailing slash so relative hrefs resolve below it
    pub const SERVICE_ROOT: &str = "http://host/service/";

    /// Customers entity set
    pub const CUSTOMERS: &str = "http://host/service/Customers";

    /// Orders entity set
    pub const ORDERS: &str = "http://host/service/Orders";

    /// Context URL of the Customers set
    pub const CUSTOMERS_CONTEXT: &str = "http://host/service/$metadata#Customers";
}

/// Qualified type names.
pub mod types {
    pub const CUSTOMER: &str = "NS.Customer";
    pub const ORDER: &str = "NS.Order";
    pub const ADDRESS: &str = "NS.Address";
    pub const PROMOTE: &str = "#NS.Promote";
}

/// Common time values for testing.
pub mod time {
    /// A fixed reference time for tests (2024-01-15T12:00:00Z)
    pub const REFERENCE_TIME: &str = "2024-01-15T12:00:00Z";
}

/// Parse a fixture URL.
pub fn url(s: &str) -> Url {
    Url::parse(s).expect("fixture URLs are valid")
}

/// URL of a keyed member of an entity set, e.g. `Customers(1)`.
pub fn keyed_url(set: &str, id: i32) -> Url {
    url(&format!("{}({})", set, id))
}

/// A typed address complex value.
pub fn address(street: &str, city: &str) -> ComplexValue {
    ComplexValue::new(Some(types::ADDRESS.to_string()))
        .with_property(Property::new("Street", PrimitiveValue::string(street)))
        .with_property(Property::new("City", PrimitiveValue::string(city)))
}

/// A read-only customer with one property of every value kind.
///
/// Every primitive carries its declared type, so the entity round-trips
/// exactly when types are emitted. `Since` is only valid in both versions
/// because `Edm.DateTimeOffset` exists in V3 and V4.
pub fn customer(id: i32) -> Entity {
    let since = DateTime::parse_from_rfc3339(time::REFERENCE_TIME).expect("valid reference time");
    let emails = CollectionValue::new(Some("Collection(Edm.String)".to_string()))
        .with_item(PrimitiveValue::string(format!("c{}@example.com", id)))
        .with_item(PrimitiveValue::string(format!("c{}@example.org", id)));
    let location = GeoValue::new(Dimension::Geography, Point::new(-122.125, 47.5)).with_srid(4326);

    Entity::keyed(types::CUSTOMER, keyed_url(urls::CUSTOMERS, id))
        .with_edit_link(keyed_url(urls::CUSTOMERS, id))
        .with_etag(format!("W/\"{}\"", id))
        .with_property(Property::new("ID", PrimitiveValue::int32(id)))
        .with_property(Property::new("Name", PrimitiveValue::string(format!("Customer {}", id))))
        .with_property(Property::new("Active", PrimitiveValue::boolean(id % 2 == 1)))
        .with_property(Property::new("Rating", PrimitiveValue::double(4.5)))
        .with_property(Property::new("Since", PrimitiveValue::date_time_offset(since)))
        .with_property(Property::new("Token", PrimitiveValue::guid(Uuid::nil())))
        .with_property(Property::new("Address", address("1 Main St", "Redmond")))
        .with_property(Property::new("Emails", emails))
        .with_property(Property::new("Location", location))
        .with_property(Property::null("Notes"))
}

/// A small order entity.
pub fn order(id: i32) -> Entity {
    Entity::keyed(types::ORDER, keyed_url(urls::ORDERS, id))
        .with_property(Property::new("OrderID", PrimitiveValue::int32(id)))
        .with_property(Property::new("Amount", PrimitiveValue::decimal("19.99")))
}

/// A customer carrying links of every kind, in the order the binder hands
/// them back: association, navigation, media-edit.
///
/// `Orders` is expanded inline as a set of `orders` entities, `BestFriend`
/// is expanded inline as a single entity and `Invoices` is a plain
/// navigation link.
pub fn customer_with_links(version: ServiceVersion, id: i32, orders: i32) -> Entity {
    let base = format!("{}({})", urls::CUSTOMERS, id);
    let mut set = EntitySet::new().with_count(orders as i64);
    for n in 1..=orders {
        set.push(order(n));
    }

    customer(id)
        .with_link(Link::association(
            version,
            "Orders",
            Some(url(&format!("{}/$links/Orders", base))),
        ))
        .with_link(Link::inline_entity_set(
            version,
            "Orders",
            Some(url(&format!("{}/Orders", base))),
            set,
        ))
        .with_link(Link::inline_entity(
            version,
            "BestFriend",
            Some(url(&format!("{}/BestFriend", base))),
            customer(id + 100),
        ))
        .with_link(Link::navigation_entity_set(
            version,
            "Invoices",
            Some(url(&format!("{}/Invoices", base))),
        ))
        .with_link(
            Link::media_edit(version, "Photo", Some(url(&format!("{}/Photo", base))))
                .with_media_etag("\"photo-1\""),
        )
        .with_operation(Operation::new(
            types::PROMOTE,
            "Promote",
            url(&format!("{}/NS.Promote", base)),
        ))
}

/// A media entity whose content lives at `/Photos(id)/$value`.
pub fn photo(id: i32) -> Entity {
    let source = url(&format!("{}Photos({})/$value", urls::SERVICE_ROOT, id));
    Entity::keyed("NS.Photo", url(&format!("{}Photos({})", urls::SERVICE_ROOT, id)))
        .with_media(Some(source), Some("image/png".to_string()))
        .with_property(Property::new("Caption", PrimitiveValue::string("sunset")))
}

/// A page of `n` customers with a total count and a next link.
pub fn customer_page(n: i32) -> EntitySet {
    let mut set = EntitySet::anchored(url(&format!("{}?$skiptoken={}", urls::CUSTOMERS, n)))
        .with_count(n as i64 * 3);
    for id in 1..=n {
        set.push(customer(id));
    }
    set
}

/// Literal payloads as services send them.
pub mod payloads {
    /// V3 Atom feed with an `xml:base` of `http://h/svc/Set` and a relative
    /// next link.
    pub const V3_ATOM_RELATIVE_NEXT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xml:base="http://h/svc/Set"
      xmlns="http://www.w3.org/2005/Atom"
      xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
      xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
  <m:count>1</m:count>
  <entry>
    <category term="NS.Item" scheme="http://schemas.microsoft.com/ado/2007/08/dataservices/scheme"/>
    <link rel="self" title="Item" href="Set(1)"/>
    <content type="application/xml">
      <m:properties><d:ID m:type="Edm.Int32">1</d:ID></m:properties>
    </content>
  </entry>
  <link rel="next" href="./p2"/>
</feed>"#;

    /// V4 JSON feed with two customers, an inline order and a next link.
    pub const V4_JSON_FEED: &str = r##"{
  "@odata.context": "http://host/service/$metadata#Customers",
  "@odata.count": 2,
  "value": [
    {
      "@odata.type": "#NS.Customer",
      "@odata.readLink": "Customers(1)",
      "@odata.etag": "W/\"1\"",
      "ID@odata.type": "#Int32",
      "ID": 1,
      "Name": "Alpha",
      "Orders@odata.navigationLink": "Customers(1)/Orders",
      "Orders": [
        {"@odata.readLink": "Orders(7)", "OrderID": 7}
      ]
    },
    {
      "@odata.type": "#NS.Customer",
      "@odata.readLink": "Customers(2)",
      "@odata.etag": "  ",
      "ID": 2,
      "Name": "Beta",
      "Location@odata.type": "#Edm.GeographyPoint",
      "Location": {"type": "Point", "coordinates": [1.5, 2.5]}
    }
  ],
  "@odata.nextLink": "http://host/service/Customers?$skiptoken=2"
}"##;

    /// V3 Atom entry with a GML point and a string collection.
    pub const V3_ATOM_ENTRY: &str = r#"<entry xml:base="http://host/service/"
      xmlns="http://www.w3.org/2005/Atom"
      xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
      xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata"
      xmlns:gml="http://www.opengis.net/gml"
      m:etag="W/&quot;3&quot;">
  <category term="NS.Customer" scheme="http://schemas.microsoft.com/ado/2007/08/dataservices/scheme"/>
  <link rel="edit" title="Customer" href="Customers(3)"/>
  <link rel="http://schemas.microsoft.com/ado/2007/08/dataservices/related/Orders"
        type="application/atom+xml;type=feed" title="Orders" href="Customers(3)/Orders"/>
  <content type="application/xml">
    <m:properties>
      <d:ID m:type="Edm.Int32">3</d:ID>
      <d:Name>Gamma</d:Name>
      <d:Location m:type="Edm.GeographyPoint">
        <gml:Point gml:srsName="http://www.opengis.net/def/crs/EPSG/0/4326">
          <gml:pos>10 20</gml:pos>
        </gml:Point>
      </d:Location>
      <d:Tags m:type="Collection(Edm.String)">
        <d:element>a</d:element>
        <d:element>b</d:element>
      </d:Tags>
    </m:properties>
  </content>
</entry>"#;

    /// V4 JSON error payload.
    pub const V4_JSON_ERROR: &str = r#"{"error": {"code": "404", "message": "Customer not found", "target": "Customers(9)"}}"#;

    /// V4 JSON service document.
    pub const V4_JSON_SERVICE: &str = r#"{
  "@odata.context": "http://host/service/$metadata",
  "value": [
    {"name": "Customers", "kind": "EntitySet", "url": "Customers"},
    {"name": "Me", "kind": "Singleton", "url": "Me"},
    {"name": "TopCustomers", "kind": "FunctionImport", "url": "TopCustomers", "title": "Top"}
  ]
}"#;

    /// V3 EDMX metadata document.
    pub const V3_METADATA: &str = r#"<edmx:Edmx Version="1.0" xmlns:edmx="http://schemas.microsoft.com/ado/2007/06/edmx">
  <edmx:DataServices m:DataServiceVersion="3.0"
      xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
    <Schema Namespace="NS" xmlns="http://schemas.microsoft.com/ado/2009/11/edm">
      <EntityType Name="Customer"/>
      <ComplexType Name="Address"/>
      <EntityContainer Name="Container">
        <EntitySet Name="Customers" EntityType="NS.Customer"/>
      </EntityContainer>
    </Schema>
  </edmx:DataServices>
</edmx:Edmx>"#;
}

#[cfg(test)]
mod tests {
    use super::*;
    use odata_common::LinkKind;

    #[test]
    fn test_customer_is_read_only() {
        let c = customer(1);
        assert!(c.is_read_only());
        assert_eq!(c.property("ID").unwrap().value.as_primitive().unwrap().text(), "1");
    }

    #[test]
    fn test_links_fixture() {
        let c = customer_with_links(ServiceVersion::V4, 1, 2);
        assert_eq!(c.links_of(LinkKind::Navigation).count(), 3);
        assert_eq!(c.links_of(LinkKind::Association).count(), 1);
        assert_eq!(c.links_of(LinkKind::MediaEdit).count(), 1);
    }

    #[test]
    fn test_page_is_anchored() {
        let page = customer_page(2);
        assert_eq!(page.len(), 2);
        assert!(page.next().is_some());
    }
}

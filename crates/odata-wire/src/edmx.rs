//! `$metadata` summary reader.
//!
//! Reads the names an EDMX document declares (schemas, entity types,
//! complex types, entity sets) without building a type system.

use odata_common::document::{EntitySetDecl, SchemaSummary};
use odata_common::{MetadataDocument, ODataError, ODataResult};

use crate::element::Element;

pub(crate) fn read_metadata(bytes: &[u8]) -> ODataResult<MetadataDocument> {
    let root = Element::parse(bytes)?;
    if root.name != "edmx:Edmx" {
        return Err(ODataError::MalformedPayload(format!(
            "expected edmx:Edmx but found '{}'",
            root.name
        )));
    }

    let data_services = root.child("edmx:DataServices");
    let schemas = data_services
        .map(|ds| ds.children_named("edm:Schema").map(schema).collect())
        .unwrap_or_default();

    Ok(MetadataDocument {
        edmx_version: root.attribute("Version").unwrap_or_default().to_string(),
        data_service_version: data_services
            .and_then(|ds| ds.attribute("m:DataServiceVersion"))
            .map(str::to_string),
        schemas,
    })
}

fn schema(element: &Element) -> SchemaSummary {
    let names = |kind: &str| -> Vec<String> {
        element
            .children_named(kind)
            .filter_map(|e| e.attribute("Name"))
            .map(str::to_string)
            .collect()
    };
    let entity_sets = element
        .children_named("edm:EntityContainer")
        .flat_map(|c| c.children_named("edm:EntitySet"))
        .filter_map(|set| {
            Some(EntitySetDecl {
                name: set.attribute("Name")?.to_string(),
                entity_type: set.attribute("EntityType")?.to_string(),
            })
        })
        .collect();

    SchemaSummary {
        namespace: element.attribute("Namespace").unwrap_or_default().to_string(),
        entity_types: names("edm:EntityType"),
        complex_types: names("edm:ComplexType"),
        entity_sets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v3_metadata() {
        let xml = r#"<edmx:Edmx Version="1.0" xmlns:edmx="http://schemas.microsoft.com/ado/2007/06/edmx">
          <edmx:DataServices m:DataServiceVersion="3.0"
              xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
            <Schema Namespace="NS" xmlns="http://schemas.microsoft.com/ado/2009/11/edm">
              <EntityType Name="Customer"/>
              <EntityType Name="Order"/>
              <ComplexType Name="Address"/>
              <EntityContainer Name="Container">
                <EntitySet Name="Customers" EntityType="NS.Customer"/>
              </EntityContainer>
            </Schema>
          </edmx:DataServices>
        </edmx:Edmx>"#;
        let doc = read_metadata(xml.as_bytes()).unwrap();
        assert_eq!(doc.edmx_version, "1.0");
        assert_eq!(doc.data_service_version.as_deref(), Some("3.0"));
        let ns = doc.schema("NS").unwrap();
        assert_eq!(ns.entity_types, vec!["Customer", "Order"]);
        assert_eq!(ns.complex_types, vec!["Address"]);
        assert_eq!(doc.entity_sets().next().unwrap().entity_type, "NS.Customer");
    }

    #[test]
    fn test_not_edmx() {
        assert!(read_metadata(b"<feed/>").is_err());
    }
}

//! Service-level documents: service documents, server errors and metadata
//! summaries.

use url::Url;

/// Kind of resource advertised by a service document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceResourceKind {
    EntitySet,
    FunctionImport,
    Singleton,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDocumentItem {
    pub kind: ServiceResourceKind,
    pub name: String,
    pub title: Option<String>,
    pub url: Url,
}

/// The resources a service exposes at its root.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceDocument {
    pub metadata_context: Option<Url>,
    pub items: Vec<ServiceDocumentItem>,
}

impl ServiceDocument {
    pub fn entity_sets(&self) -> impl Iterator<Item = &ServiceDocumentItem> {
        self.of_kind(ServiceResourceKind::EntitySet)
    }

    pub fn function_imports(&self) -> impl Iterator<Item = &ServiceDocumentItem> {
        self.of_kind(ServiceResourceKind::FunctionImport)
    }

    pub fn singletons(&self) -> impl Iterator<Item = &ServiceDocumentItem> {
        self.of_kind(ServiceResourceKind::Singleton)
    }

    pub fn entity_set_url(&self, name: &str) -> Option<&Url> {
        self.entity_sets().find(|i| i.name == name).map(|i| &i.url)
    }

    fn of_kind(&self, kind: ServiceResourceKind) -> impl Iterator<Item = &ServiceDocumentItem> {
        self.items.iter().filter(move |i| i.kind == kind)
    }
}

/// An error reported by the service in the response body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerError {
    pub code: String,
    pub message: String,
    pub language: Option<String>,
    pub target: Option<String>,
    pub inner_error: Option<String>,
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.code.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "[{}] {}", self.code, self.message)
        }
    }
}

/// Entity set declared in an entity container.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySetDecl {
    pub name: String,
    pub entity_type: String,
}

/// Summary of one schema of an EDMX document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaSummary {
    pub namespace: String,
    pub entity_types: Vec<String>,
    pub complex_types: Vec<String>,
    pub entity_sets: Vec<EntitySetDecl>,
}

/// Summary of a `$metadata` document: enough to navigate a service, no
/// type system.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetadataDocument {
    pub edmx_version: String,
    pub data_service_version: Option<String>,
    pub schemas: Vec<SchemaSummary>,
}

impl MetadataDocument {
    pub fn schema(&self, namespace: &str) -> Option<&SchemaSummary> {
        self.schemas.iter().find(|s| s.namespace == namespace)
    }

    /// All entity sets across every schema.
    pub fn entity_sets(&self) -> impl Iterator<Item = &EntitySetDecl> {
        self.schemas.iter().flat_map(|s| s.entity_sets.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_document_lookup() {
        let doc = ServiceDocument {
            metadata_context: None,
            items: vec![
                ServiceDocumentItem {
                    kind: ServiceResourceKind::EntitySet,
                    name: "Customers".to_string(),
                    title: None,
                    url: Url::parse("http://h/svc/Customers").unwrap(),
                },
                ServiceDocumentItem {
                    kind: ServiceResourceKind::Singleton,
                    name: "Me".to_string(),
                    title: None,
                    url: Url::parse("http://h/svc/Me").unwrap(),
                },
            ],
        };
        assert_eq!(doc.entity_sets().count(), 1);
        assert_eq!(doc.singletons().count(), 1);
        assert_eq!(
            doc.entity_set_url("Customers").unwrap().as_str(),
            "http://h/svc/Customers"
        );
        assert!(doc.entity_set_url("Me").is_none());
    }

    #[test]
    fn test_server_error_display() {
        let err = ServerError {
            code: "404".to_string(),
            message: "Not found".to_string(),
            ..Default::default()
        };
        assert_eq!(err.to_string(), "[404] Not found");
    }
}

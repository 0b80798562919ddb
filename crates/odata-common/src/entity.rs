//! Entities, entity sets and bound operations.

use url::Url;

use crate::link::{Link, LinkKind};
use crate::value::Property;

/// An action or function advertised by an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub metadata_anchor: String,
    pub title: String,
    pub target: Url,
}

impl Operation {
    pub fn new(metadata_anchor: impl Into<String>, title: impl Into<String>, target: Url) -> Self {
        Self {
            metadata_anchor: metadata_anchor.into(),
            title: title.into(),
            target,
        }
    }
}

/// An entity instance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entity {
    pub type_name: String,
    pub etag: Option<String>,
    pub edit_link: Option<Url>,
    /// The entity's own (read) link. An entity keyed by a self link is read-only.
    pub self_link: Option<Url>,
    pub links: Vec<Link>,
    pub operations: Vec<Operation>,
    pub media_entity: bool,
    pub media_content_source: Option<Url>,
    pub media_content_type: Option<String>,
    pub properties: Vec<Property>,
}

impl Entity {
    /// An unkeyed entity of the given type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    /// An entity keyed by its self link.
    pub fn keyed(type_name: impl Into<String>, self_link: Url) -> Self {
        Self {
            type_name: type_name.into(),
            self_link: Some(self_link),
            ..Default::default()
        }
    }

    /// Entity name used as the title of its own links.
    pub fn name(&self) -> &str {
        &self.type_name
    }

    pub fn is_read_only(&self) -> bool {
        self.self_link.is_some()
    }

    pub fn is_media_entity(&self) -> bool {
        self.media_entity
    }

    /// Mark this entity as a media entity with the given content.
    pub fn with_media(mut self, source: Option<Url>, content_type: Option<String>) -> Self {
        self.media_entity = true;
        self.media_content_source = source;
        self.media_content_type = content_type;
        self
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    pub fn with_edit_link(mut self, edit_link: Url) -> Self {
        self.edit_link = Some(edit_link);
        self
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.add_property(property);
        self
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Add a property, replacing any existing property with the same name.
    /// Returns the replaced property.
    pub fn add_property(&mut self, property: Property) -> Option<Property> {
        match self.properties.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => Some(std::mem::replace(existing, property)),
            None => {
                self.properties.push(property);
                None
            }
        }
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn links_of(&self, kind: LinkKind) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.kind == kind)
    }

    pub fn link(&self, title: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.title == title)
    }
}

/// An ordered set of entities, optionally paged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntitySet {
    pub entities: Vec<Entity>,
    pub count: Option<i64>,
    next: Option<Url>,
}

impl EntitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set anchored at a continuation URI.
    pub fn anchored(next: Url) -> Self {
        Self {
            next: Some(next),
            ..Default::default()
        }
    }

    /// URI of the next page, if the server paged the result.
    pub fn next(&self) -> Option<&Url> {
        self.next.as_ref()
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn push(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

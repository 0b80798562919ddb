//! Entity/link binder.
//!
//! Converts domain objects into wire resources of a given family and wire
//! resources back into domain objects. Outbound binding cannot fail; inbound
//! binding resolves hrefs against base URIs, parses geometries and resolves
//! declared primitive types, any of which may fail.
//!
//! Base URI precedence on the way in: an explicit base handed in by the
//! caller wins over the base a resource declares itself. Entries of a feed
//! receive the feed's resolved base explicitly. Inline resources use their
//! own base when they declare one and the enclosing resource's base
//! otherwise.

use odata_common::document::ServiceResourceKind;
use odata_common::edm::collection_item_type;
use odata_common::link::{
    ASSOCIATION_MEDIA_TYPE, ENTRY_MEDIA_TYPE, FEED_MEDIA_TYPE, MEDIA_EDIT_MEDIA_TYPE,
};
use odata_common::uri::{parse_base, resolve};
use odata_common::{
    CollectionValue, ComplexValue, EdmPrimitiveType, Entity, EntitySet, Inline, Link, LinkKind,
    ODataError, ODataResult, Operation, PrimitiveValue, Property, ServiceDocument,
    ServiceDocumentItem, ServiceVersion, Url, Value,
};
use odata_wire::{
    gml, ResourceFactory, ResourceFamily, WireEntry, WireEntryLink, WireFeed, WireLink,
    WireOperation, WireProperty, WireServiceDocument, WireServiceItem, WireValue,
};
use tracing::debug;

/// Bidirectional converter between wire resources and the domain model.
///
/// Stateless apart from its settings; one binder can be shared freely
/// between threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binder {
    factory: ResourceFactory,
    emit_types: bool,
}

impl Binder {
    pub fn new(version: ServiceVersion) -> Self {
        Self {
            factory: ResourceFactory::new(version),
            emit_types: true,
        }
    }

    /// Whether outbound properties carry their declared type names.
    pub fn with_types(mut self, emit_types: bool) -> Self {
        self.emit_types = emit_types;
        self
    }

    pub fn version(&self) -> ServiceVersion {
        self.factory.version()
    }

    pub fn factory(&self) -> &ResourceFactory {
        &self.factory
    }

    // === Outbound ===

    pub fn bind_feed(&self, entity_set: &EntitySet, family: ResourceFamily) -> WireFeed {
        let mut feed = self.factory.new_feed(family);
        feed.count = entity_set.count;
        feed.next = entity_set.next().map(Url::to_string);
        let entry_family = ResourceFactory::entry_family_for(family);
        feed.entries = entity_set
            .entities
            .iter()
            .map(|e| self.bind_entity(e, entry_family))
            .collect();
        feed
    }

    pub fn bind_entity(&self, entity: &Entity, family: ResourceFamily) -> WireEntry {
        let mut entry = self.factory.new_entry(family);
        if !entity.type_name.is_empty() {
            entry.type_name = Some(entity.type_name.clone());
        }
        entry.etag = entity.etag.clone();

        let entry_link = |url: &Url| WireEntryLink {
            title: entity.name().to_string(),
            href: url.to_string(),
        };
        entry.edit_link = entity.edit_link.as_ref().map(entry_link);
        if entity.is_read_only() {
            entry.self_link = entity.self_link.as_ref().map(entry_link);
        }

        for link in &entity.links {
            let wire = self.bind_link(link, family);
            match link.kind {
                LinkKind::Navigation => entry.navigation_links.push(wire),
                LinkKind::MediaEdit => entry.media_edit_links.push(wire),
                LinkKind::Association => entry.association_links.push(wire),
            }
        }

        entry.operations = entity
            .operations
            .iter()
            .map(|op| WireOperation {
                metadata_anchor: op.metadata_anchor.clone(),
                title: op.title.clone(),
                target: op.target.to_string(),
            })
            .collect();

        if entity.is_media_entity() {
            entry.media_entry = true;
            entry.media_content_source = entity.media_content_source.as_ref().map(Url::to_string);
            entry.media_content_type = entity.media_content_type.clone();
        }

        entry.properties = entity
            .properties
            .iter()
            .map(|p| self.bind_property(p, family))
            .collect();
        entry
    }

    pub fn bind_link(&self, link: &Link, family: ResourceFamily) -> WireLink {
        let mut wire = WireLink::new(link.kind, link.relation.as_str(), link.title.as_str());
        wire.href = link.href.as_ref().map(Url::to_string);
        if !link.media_type.is_empty() {
            wire.media_type = Some(link.media_type.clone());
        }
        wire.media_etag = link.media_etag.clone();
        match link.inline() {
            Some(Inline::Entity(entity)) => {
                wire.inline_entry = Some(Box::new(self.bind_entity(entity, family)));
            }
            Some(Inline::EntitySet(set)) => {
                wire.inline_feed = Some(self.bind_feed(set, family));
            }
            None => {}
        }
        wire
    }

    pub fn bind_property(&self, property: &Property, family: ResourceFamily) -> WireProperty {
        let mut wire = self.factory.new_property(family, property.name.as_str());
        wire.value = self.bind_value(&property.value, family);
        if self.emit_types {
            wire.type_name = property.value.declared_type_name();
        }
        wire
    }

    /// Collection items are bound as bare values; no property names are
    /// invented for them.
    pub fn bind_value(&self, value: &Value, family: ResourceFamily) -> WireValue {
        match value {
            Value::Null => WireValue::Null,
            Value::Primitive(p) => WireValue::Simple(p.text().to_string()),
            Value::Geospatial(geo) => WireValue::Geospatial(gml::serialize(geo)),
            Value::Complex(complex) => WireValue::Complex(
                complex
                    .properties
                    .iter()
                    .map(|p| self.bind_property(p, family))
                    .collect(),
            ),
            Value::Collection(collection) => WireValue::Collection(
                collection
                    .items
                    .iter()
                    .map(|item| self.bind_value(item, family))
                    .collect(),
            ),
        }
    }

    // === Inbound ===

    pub fn unbind_feed(&self, feed: &WireFeed, default_base: Option<&Url>) -> ODataResult<EntitySet> {
        let base = effective_base(default_base, feed.base.as_deref())?;
        let mut set = match &feed.next {
            Some(next) => EntitySet::anchored(resolve(base.as_ref(), next)?),
            None => EntitySet::new(),
        };
        set.count = feed.count;
        for entry in &feed.entries {
            set.push(self.unbind_entry(entry, base.as_ref())?);
        }
        debug!(entities = set.len(), count = ?set.count, "Unbound feed");
        Ok(set)
    }

    pub fn unbind_entry(&self, entry: &WireEntry, default_base: Option<&Url>) -> ODataResult<Entity> {
        let base = effective_base(default_base, entry.base.as_deref())?;
        let base = base.as_ref();
        let resolve_link = |link: &Option<WireEntryLink>| -> ODataResult<Option<Url>> {
            link.as_ref().map(|l| resolve(base, &l.href)).transpose()
        };

        let mut entity = Entity::new(entry.type_name.clone().unwrap_or_default());
        entity.self_link = resolve_link(&entry.self_link)?;
        entity.edit_link = resolve_link(&entry.edit_link)?;
        entity.etag = entry.etag.clone().filter(|etag| !etag.trim().is_empty());

        let links = entry
            .association_links
            .iter()
            .chain(&entry.navigation_links)
            .chain(&entry.media_edit_links);
        for link in links {
            entity.links.push(self.unbind_link(link, base)?);
        }

        for op in &entry.operations {
            entity.operations.push(Operation::new(
                op.metadata_anchor.as_str(),
                op.title.as_str(),
                resolve(base, &op.target)?,
            ));
        }

        if entry.media_entry {
            entity.media_entity = true;
            entity.media_content_source = entry
                .media_content_source
                .as_deref()
                .map(|src| resolve(base, src))
                .transpose()?;
            entity.media_content_type = entry.media_content_type.clone();
        }

        for property in &entry.properties {
            entity.add_property(self.unbind_property(property)?);
        }
        Ok(entity)
    }

    /// A link may carry an inline entry or an inline feed but never both.
    /// A link with neither and no href is still a valid link.
    pub fn unbind_link(&self, link: &WireLink, default_base: Option<&Url>) -> ODataResult<Link> {
        if link.inline_entry.is_some() && link.inline_feed.is_some() {
            return Err(ODataError::MalformedLink(format!(
                "link '{}' carries both an inline entry and an inline feed",
                link.title
            )));
        }

        let href = link
            .href
            .as_deref()
            .map(|href| resolve(default_base, href))
            .transpose()?;
        let media_type = link
            .media_type
            .clone()
            .unwrap_or_else(|| default_media_type(link).to_string());
        let mut domain = Link::new(link.kind, link.rel.as_str(), link.title.as_str())
            .with_href(href)
            .with_media_type(media_type);
        if let Some(etag) = &link.media_etag {
            domain = domain.with_media_etag(etag.as_str());
        }

        if let Some(entry) = &link.inline_entry {
            let base = inline_base(entry.base.as_deref(), default_base)?;
            let entity = self.unbind_entry(entry, base.as_ref())?;
            domain = domain.with_inline(Inline::Entity(Box::new(entity)))?;
        } else if let Some(feed) = &link.inline_feed {
            let base = inline_base(feed.base.as_deref(), default_base)?;
            let set = self.unbind_feed(feed, base.as_ref())?;
            domain = domain.with_inline(Inline::EntitySet(set))?;
        }
        Ok(domain)
    }

    pub fn unbind_property(&self, property: &WireProperty) -> ODataResult<Property> {
        let value = self.unbind_value(&property.value, property.type_name.as_deref())?;
        Ok(Property::new(property.name.as_str(), value))
    }

    /// Convert a wire value given the type declared for it, if any.
    ///
    /// Geospatial values without a concrete declared type take their shape
    /// from the payload's root element. Simple values without a declared
    /// type stay untyped.
    pub fn unbind_value(&self, value: &WireValue, declared_type: Option<&str>) -> ODataResult<Value> {
        let version = self.version();
        let unbound = match value {
            WireValue::Null => Value::Null,
            WireValue::Simple(text) => match declared_type {
                None => PrimitiveValue::untyped(text.as_str()).into(),
                Some(name) => {
                    let edm = EdmPrimitiveType::from_name(name, version)?;
                    if edm.is_geospatial() {
                        return Err(ODataError::MalformedGeometry(format!(
                            "{} value without a geometry tree",
                            edm
                        )));
                    }
                    PrimitiveValue::new(Some(edm), text.as_str()).into()
                }
            },
            WireValue::Geospatial(tree) => {
                let declared = match declared_type {
                    Some(name) => EdmPrimitiveType::from_name(name, version)?.as_geospatial(),
                    None => None,
                };
                let kind = gml::resolve_kind(tree, declared)?;
                gml::parse(tree, kind)?.into()
            }
            WireValue::Complex(properties) => {
                let mut complex = ComplexValue::new(declared_type.map(str::to_string));
                for property in properties {
                    complex.properties.push(self.unbind_property(property)?);
                }
                complex.into()
            }
            WireValue::Collection(items) => {
                let item_type = declared_type.and_then(collection_item_type);
                let mut collection = CollectionValue::new(declared_type.map(str::to_string));
                for item in items {
                    collection.items.push(self.unbind_value(item, item_type)?);
                }
                collection.into()
            }
        };
        Ok(unbound)
    }

    pub fn unbind_service_document(
        &self,
        document: &WireServiceDocument,
        default_base: Option<&Url>,
    ) -> ODataResult<ServiceDocument> {
        let base = effective_base(default_base, document.base.as_deref())?;
        let groups = [
            (ServiceResourceKind::EntitySet, &document.entity_sets),
            (ServiceResourceKind::FunctionImport, &document.function_imports),
            (ServiceResourceKind::Singleton, &document.singletons),
        ];

        let mut items = Vec::new();
        for (kind, group) in groups {
            for item in group.iter() {
                items.push(service_item(kind, item, base.as_ref())?);
            }
        }
        Ok(ServiceDocument {
            metadata_context: document
                .metadata_context
                .as_deref()
                .map(|c| resolve(base.as_ref(), c))
                .transpose()?,
            items,
        })
    }
}

fn service_item(
    kind: ServiceResourceKind,
    item: &WireServiceItem,
    base: Option<&Url>,
) -> ODataResult<ServiceDocumentItem> {
    Ok(ServiceDocumentItem {
        kind,
        name: item.name.clone(),
        title: item.title.clone(),
        url: resolve(base, &item.href)?,
    })
}

/// Explicit base else the resource's own.
fn effective_base(explicit: Option<&Url>, own: Option<&str>) -> ODataResult<Option<Url>> {
    match explicit {
        Some(base) => Ok(Some(base.clone())),
        None => parse_base(own),
    }
}

/// The inline resource's own base else the enclosing one.
fn inline_base(own: Option<&str>, outer: Option<&Url>) -> ODataResult<Option<Url>> {
    Ok(parse_base(own)?.or_else(|| outer.cloned()))
}

fn default_media_type(link: &WireLink) -> &'static str {
    match link.kind {
        LinkKind::Navigation if link.inline_entry.is_some() => ENTRY_MEDIA_TYPE,
        LinkKind::Navigation => FEED_MEDIA_TYPE,
        LinkKind::Association => ASSOCIATION_MEDIA_TYPE,
        LinkKind::MediaEdit => MEDIA_EDIT_MEDIA_TYPE,
    }
}

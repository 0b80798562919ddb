use odata_common::edm::collection_item_type;
use odata_common::link::{
    ASSOCIATION_MEDIA_TYPE, ENTRY_MEDIA_TYPE, FEED_MEDIA_TYPE, MEDIA_EDIT_MEDIA_TYPE,
};
use odata_common::uri::{base_of_context, context_fragment_tail};
use odata_common::{Dimension, LinkKind, ODataError, ODataResult, ServiceVersion};
use serde_json::{Map, Value};

use super::geojson;
use super::*;
use crate::gml;
use crate::resource::{
    ResourceFamily, WireEntry, WireEntryLink, WireFeed, WireLink, WireOperation, WireProperty,
    WireValue,
};

const FAMILY: ResourceFamily = ResourceFamily::Json;

type Object = Map<String, Value>;

/// Maps JSON documents onto wire resources.
#[derive(Debug, Clone, Copy)]
pub(crate) struct JsonDeserializer {
    version: ServiceVersion,
}

/// Members of a JSON object split into instance annotations, per-property
/// annotations and plain members, each in document order.
#[derive(Default)]
struct Members<'a> {
    annotations: Vec<(&'a str, &'a Value)>,
    property_annotations: Vec<(&'a str, Vec<(&'a str, &'a Value)>)>,
    operations: Vec<(&'a str, &'a Value)>,
    plain: Vec<(&'a str, &'a Value)>,
}

impl<'a> Members<'a> {
    fn property_annotation(&self, property: &str, name: &str) -> Option<&'a Value> {
        self.property_annotations
            .iter()
            .find(|(p, _)| *p == property)
            .and_then(|(_, anns)| anns.iter().find(|(n, _)| *n == name))
            .map(|(_, v)| *v)
    }

    fn plain(&self, name: &str) -> Option<&'a Value> {
        self.plain.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }
}

impl JsonDeserializer {
    pub(crate) fn new(version: ServiceVersion) -> Self {
        Self { version }
    }

    pub(crate) fn feed(&self, bytes: &[u8]) -> ODataResult<WireFeed> {
        let document: Value = serde_json::from_slice(bytes)?;
        self.feed_from(as_object(&document, "feed")?)
    }

    pub(crate) fn entry(&self, bytes: &[u8]) -> ODataResult<WireEntry> {
        let document: Value = serde_json::from_slice(bytes)?;
        self.entry_from(as_object(&document, "entry")?)
    }

    /// A property document. The property name is taken from the last
    /// segment of the context URL fragment, when there is one.
    pub(crate) fn property(&self, bytes: &[u8]) -> ODataResult<WireProperty> {
        let document: Value = serde_json::from_slice(bytes)?;
        let object = as_object(&document, "property")?;
        let members = self.split(object);

        let context = self.annotation_str(&members, CONTEXT);
        let type_name = self.annotation_str(&members, TYPE).as_deref().map(strip_hash);
        let raw = members.plain(VALUE).unwrap_or(&Value::Null);
        let value = value_from(raw, type_name.as_deref())?;

        let name = context
            .as_deref()
            .and_then(context_fragment_tail)
            .unwrap_or_default()
            .to_string();
        let mut property = WireProperty::named(FAMILY, name, value);
        property.type_name = type_name;
        property.metadata_etag = self.annotation_str(&members, METADATA_ETAG);
        property.base = context.as_deref().and_then(context_base);
        property.context = context;
        Ok(property)
    }

    pub(crate) fn feed_from(&self, object: &Object) -> ODataResult<WireFeed> {
        let members = self.split(object);
        let mut feed = WireFeed::empty(FAMILY);
        feed.context = self.annotation_str(&members, CONTEXT);
        feed.base = feed.context.as_deref().and_then(context_base);
        feed.metadata_etag = self.annotation_str(&members, METADATA_ETAG);
        feed.count = self.annotation(&members, COUNT).and_then(as_count);
        feed.next = self.annotation_str(&members, NEXT_LINK);
        if let Some(entries) = members.plain(VALUE) {
            feed.entries = self.entries_from(entries)?;
        }
        Ok(feed)
    }

    pub(crate) fn entry_from(&self, object: &Object) -> ODataResult<WireEntry> {
        let members = self.split(object);
        let mut entry = WireEntry::empty(FAMILY);
        entry.context = self.annotation_str(&members, CONTEXT);
        entry.base = entry.context.as_deref().and_then(context_base);
        entry.metadata_etag = self.annotation_str(&members, METADATA_ETAG);
        entry.type_name = self.annotation_str(&members, TYPE).as_deref().map(strip_hash);
        entry.etag = self.annotation_str(&members, ETAG);
        entry.edit_link = self.annotation_str(&members, EDIT_LINK).map(entry_link);
        entry.self_link = self.annotation_str(&members, READ_LINK).map(entry_link);
        if let Some(source) = self.annotation_str(&members, MEDIA_READ_LINK) {
            entry.media_entry = true;
            entry.media_content_source = Some(source);
            entry.media_content_type = self.annotation_str(&members, MEDIA_CONTENT_TYPE);
        }

        for (key, value) in &members.operations {
            entry.operations.push(WireOperation {
                metadata_anchor: key.to_string(),
                title: str_member(value, "title").unwrap_or_default(),
                target: str_member(value, "target").unwrap_or_default(),
            });
        }

        let navigation = self.version.navigation_link_annotation();
        let association = self.version.association_link_annotation();
        let mut inline_names = Vec::new();
        for (name, annotations) in &members.property_annotations {
            for (annotation, value) in annotations {
                let kind = match *annotation {
                    a if a == navigation => LinkKind::Navigation,
                    a if a == association => LinkKind::Association,
                    MEDIA_EDIT_LINK => LinkKind::MediaEdit,
                    _ => continue,
                };
                let mut link = WireLink::new(kind, self.version.rel_for(kind, name), *name);
                link.href = value.as_str().map(str::to_string);
                match kind {
                    LinkKind::Navigation => {
                        if let Some(inline) = members.plain(name) {
                            inline_names.push(*name);
                            self.set_inline(&mut link, &members, name, inline)?;
                        }
                        link.media_type = Some(navigation_media_type(&link).to_string());
                        entry.navigation_links.push(link);
                    }
                    LinkKind::Association => {
                        link.media_type = Some(ASSOCIATION_MEDIA_TYPE.to_string());
                        entry.association_links.push(link);
                    }
                    LinkKind::MediaEdit => {
                        link.media_type = Some(MEDIA_EDIT_MEDIA_TYPE.to_string());
                        link.media_etag = members
                            .property_annotation(name, MEDIA_ETAG)
                            .and_then(Value::as_str)
                            .map(str::to_string);
                        entry.media_edit_links.push(link);
                    }
                }
            }
        }

        for (name, value) in &members.plain {
            if inline_names.contains(name) {
                continue;
            }
            entry.properties.push(self.property_from(&members, name, value)?);
        }
        Ok(entry)
    }

    fn set_inline(
        &self,
        link: &mut WireLink,
        members: &Members<'_>,
        name: &str,
        inline: &Value,
    ) -> ODataResult<()> {
        match inline {
            Value::Object(object) => {
                link.inline_entry = Some(Box::new(self.entry_from(object)?));
            }
            Value::Array(_) => {
                let mut feed = WireFeed::empty(FAMILY);
                feed.count = members.property_annotation(name, COUNT).and_then(as_count);
                feed.next = members
                    .property_annotation(name, NEXT_LINK)
                    .and_then(Value::as_str)
                    .map(str::to_string);
                feed.entries = self.entries_from(inline)?;
                link.inline_feed = Some(feed);
            }
            _ => {}
        }
        Ok(())
    }

    fn entries_from(&self, value: &Value) -> ODataResult<Vec<WireEntry>> {
        let items = value.as_array().ok_or_else(|| {
            ODataError::MalformedPayload("feed entries must be a JSON array".to_string())
        })?;
        items
            .iter()
            .map(|item| self.entry_from(as_object(item, "entry")?))
            .collect()
    }

    fn property_from(
        &self,
        members: &Members<'_>,
        name: &str,
        value: &Value,
    ) -> ODataResult<WireProperty> {
        let type_name = members
            .property_annotation(name, TYPE)
            .and_then(Value::as_str)
            .map(strip_hash);
        let value = value_from(value, type_name.as_deref())?;
        let mut property = WireProperty::named(FAMILY, name, value);
        property.type_name = type_name;
        Ok(property)
    }

    fn split<'a>(&self, object: &'a Object) -> Members<'a> {
        let prefix = self.version.annotation_prefix();
        let mut members = Members::default();
        for (key, value) in object {
            if let Some(name) = key.strip_prefix(prefix) {
                members.annotations.push((name, value));
            } else if key.starts_with('#') {
                members.operations.push((key.as_str(), value));
            } else if let Some((property, annotation)) = key.split_once("@odata.") {
                match members
                    .property_annotations
                    .iter_mut()
                    .find(|(p, _)| *p == property)
                {
                    Some((_, anns)) => anns.push((annotation, value)),
                    None => members
                        .property_annotations
                        .push((property, vec![(annotation, value)])),
                }
            } else if !key.contains('@') {
                members.plain.push((key.as_str(), value));
            }
        }
        members
    }

    fn annotation<'a>(&self, members: &Members<'a>, name: &str) -> Option<&'a Value> {
        // V3 spells the context annotation "metadata"
        let name = match (self.version, name) {
            (ServiceVersion::V3, CONTEXT) => "metadata",
            _ => name,
        };
        members
            .annotations
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    fn annotation_str(&self, members: &Members<'_>, name: &str) -> Option<String> {
        self.annotation(members, name)
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

fn navigation_media_type(link: &WireLink) -> &'static str {
    if link.inline_entry.is_some() {
        ENTRY_MEDIA_TYPE
    } else {
        FEED_MEDIA_TYPE
    }
}

/// Convert a JSON value. Arrays become collections, objects complex values
/// unless they are GeoJSON geometries.
pub(crate) fn value_from(value: &Value, type_name: Option<&str>) -> ODataResult<WireValue> {
    let wire = match value {
        Value::Null => WireValue::Null,
        Value::Bool(b) => WireValue::Simple(b.to_string()),
        Value::Number(n) => WireValue::Simple(n.to_string()),
        Value::String(s) => WireValue::Simple(s.clone()),
        Value::Array(items) => {
            let item_type = type_name.and_then(collection_item_type);
            WireValue::Collection(
                items
                    .iter()
                    .map(|item| value_from(item, item_type))
                    .collect::<ODataResult<_>>()?,
            )
        }
        Value::Object(object) if geojson::is_geojson(object) => {
            let dimension = type_name
                .map(Dimension::of_type_name)
                .unwrap_or(Dimension::Geometry);
            WireValue::Geospatial(gml::serialize(&geojson::from_json(value, dimension)?))
        }
        Value::Object(object) => {
            let mut properties = Vec::new();
            let typed = |name: &str| -> Option<String> {
                object
                    .get(&format!("{}@odata.type", name))
                    .and_then(Value::as_str)
                    .map(strip_hash)
            };
            for (key, item) in object {
                if key.contains('@') || key.starts_with("odata.") {
                    continue;
                }
                let item_type = typed(key);
                let value = value_from(item, item_type.as_deref())?;
                let mut property = WireProperty::named(FAMILY, key.as_str(), value);
                property.type_name = item_type;
                properties.push(property);
            }
            WireValue::Complex(properties)
        }
    };
    Ok(wire)
}

fn as_object<'a>(value: &'a Value, what: &str) -> ODataResult<&'a Object> {
    value.as_object().ok_or_else(|| {
        ODataError::MalformedPayload(format!("expected a JSON object for {}", what))
    })
}

fn as_count(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn str_member(value: &Value, name: &str) -> Option<String> {
    value.get(name).and_then(Value::as_str).map(str::to_string)
}

fn strip_hash(type_name: &str) -> String {
    type_name.trim_start_matches('#').to_string()
}

fn entry_link(href: String) -> WireEntryLink {
    WireEntryLink {
        title: String::new(),
        href,
    }
}

fn context_base(context: &str) -> Option<String> {
    base_of_context(context).map(|url| url.to_string())
}

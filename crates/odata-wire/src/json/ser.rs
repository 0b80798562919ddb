use odata_common::edm::collection_item_type;
use odata_common::{EdmPrimitiveType, ODataError, ODataResult, ServiceVersion};
use serde_json::{Map, Number, Value};

use super::geojson;
use super::*;
use crate::gml;
use crate::resource::{WireEntry, WireFeed, WireLink, WireProperty, WireValue};

/// Writes wire resources as JSON documents.
#[derive(Debug, Clone, Copy)]
pub(crate) struct JsonSerializer {
    version: ServiceVersion,
}

impl JsonSerializer {
    pub(crate) fn new(version: ServiceVersion) -> Self {
        Self { version }
    }

    pub(crate) fn feed(&self, feed: &WireFeed) -> ODataResult<Vec<u8>> {
        Ok(serde_json::to_vec(&Value::Object(self.feed_object(feed)?))?)
    }

    pub(crate) fn entry(&self, entry: &WireEntry) -> ODataResult<Vec<u8>> {
        self.entries(std::slice::from_ref(entry))
    }

    /// Entries written back to back as consecutive JSON objects.
    pub(crate) fn entries(&self, entries: &[WireEntry]) -> ODataResult<Vec<u8>> {
        let mut out = Vec::new();
        for entry in entries {
            serde_json::to_writer(&mut out, &Value::Object(self.entry_object(entry)?))?;
        }
        Ok(out)
    }

    pub(crate) fn property(&self, property: &WireProperty) -> ODataResult<Vec<u8>> {
        let mut object = Map::new();
        self.put_annotation(&mut object, CONTEXT, &property.context);
        self.put_annotation(&mut object, METADATA_ETAG, &property.metadata_etag);
        if let Some(type_name) = &property.type_name {
            object.insert(
                self.version.annotation(TYPE),
                Value::String(self.version.json_type_value(type_name)),
            );
        }
        object.insert(
            VALUE.to_string(),
            self.value(&property.value, property.type_name.as_deref())?,
        );
        Ok(serde_json::to_vec(&Value::Object(object))?)
    }

    pub(crate) fn link(&self, link: &WireLink) -> ODataResult<Vec<u8>> {
        let mut object = Map::new();
        object.insert(
            self.version.json_link_key(),
            link.href.clone().map(Value::String).unwrap_or(Value::Null),
        );
        Ok(serde_json::to_vec(&Value::Object(object))?)
    }

    fn feed_object(&self, feed: &WireFeed) -> ODataResult<Map<String, Value>> {
        let mut object = Map::new();
        self.put_annotation(&mut object, CONTEXT, &feed.context);
        self.put_annotation(&mut object, METADATA_ETAG, &feed.metadata_etag);
        if let Some(count) = feed.count {
            object.insert(self.version.annotation(COUNT), Value::from(count));
        }
        object.insert(VALUE.to_string(), self.entry_array(&feed.entries)?);
        self.put_annotation(&mut object, NEXT_LINK, &feed.next);
        Ok(object)
    }

    fn entry_array(&self, entries: &[WireEntry]) -> ODataResult<Value> {
        let items = entries
            .iter()
            .map(|e| self.entry_object(e).map(Value::Object))
            .collect::<ODataResult<Vec<_>>>()?;
        Ok(Value::Array(items))
    }

    fn entry_object(&self, entry: &WireEntry) -> ODataResult<Map<String, Value>> {
        let v = self.version;
        let mut object = Map::new();
        self.put_annotation(&mut object, CONTEXT, &entry.context);
        self.put_annotation(&mut object, METADATA_ETAG, &entry.metadata_etag);
        let type_value = entry.type_name.as_deref().map(|t| v.json_type_value(t));
        self.put_annotation(&mut object, TYPE, &type_value);
        self.put_annotation(&mut object, ETAG, &entry.etag);
        let edit = entry.edit_link.as_ref().map(|l| l.href.clone());
        self.put_annotation(&mut object, EDIT_LINK, &edit);
        let read = entry.self_link.as_ref().map(|l| l.href.clone());
        self.put_annotation(&mut object, READ_LINK, &read);
        if entry.media_entry {
            self.put_annotation(&mut object, MEDIA_READ_LINK, &entry.media_content_source);
            self.put_annotation(&mut object, MEDIA_CONTENT_TYPE, &entry.media_content_type);
        }

        for operation in &entry.operations {
            let mut body = Map::new();
            body.insert("title".to_string(), Value::String(operation.title.clone()));
            body.insert("target".to_string(), Value::String(operation.target.clone()));
            object.insert(operation_key(&operation.metadata_anchor), Value::Object(body));
        }

        for link in &entry.navigation_links {
            let name = &link.title;
            object.insert(
                v.property_annotation(name, v.navigation_link_annotation()),
                href_value(link),
            );
            match (&link.inline_entry, &link.inline_feed) {
                (Some(_), Some(_)) => {
                    return Err(ODataError::MalformedLink(format!(
                        "navigation link '{}' carries both an inline entry and an inline feed",
                        name
                    )))
                }
                (Some(inline), None) => {
                    object.insert(name.clone(), Value::Object(self.entry_object(inline)?));
                }
                (None, Some(feed)) => {
                    if let Some(count) = feed.count {
                        object.insert(v.property_annotation(name, COUNT), Value::from(count));
                    }
                    if let Some(next) = &feed.next {
                        object.insert(
                            v.property_annotation(name, NEXT_LINK),
                            Value::String(next.clone()),
                        );
                    }
                    object.insert(name.clone(), self.entry_array(&feed.entries)?);
                }
                (None, None) => {}
            }
        }
        for link in &entry.association_links {
            object.insert(
                v.property_annotation(&link.title, v.association_link_annotation()),
                href_value(link),
            );
        }
        for link in &entry.media_edit_links {
            object.insert(
                v.property_annotation(&link.title, MEDIA_EDIT_LINK),
                href_value(link),
            );
            if let Some(etag) = &link.media_etag {
                object.insert(
                    v.property_annotation(&link.title, MEDIA_ETAG),
                    Value::String(etag.clone()),
                );
            }
        }

        self.put_properties(&mut object, &entry.properties)?;
        Ok(object)
    }

    fn put_properties(
        &self,
        object: &mut Map<String, Value>,
        properties: &[WireProperty],
    ) -> ODataResult<()> {
        for property in properties {
            if let Some(type_name) = &property.type_name {
                object.insert(
                    self.version.property_annotation(&property.name, TYPE),
                    Value::String(self.version.json_type_value(type_name)),
                );
            }
            object.insert(
                property.name.clone(),
                self.value(&property.value, property.type_name.as_deref())?,
            );
        }
        Ok(())
    }

    fn value(&self, value: &WireValue, type_name: Option<&str>) -> ODataResult<Value> {
        let json = match value {
            WireValue::Null => Value::Null,
            WireValue::Simple(text) => self.simple(text, type_name),
            WireValue::Geospatial(tree) => {
                let declared = type_name
                    .and_then(|t| EdmPrimitiveType::from_name(t, self.version).ok())
                    .and_then(|t| t.as_geospatial());
                let kind = gml::resolve_kind(tree, declared)?;
                geojson::to_json(&gml::parse(tree, kind)?)?
            }
            WireValue::Complex(properties) => {
                let mut object = Map::new();
                self.put_properties(&mut object, properties)?;
                Value::Object(object)
            }
            WireValue::Collection(items) => {
                let item_type = type_name.and_then(collection_item_type);
                Value::Array(
                    items
                        .iter()
                        .map(|item| self.value(item, item_type))
                        .collect::<ODataResult<_>>()?,
                )
            }
        };
        Ok(json)
    }

    /// Booleans and small numeric types become JSON literals when their text
    /// is already the canonical literal; everything else stays a string.
    fn simple(&self, text: &str, type_name: Option<&str>) -> Value {
        let edm = type_name.and_then(|t| EdmPrimitiveType::from_name(t, self.version).ok());
        match edm {
            Some(EdmPrimitiveType::Boolean) if text == "true" || text == "false" => {
                Value::Bool(text == "true")
            }
            Some(t) if t.is_json_number() => match serde_json::from_str::<Number>(text) {
                Ok(n) if n.to_string() == text => Value::Number(n),
                _ => Value::String(text.to_string()),
            },
            _ => Value::String(text.to_string()),
        }
    }

    fn put_annotation(&self, object: &mut Map<String, Value>, name: &str, value: &Option<String>) {
        if let Some(value) = value {
            object.insert(self.version.annotation(name), Value::String(value.clone()));
        }
    }
}

fn href_value(link: &WireLink) -> Value {
    link.href.clone().map(Value::String).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::JsonDeserializer;
    use crate::resource::ResourceFamily;
    use odata_common::LinkKind;

    fn typed(name: &str, type_name: &str, value: WireValue) -> WireProperty {
        let mut property = WireProperty::named(ResourceFamily::Json, name, value);
        property.type_name = Some(type_name.to_string());
        property
    }

    #[test]
    fn test_number_literals() {
        let ser = JsonSerializer::new(ServiceVersion::V4);
        assert_eq!(ser.simple("42", Some("Edm.Int32")), Value::from(42));
        assert_eq!(ser.simple("1.5", Some("Edm.Double")), Value::from(1.5));
        assert_eq!(ser.simple("INF", Some("Edm.Double")), Value::from("INF"));
        assert_eq!(ser.simple("42", Some("Edm.Int64")), Value::from("42"));
        assert_eq!(ser.simple("true", Some("Edm.Boolean")), Value::Bool(true));
        assert_eq!(ser.simple("42", None), Value::from("42"));
    }

    #[test]
    fn test_entry_round_trip() {
        let version = ServiceVersion::V3;
        let mut entry = WireEntry::empty(ResourceFamily::Json);
        entry.type_name = Some("NS.Customer".to_string());
        entry.properties.push(typed("ID", "Edm.Int32", WireValue::Simple("1".to_string())));
        entry.properties.push(typed(
            "Tags",
            "Collection(Edm.Int32)",
            WireValue::Collection(vec![
                WireValue::Simple("1".to_string()),
                WireValue::Simple("2".to_string()),
            ]),
        ));
        let mut orders = WireLink::new(
            LinkKind::Navigation,
            version.rel_for(LinkKind::Navigation, "Orders"),
            "Orders",
        )
        .with_href("http://h/svc/Customers(1)/Orders");
        orders.media_type = Some(odata_common::link::FEED_MEDIA_TYPE.to_string());
        entry.navigation_links.push(orders);

        let bytes = JsonSerializer::new(version).entry(&entry).unwrap();
        let parsed = JsonDeserializer::new(version).entry(&bytes).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_both_inline_slots_rejected() {
        let mut link = WireLink::new(LinkKind::Navigation, "rel", "Orders");
        link.inline_entry = Some(Box::new(WireEntry::empty(ResourceFamily::Json)));
        link.inline_feed = Some(WireFeed::empty(ResourceFamily::Json));
        let mut entry = WireEntry::empty(ResourceFamily::Json);
        entry.navigation_links.push(link);
        let err = JsonSerializer::new(ServiceVersion::V4).entry(&entry).unwrap_err();
        assert!(matches!(err, ODataError::MalformedLink(_)));
    }

    #[test]
    fn test_link_document() {
        let link = WireLink::new(LinkKind::Navigation, "rel", "Orders").with_href("http://h/o(1)");
        let bytes = JsonSerializer::new(ServiceVersion::V4).link(&link).unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["@odata.id"], "http://h/o(1)");
    }
}

//! Service documents and error payloads.

use odata_common::uri::base_of_context;
use odata_common::{ODataError, ODataResult, ServerError, ServiceVersion};
use serde_json::Value;

use crate::element::Element;
use crate::resource::{ResourceFamily, WireServiceDocument, WireServiceItem};

/// Read a service document of either family.
pub(crate) fn read_service_document(
    bytes: &[u8],
    family: ResourceFamily,
    version: ServiceVersion,
) -> ODataResult<WireServiceDocument> {
    match family {
        ResourceFamily::Atom => atom_service_document(&Element::parse(bytes)?),
        ResourceFamily::Json => json_service_document(&serde_json::from_slice(bytes)?, version),
    }
}

fn atom_service_document(root: &Element) -> ODataResult<WireServiceDocument> {
    if root.name != "app:service" {
        return Err(ODataError::MalformedPayload(format!(
            "expected app:service but found '{}'",
            root.name
        )));
    }

    let mut document = WireServiceDocument {
        base: root.attribute("xml:base").map(str::to_string),
        metadata_context: root.attribute("m:context").map(str::to_string),
        ..Default::default()
    };
    for workspace in root.children_named("app:workspace") {
        for child in &workspace.children {
            let Some(href) = child.attribute("href") else {
                continue;
            };
            let title = child.child("title").map(|t| t.text.trim().to_string());
            let name = child
                .attribute("m:name")
                .map(str::to_string)
                .or_else(|| title.clone())
                .unwrap_or_else(|| href.to_string());
            let item = WireServiceItem {
                name,
                title,
                href: href.to_string(),
            };
            match child.name.as_str() {
                "app:collection" => document.entity_sets.push(item),
                "m:function-import" => document.function_imports.push(item),
                "m:singleton" => document.singletons.push(item),
                _ => {}
            }
        }
    }
    Ok(document)
}

fn json_service_document(
    root: &Value,
    version: ServiceVersion,
) -> ODataResult<WireServiceDocument> {
    let context = root
        .get(version.annotation("context"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let mut document = WireServiceDocument {
        base: context
            .as_deref()
            .and_then(base_of_context)
            .map(|u| u.to_string()),
        metadata_context: context,
        ..Default::default()
    };

    let items = root
        .get("value")
        .and_then(Value::as_array)
        .ok_or_else(|| ODataError::MalformedPayload("service document without value".to_string()))?;
    for item in items {
        let name = item.get("name").and_then(Value::as_str).unwrap_or_default();
        let Some(href) = item.get("url").and_then(Value::as_str) else {
            continue;
        };
        let entry = WireServiceItem {
            name: name.to_string(),
            title: item.get("title").and_then(Value::as_str).map(str::to_string),
            href: href.to_string(),
        };
        match item.get("kind").and_then(Value::as_str).unwrap_or("EntitySet") {
            "FunctionImport" => document.function_imports.push(entry),
            "Singleton" => document.singletons.push(entry),
            "EntitySet" => document.entity_sets.push(entry),
            _ => {}
        }
    }
    Ok(document)
}

/// Read an error payload of either family.
pub(crate) fn read_error(
    bytes: &[u8],
    family: ResourceFamily,
    version: ServiceVersion,
) -> ODataResult<ServerError> {
    match family {
        ResourceFamily::Atom => xml_error(&Element::parse(bytes)?),
        ResourceFamily::Json => json_error(&serde_json::from_slice(bytes)?, version),
    }
}

fn xml_error(root: &Element) -> ODataResult<ServerError> {
    if root.name != "m:error" {
        return Err(ODataError::MalformedPayload(format!(
            "expected m:error but found '{}'",
            root.name
        )));
    }
    let text = |name: &str| root.child(name).map(|e| e.text.trim().to_string());
    let message = root.child("m:message");
    Ok(ServerError {
        code: text("m:code").unwrap_or_default(),
        message: message.map(|m| m.text.trim().to_string()).unwrap_or_default(),
        language: message.and_then(|m| m.attribute("xml:lang")).map(str::to_string),
        target: text("m:target"),
        inner_error: text("m:innererror").filter(|t| !t.is_empty()),
    })
}

fn json_error(root: &Value, version: ServiceVersion) -> ODataResult<ServerError> {
    let error = root
        .get(version.json_error_key())
        .or_else(|| root.get("error"))
        .or_else(|| root.get("odata.error"))
        .ok_or_else(|| ODataError::MalformedPayload("not an error document".to_string()))?;

    let str_of = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);
    // V3 wraps the message in {"lang", "value"}
    let (message, language) = match error.get("message") {
        Some(Value::Object(m)) => (str_of(m.get("value")), str_of(m.get("lang"))),
        other => (str_of(other), None),
    };
    let inner_error = error.get("innererror").map(|inner| match inner {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    });

    Ok(ServerError {
        code: str_of(error.get("code")).unwrap_or_default(),
        message: message.unwrap_or_default(),
        language,
        target: str_of(error.get("target")),
        inner_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atom_service_document() {
        let xml = r#"<service xmlns="http://www.w3.org/2007/app"
            xmlns:atom="http://www.w3.org/2005/Atom"
            xmlns:m="http://docs.oasis-open.org/odata/ns/metadata"
            xml:base="http://h/svc/">
          <workspace>
            <atom:title>Default</atom:title>
            <collection href="Customers"><atom:title>Customers</atom:title></collection>
            <m:singleton href="Me" m:name="Me"><atom:title>Me</atom:title></m:singleton>
            <m:function-import href="Top" m:name="Top"/>
          </workspace>
        </service>"#;
        let doc = read_service_document(xml.as_bytes(), ResourceFamily::Atom, ServiceVersion::V4)
            .unwrap();
        assert_eq!(doc.base.as_deref(), Some("http://h/svc/"));
        assert_eq!(doc.entity_sets[0].name, "Customers");
        assert_eq!(doc.singletons[0].href, "Me");
        assert_eq!(doc.function_imports[0].name, "Top");
    }

    #[test]
    fn test_json_service_document() {
        let json = r#"{"odata.metadata": "http://h/svc/$metadata",
            "value": [{"name": "Customers", "url": "Customers"}]}"#;
        let doc = read_service_document(json.as_bytes(), ResourceFamily::Json, ServiceVersion::V3)
            .unwrap();
        assert_eq!(doc.base.as_deref(), Some("http://h/svc/"));
        assert_eq!(doc.entity_sets.len(), 1);
    }

    #[test]
    fn test_v3_json_error() {
        let json = r#"{"odata.error": {"code": "400",
            "message": {"lang": "en-US", "value": "Bad request"}}}"#;
        let err = read_error(json.as_bytes(), ResourceFamily::Json, ServiceVersion::V3).unwrap();
        assert_eq!(err.code, "400");
        assert_eq!(err.message, "Bad request");
        assert_eq!(err.language.as_deref(), Some("en-US"));
    }

    #[test]
    fn test_xml_error() {
        let xml = r#"<m:error xmlns:m="http://docs.oasis-open.org/odata/ns/metadata">
            <m:code>404</m:code><m:message xml:lang="en">Not found</m:message>
          </m:error>"#;
        let err = read_error(xml.as_bytes(), ResourceFamily::Atom, ServiceVersion::V4).unwrap();
        assert_eq!(err.to_string(), "[404] Not found");
        assert_eq!(err.language.as_deref(), Some("en"));
        assert_eq!(err.inner_error, None);
    }
}

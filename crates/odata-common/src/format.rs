//! Payload formats understood by the reader and writer.

use serde::{Deserialize, Serialize};

use crate::version::ServiceVersion;

/// A payload format tag as negotiated with a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// application/atom+xml
    #[default]
    Atom,
    /// application/xml (properties, links, metadata)
    Xml,
    /// application/json with minimal metadata
    Json,
    /// application/json without metadata annotations
    JsonNoMetadata,
    /// application/json with full metadata annotations
    JsonFullMetadata,
    /// text/plain raw values
    Text,
    /// application/octet-stream raw values
    Binary,
}

impl Format {
    /// Parse a format from a short name or MIME type.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        let mime = lower.split(';').next().unwrap_or("").trim();
        match mime {
            "atom" | "application/atom+xml" => Some(Format::Atom),
            "xml" | "application/xml" | "text/xml" => Some(Format::Xml),
            "json" | "application/json" => {
                if lower.contains("nometadata") || lower.contains("metadata=none") {
                    Some(Format::JsonNoMetadata)
                } else if lower.contains("fullmetadata") || lower.contains("metadata=full") {
                    Some(Format::JsonFullMetadata)
                } else {
                    Some(Format::Json)
                }
            }
            "json_no_metadata" => Some(Format::JsonNoMetadata),
            "json_full_metadata" => Some(Format::JsonFullMetadata),
            "text" | "text/plain" => Some(Format::Text),
            "binary" | "application/octet-stream" => Some(Format::Binary),
            _ => None,
        }
    }

    /// Content type to send for this format.
    pub fn content_type(&self, version: ServiceVersion) -> &'static str {
        match (self, version) {
            (Format::Atom, _) => "application/atom+xml",
            (Format::Xml, _) => "application/xml",
            (Format::Json, ServiceVersion::V3) => "application/json;odata=minimalmetadata",
            (Format::Json, ServiceVersion::V4) => "application/json;odata.metadata=minimal",
            (Format::JsonNoMetadata, ServiceVersion::V3) => "application/json;odata=nometadata",
            (Format::JsonNoMetadata, ServiceVersion::V4) => "application/json;odata.metadata=none",
            (Format::JsonFullMetadata, ServiceVersion::V3) => {
                "application/json;odata=fullmetadata"
            }
            (Format::JsonFullMetadata, ServiceVersion::V4) => {
                "application/json;odata.metadata=full"
            }
            (Format::Text, _) => "text/plain",
            (Format::Binary, _) => "application/octet-stream",
        }
    }

    /// Whether this is a raw value format (no resource tree).
    pub fn is_raw(&self) -> bool {
        matches!(self, Format::Text | Format::Binary)
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Format::Atom => "atom",
            Format::Xml => "xml",
            Format::Json => "json",
            Format::JsonNoMetadata => "json_no_metadata",
            Format::JsonFullMetadata => "json_full_metadata",
            Format::Text => "text",
            Format::Binary => "binary",
        };
        f.write_str(name)
    }
}

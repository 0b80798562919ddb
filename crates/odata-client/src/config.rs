//! Client configuration.

use std::fs;
use std::path::Path;

use odata_common::{Format, ODataError, ODataResult, ServiceVersion};
use serde::{Deserialize, Serialize};

/// Settings chosen once when a client is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Protocol version spoken by the service.
    pub version: ServiceVersion,

    /// Format for feeds and entries.
    pub format: Format,

    /// Format for standalone properties and links.
    pub property_format: Format,

    /// Emit declared type names on outbound properties.
    pub emit_types: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: ServiceVersion::V3,
            format: Format::Atom,
            property_format: Format::Xml,
            emit_types: true,
        }
    }
}

impl ClientConfig {
    /// Defaults for a protocol version: Atom/XML for V3, JSON for V4.
    pub fn for_version(version: ServiceVersion) -> Self {
        match version {
            ServiceVersion::V3 => Self::default(),
            ServiceVersion::V4 => Self {
                version,
                format: Format::Json,
                property_format: Format::Json,
                ..Self::default()
            },
        }
    }

    /// Load configuration from environment variables over the defaults.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `ODATA_*` environment variables. Unparseable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("ODATA_VERSION") {
            if let Some(version) = ServiceVersion::parse(&val) {
                self.version = version;
            }
        }

        if let Ok(val) = std::env::var("ODATA_FORMAT") {
            if let Some(format) = Format::parse(&val) {
                self.format = format;
            }
        }

        if let Ok(val) = std::env::var("ODATA_PROPERTY_FORMAT") {
            if let Some(format) = Format::parse(&val) {
                self.property_format = format;
            }
        }

        if let Ok(val) = std::env::var("ODATA_EMIT_TYPES") {
            self.emit_types = val.to_lowercase() == "true" || val == "1";
        }

        self
    }

    /// Load configuration from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ODataResult<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(yaml: &str) -> ODataResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| ODataError::InvalidConfig(format!("invalid client config: {}", e)))?;
        config.validate().map_err(ODataError::InvalidConfig)?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.format.is_raw() {
            return Err(format!("format must be a resource format, got {}", self.format));
        }

        if self.property_format.is_raw() {
            return Err(format!(
                "property_format must be a resource format, got {}",
                self.property_format
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.version, ServiceVersion::V3);
        assert_eq!(config.format, Format::Atom);
        assert!(config.emit_types);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_for_version() {
        let config = ClientConfig::for_version(ServiceVersion::V4);
        assert_eq!(config.format, Format::Json);
        assert_eq!(config.property_format, Format::Json);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ClientConfig::from_yaml_str("version: v4\nformat: json\n").unwrap();
        assert_eq!(config.version, ServiceVersion::V4);
        assert_eq!(config.format, Format::Json);
        assert_eq!(config.property_format, Format::Xml);
        assert!(config.emit_types);
    }

    #[test]
    fn test_raw_format_rejected() {
        let result = ClientConfig::from_yaml_str("format: text\n");
        assert!(matches!(result, Err(ODataError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        let result = ClientConfig::from_yaml_str("version: [v4");
        assert!(matches!(result, Err(ODataError::InvalidConfig(_))));
    }
}

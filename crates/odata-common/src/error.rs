//! Error types shared by every OData crate in the workspace.

use thiserror::Error;

/// Result type alias using ODataError.
pub type ODataResult<T> = Result<T, ODataError>;

/// Primary error type for OData binding, codec and I/O operations.
#[derive(Debug, Error)]
pub enum ODataError {
    // === Geospatial Errors ===
    #[error("Type cannot be instantiated: {0}")]
    NotInstantiableType(String),

    #[error("Malformed geometry: {0}")]
    MalformedGeometry(String),

    // === Binding Errors ===
    #[error("No base URI available to resolve '{0}'")]
    UnresolvableBase(String),

    #[error("Unknown declared type: {0}")]
    UnknownDeclaredType(String),

    #[error("Malformed link: {0}")]
    MalformedLink(String),

    #[error("Invalid value for {type_name}: {message}")]
    InvalidValue { type_name: String, message: String },

    #[error("Invalid URI: {0}")]
    InvalidUri(#[from] url::ParseError),

    // === Format Errors ===
    #[error("Cannot produce {0} from the given input")]
    UnsupportedTargetShape(String),

    #[error("Format not supported here: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Infrastructure Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ODataError {
    /// Shorthand for a value that does not parse as its declared type.
    pub fn invalid_value(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        ODataError::InvalidValue {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Whether the error comes from malformed input rather than caller misuse.
    pub fn is_content_error(&self) -> bool {
        matches!(
            self,
            ODataError::MalformedGeometry(_)
                | ODataError::MalformedLink(_)
                | ODataError::MalformedPayload(_)
                | ODataError::Xml(_)
                | ODataError::Json(_)
                | ODataError::InvalidValue { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ODataError::NotInstantiableType("Edm.Geography".to_string());
        let display = format!("{}", err);
        assert!(display.contains("cannot be instantiated"));
        assert!(display.contains("Edm.Geography"));
    }

    #[test]
    fn test_url_error_conversion() {
        let parse_err = url::Url::parse("not a url").unwrap_err();
        let err: ODataError = parse_err.into();
        assert!(matches!(err, ODataError::InvalidUri(_)));
        assert!(!err.is_content_error());
    }

    #[test]
    fn test_content_errors() {
        assert!(ODataError::MalformedGeometry("pos".to_string()).is_content_error());
        assert!(ODataError::invalid_value("Edm.Int32", "abc").is_content_error());
        assert!(!ODataError::UnresolvableBase("./p2".to_string()).is_content_error());
    }
}

//! Typed error handling for the input filter library
//!
//! Construction problems (bad specifications, unknown plugin names, unknown
//! validation-group names, wrongly shaped data) are reported through these
//! types. A failed validation is *not* an error: it is reported as `false`
//! plus a message map.
//!
//! # Error Categories
//!
//! - [`ConfigurationError`]: malformed specification
//! - [`PluginError`]: a named filter/validator/input kind could not be built
//! - [`UnknownNameError`]: validation group references an unregistered name
//! - [`InputFilterError::InvalidData`]: `set_data` received the wrong shape
//!
//! # Example
//!
//! ```rust,ignore
//! match factory.create_input_filter_from_value(&spec) {
//!     Ok(filter) => { /* ... */ }
//!     Err(InputFilterError::Plugin(PluginError::NotFound { name, .. })) => {
//!         eprintln!("no such plugin: {}", name);
//!     }
//!     Err(e) => eprintln!("{} ({})", e, e.error_code()),
//! }
//! ```

use std::fmt;

/// Convenience alias used across the crate
pub type Result<T, E = InputFilterError> = std::result::Result<T, E>;

/// The main error type of the crate
#[derive(Debug, thiserror::Error)]
pub enum InputFilterError {
    /// Malformed specification
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Plugin resolution failed
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Validation group references an unknown name
    #[error(transparent)]
    UnknownName(#[from] UnknownNameError),

    /// Data handed to `set_data`/`set_value` has the wrong shape
    #[error("Invalid data for '{target}': expected {expected}, got {found}")]
    InvalidData {
        target: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl InputFilterError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            InputFilterError::Configuration(e) => e.error_code(),
            InputFilterError::Plugin(e) => e.error_code(),
            InputFilterError::UnknownName(_) => "UNKNOWN_NAME",
            InputFilterError::InvalidData { .. } => "INVALID_DATA",
        }
    }

    pub(crate) fn invalid_data(
        target: impl Into<String>,
        expected: &'static str,
        found: &serde_json::Value,
    ) -> Self {
        InputFilterError::InvalidData {
            target: target.into(),
            expected,
            found: crate::core::value::json_type_name(found),
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors raised while interpreting a declarative specification
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// Missing required key in a specification
    #[error("Missing required key '{field}' in {context}")]
    MissingField { field: String, context: String },

    /// A key holds a value of the wrong type
    #[error("Invalid value '{value}' for key '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// The target kind cannot perform the requested operation
    #[error("Kind '{kind}' does not support {operation}")]
    UnsupportedOperation { kind: String, operation: String },

    /// Failed to parse a textual specification
    #[error("Failed to parse {format} specification: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
}

impl ConfigurationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigurationError::MissingField { .. } => "CONFIG_MISSING_FIELD",
            ConfigurationError::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
            ConfigurationError::UnsupportedOperation { .. } => "CONFIG_UNSUPPORTED",
            ConfigurationError::Parse { .. } => "CONFIG_PARSE_ERROR",
        }
    }

    pub(crate) fn invalid_value(
        field: impl Into<String>,
        value: &serde_json::Value,
        message: impl Into<String>,
    ) -> Self {
        ConfigurationError::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            message: message.into(),
        }
    }
}

impl From<serde_yaml::Error> for ConfigurationError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigurationError::Parse {
            format: "YAML",
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ConfigurationError {
    fn from(err: serde_json::Error) -> Self {
        ConfigurationError::Parse {
            format: "JSON",
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Plugin Errors
// =============================================================================

/// What a plugin resolver builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginKind {
    Filter,
    Validator,
    Input,
    InputFilter,
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginKind::Filter => write!(f, "filter"),
            PluginKind::Validator => write!(f, "validator"),
            PluginKind::Input => write!(f, "input"),
            PluginKind::InputFilter => write!(f, "input filter"),
        }
    }
}

/// Errors raised by a plugin resolver
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// No plugin registered under that name
    #[error("Unknown {kind} plugin: {name}")]
    NotFound { kind: PluginKind, name: String },

    /// The plugin exists but rejected its options
    #[error("Invalid options for {kind} plugin '{name}': {source}")]
    InvalidOptions {
        kind: PluginKind,
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl PluginError {
    pub fn error_code(&self) -> &'static str {
        match self {
            PluginError::NotFound { .. } => "PLUGIN_NOT_FOUND",
            PluginError::InvalidOptions { .. } => "PLUGIN_INVALID_OPTIONS",
        }
    }
}

// =============================================================================
// Validation Group Errors
// =============================================================================

/// Validation group references a name the input filter does not own
#[derive(Debug, thiserror::Error)]
pub enum UnknownNameError {
    #[error("Input '{name}' is not registered in this input filter")]
    UnknownInput { name: String },

    /// A nested group was requested for a plain input
    #[error("'{name}' is an input, not an input filter; nested groups need an input filter")]
    NotAnInputFilter { name: String },

    /// Failure inside a nested input filter
    #[error("In nested input filter '{name}': {source}")]
    Nested {
        name: String,
        #[source]
        source: Box<InputFilterError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plugin_not_found_message() {
        let err: InputFilterError = PluginError::NotFound {
            kind: PluginKind::Validator,
            name: "nope".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Unknown validator plugin: nope");
        assert_eq!(err.error_code(), "PLUGIN_NOT_FOUND");
    }

    #[test]
    fn test_invalid_data_names_json_types() {
        let err = InputFilterError::invalid_data("tags", "array", &json!({"a": 1}));
        assert_eq!(
            err.to_string(),
            "Invalid data for 'tags': expected array, got object"
        );
        assert_eq!(err.error_code(), "INVALID_DATA");
    }

    #[test]
    fn test_nested_unknown_name_keeps_source() {
        let inner: InputFilterError = UnknownNameError::UnknownInput {
            name: "zip".to_string(),
        }
        .into();
        let err = UnknownNameError::Nested {
            name: "address".to_string(),
            source: Box::new(inner),
        };
        let text = err.to_string();
        assert!(text.contains("address"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_yaml_error_converts_to_parse_error() {
        let yaml_err = serde_yaml::from_str::<serde_json::Value>("a: [").unwrap_err();
        let err: ConfigurationError = yaml_err.into();
        assert_eq!(err.error_code(), "CONFIG_PARSE_ERROR");
    }
}

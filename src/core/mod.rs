//! Core module containing the error types, value helpers, plugin resolution
//! and the filter/validator chains

pub mod error;
pub mod plugins;
pub mod validation;
pub mod value;

pub use error::{
    ConfigurationError, InputFilterError, PluginError, PluginKind, Result, UnknownNameError,
};
pub use plugins::{
    ConfigurableViaSpec, PluginOptions, PluginRegistry, PluginResolver, canonical_name,
};
pub use validation::{FilterChain, ValidatorChain};
pub use value::{Messages, Shared, ValidationMessages, failure, is_empty_value};

/// Handle to a filter chain that may be shared between inputs
pub type SharedFilterChain = Shared<FilterChain>;

/// Handle to a validator chain that may be shared between inputs
pub type SharedValidatorChain = Shared<ValidatorChain>;

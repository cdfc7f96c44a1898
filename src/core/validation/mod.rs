//! Filtering and validation building blocks
//!
//! Filters sanitize a raw value, validators judge the sanitized value. Both
//! are arranged in priority-ordered chains and can be resolved by name
//! through a plugin resolver.

pub mod chain;
pub mod filters;
pub mod validators;

pub use chain::{FilterChain, ValidatorChain};
pub use filters::{Filter, FilterPlugins, default_filter_plugins};
pub use validators::{Context, Validator, ValidatorPlugins, default_validator_plugins};

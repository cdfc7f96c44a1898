//! # InputFilter-RS
//!
//! Declarative input filtering and validation for form-shaped data.
//!
//! ## Features
//!
//! - **Inputs**: one raw value, a filter chain (sanitizers) and a validator chain
//! - **Priority-Ordered Chains**: filters and validators run in a stable, priority-sorted order
//! - **Input Filters**: named inputs and nested input filters validated together
//! - **Collections**: one template input filter applied to every row of a list
//! - **Validation Groups**: validate only part of a form (nested groups included)
//! - **Factory**: build whole input graphs from JSON/YAML specifications
//! - **Pluggable**: filters, validators, input kinds and input-filter kinds resolve by name
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use inputfilter::prelude::*;
//!
//! let factory = Factory::new();
//! let mut form = factory.create_input_filter_from_value(&json!({
//!     "username": {
//!         "filters": ["string_trim", "string_to_lower"],
//!         "validators": [{"name": "string_length", "options": {"min": 3}}]
//!     },
//!     "age": {"required": false, "validators": ["digits"]}
//! }))?;
//!
//! form.set_data(json!({"username": "  Jane  ", "age": "41"}))?;
//! if form.is_valid() {
//!     println!("{}", form.values()); // {"username":"jane","age":"41"}
//! } else {
//!     println!("{}", serde_json::to_string(&form.messages())?);
//! }
//! ```

pub mod config;
pub mod core;
pub mod factory;
pub mod inputs;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        ConfigurableViaSpec, ConfigurationError, FilterChain, InputFilterError, Messages,
        PluginError, PluginKind, PluginOptions, PluginRegistry, PluginResolver, Result, Shared,
        SharedFilterChain, SharedValidatorChain, UnknownNameError, ValidationMessages,
        ValidatorChain, is_empty_value,
    };

    // === Filters & Validators ===
    pub use crate::core::validation::filters::{Filter, FilterPlugins};
    pub use crate::core::validation::validators::{Context, Validator, ValidatorPlugins};

    // === Inputs ===
    pub use crate::inputs::{
        ArrayInput, CollectionInputFilter, Entry, GroupItem, Input, InputFilter,
        InputFilterInterface, InputInterface,
    };

    // === Factory ===
    pub use crate::factory::{
        Factory, FilterSpec, InputFilterSpec, InputSpec, SpecEntry, ValidatorSpec,
    };

    // === Config ===
    pub use crate::config::InputFilterConfig;

    // === External dependencies ===
    pub use serde_json::{Value, json};
}

//! Builds inputs and input filters from declarative specifications
//!
//! The factory owns three things:
//!
//! - the default filter and validator chains every new input starts from
//!   (built lazily over the plugin resolvers, or injected)
//! - a resolver of input kinds (`input`, `array_input` built in)
//! - a resolver of input-filter kinds (`input_filter`, `collection` built in)
//!
//! # Example
//!
//! ```rust,ignore
//! let factory = Factory::new();
//! let mut filter = factory.create_input_filter_from_value(&json!({
//!     "email": {
//!         "name": "email",
//!         "filters": ["string_trim"],
//!         "validators": [{"name": "email_address"}]
//!     }
//! }))?;
//! filter.set_data(json!({"email": " jane@example.com "}))?;
//! assert!(filter.is_valid());
//! ```

pub mod spec;

pub use spec::{
    FilterSpec, FiltersSpec, InputFilterSpec, InputSpec, SpecEntry, ValidatorSpec, ValidatorsSpec,
};

use crate::core::error::{ConfigurationError, PluginKind, Result};
use crate::core::plugins::{PluginOptions, PluginRegistry, PluginResolver};
use crate::core::validation::filters::{FilterPlugins, default_filter_plugins};
use crate::core::validation::validators::{ValidatorPlugins, default_validator_plugins};
use crate::core::validation::{FilterChain, ValidatorChain};
use crate::core::{Shared, SharedFilterChain, SharedValidatorChain};
use crate::inputs::{
    ArrayInput, CollectionInputFilter, Entry, Input, InputFilter, InputFilterInterface,
    InputInterface,
};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Kind used when an input spec has no `type`
pub const DEFAULT_INPUT_KIND: &str = "input";

/// Kind used when an input filter spec has no `type`
pub const DEFAULT_INPUT_FILTER_KIND: &str = "input_filter";

/// Resolver of input kinds
pub type InputKinds = dyn PluginResolver<Box<dyn InputInterface>>;

/// Resolver of input-filter kinds
pub type InputFilterKinds = dyn PluginResolver<Box<dyn InputFilterInterface>>;

impl PluginRegistry<Box<dyn InputInterface>> {
    /// Registry holding the built-in input kinds
    pub fn builtin_inputs() -> Self {
        let mut registry = Self::new(PluginKind::Input);
        registry
            .register("input", |_: &PluginOptions| {
                Ok(Box::new(Input::default()) as Box<dyn InputInterface>)
            })
            .register("array_input", |_: &PluginOptions| {
                Ok(Box::new(ArrayInput::default()) as Box<dyn InputInterface>)
            });
        registry
    }
}

impl PluginRegistry<Box<dyn InputFilterInterface>> {
    /// Registry holding the built-in input filter kinds
    pub fn builtin_input_filters() -> Self {
        let mut registry = Self::new(PluginKind::InputFilter);
        registry
            .register("input_filter", |_: &PluginOptions| {
                Ok(Box::new(InputFilter::new()) as Box<dyn InputFilterInterface>)
            })
            .register("collection", |_: &PluginOptions| {
                Ok(Box::new(CollectionInputFilter::new()) as Box<dyn InputFilterInterface>)
            });
        registry
    }
}

/// Builds input graphs from [`InputSpec`]/[`InputFilterSpec`] or their JSON form
pub struct Factory {
    filter_plugins: Arc<FilterPlugins>,
    validator_plugins: Arc<ValidatorPlugins>,
    default_filter_chain: OnceLock<SharedFilterChain>,
    default_validator_chain: OnceLock<SharedValidatorChain>,
    input_kinds: Arc<InputKinds>,
    input_filter_kinds: Arc<InputFilterKinds>,
}

impl Factory {
    pub fn new() -> Self {
        Self::with_plugins(default_filter_plugins(), default_validator_plugins())
    }

    /// Factory whose default chains resolve names through the given resolvers
    pub fn with_plugins(
        filter_plugins: Arc<FilterPlugins>,
        validator_plugins: Arc<ValidatorPlugins>,
    ) -> Self {
        Self {
            filter_plugins,
            validator_plugins,
            default_filter_chain: OnceLock::new(),
            default_validator_chain: OnceLock::new(),
            input_kinds: Arc::new(PluginRegistry::builtin_inputs()),
            input_filter_kinds: Arc::new(PluginRegistry::builtin_input_filters()),
        }
    }

    /// Chain every new input starts from; built on first use
    pub fn default_filter_chain(&self) -> &SharedFilterChain {
        self.default_filter_chain.get_or_init(|| {
            Shared::new(FilterChain::with_plugins(Arc::clone(&self.filter_plugins)))
        })
    }

    pub fn set_default_filter_chain(&mut self, chain: SharedFilterChain) -> &mut Self {
        self.default_filter_chain = OnceLock::from(chain);
        self
    }

    pub fn default_validator_chain(&self) -> &SharedValidatorChain {
        self.default_validator_chain.get_or_init(|| {
            Shared::new(ValidatorChain::with_plugins(Arc::clone(
                &self.validator_plugins,
            )))
        })
    }

    pub fn set_default_validator_chain(&mut self, chain: SharedValidatorChain) -> &mut Self {
        self.default_validator_chain = OnceLock::from(chain);
        self
    }

    pub fn input_kinds(&self) -> &Arc<InputKinds> {
        &self.input_kinds
    }

    pub fn set_input_kinds(&mut self, kinds: Arc<InputKinds>) -> &mut Self {
        self.input_kinds = kinds;
        self
    }

    pub fn input_filter_kinds(&self) -> &Arc<InputFilterKinds> {
        &self.input_filter_kinds
    }

    pub fn set_input_filter_kinds(&mut self, kinds: Arc<InputFilterKinds>) -> &mut Self {
        self.input_filter_kinds = kinds;
        self
    }

    // === Inputs ===

    /// Build one input
    ///
    /// The input gets private copies of the default chains (still sharing
    /// their plugin resolvers); a chain given in the spec is used as-is.
    pub fn create_input(&self, spec: InputSpec) -> Result<Box<dyn InputInterface>> {
        let kind = spec.kind.as_deref().unwrap_or(DEFAULT_INPUT_KIND);
        let mut input = self.input_kinds.resolve(kind, &PluginOptions::new())?;

        {
            let base = input.input_mut();
            if let Some(name) = &spec.name {
                base.set_name(name.clone());
            }
            base.set_filter_chain(self.default_filter_chain().deep_clone());
            base.set_validator_chain(self.default_validator_chain().deep_clone());

            match (spec.required, spec.allow_empty) {
                (Some(required), Some(allow_empty)) => {
                    base.set_required(required).set_allow_empty(allow_empty);
                }
                (Some(required), None) => {
                    base.set_required(required).set_allow_empty(!required);
                }
                (None, Some(allow_empty)) => {
                    base.set_allow_empty(allow_empty).set_required(!allow_empty);
                }
                (None, None) => {}
            }
            if let Some(flag) = spec.continue_if_empty {
                base.set_continue_if_empty(flag);
            }
            if let Some(flag) = spec.break_on_failure {
                base.set_break_on_failure(flag);
            }
            if spec.error_message.is_some() {
                base.set_error_message(spec.error_message.clone());
            }

            match spec.filters {
                FiltersSpec::Chain(chain) => {
                    base.set_filter_chain(chain);
                }
                FiltersSpec::Entries(entries) => {
                    let mut chain = base.filter_chain().write();
                    for entry in entries {
                        match entry {
                            FilterSpec::Named {
                                name,
                                options,
                                priority,
                            } => {
                                chain.attach_by_name(&name, &options, priority)?;
                            }
                            FilterSpec::Instance { filter, priority } => {
                                chain.attach(filter, priority);
                            }
                        }
                    }
                }
            }

            match spec.validators {
                ValidatorsSpec::Chain(chain) => {
                    base.set_validator_chain(chain);
                }
                ValidatorsSpec::Entries(entries) => {
                    let mut chain = base.validator_chain().write();
                    for entry in entries {
                        match entry {
                            ValidatorSpec::Named {
                                name,
                                options,
                                break_chain_on_failure,
                                priority,
                            } => {
                                chain.attach_by_name(
                                    &name,
                                    &options,
                                    break_chain_on_failure,
                                    priority,
                                )?;
                            }
                            ValidatorSpec::Instance {
                                validator,
                                break_chain_on_failure,
                                priority,
                            } => {
                                chain.attach(validator, break_chain_on_failure, priority);
                            }
                        }
                    }
                }
            }
        }

        for (key, value) in &spec.options {
            if !input.apply_option(key, value)? {
                tracing::debug!(kind = input.kind(), option = %key, "ignoring unsupported input option");
            }
        }

        tracing::debug!(kind = input.kind(), name = %input.input().name(), "built input");
        Ok(input)
    }

    /// Parse and build an input from its JSON form
    pub fn create_input_from_value(&self, value: &Value) -> Result<Box<dyn InputInterface>> {
        self.create_input(InputSpec::from_value(value)?)
    }

    // === Input filters ===

    /// Build an input filter of the spec's kind with every child registered
    /// in specification order
    pub fn create_input_filter(&self, spec: InputFilterSpec) -> Result<Box<dyn InputFilterInterface>> {
        let kind = spec.kind.as_deref().unwrap_or(DEFAULT_INPUT_FILTER_KIND);
        let mut filter = self.input_filter_kinds.resolve(kind, &PluginOptions::new())?;
        let is_collection = filter.as_any().is::<CollectionInputFilter>();

        for (name, entry) in spec.entries {
            if is_collection && matches!(name.as_str(), "input_filter" | "inputfilter") {
                let template = self.create_template(&name, entry)?;
                if let Some(collection) = filter.as_any_mut().downcast_mut::<CollectionInputFilter>() {
                    collection.set_input_filter(template);
                }
                continue;
            }

            if let SpecEntry::Value(value) = &entry {
                if !matches!(value, Value::Object(_) | Value::Array(_)) {
                    if !filter.apply_option(&name, value)? {
                        tracing::debug!(kind = filter.kind(), option = %name, "ignoring unsupported input filter option");
                    }
                    continue;
                }
            }

            let child = self.create_entry(&name, entry)?;
            filter.add(&name, child)?;
        }

        tracing::debug!(kind = filter.kind(), children = filter.len(), "built input filter");
        Ok(filter)
    }

    /// Parse and build an input filter from its JSON form
    pub fn create_input_filter_from_value(
        &self,
        value: &Value,
    ) -> Result<Box<dyn InputFilterInterface>> {
        self.create_input_filter(InputFilterSpec::from_value(value)?)
    }

    /// Build one child; already built entries pass through unchanged
    pub fn create_entry(&self, name: &str, entry: SpecEntry) -> Result<Entry> {
        match entry {
            SpecEntry::Built(entry) => Ok(entry),
            SpecEntry::Input(mut spec) => {
                if spec.name.is_none() {
                    spec.name = Some(name.to_string());
                }
                Ok(Entry::Input(self.create_input(spec)?))
            }
            SpecEntry::InputFilter(spec) => Ok(Entry::Filter(self.create_input_filter(spec)?)),
            SpecEntry::Value(value) => match &value {
                Value::Array(_) => Ok(Entry::Filter(self.create_input_filter_from_value(&value)?)),
                Value::Object(map) => {
                    let names_filter_kind = match map.get("type") {
                        Some(Value::String(kind)) => self.input_filter_kinds.has(kind),
                        _ => false,
                    };
                    if names_filter_kind {
                        return Ok(Entry::Filter(self.create_input_filter_from_value(&value)?));
                    }
                    let mut spec = InputSpec::from_value(&value)?;
                    if spec.name.is_none() {
                        spec.name = Some(name.to_string());
                    }
                    Ok(Entry::Input(self.create_input(spec)?))
                }
                other => Err(ConfigurationError::invalid_value(
                    name,
                    other,
                    "expected an input or input filter specification",
                )
                .into()),
            },
        }
    }

    /// Template of a collection: an input filter, or a spec describing one
    fn create_template(&self, key: &str, entry: SpecEntry) -> Result<Box<dyn InputFilterInterface>> {
        match entry {
            SpecEntry::Built(Entry::Filter(filter)) => Ok(filter),
            SpecEntry::InputFilter(spec) => self.create_input_filter(spec),
            SpecEntry::Value(value @ (Value::Object(_) | Value::Array(_))) => {
                self.create_input_filter_from_value(&value)
            }
            SpecEntry::Value(other) => Err(ConfigurationError::invalid_value(
                key,
                &other,
                "expected an input filter specification",
            )
            .into()),
            SpecEntry::Built(Entry::Input(_)) | SpecEntry::Input(_) => {
                Err(ConfigurationError::InvalidValue {
                    field: key.to_string(),
                    value: "input".to_string(),
                    message: "a collection template must be an input filter".to_string(),
                }
                .into())
            }
        }
    }
}

impl Default for Factory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("default_filter_chain", &self.default_filter_chain.get())
            .field("default_validator_chain", &self.default_validator_chain.get())
            .finish_non_exhaustive()
    }
}

//! Declarative specifications understood by the [`Factory`](super::Factory)
//!
//! Specs can be built in code with the builder methods below, or parsed from
//! the JSON wire format (`from_value`). Recognised keys:
//!
//! - inputs: `name`, `type`, `required`, `allow_empty`, `continue_if_empty`,
//!   `break_on_failure`, `error_message`, `filters`, `validators`; any other
//!   key is handed to the built kind through `apply_option`
//! - filter entries: `name`, `options`, `priority` (or a bare plugin name)
//! - validator entries: `name`, `options`, `priority`, `break_chain_on_failure`
//! - input filters: `type` (when it holds a string) plus one entry per child;
//!   collections also read `input_filter`/`inputfilter` and `count`

use crate::core::error::ConfigurationError;
use crate::core::plugins::PluginOptions;
use crate::core::validation::filters::Filter;
use crate::core::validation::validators::Validator;
use crate::core::validation::{FilterChain, ValidatorChain};
use crate::core::{SharedFilterChain, SharedValidatorChain};
use crate::inputs::input::expect_bool;
use crate::inputs::{Entry, Input, InputFilter};
use serde_json::{Map, Value};
use std::sync::Arc;

// =============================================================================
// Filter and validator entries
// =============================================================================

/// One entry of a `filters` list
#[derive(Debug, Clone)]
pub enum FilterSpec {
    /// Resolved by name through the chain's plugin resolver
    Named {
        name: String,
        options: PluginOptions,
        priority: i32,
    },
    /// Attached as-is
    Instance {
        filter: Arc<dyn Filter>,
        priority: i32,
    },
}

impl FilterSpec {
    pub fn named(name: impl Into<String>) -> Self {
        FilterSpec::Named {
            name: name.into(),
            options: PluginOptions::new(),
            priority: FilterChain::DEFAULT_PRIORITY,
        }
    }

    pub fn instance(filter: Arc<dyn Filter>) -> Self {
        FilterSpec::Instance {
            filter,
            priority: FilterChain::DEFAULT_PRIORITY,
        }
    }

    /// Set one plugin option; ignored for instances
    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        if let FilterSpec::Named { options, .. } = &mut self {
            options.insert(key.into(), value);
        }
        self
    }

    pub fn priority(mut self, value: i32) -> Self {
        match &mut self {
            FilterSpec::Named { priority, .. } | FilterSpec::Instance { priority, .. } => {
                *priority = value
            }
        }
        self
    }

    pub fn from_value(value: &Value) -> Result<Self, ConfigurationError> {
        let (name, options, priority) = named_entry(value, "filter")?;
        Ok(FilterSpec::Named {
            name,
            options,
            priority: priority.unwrap_or(FilterChain::DEFAULT_PRIORITY),
        })
    }
}

/// One entry of a `validators` list
#[derive(Debug, Clone)]
pub enum ValidatorSpec {
    Named {
        name: String,
        options: PluginOptions,
        break_chain_on_failure: bool,
        priority: i32,
    },
    Instance {
        validator: Arc<dyn Validator>,
        break_chain_on_failure: bool,
        priority: i32,
    },
}

impl ValidatorSpec {
    pub fn named(name: impl Into<String>) -> Self {
        ValidatorSpec::Named {
            name: name.into(),
            options: PluginOptions::new(),
            break_chain_on_failure: false,
            priority: ValidatorChain::DEFAULT_PRIORITY,
        }
    }

    pub fn instance(validator: Arc<dyn Validator>) -> Self {
        ValidatorSpec::Instance {
            validator,
            break_chain_on_failure: false,
            priority: ValidatorChain::DEFAULT_PRIORITY,
        }
    }

    /// Set one plugin option; ignored for instances
    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        if let ValidatorSpec::Named { options, .. } = &mut self {
            options.insert(key.into(), value);
        }
        self
    }

    pub fn break_chain_on_failure(mut self, flag: bool) -> Self {
        match &mut self {
            ValidatorSpec::Named {
                break_chain_on_failure,
                ..
            }
            | ValidatorSpec::Instance {
                break_chain_on_failure,
                ..
            } => *break_chain_on_failure = flag,
        }
        self
    }

    pub fn priority(mut self, value: i32) -> Self {
        match &mut self {
            ValidatorSpec::Named { priority, .. } | ValidatorSpec::Instance { priority, .. } => {
                *priority = value
            }
        }
        self
    }

    pub fn from_value(value: &Value) -> Result<Self, ConfigurationError> {
        let (name, options, priority) = named_entry(value, "validator")?;
        let break_chain_on_failure = match value.get("break_chain_on_failure") {
            None | Some(Value::Null) => false,
            Some(flag) => expect_bool("break_chain_on_failure", flag)?,
        };
        Ok(ValidatorSpec::Named {
            name,
            options,
            break_chain_on_failure,
            priority: priority.unwrap_or(ValidatorChain::DEFAULT_PRIORITY),
        })
    }
}

/// Parse `"name"` or `{name, options, priority}`
fn named_entry(
    value: &Value,
    context: &str,
) -> Result<(String, PluginOptions, Option<i32>), ConfigurationError> {
    let map = match value {
        Value::String(name) => return Ok((name.clone(), PluginOptions::new(), None)),
        Value::Object(map) => map,
        other => {
            return Err(ConfigurationError::invalid_value(
                context,
                other,
                "expected a plugin name or an object with a 'name' key",
            ));
        }
    };

    let name = match map.get("name") {
        Some(Value::String(name)) => name.clone(),
        Some(other) => {
            return Err(ConfigurationError::invalid_value(
                "name",
                other,
                "expected a string",
            ));
        }
        None => {
            return Err(ConfigurationError::MissingField {
                field: "name".to_string(),
                context: format!("{} specification", context),
            });
        }
    };

    let options = match map.get("options") {
        None | Some(Value::Null) => PluginOptions::new(),
        Some(Value::Object(options)) => options.clone(),
        Some(other) => {
            return Err(ConfigurationError::invalid_value(
                "options",
                other,
                "expected an object",
            ));
        }
    };

    let priority = match map.get("priority") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            value
                .as_i64()
                .and_then(|p| i32::try_from(p).ok())
                .ok_or_else(|| {
                    ConfigurationError::invalid_value("priority", value, "expected an integer")
                })?,
        ),
    };

    Ok((name, options, priority))
}

/// The `filters` key: a ready chain, or entries to attach to a fresh one
#[derive(Debug, Clone)]
pub enum FiltersSpec {
    /// Used by the input as-is (shared with the caller)
    Chain(SharedFilterChain),
    Entries(Vec<FilterSpec>),
}

impl Default for FiltersSpec {
    fn default() -> Self {
        FiltersSpec::Entries(Vec::new())
    }
}

/// The `validators` key
#[derive(Debug, Clone)]
pub enum ValidatorsSpec {
    Chain(SharedValidatorChain),
    Entries(Vec<ValidatorSpec>),
}

impl Default for ValidatorsSpec {
    fn default() -> Self {
        ValidatorsSpec::Entries(Vec::new())
    }
}

// =============================================================================
// InputSpec
// =============================================================================

/// Declarative description of one input
///
/// `None` flags leave the built kind's defaults alone. When exactly one of
/// `required`/`allow_empty` is given, the other becomes its complement.
#[derive(Debug, Clone, Default)]
pub struct InputSpec {
    pub name: Option<String>,
    /// Input kind; a plain input when absent
    pub kind: Option<String>,
    pub required: Option<bool>,
    pub allow_empty: Option<bool>,
    pub continue_if_empty: Option<bool>,
    pub break_on_failure: Option<bool>,
    pub error_message: Option<String>,
    pub filters: FiltersSpec,
    pub validators: ValidatorsSpec,
    /// Keys forwarded to the built kind
    pub options: Map<String, Value>,
}

impl InputSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn required(mut self, flag: bool) -> Self {
        self.required = Some(flag);
        self
    }

    pub fn allow_empty(mut self, flag: bool) -> Self {
        self.allow_empty = Some(flag);
        self
    }

    pub fn continue_if_empty(mut self, flag: bool) -> Self {
        self.continue_if_empty = Some(flag);
        self
    }

    pub fn break_on_failure(mut self, flag: bool) -> Self {
        self.break_on_failure = Some(flag);
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Append a filter entry; replaces a previously given chain
    pub fn filter(mut self, filter: FilterSpec) -> Self {
        match &mut self.filters {
            FiltersSpec::Entries(entries) => entries.push(filter),
            FiltersSpec::Chain(_) => self.filters = FiltersSpec::Entries(vec![filter]),
        }
        self
    }

    /// Append a validator entry; replaces a previously given chain
    pub fn validator(mut self, validator: ValidatorSpec) -> Self {
        match &mut self.validators {
            ValidatorsSpec::Entries(entries) => entries.push(validator),
            ValidatorsSpec::Chain(_) => self.validators = ValidatorsSpec::Entries(vec![validator]),
        }
        self
    }

    pub fn filter_chain(mut self, chain: SharedFilterChain) -> Self {
        self.filters = FiltersSpec::Chain(chain);
        self
    }

    pub fn validator_chain(mut self, chain: SharedValidatorChain) -> Self {
        self.validators = ValidatorsSpec::Chain(chain);
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Parse an input specification object
    pub fn from_value(value: &Value) -> Result<Self, ConfigurationError> {
        let Value::Object(map) = value else {
            return Err(ConfigurationError::invalid_value(
                "input",
                value,
                "expected an object",
            ));
        };

        let mut spec = InputSpec::default();
        for (key, value) in map {
            match key.as_str() {
                "name" => spec.name = Some(expect_string(key, value)?),
                "type" => spec.kind = Some(expect_string(key, value)?),
                "required" => spec.required = Some(expect_bool(key, value)?),
                "allow_empty" => spec.allow_empty = Some(expect_bool(key, value)?),
                "continue_if_empty" => spec.continue_if_empty = Some(expect_bool(key, value)?),
                "break_on_failure" => spec.break_on_failure = Some(expect_bool(key, value)?),
                "error_message" => {
                    spec.error_message = match value {
                        Value::Null => None,
                        other => Some(expect_string(key, other)?),
                    }
                }
                "filters" => {
                    spec.filters = FiltersSpec::Entries(
                        expect_list(key, value)?
                            .iter()
                            .map(FilterSpec::from_value)
                            .collect::<Result<_, _>>()?,
                    )
                }
                "validators" => {
                    spec.validators = ValidatorsSpec::Entries(
                        expect_list(key, value)?
                            .iter()
                            .map(ValidatorSpec::from_value)
                            .collect::<Result<_, _>>()?,
                    )
                }
                _ => {
                    spec.options.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(spec)
    }
}

fn expect_string(key: &str, value: &Value) -> Result<String, ConfigurationError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ConfigurationError::invalid_value(key, value, "expected a string"))
}

fn expect_list<'a>(key: &str, value: &'a Value) -> Result<&'a [Value], ConfigurationError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(&[]),
        other => Err(ConfigurationError::invalid_value(key, other, "expected a list")),
    }
}

// =============================================================================
// InputFilterSpec
// =============================================================================

/// A child of an input filter specification
#[derive(Debug, Clone)]
pub enum SpecEntry {
    Input(InputSpec),
    InputFilter(InputFilterSpec),
    /// Wire-format value; objects and arrays describe children, scalars are
    /// options for the input filter kind
    Value(Value),
    /// Already built; registered unchanged
    Built(Entry),
}

impl From<InputSpec> for SpecEntry {
    fn from(spec: InputSpec) -> Self {
        SpecEntry::Input(spec)
    }
}

impl From<InputFilterSpec> for SpecEntry {
    fn from(spec: InputFilterSpec) -> Self {
        SpecEntry::InputFilter(spec)
    }
}

impl From<Value> for SpecEntry {
    fn from(value: Value) -> Self {
        SpecEntry::Value(value)
    }
}

impl From<Entry> for SpecEntry {
    fn from(entry: Entry) -> Self {
        SpecEntry::Built(entry)
    }
}

impl From<Input> for SpecEntry {
    fn from(input: Input) -> Self {
        SpecEntry::Built(input.into())
    }
}

impl From<InputFilter> for SpecEntry {
    fn from(filter: InputFilter) -> Self {
        SpecEntry::Built(filter.into())
    }
}

/// Declarative description of an input filter
///
/// Entries keep specification order; the built filter registers its
/// children in that order.
#[derive(Debug, Clone, Default)]
pub struct InputFilterSpec {
    /// Input filter kind; a plain input filter when absent
    pub kind: Option<String>,
    pub entries: Vec<(String, SpecEntry)>,
}

impl InputFilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Add an input spec under its own name
    pub fn input(mut self, spec: InputSpec) -> Self {
        let name = spec.name.clone().unwrap_or_default();
        self.entries.push((name, SpecEntry::Input(spec)));
        self
    }

    /// Add any child (or kind option) under `name`
    pub fn entry(mut self, name: impl Into<String>, entry: impl Into<SpecEntry>) -> Self {
        self.entries.push((name.into(), entry.into()));
        self
    }

    /// Parse the wire format
    ///
    /// An object maps child names to child specs; a string under `type`
    /// selects the kind while any other value under `type` is a child named
    /// "type". An array lists child specs that each carry their own `name`.
    pub fn from_value(value: &Value) -> Result<Self, ConfigurationError> {
        let mut spec = InputFilterSpec::default();
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    match (key.as_str(), child) {
                        ("type", Value::String(kind)) => spec.kind = Some(kind.clone()),
                        _ => spec.entries.push((key.clone(), SpecEntry::Value(child.clone()))),
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    let name = match item.get("name") {
                        Some(Value::String(name)) => name.clone(),
                        Some(other) => {
                            return Err(ConfigurationError::invalid_value(
                                "name",
                                other,
                                "expected a string",
                            ));
                        }
                        None => {
                            return Err(ConfigurationError::MissingField {
                                field: "name".to_string(),
                                context: "input filter list entry".to_string(),
                            });
                        }
                    };
                    spec.entries.push((name, SpecEntry::Value(item.clone())));
                }
            }
            other => {
                return Err(ConfigurationError::invalid_value(
                    "input_filter",
                    other,
                    "expected an object or a list",
                ));
            }
        }
        Ok(spec)
    }
}

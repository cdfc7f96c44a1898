//! Named collections of inputs and nested input filters

use super::input::{Input, InputInterface};
use crate::core::error::{ConfigurationError, InputFilterError, UnknownNameError};
use crate::core::plugins::ConfigurableViaSpec;
use crate::core::value::{ValidationMessages, json_type_name};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;

/// Anything the input filter can hold as a branch
pub trait InputFilterInterface: ConfigurableViaSpec + fmt::Debug + Send + Sync + 'static {
    /// Kind name, as used in specifications
    fn kind(&self) -> &'static str;

    /// Register a child under `name`
    fn add(&mut self, name: &str, entry: Entry) -> Result<(), InputFilterError>;

    /// Replace the raw data and push it into the children
    fn set_data(&mut self, data: Value) -> Result<(), InputFilterError>;

    fn is_valid(&mut self) -> bool;

    /// Messages of the invalid children from the last run
    fn messages(&self) -> ValidationMessages;

    /// Filtered values of the active children
    fn values(&self) -> Value;

    /// Raw values of the active children
    fn raw_values(&self) -> Value;

    /// Restrict the next validation runs to `group`
    fn set_validation_group(&mut self, group: &[GroupItem]) -> Result<(), InputFilterError>;

    /// Validate every child again
    fn clear_validation_group(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn box_clone(&self) -> Box<dyn InputFilterInterface>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl Clone for Box<dyn InputFilterInterface> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// A child of an input filter
#[derive(Debug)]
pub enum Entry {
    Input(Box<dyn InputInterface>),
    Filter(Box<dyn InputFilterInterface>),
}

impl Entry {
    pub fn as_input(&self) -> Option<&dyn InputInterface> {
        match self {
            Entry::Input(input) => Some(input.as_ref()),
            Entry::Filter(_) => None,
        }
    }

    pub fn as_input_mut(&mut self) -> Option<&mut dyn InputInterface> {
        match self {
            Entry::Input(input) => Some(input.as_mut()),
            Entry::Filter(_) => None,
        }
    }

    pub fn as_filter(&self) -> Option<&dyn InputFilterInterface> {
        match self {
            Entry::Filter(filter) => Some(filter.as_ref()),
            Entry::Input(_) => None,
        }
    }

    pub fn as_filter_mut(&mut self) -> Option<&mut dyn InputFilterInterface> {
        match self {
            Entry::Filter(filter) => Some(filter.as_mut()),
            Entry::Input(_) => None,
        }
    }

    fn messages(&self) -> ValidationMessages {
        match self {
            Entry::Input(input) => ValidationMessages::Input(input.input().messages().clone()),
            Entry::Filter(filter) => filter.messages(),
        }
    }
}

impl Clone for Entry {
    fn clone(&self) -> Self {
        match self {
            Entry::Input(input) => Entry::Input(input.box_clone()),
            Entry::Filter(filter) => Entry::Filter(filter.box_clone()),
        }
    }
}

impl From<Input> for Entry {
    fn from(input: Input) -> Self {
        Entry::Input(Box::new(input))
    }
}

impl From<InputFilter> for Entry {
    fn from(filter: InputFilter) -> Self {
        Entry::Filter(Box::new(filter))
    }
}

impl From<Box<dyn InputInterface>> for Entry {
    fn from(input: Box<dyn InputInterface>) -> Self {
        Entry::Input(input)
    }
}

impl From<Box<dyn InputFilterInterface>> for Entry {
    fn from(filter: Box<dyn InputFilterInterface>) -> Self {
        Entry::Filter(filter)
    }
}

/// One name of a validation group, optionally restricting a nested filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupItem {
    Name(String),
    Nested(String, Vec<GroupItem>),
}

impl GroupItem {
    pub fn nested<I, T>(name: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<GroupItem>,
    {
        GroupItem::Nested(name.into(), items.into_iter().map(Into::into).collect())
    }

    pub fn name(&self) -> &str {
        match self {
            GroupItem::Name(name) | GroupItem::Nested(name, _) => name,
        }
    }
}

impl From<&str> for GroupItem {
    fn from(name: &str) -> Self {
        GroupItem::Name(name.to_string())
    }
}

impl From<String> for GroupItem {
    fn from(name: String) -> Self {
        GroupItem::Name(name)
    }
}

/// Plain input filter
///
/// Children are kept in registration order. A validation pass first judges
/// the children present in the data, then the absent ones.
#[derive(Debug, Clone, Default)]
pub struct InputFilter {
    inputs: IndexMap<String, Entry>,
    data: Map<String, Value>,
    validation_group: Option<Vec<String>>,
    valid_inputs: Vec<String>,
    invalid_inputs: Vec<String>,
}

impl InputFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an input under its own name
    pub fn add_input(&mut self, input: impl InputInterface) -> &mut Self {
        let name = input.input().name().to_string();
        self.inputs.insert(name, Entry::Input(Box::new(input)));
        self
    }

    /// Register a child under `name`; an existing child of that name is replaced
    pub fn insert(&mut self, name: impl Into<String>, entry: impl Into<Entry>) -> &mut Self {
        let name = name.into();
        let mut entry = entry.into();
        if let Entry::Input(input) = &mut entry {
            if input.input().name().is_empty() {
                input.input_mut().set_name(name.clone());
            }
        }
        self.inputs.insert(name, entry);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.inputs.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Entry> {
        self.inputs.get_mut(name)
    }

    /// Shortcut for a child that is an input
    pub fn input(&self, name: &str) -> Option<&dyn InputInterface> {
        self.get(name).and_then(Entry::as_input)
    }

    pub fn has(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Entry> {
        self.inputs.shift_remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inputs.keys().map(String::as_str)
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Merge another filter's children into this one
    ///
    /// Same-named inputs are merged with [`Input::merge`]; every other child
    /// replaces (or joins) the existing entries.
    pub fn merge(&mut self, other: &InputFilter) -> &mut Self {
        for (name, entry) in &other.inputs {
            match (self.inputs.get_mut(name), entry) {
                (Some(Entry::Input(existing)), Entry::Input(incoming)) => {
                    existing.input_mut().merge(incoming.input());
                }
                _ => {
                    self.inputs.insert(name.clone(), entry.clone());
                }
            }
        }
        self
    }

    /// Names validated by the next pass
    fn active_names(&self) -> Vec<String> {
        match &self.validation_group {
            Some(group) => group.clone(),
            None => self.inputs.keys().cloned().collect(),
        }
    }

    pub fn valid_input_names(&self) -> &[String] {
        &self.valid_inputs
    }

    pub fn invalid_input_names(&self) -> &[String] {
        &self.invalid_inputs
    }

    /// Data keys that no child is registered for
    pub fn unknown(&self) -> Map<String, Value> {
        self.data
            .iter()
            .filter(|(key, _)| !self.inputs.contains_key(*key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn has_unknown(&self) -> bool {
        self.data.keys().any(|key| !self.inputs.contains_key(key))
    }
}

impl ConfigurableViaSpec for InputFilter {}

impl InputFilterInterface for InputFilter {
    fn kind(&self) -> &'static str {
        "input_filter"
    }

    fn add(&mut self, name: &str, entry: Entry) -> Result<(), InputFilterError> {
        self.insert(name, entry);
        Ok(())
    }

    fn set_data(&mut self, data: Value) -> Result<(), InputFilterError> {
        let data = match data {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => return Err(InputFilterError::invalid_data("input filter", "object", &other)),
        };

        // children are updated on a copy so a rejected entry leaves no trace
        let mut inputs = self.inputs.clone();
        for (name, entry) in inputs.iter_mut() {
            match (entry, data.get(name)) {
                (Entry::Input(input), Some(value)) => input.set_value(value.clone())?,
                (Entry::Input(input), None) => {
                    input.input_mut().clear_value();
                }
                (Entry::Filter(filter), Some(value)) => {
                    if !matches!(value, Value::Object(_) | Value::Array(_) | Value::Null) {
                        return Err(InputFilterError::InvalidData {
                            target: name.clone(),
                            expected: "object or array",
                            found: json_type_name(value),
                        });
                    }
                    filter.set_data(value.clone())?;
                }
                (Entry::Filter(filter), None) => filter.set_data(Value::Null)?,
            }
        }

        self.inputs = inputs;
        self.data = data;
        Ok(())
    }

    fn is_valid(&mut self) -> bool {
        self.valid_inputs.clear();
        self.invalid_inputs.clear();

        let (present, missing): (Vec<String>, Vec<String>) = self
            .active_names()
            .into_iter()
            .partition(|name| self.data.contains_key(name));

        let context = self.data.clone();
        let mut valid = true;

        let passes = present
            .into_iter()
            .map(|name| (name, true))
            .chain(missing.into_iter().map(|name| (name, false)));

        for (name, has_data) in passes {
            let Some(entry) = self.inputs.get_mut(&name) else {
                continue;
            };

            let (entry_valid, breaks) = match entry {
                Entry::Input(input) => {
                    let entry_valid = if has_data {
                        input.is_valid_with_context(Some(&context))
                    } else if input.input().is_required() {
                        input.input_mut().mark_missing();
                        false
                    } else {
                        input.input_mut().clear_messages();
                        true
                    };
                    (entry_valid, input.input().break_on_failure())
                }
                Entry::Filter(filter) => (filter.is_valid(), false),
            };

            if entry_valid {
                self.valid_inputs.push(name);
            } else {
                self.invalid_inputs.push(name);
                valid = false;
                if breaks {
                    break;
                }
            }
        }

        if !valid {
            tracing::debug!(invalid = ?self.invalid_inputs, "input filter validation failed");
        }
        valid
    }

    fn messages(&self) -> ValidationMessages {
        ValidationMessages::Group(
            self.invalid_inputs
                .iter()
                .filter_map(|name| {
                    self.inputs
                        .get(name)
                        .map(|entry| (name.clone(), entry.messages()))
                })
                .collect(),
        )
    }

    fn values(&self) -> Value {
        Value::Object(
            self.active_names()
                .into_iter()
                .filter_map(|name| {
                    let value = match self.inputs.get(&name)? {
                        Entry::Input(input) => input.value(),
                        Entry::Filter(filter) => filter.values(),
                    };
                    Some((name, value))
                })
                .collect(),
        )
    }

    fn raw_values(&self) -> Value {
        Value::Object(
            self.active_names()
                .into_iter()
                .filter_map(|name| {
                    let value = match self.inputs.get(&name)? {
                        Entry::Input(input) => {
                            input.input().raw_value().cloned().unwrap_or(Value::Null)
                        }
                        Entry::Filter(filter) => filter.raw_values(),
                    };
                    Some((name, value))
                })
                .collect(),
        )
    }

    fn set_validation_group(&mut self, group: &[GroupItem]) -> Result<(), InputFilterError> {
        let mut staged = Vec::new();
        for item in group {
            let name = item.name();
            let Some(entry) = self.inputs.get(name) else {
                return Err(UnknownNameError::UnknownInput {
                    name: name.to_string(),
                }
                .into());
            };
            if let GroupItem::Nested(_, items) = item {
                let Entry::Filter(filter) = entry else {
                    return Err(UnknownNameError::NotAnInputFilter {
                        name: name.to_string(),
                    }
                    .into());
                };
                let mut filter = filter.clone();
                filter
                    .set_validation_group(items)
                    .map_err(|source| UnknownNameError::Nested {
                        name: name.to_string(),
                        source: Box::new(source),
                    })?;
                staged.push((name.to_string(), filter));
            }
        }

        for (name, filter) in staged {
            if let Some(entry) = self.inputs.get_mut(&name) {
                *entry = Entry::Filter(filter);
            }
        }
        self.validation_group = Some(group.iter().map(|item| item.name().to_string()).collect());
        Ok(())
    }

    fn clear_validation_group(&mut self) {
        self.validation_group = None;
        for entry in self.inputs.values_mut() {
            if let Entry::Filter(filter) = entry {
                filter.clear_validation_group();
            }
        }
    }

    fn len(&self) -> usize {
        self.inputs.len()
    }

    fn box_clone(&self) -> Box<dyn InputFilterInterface> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Shared rejection for kinds that cannot hold named children
pub(crate) fn unsupported_add(kind: &str) -> InputFilterError {
    ConfigurationError::UnsupportedOperation {
        kind: kind.to_string(),
        operation: "named children".to_string(),
    }
    .into()
}

//! One template input filter applied to every element of a list

use super::input::expect_bool;
use super::input_filter::{Entry, GroupItem, InputFilter, InputFilterInterface, unsupported_add};
use crate::core::error::{ConfigurationError, InputFilterError};
use crate::core::plugins::ConfigurableViaSpec;
use crate::core::validation::validators::NotEmpty;
use crate::core::value::{ValidationMessages, failure};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::any::Any;

/// Message code for an element the expected count asks for but the data lacks
pub const MISSING_ELEMENT: &str = "collectionElementMissing";

/// Largest `count` accepted from a specification; each counted element clones the template
pub const MAX_COUNT: usize = 10_000;

#[derive(Debug, Clone)]
struct ElementResult {
    valid: bool,
    values: Value,
    raw_values: Value,
    messages: ValidationMessages,
}

/// Validates a sequence of data maps against one template
#[derive(Debug, Clone)]
pub struct CollectionInputFilter {
    input_filter: Box<dyn InputFilterInterface>,
    collection_data: Vec<Value>,
    count: Option<usize>,
    required: bool,
    elements: Vec<ElementResult>,
    collection_messages: Option<ValidationMessages>,
}

impl CollectionInputFilter {
    pub fn new() -> Self {
        Self::with_input_filter(Box::new(InputFilter::new()))
    }

    pub fn with_input_filter(input_filter: Box<dyn InputFilterInterface>) -> Self {
        Self {
            input_filter,
            collection_data: Vec::new(),
            count: None,
            required: false,
            elements: Vec::new(),
            collection_messages: None,
        }
    }

    /// Template applied to every element
    pub fn input_filter(&self) -> &dyn InputFilterInterface {
        self.input_filter.as_ref()
    }

    pub fn input_filter_mut(&mut self) -> &mut dyn InputFilterInterface {
        self.input_filter.as_mut()
    }

    pub fn set_input_filter(&mut self, input_filter: Box<dyn InputFilterInterface>) -> &mut Self {
        self.input_filter = input_filter;
        self
    }

    /// Expected element count: explicit, or the length of the data
    pub fn count(&self) -> usize {
        self.count.unwrap_or(self.collection_data.len())
    }

    pub fn set_count(&mut self, count: usize) -> &mut Self {
        self.count = Some(count);
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// When set, an empty collection is invalid
    pub fn set_required(&mut self, required: bool) -> &mut Self {
        self.required = required;
        self
    }

    pub fn collection_data(&self) -> &[Value] {
        &self.collection_data
    }

    /// Messages of element `index` from the last run, if it failed
    pub fn element_messages(&self, index: usize) -> Option<&ValidationMessages> {
        self.elements
            .get(index)
            .filter(|element| !element.valid)
            .map(|element| &element.messages)
    }

    pub fn is_element_valid(&self, index: usize) -> Option<bool> {
        self.elements.get(index).map(|element| element.valid)
    }

    fn validate_element(&self, index: usize) -> ElementResult {
        let mut filter = self.input_filter.box_clone();
        let (data, missing) = match self.collection_data.get(index) {
            Some(data) => (data.clone(), false),
            None => (Value::Object(Map::new()), true),
        };

        if let Err(err) = filter.set_data(data) {
            return ElementResult {
                valid: false,
                values: Value::Null,
                raw_values: Value::Null,
                messages: ValidationMessages::Input(failure(err.error_code(), err.to_string())),
            };
        }

        let filter_valid = filter.is_valid();
        let mut messages = filter.messages();
        if missing && messages.is_empty() {
            messages = ValidationMessages::Input(failure(
                MISSING_ELEMENT,
                format!("Collection element {} is missing", index),
            ));
        }

        ElementResult {
            valid: filter_valid && !missing,
            values: filter.values(),
            raw_values: filter.raw_values(),
            messages,
        }
    }
}

impl Default for CollectionInputFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurableViaSpec for CollectionInputFilter {
    fn apply_option(&mut self, key: &str, value: &Value) -> Result<bool, ConfigurationError> {
        match key {
            "count" => {
                let count = value
                    .as_u64()
                    .and_then(|count| usize::try_from(count).ok())
                    .ok_or_else(|| {
                        ConfigurationError::invalid_value(key, value, "expected a non-negative integer")
                    })?;
                if count > MAX_COUNT {
                    return Err(ConfigurationError::invalid_value(
                        key,
                        value,
                        format!("at most {} elements can be counted", MAX_COUNT),
                    ));
                }
                self.set_count(count);
                Ok(true)
            }
            "required" | "is_required" => {
                self.set_required(expect_bool(key, value)?);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl InputFilterInterface for CollectionInputFilter {
    fn kind(&self) -> &'static str {
        "collection"
    }

    fn add(&mut self, _name: &str, _entry: Entry) -> Result<(), InputFilterError> {
        Err(unsupported_add(self.kind()))
    }

    fn set_data(&mut self, data: Value) -> Result<(), InputFilterError> {
        self.collection_data = match data {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => return Err(InputFilterError::invalid_data("collection", "array", &other)),
        };
        Ok(())
    }

    fn is_valid(&mut self) -> bool {
        self.collection_messages = None;
        self.elements = (0..self.count())
            .map(|index| self.validate_element(index))
            .collect();

        if self.required && self.collection_data.is_empty() {
            self.collection_messages = Some(ValidationMessages::Input(failure(
                NotEmpty::IS_EMPTY,
                NotEmpty::MESSAGE,
            )));
            return false;
        }

        self.elements.iter().all(|element| element.valid)
    }

    /// Failed indices (as strings) → element messages
    fn messages(&self) -> ValidationMessages {
        if let Some(messages) = &self.collection_messages {
            return messages.clone();
        }
        ValidationMessages::Group(
            self.elements
                .iter()
                .enumerate()
                .filter(|(_, element)| !element.valid)
                .map(|(index, element)| (index.to_string(), element.messages.clone()))
                .collect::<IndexMap<_, _>>(),
        )
    }

    fn values(&self) -> Value {
        Value::Array(self.elements.iter().map(|e| e.values.clone()).collect())
    }

    fn raw_values(&self) -> Value {
        Value::Array(self.elements.iter().map(|e| e.raw_values.clone()).collect())
    }

    /// Applied to the template, so it restricts every element
    fn set_validation_group(&mut self, group: &[GroupItem]) -> Result<(), InputFilterError> {
        self.input_filter.set_validation_group(group)
    }

    fn clear_validation_group(&mut self) {
        self.input_filter.clear_validation_group();
    }

    fn len(&self) -> usize {
        self.input_filter.len()
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

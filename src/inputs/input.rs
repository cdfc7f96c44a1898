//! A single named value with its filter and validator pipelines

use crate::core::error::{ConfigurationError, InputFilterError};
use crate::core::plugins::ConfigurableViaSpec;
use crate::core::validation::validators::{Context, NotEmpty};
use crate::core::validation::{FilterChain, ValidatorChain};
use crate::core::value::{Messages, is_empty_value};
use crate::core::{SharedFilterChain, SharedValidatorChain};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Message code used when a custom error message replaces validator output
pub const ERROR_MESSAGE_KEY: &str = "errorMessage";

/// Anything the input filter can hold as a leaf
///
/// Kinds embed a base [`Input`] and expose it through [`input`](Self::input)
/// and [`input_mut`](Self::input_mut); flags, chains and messages are always
/// read from there. Kinds override [`value`](Self::value) or
/// [`is_valid_with_context`](Self::is_valid_with_context) to change how the
/// value is filtered or judged.
pub trait InputInterface: ConfigurableViaSpec + fmt::Debug + Send + Sync + 'static {
    fn input(&self) -> &Input;

    fn input_mut(&mut self) -> &mut Input;

    /// Kind name, as used in specifications
    fn kind(&self) -> &'static str {
        "input"
    }

    fn set_value(&mut self, value: Value) -> Result<(), InputFilterError> {
        self.input_mut().set_value(value);
        Ok(())
    }

    fn value(&self) -> Value {
        self.input().value()
    }

    fn is_valid_with_context(&mut self, context: Option<&Context>) -> bool {
        self.input_mut().is_valid_with_context(context)
    }

    fn is_valid(&mut self) -> bool {
        self.is_valid_with_context(None)
    }

    fn box_clone(&self) -> Box<dyn InputInterface>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Plain input
///
/// Holds the last raw value; [`value`](Input::value) runs it through the
/// filter chain on every call and never touches the raw value.
#[derive(Debug, Clone)]
pub struct Input {
    name: String,
    raw_value: Option<Value>,
    filter_chain: SharedFilterChain,
    validator_chain: SharedValidatorChain,
    required: bool,
    allow_empty: bool,
    continue_if_empty: bool,
    break_on_failure: bool,
    error_message: Option<String>,
    messages: Messages,
}

impl Input {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_value: None,
            filter_chain: SharedFilterChain::new(FilterChain::new()),
            validator_chain: SharedValidatorChain::new(ValidatorChain::new()),
            required: true,
            allow_empty: false,
            continue_if_empty: false,
            break_on_failure: false,
            error_message: None,
            messages: Messages::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    // === value ===

    pub fn set_value(&mut self, value: Value) -> &mut Self {
        self.raw_value = Some(value);
        self
    }

    /// Forget the raw value (as if it was never set)
    pub fn clear_value(&mut self) -> &mut Self {
        self.raw_value = None;
        self
    }

    pub fn has_value(&self) -> bool {
        self.raw_value.is_some()
    }

    pub fn raw_value(&self) -> Option<&Value> {
        self.raw_value.as_ref()
    }

    /// The raw value passed through the filter chain
    pub fn value(&self) -> Value {
        self.filter_value(self.raw_value.clone().unwrap_or(Value::Null))
    }

    /// Run any value through this input's filter chain
    pub fn filter_value(&self, value: Value) -> Value {
        self.filter_chain.read().filter(value)
    }

    // === flags ===

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn set_required(&mut self, required: bool) -> &mut Self {
        self.required = required;
        self
    }

    pub fn allow_empty(&self) -> bool {
        self.allow_empty
    }

    pub fn set_allow_empty(&mut self, allow_empty: bool) -> &mut Self {
        self.allow_empty = allow_empty;
        self
    }

    pub fn continue_if_empty(&self) -> bool {
        self.continue_if_empty
    }

    pub fn set_continue_if_empty(&mut self, continue_if_empty: bool) -> &mut Self {
        self.continue_if_empty = continue_if_empty;
        self
    }

    pub fn break_on_failure(&self) -> bool {
        self.break_on_failure
    }

    pub fn set_break_on_failure(&mut self, break_on_failure: bool) -> &mut Self {
        self.break_on_failure = break_on_failure;
        self
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn set_error_message(&mut self, message: Option<String>) -> &mut Self {
        self.error_message = message;
        self
    }

    // === chains ===

    pub fn filter_chain(&self) -> &SharedFilterChain {
        &self.filter_chain
    }

    pub fn set_filter_chain(&mut self, chain: SharedFilterChain) -> &mut Self {
        self.filter_chain = chain;
        self
    }

    pub fn validator_chain(&self) -> &SharedValidatorChain {
        &self.validator_chain
    }

    pub fn set_validator_chain(&mut self, chain: SharedValidatorChain) -> &mut Self {
        self.validator_chain = chain;
        self
    }

    // === validation ===

    /// Messages of the last failed validation
    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    pub(crate) fn clear_messages(&mut self) {
        self.messages.clear();
    }

    pub(crate) fn set_failed(&mut self, messages: Messages) {
        self.messages = messages;
    }

    /// Report this input as required but absent from the submitted data
    pub(crate) fn mark_missing(&mut self) {
        self.messages.clear();
        match &self.error_message {
            Some(custom) => {
                self.messages
                    .insert(ERROR_MESSAGE_KEY.to_string(), custom.clone());
            }
            None => {
                self.messages
                    .insert(NotEmpty::IS_EMPTY.to_string(), NotEmpty::MESSAGE.to_string());
            }
        }
    }

    /// Add the default not-empty validator unless one is already present
    ///
    /// Returns `true` when a validator was injected.
    pub fn ensure_not_empty_validator(&self) -> bool {
        let mut chain = self.validator_chain.write();
        if chain.has_not_empty_check() {
            return false;
        }
        chain.prepend_validator(Arc::new(NotEmpty), true);
        tracing::trace!(input = %self.name, "injected not-empty validator");
        true
    }

    pub fn is_valid(&mut self) -> bool {
        self.is_valid_with_context(None)
    }

    /// Filter the raw value and validate it
    ///
    /// `context` is the data of the enclosing input filter, handed to
    /// validators that compare against sibling fields.
    pub fn is_valid_with_context(&mut self, context: Option<&Context>) -> bool {
        self.messages.clear();
        let value = self.value();
        match self.check_value(&value, context) {
            Ok(()) => true,
            Err(messages) => {
                self.set_failed(messages);
                false
            }
        }
    }

    /// Judge an already filtered value against the flags and the chain
    ///
    /// Does not touch the stored messages; the custom error message, when
    /// set, already replaces the validator output in the returned map.
    pub fn check_value(&self, value: &Value, context: Option<&Context>) -> Result<(), Messages> {
        let empty = is_empty_value(value);
        let empty_permitted =
            self.allow_empty || (!self.required && self.continue_if_empty);

        if empty && empty_permitted {
            return Ok(());
        }
        if self.required || !self.continue_if_empty {
            self.ensure_not_empty_validator();
        }

        let result = self.validator_chain.read().validate(value, context);
        result.map_err(|messages| match &self.error_message {
            Some(custom) => {
                let mut replaced = Messages::new();
                replaced.insert(ERROR_MESSAGE_KEY.to_string(), custom.clone());
                replaced
            }
            None => messages,
        })
    }

    /// Take over `other`'s value, flags, error message and chain handles
    ///
    /// The chains are shared afterwards, not copied. The name is kept.
    pub fn merge(&mut self, other: &Input) -> &mut Self {
        self.raw_value = other.raw_value.clone();
        self.required = other.required;
        self.allow_empty = other.allow_empty;
        self.continue_if_empty = other.continue_if_empty;
        self.break_on_failure = other.break_on_failure;
        self.error_message = other.error_message.clone();
        self.filter_chain = other.filter_chain.clone();
        self.validator_chain = other.validator_chain.clone();
        self
    }
}

impl Default for Input {
    fn default() -> Self {
        Self::new("")
    }
}

impl ConfigurableViaSpec for Input {}

impl InputInterface for Input {
    fn input(&self) -> &Input {
        self
    }

    fn input_mut(&mut self) -> &mut Input {
        self
    }

    fn box_clone(&self) -> Box<dyn InputInterface> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Helper for kinds whose options are plain booleans
pub(crate) fn expect_bool(key: &str, value: &Value) -> Result<bool, ConfigurationError> {
    value
        .as_bool()
        .ok_or_else(|| ConfigurationError::invalid_value(key, value, "expected a boolean"))
}

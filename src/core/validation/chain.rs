//! Priority-ordered filter and validator pipelines
//!
//! Both chains keep their entries sorted by descending priority; entries of
//! equal priority keep insertion order. Cloning a chain copies its entry
//! list but keeps sharing the plugin resolver.

use super::filters::{Filter, FilterPlugins, default_filter_plugins};
use super::validators::{Context, Validator, ValidatorPlugins, default_validator_plugins};
use crate::core::error::PluginError;
use crate::core::plugins::PluginOptions;
use crate::core::value::Messages;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Insert position keeping `priorities` sorted descending, after equals
fn insert_position<T>(entries: &[T], priority: i32, priority_of: impl Fn(&T) -> i32) -> usize {
    entries.partition_point(|e| priority_of(e) >= priority)
}

// =============================================================================
// FilterChain
// =============================================================================

#[derive(Clone)]
struct FilterEntry {
    filter: Arc<dyn Filter>,
    priority: i32,
}

/// Ordered pipeline of filters; higher priority runs first
#[derive(Clone)]
pub struct FilterChain {
    plugins: Arc<FilterPlugins>,
    entries: Vec<FilterEntry>,
}

impl FilterChain {
    pub const DEFAULT_PRIORITY: i32 = 1000;

    pub fn new() -> Self {
        Self::with_plugins(default_filter_plugins())
    }

    pub fn with_plugins(plugins: Arc<FilterPlugins>) -> Self {
        Self {
            plugins,
            entries: Vec::new(),
        }
    }

    pub fn plugins(&self) -> &Arc<FilterPlugins> {
        &self.plugins
    }

    pub fn set_plugins(&mut self, plugins: Arc<FilterPlugins>) {
        self.plugins = plugins;
    }

    /// Attach a filter instance at `priority`
    pub fn attach(&mut self, filter: Arc<dyn Filter>, priority: i32) -> &mut Self {
        let at = insert_position(&self.entries, priority, |e| e.priority);
        self.entries.insert(at, FilterEntry { filter, priority });
        self
    }

    /// Resolve `name` through the plugin resolver and attach it
    pub fn attach_by_name(
        &mut self,
        name: &str,
        options: &PluginOptions,
        priority: i32,
    ) -> Result<&mut Self, PluginError> {
        let filter = self.plugins.resolve(name, options)?;
        Ok(self.attach(filter, priority))
    }

    /// Append every filter of `other`, keeping their priorities
    pub fn merge(&mut self, other: &FilterChain) -> &mut Self {
        for entry in &other.entries {
            self.attach(Arc::clone(&entry.filter), entry.priority);
        }
        self
    }

    /// Filters in execution order
    pub fn filters(&self) -> impl Iterator<Item = &Arc<dyn Filter>> {
        self.entries.iter().map(|e| &e.filter)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run `value` through every filter
    pub fn filter(&self, value: Value) -> Value {
        self.entries
            .iter()
            .fold(value, |acc, entry| entry.filter.filter(acc))
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field(
                "filters",
                &self
                    .entries
                    .iter()
                    .map(|e| (e.filter.name(), e.priority))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

// =============================================================================
// ValidatorChain
// =============================================================================

#[derive(Clone)]
struct ValidatorEntry {
    validator: Arc<dyn Validator>,
    break_chain_on_failure: bool,
    priority: i32,
}

/// Ordered pipeline of validators; insertion order unless reprioritized
#[derive(Clone)]
pub struct ValidatorChain {
    plugins: Arc<ValidatorPlugins>,
    entries: Vec<ValidatorEntry>,
    break_on_first_failure: bool,
}

impl ValidatorChain {
    pub const DEFAULT_PRIORITY: i32 = 1;

    pub fn new() -> Self {
        Self::with_plugins(default_validator_plugins())
    }

    pub fn with_plugins(plugins: Arc<ValidatorPlugins>) -> Self {
        Self {
            plugins,
            entries: Vec::new(),
            break_on_first_failure: false,
        }
    }

    pub fn plugins(&self) -> &Arc<ValidatorPlugins> {
        &self.plugins
    }

    pub fn set_plugins(&mut self, plugins: Arc<ValidatorPlugins>) {
        self.plugins = plugins;
    }

    /// Stop at the first failing validator regardless of per-entry flags
    pub fn set_break_on_first_failure(&mut self, flag: bool) -> &mut Self {
        self.break_on_first_failure = flag;
        self
    }

    pub fn break_on_first_failure(&self) -> bool {
        self.break_on_first_failure
    }

    /// Attach a validator at `priority`
    pub fn attach(
        &mut self,
        validator: Arc<dyn Validator>,
        break_chain_on_failure: bool,
        priority: i32,
    ) -> &mut Self {
        let at = insert_position(&self.entries, priority, |e| e.priority);
        self.entries.insert(
            at,
            ValidatorEntry {
                validator,
                break_chain_on_failure,
                priority,
            },
        );
        self
    }

    /// Append a validator at default priority
    pub fn add_validator(
        &mut self,
        validator: Arc<dyn Validator>,
        break_chain_on_failure: bool,
    ) -> &mut Self {
        self.attach(validator, break_chain_on_failure, Self::DEFAULT_PRIORITY)
    }

    /// Insert a validator ahead of every current entry
    pub fn prepend_validator(
        &mut self,
        validator: Arc<dyn Validator>,
        break_chain_on_failure: bool,
    ) -> &mut Self {
        let priority = self
            .entries
            .first()
            .map_or(Self::DEFAULT_PRIORITY, |e| e.priority.max(Self::DEFAULT_PRIORITY));
        self.entries.insert(
            0,
            ValidatorEntry {
                validator,
                break_chain_on_failure,
                priority,
            },
        );
        self
    }

    /// Resolve `name` through the plugin resolver and attach it
    pub fn attach_by_name(
        &mut self,
        name: &str,
        options: &PluginOptions,
        break_chain_on_failure: bool,
        priority: i32,
    ) -> Result<&mut Self, PluginError> {
        let validator = self.plugins.resolve(name, options)?;
        Ok(self.attach(validator, break_chain_on_failure, priority))
    }

    /// Append every validator of `other`, keeping their flags and priorities
    pub fn merge(&mut self, other: &ValidatorChain) -> &mut Self {
        for entry in &other.entries {
            self.attach(
                Arc::clone(&entry.validator),
                entry.break_chain_on_failure,
                entry.priority,
            );
        }
        self
    }

    /// Validators in execution order
    pub fn validators(&self) -> impl Iterator<Item = &Arc<dyn Validator>> {
        self.entries.iter().map(|e| &e.validator)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a not-empty check is already present
    pub fn has_not_empty_check(&self) -> bool {
        self.entries.iter().any(|e| e.validator.is_not_empty_check())
    }

    /// Run the validators in order, collecting the messages of every failure
    pub fn validate(&self, value: &Value, context: Option<&Context>) -> Result<(), Messages> {
        let mut messages = Messages::new();
        for entry in &self.entries {
            if let Err(failed) = entry.validator.validate(value, context) {
                messages.extend(failed);
                if entry.break_chain_on_failure || self.break_on_first_failure {
                    break;
                }
            }
        }
        if messages.is_empty() {
            Ok(())
        } else {
            Err(messages)
        }
    }
}

impl Default for ValidatorChain {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValidatorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorChain")
            .field(
                "validators",
                &self
                    .entries
                    .iter()
                    .map(|e| (e.validator.name(), e.break_chain_on_failure, e.priority))
                    .collect::<Vec<_>>(),
            )
            .field("break_on_first_failure", &self.break_on_first_failure)
            .finish()
    }
}

//! Name → instance resolution for filters, validators and input kinds
//!
//! Specifications refer to plugins by name (`"string_trim"`,
//! `"StringTrim"` and `"string-trim"` all resolve to the same entry). A
//! [`PluginRegistry`] is the default static mapping; anything implementing
//! [`PluginResolver`] can be injected instead.

use super::error::{ConfigurationError, PluginError, PluginKind};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Options handed to a plugin constructor
pub type PluginOptions = Map<String, Value>;

/// Builds one plugin instance from its options
pub type Constructor<P> = Arc<dyn Fn(&PluginOptions) -> anyhow::Result<P> + Send + Sync>;

/// Resolves a plugin name to a freshly built instance
pub trait PluginResolver<P>: Send + Sync {
    /// Build the plugin registered under `name`
    fn resolve(&self, name: &str, options: &PluginOptions) -> Result<P, PluginError>;

    /// Whether `name` is known to this resolver
    fn has(&self, name: &str) -> bool;
}

/// Canonical form of a plugin name
pub fn canonical_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | '\\' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Static name → constructor mapping
pub struct PluginRegistry<P> {
    kind: PluginKind,
    constructors: BTreeMap<String, Constructor<P>>,
}

impl<P> PluginRegistry<P> {
    pub fn new(kind: PluginKind) -> Self {
        Self {
            kind,
            constructors: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> PluginKind {
        self.kind
    }

    /// Register (or replace) a constructor
    pub fn register<F>(&mut self, name: &str, constructor: F) -> &mut Self
    where
        F: Fn(&PluginOptions) -> anyhow::Result<P> + Send + Sync + 'static,
    {
        self.constructors
            .insert(canonical_name(name), Arc::new(constructor));
        self
    }

    /// Canonical names of every registered plugin
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

impl<P> PluginResolver<P> for PluginRegistry<P> {
    fn resolve(&self, name: &str, options: &PluginOptions) -> Result<P, PluginError> {
        let constructor =
            self.constructors
                .get(&canonical_name(name))
                .ok_or_else(|| PluginError::NotFound {
                    kind: self.kind,
                    name: name.to_string(),
                })?;

        constructor(options).map_err(|source| PluginError::InvalidOptions {
            kind: self.kind,
            name: name.to_string(),
            source,
        })
    }

    fn has(&self, name: &str) -> bool {
        self.constructors.contains_key(&canonical_name(name))
    }
}

impl<P> Clone for PluginRegistry<P> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            constructors: self.constructors.clone(),
        }
    }
}

impl<P> fmt::Debug for PluginRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("kind", &self.kind)
            .field("names", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Receives the spec keys the factory does not interpret itself
///
/// Custom input and input-filter kinds implement this to accept extra
/// configuration. Returning `Ok(false)` means "not mine"; the factory then
/// ignores the key.
pub trait ConfigurableViaSpec {
    fn apply_option(&mut self, _key: &str, _value: &Value) -> Result<bool, ConfigurationError> {
        Ok(false)
    }
}

// === option helpers used by the built-in constructors ===

pub(crate) fn opt_str<'a>(options: &'a PluginOptions, key: &str) -> anyhow::Result<Option<&'a str>> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => anyhow::bail!("option '{}' must be a string, got {}", key, other),
    }
}

pub(crate) fn opt_f64(options: &PluginOptions, key: &str) -> anyhow::Result<Option<f64>> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("option '{}' must be numeric, got '{}'", key, s)),
        Some(other) => anyhow::bail!("option '{}' must be numeric, got {}", key, other),
    }
}

pub(crate) fn opt_usize(options: &PluginOptions, key: &str) -> anyhow::Result<Option<usize>> {
    match opt_f64(options, key)? {
        None => Ok(None),
        Some(n) if n >= 0.0 && n.fract() == 0.0 => Ok(Some(n as usize)),
        Some(n) => anyhow::bail!("option '{}' must be a non-negative integer, got {}", key, n),
    }
}

pub(crate) fn opt_bool(options: &PluginOptions, key: &str) -> anyhow::Result<Option<bool>> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => anyhow::bail!("option '{}' must be a boolean, got {}", key, other),
    }
}

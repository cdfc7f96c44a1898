//! Reusable value filters
//!
//! Filters transform a raw value into a sanitized one before validation.
//! They are pure: the same input always yields the same output, and values
//! of a type a filter does not handle pass through untouched.

use crate::core::error::PluginKind;
use crate::core::plugins::{PluginOptions, PluginRegistry, PluginResolver, opt_str, opt_usize};
use serde_json::{Value, json};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A pure value transformation
pub trait Filter: fmt::Debug + Send + Sync + 'static {
    /// Plugin name of this filter
    fn name(&self) -> &str;

    fn filter(&self, value: Value) -> Value;

    fn as_any(&self) -> &dyn Any;
}

/// Resolver type the filter chains hold
pub type FilterPlugins = dyn PluginResolver<Arc<dyn Filter>>;

/// Filter: trim whitespace (or a custom character list) from both ends
#[derive(Debug, Clone, Default)]
pub struct StringTrim {
    charlist: Option<Vec<char>>,
}

impl StringTrim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_charlist(charlist: &str) -> Self {
        Self {
            charlist: Some(charlist.chars().collect()),
        }
    }
}

impl Filter for StringTrim {
    fn name(&self) -> &str {
        "string_trim"
    }

    fn filter(&self, value: Value) -> Value {
        match (&value, &self.charlist) {
            (Value::String(s), None) => Value::String(s.trim().to_string()),
            (Value::String(s), Some(chars)) => {
                Value::String(s.trim_matches(|c| chars.contains(&c)).to_string())
            }
            _ => value,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Filter: convert string to uppercase
#[derive(Debug, Clone, Default)]
pub struct StringToUpper;

impl Filter for StringToUpper {
    fn name(&self) -> &str {
        "string_to_upper"
    }

    fn filter(&self, value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(s.to_uppercase()),
            other => other,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Filter: convert string to lowercase
///
/// With a single-byte encoding such as `ISO-8859-1` only characters that
/// encoding can represent (up to U+00FF) are folded.
#[derive(Debug, Clone)]
pub struct StringToLower {
    encoding: String,
}

impl StringToLower {
    pub fn new() -> Self {
        Self::with_encoding("UTF-8")
    }

    pub fn with_encoding(encoding: impl Into<String>) -> Self {
        Self {
            encoding: encoding.into(),
        }
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    fn is_single_byte(&self) -> bool {
        let encoding = self.encoding.to_ascii_uppercase();
        encoding.starts_with("ISO-8859") || encoding == "LATIN1" || encoding == "ASCII"
    }
}

impl Default for StringToLower {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for StringToLower {
    fn name(&self) -> &str {
        "string_to_lower"
    }

    fn filter(&self, value: Value) -> Value {
        match value {
            Value::String(s) if self.is_single_byte() => Value::String(
                s.chars()
                    .flat_map(|c| {
                        let lowered: Vec<char> = if (c as u32) <= 0xFF {
                            c.to_lowercase().collect()
                        } else {
                            vec![c]
                        };
                        lowered
                    })
                    .collect(),
            ),
            Value::String(s) => Value::String(s.to_lowercase()),
            other => other,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Filter: round number to specified decimal places
#[derive(Debug, Clone, Default)]
pub struct RoundDecimals {
    decimals: u32,
}

impl RoundDecimals {
    pub fn new(decimals: u32) -> Self {
        Self { decimals }
    }
}

impl Filter for RoundDecimals {
    fn name(&self) -> &str {
        "round"
    }

    fn filter(&self, value: Value) -> Value {
        if let Some(num) = value.as_f64() {
            // f64 carries no more than 15 significant decimal digits
            let decimals = i32::try_from(self.decimals.min(15)).unwrap_or(15);
            let factor = 10_f64.powi(decimals);
            json!((num * factor).round() / factor)
        } else {
            value
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Filter: strip everything but ASCII digits from a string
#[derive(Debug, Clone, Default)]
pub struct Digits;

impl Filter for Digits {
    fn name(&self) -> &str {
        "digits"
    }

    fn filter(&self, value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(s.chars().filter(char::is_ascii_digit).collect()),
            other => other,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Filter: parse the leading integer of a string, truncate floats
#[derive(Debug, Clone, Default)]
pub struct ToInt;

impl Filter for ToInt {
    fn name(&self) -> &str {
        "to_int"
    }

    fn filter(&self, value: Value) -> Value {
        match &value {
            Value::String(s) => {
                let trimmed = s.trim();
                let end = trimmed
                    .char_indices()
                    .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
                    .map(|(i, _)| i)
                    .unwrap_or(trimmed.len());
                json!(trimmed[..end].parse::<i64>().unwrap_or(0))
            }
            Value::Number(n) if !n.is_i64() && !n.is_u64() => {
                json!(n.as_f64().map(|f| f.trunc() as i64).unwrap_or(0))
            }
            Value::Bool(b) => json!(i64::from(*b)),
            _ => value,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Filter: turn empty strings and empty arrays into null
#[derive(Debug, Clone, Default)]
pub struct ToNull;

impl Filter for ToNull {
    fn name(&self) -> &str {
        "to_null"
    }

    fn filter(&self, value: Value) -> Value {
        if crate::core::value::is_empty_value(&value) {
            Value::Null
        } else {
            value
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Filter: escape HTML special characters
#[derive(Debug, Clone, Default)]
pub struct HtmlEntities;

impl Filter for HtmlEntities {
    fn name(&self) -> &str {
        "html_entities"
    }

    fn filter(&self, value: Value) -> Value {
        match value {
            Value::String(s) => {
                let mut escaped = String::with_capacity(s.len());
                for c in s.chars() {
                    match c {
                        '&' => escaped.push_str("&amp;"),
                        '<' => escaped.push_str("&lt;"),
                        '>' => escaped.push_str("&gt;"),
                        '"' => escaped.push_str("&quot;"),
                        '\'' => escaped.push_str("&#039;"),
                        other => escaped.push(other),
                    }
                }
                Value::String(escaped)
            }
            other => other,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn shared<F: Filter>(filter: F) -> Arc<dyn Filter> {
    Arc::new(filter)
}

impl PluginRegistry<Arc<dyn Filter>> {
    /// Registry holding every built-in filter
    pub fn builtin_filters() -> Self {
        let mut registry = Self::new(PluginKind::Filter);
        registry
            .register("string_trim", |options: &PluginOptions| {
                Ok(match opt_str(options, "charlist")? {
                    Some(chars) => shared(StringTrim::with_charlist(chars)),
                    None => shared(StringTrim::new()),
                })
            })
            .register("string_to_upper", |_: &PluginOptions| Ok(shared(StringToUpper)))
            .register("string_to_lower", |options: &PluginOptions| {
                let encoding = opt_str(options, "encoding")?.unwrap_or("UTF-8");
                Ok(shared(StringToLower::with_encoding(encoding)))
            })
            .register("round", |options: &PluginOptions| {
                let decimals = opt_usize(options, "decimals")?.unwrap_or(0);
                let decimals = u32::try_from(decimals)
                    .map_err(|_| anyhow::anyhow!("option 'decimals' is out of range: {}", decimals))?;
                Ok(shared(RoundDecimals::new(decimals)))
            })
            .register("digits", |_: &PluginOptions| Ok(shared(Digits)))
            .register("to_int", |_: &PluginOptions| Ok(shared(ToInt)))
            .register("to_null", |_: &PluginOptions| Ok(shared(ToNull)))
            .register("html_entities", |_: &PluginOptions| Ok(shared(HtmlEntities)));
        registry
    }
}

/// Process-wide registry of built-in filters
pub fn default_filter_plugins() -> Arc<FilterPlugins> {
    static PLUGINS: OnceLock<Arc<PluginRegistry<Arc<dyn Filter>>>> = OnceLock::new();
    let registry = PLUGINS.get_or_init(|| Arc::new(PluginRegistry::builtin_filters()));
    Arc::clone(registry) as Arc<FilterPlugins>
}

//! Reusable value validators
//!
//! A validator inspects a (filtered) value and either accepts it or returns
//! a map of failure codes to messages. Validators that need sibling values
//! (e.g. [`Identical`]) read them from the optional validation context.

use crate::core::error::PluginKind;
use crate::core::plugins::{
    PluginOptions, PluginRegistry, PluginResolver, opt_bool, opt_f64, opt_str, opt_usize,
};
use crate::core::value::{Messages, failure, is_empty_value};
use regex::Regex;
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};
use validator::{ValidateEmail, ValidateUrl};

/// Data of the enclosing input filter, if any
pub type Context = Map<String, Value>;

/// A predicate over a value producing failure messages
pub trait Validator: fmt::Debug + Send + Sync + 'static {
    /// Plugin name of this validator
    fn name(&self) -> &str;

    fn validate(&self, value: &Value, context: Option<&Context>) -> Result<(), Messages>;

    /// Marks validators that reject empty values.
    ///
    /// Inputs only inject their own not-empty check when no validator in the
    /// chain answers `true` here.
    fn is_not_empty_check(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;
}

/// Resolver type the validator chains hold
pub type ValidatorPlugins = dyn PluginResolver<Arc<dyn Validator>>;

/// Validator: value must not be null, an empty string or an empty sequence
#[derive(Debug, Clone, Default)]
pub struct NotEmpty;

impl NotEmpty {
    pub const IS_EMPTY: &'static str = "isEmpty";
    pub const MESSAGE: &'static str = "Value is required and can't be empty";
}

impl Validator for NotEmpty {
    fn name(&self) -> &str {
        "not_empty"
    }

    fn validate(&self, value: &Value, _: Option<&Context>) -> Result<(), Messages> {
        if is_empty_value(value) {
            Err(failure(Self::IS_EMPTY, Self::MESSAGE))
        } else {
            Ok(())
        }
    }

    fn is_not_empty_check(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Validator: value contains only digit characters
#[derive(Debug, Clone, Default)]
pub struct Digits;

impl Digits {
    pub const NOT_DIGITS: &'static str = "notDigits";
    pub const STRING_EMPTY: &'static str = "digitsStringEmpty";
    pub const INVALID: &'static str = "digitsInvalid";
}

impl Validator for Digits {
    fn name(&self) -> &str {
        "digits"
    }

    fn validate(&self, value: &Value, _: Option<&Context>) -> Result<(), Messages> {
        match value {
            Value::Number(n) if n.is_u64() => Ok(()),
            Value::String(s) if s.is_empty() => Err(failure(
                Self::STRING_EMPTY,
                "The input is an empty string",
            )),
            Value::String(s) if s.chars().all(|c| c.is_ascii_digit()) => Ok(()),
            Value::String(_) | Value::Number(_) => Err(failure(
                Self::NOT_DIGITS,
                "The input must contain only digits",
            )),
            _ => Err(failure(
                Self::INVALID,
                "Invalid type given. String, integer or float expected",
            )),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Validator: string length (in characters) must be within range
#[derive(Debug, Clone)]
pub struct StringLength {
    min: usize,
    max: Option<usize>,
}

impl StringLength {
    pub const TOO_SHORT: &'static str = "stringLengthTooShort";
    pub const TOO_LONG: &'static str = "stringLengthTooLong";
    pub const INVALID: &'static str = "stringLengthInvalid";

    pub fn new(min: usize, max: Option<usize>) -> Self {
        Self { min, max }
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> Option<usize> {
        self.max
    }
}

impl Validator for StringLength {
    fn name(&self) -> &str {
        "string_length"
    }

    fn validate(&self, value: &Value, _: Option<&Context>) -> Result<(), Messages> {
        let Some(s) = value.as_str() else {
            return Err(failure(Self::INVALID, "Invalid type given. String expected"));
        };
        let len = s.chars().count();
        if len < self.min {
            return Err(failure(
                Self::TOO_SHORT,
                format!("The input is less than {} characters long", self.min),
            ));
        }
        match self.max {
            Some(max) if len > max => Err(failure(
                Self::TOO_LONG,
                format!("The input is more than {} characters long", max),
            )),
            _ => Ok(()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Validator: number must lie between `min` and `max`
#[derive(Debug, Clone)]
pub struct Between {
    min: f64,
    max: f64,
    inclusive: bool,
}

impl Between {
    pub const NOT_BETWEEN: &'static str = "notBetween";
    pub const NOT_BETWEEN_STRICT: &'static str = "notBetweenStrict";

    pub fn new(min: f64, max: f64, inclusive: bool) -> Self {
        Self { min, max, inclusive }
    }

    fn number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl Validator for Between {
    fn name(&self) -> &str {
        "between"
    }

    fn validate(&self, value: &Value, _: Option<&Context>) -> Result<(), Messages> {
        let num = Self::number(value);
        match num {
            Some(n) if self.inclusive && n >= self.min && n <= self.max => Ok(()),
            Some(n) if !self.inclusive && n > self.min && n < self.max => Ok(()),
            _ if self.inclusive => Err(failure(
                Self::NOT_BETWEEN,
                format!(
                    "The input is not between '{}' and '{}', inclusively",
                    self.min, self.max
                ),
            )),
            _ => Err(failure(
                Self::NOT_BETWEEN_STRICT,
                format!(
                    "The input is not strictly between '{}' and '{}'",
                    self.min, self.max
                ),
            )),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Validator: value must be in allowed list
#[derive(Debug, Clone)]
pub struct InArray {
    haystack: Vec<Value>,
}

impl InArray {
    pub const NOT_IN_ARRAY: &'static str = "notInArray";

    pub fn new(haystack: Vec<Value>) -> Self {
        Self { haystack }
    }
}

impl Validator for InArray {
    fn name(&self) -> &str {
        "in_array"
    }

    fn validate(&self, value: &Value, _: Option<&Context>) -> Result<(), Messages> {
        if self.haystack.contains(value) {
            Ok(())
        } else {
            Err(failure(
                Self::NOT_IN_ARRAY,
                "The input was not found in the haystack",
            ))
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Validator: date must match a chrono format string
#[derive(Debug, Clone)]
pub struct Date {
    format: String,
}

impl Date {
    pub const INVALID: &'static str = "dateInvalid";
    pub const FALSE_FORMAT: &'static str = "dateFalseFormat";

    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }
}

impl Default for Date {
    fn default() -> Self {
        Self::new("%Y-%m-%d")
    }
}

impl Validator for Date {
    fn name(&self) -> &str {
        "date"
    }

    fn validate(&self, value: &Value, _: Option<&Context>) -> Result<(), Messages> {
        let Some(s) = value.as_str() else {
            return Err(failure(Self::INVALID, "Invalid type given. String expected"));
        };
        match chrono::NaiveDate::parse_from_str(s, &self.format) {
            Ok(_) => Ok(()),
            Err(_) => Err(failure(
                Self::FALSE_FORMAT,
                format!("The input does not fit the date format '{}'", self.format),
            )),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Validator: string must match a regular expression
#[derive(Debug, Clone)]
pub struct RegexMatch {
    pattern: Regex,
}

impl RegexMatch {
    pub const NOT_MATCH: &'static str = "regexNotMatch";
    pub const INVALID: &'static str = "regexInvalid";

    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl Validator for RegexMatch {
    fn name(&self) -> &str {
        "regex"
    }

    fn validate(&self, value: &Value, _: Option<&Context>) -> Result<(), Messages> {
        let subject = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => {
                return Err(failure(
                    Self::INVALID,
                    "Invalid type given. String, integer or float expected",
                ));
            }
        };
        if self.pattern.is_match(&subject) {
            Ok(())
        } else {
            Err(failure(
                Self::NOT_MATCH,
                format!(
                    "The input does not match against pattern '{}'",
                    self.pattern.as_str()
                ),
            ))
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Validator: string must be an email address
#[derive(Debug, Clone, Default)]
pub struct EmailAddress;

impl EmailAddress {
    pub const INVALID_FORMAT: &'static str = "emailAddressInvalidFormat";
}

impl Validator for EmailAddress {
    fn name(&self) -> &str {
        "email_address"
    }

    fn validate(&self, value: &Value, _: Option<&Context>) -> Result<(), Messages> {
        match value.as_str() {
            Some(s) if s.validate_email() => Ok(()),
            _ => Err(failure(
                Self::INVALID_FORMAT,
                "The input is not a valid email address",
            )),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Validator: string must be an absolute URL
#[derive(Debug, Clone, Default)]
pub struct Uri;

impl Uri {
    pub const NOT_URI: &'static str = "notUri";
}

impl Validator for Uri {
    fn name(&self) -> &str {
        "uri"
    }

    fn validate(&self, value: &Value, _: Option<&Context>) -> Result<(), Messages> {
        match value.as_str() {
            Some(s) if s.validate_url() => Ok(()),
            _ => Err(failure(Self::NOT_URI, "The input does not appear to be a valid Uri")),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Validator: string must be a UUID
#[derive(Debug, Clone, Default)]
pub struct UuidFormat;

impl UuidFormat {
    pub const INVALID: &'static str = "valueNotUuid";
}

impl Validator for UuidFormat {
    fn name(&self) -> &str {
        "uuid"
    }

    fn validate(&self, value: &Value, _: Option<&Context>) -> Result<(), Messages> {
        match value.as_str().map(uuid::Uuid::parse_str) {
            Some(Ok(_)) => Ok(()),
            _ => Err(failure(Self::INVALID, "Invalid UUID format")),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Validator: value must equal another field of the validation context
#[derive(Debug, Clone)]
pub struct Identical {
    token: String,
}

impl Identical {
    pub const NOT_SAME: &'static str = "notSame";
    pub const MISSING_TOKEN: &'static str = "missingToken";

    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Validator for Identical {
    fn name(&self) -> &str {
        "identical"
    }

    fn validate(&self, value: &Value, context: Option<&Context>) -> Result<(), Messages> {
        match context.and_then(|c| c.get(&self.token)) {
            None => Err(failure(
                Self::MISSING_TOKEN,
                "No token was provided to match against",
            )),
            Some(expected) if expected == value => Ok(()),
            Some(_) => Err(failure(
                Self::NOT_SAME,
                "The two given tokens do not match",
            )),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn shared<V: Validator>(validator: V) -> Arc<dyn Validator> {
    Arc::new(validator)
}

impl PluginRegistry<Arc<dyn Validator>> {
    /// Registry holding every built-in validator
    pub fn builtin_validators() -> Self {
        let mut registry = Self::new(PluginKind::Validator);
        registry
            .register("not_empty", |_: &PluginOptions| Ok(shared(NotEmpty)))
            .register("digits", |_: &PluginOptions| Ok(shared(Digits)))
            .register("string_length", |options: &PluginOptions| {
                let min = opt_usize(options, "min")?.unwrap_or(0);
                let max = opt_usize(options, "max")?;
                if let Some(max) = max {
                    anyhow::ensure!(min <= max, "min ({}) is greater than max ({})", min, max);
                }
                Ok(shared(StringLength::new(min, max)))
            })
            .register("between", |options: &PluginOptions| {
                let min = opt_f64(options, "min")?
                    .ok_or_else(|| anyhow::anyhow!("missing option 'min'"))?;
                let max = opt_f64(options, "max")?
                    .ok_or_else(|| anyhow::anyhow!("missing option 'max'"))?;
                let inclusive = opt_bool(options, "inclusive")?.unwrap_or(true);
                Ok(shared(Between::new(min, max, inclusive)))
            })
            .register("in_array", |options: &PluginOptions| {
                match options.get("haystack") {
                    Some(Value::Array(items)) => Ok(shared(InArray::new(items.clone()))),
                    _ => anyhow::bail!("option 'haystack' must be an array"),
                }
            })
            .register("date", |options: &PluginOptions| {
                let format = opt_str(options, "format")?.unwrap_or("%Y-%m-%d");
                Ok(shared(Date::new(format)))
            })
            .register("regex", |options: &PluginOptions| {
                let pattern = opt_str(options, "pattern")?
                    .ok_or_else(|| anyhow::anyhow!("missing option 'pattern'"))?;
                Ok(shared(RegexMatch::new(pattern)?))
            })
            .register("email_address", |_: &PluginOptions| Ok(shared(EmailAddress)))
            .register("uri", |_: &PluginOptions| Ok(shared(Uri)))
            .register("uuid", |_: &PluginOptions| Ok(shared(UuidFormat)))
            .register("identical", |options: &PluginOptions| {
                let token = opt_str(options, "token")?
                    .ok_or_else(|| anyhow::anyhow!("missing option 'token'"))?;
                Ok(shared(Identical::new(token)))
            });
        registry
    }
}

/// Process-wide registry of built-in validators
pub fn default_validator_plugins() -> Arc<ValidatorPlugins> {
    static PLUGINS: OnceLock<Arc<PluginRegistry<Arc<dyn Validator>>>> = OnceLock::new();
    let registry = PLUGINS.get_or_init(|| Arc::new(PluginRegistry::builtin_validators()));
    Arc::clone(registry) as Arc<ValidatorPlugins>
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codes(result: Result<(), Messages>) -> Vec<String> {
        result.unwrap_err().keys().cloned().collect()
    }

    // === NotEmpty ===

    #[test]
    fn test_not_empty_rejects_empty_values() {
        assert_eq!(codes(NotEmpty.validate(&json!(null), None)), vec!["isEmpty"]);
        assert!(NotEmpty.validate(&json!(""), None).is_err());
        assert!(NotEmpty.validate(&json!([]), None).is_err());
    }

    #[test]
    fn test_not_empty_accepts_zero_and_false() {
        assert!(NotEmpty.validate(&json!(0), None).is_ok());
        assert!(NotEmpty.validate(&json!(false), None).is_ok());
        assert!(NotEmpty.validate(&json!("0"), None).is_ok());
    }

    #[test]
    fn test_not_empty_is_marked() {
        assert!(NotEmpty.is_not_empty_check());
        assert!(!Digits.is_not_empty_check());
    }

    // === Digits ===

    #[test]
    fn test_digits() {
        assert!(Digits.validate(&json!("123"), None).is_ok());
        assert!(Digits.validate(&json!(123), None).is_ok());
        assert_eq!(codes(Digits.validate(&json!("bar"), None)), vec!["notDigits"]);
        assert_eq!(codes(Digits.validate(&json!(-1), None)), vec!["notDigits"]);
        assert_eq!(
            codes(Digits.validate(&json!(""), None)),
            vec!["digitsStringEmpty"]
        );
        assert_eq!(codes(Digits.validate(&json!([1]), None)), vec!["digitsInvalid"]);
    }

    // === StringLength ===

    #[test]
    fn test_string_length_bounds() {
        let v = StringLength::new(3, Some(5));
        assert_eq!(
            codes(v.validate(&json!("ab"), None)),
            vec!["stringLengthTooShort"]
        );
        assert_eq!(
            codes(v.validate(&json!("abcdef"), None)),
            vec!["stringLengthTooLong"]
        );
        assert!(v.validate(&json!("abc"), None).is_ok());
        assert!(v.validate(&json!("abcde"), None).is_ok());
    }

    #[test]
    fn test_string_length_counts_chars_not_bytes() {
        let v = StringLength::new(0, Some(4));
        assert!(v.validate(&json!("éééé"), None).is_ok());
    }

    #[test]
    fn test_string_length_non_string_is_invalid() {
        let v = StringLength::new(0, None);
        assert_eq!(codes(v.validate(&json!(42), None)), vec!["stringLengthInvalid"]);
    }

    // === Between ===

    #[test]
    fn test_between_inclusive() {
        let v = Between::new(1.0, 10.0, true);
        assert!(v.validate(&json!(1), None).is_ok());
        assert!(v.validate(&json!("10"), None).is_ok());
        assert_eq!(codes(v.validate(&json!(11), None)), vec!["notBetween"]);
    }

    #[test]
    fn test_between_strict() {
        let v = Between::new(1.0, 10.0, false);
        assert_eq!(codes(v.validate(&json!(1), None)), vec!["notBetweenStrict"]);
        assert!(v.validate(&json!(5.5), None).is_ok());
    }

    // === InArray ===

    #[test]
    fn test_in_array() {
        let v = InArray::new(vec![json!("active"), json!("pending")]);
        assert!(v.validate(&json!("active"), None).is_ok());
        assert_eq!(codes(v.validate(&json!("deleted"), None)), vec!["notInArray"]);
    }

    // === Date ===

    #[test]
    fn test_date_format() {
        let v = Date::default();
        assert!(v.validate(&json!("2024-01-15"), None).is_ok());
        assert_eq!(
            codes(v.validate(&json!("15/01/2024"), None)),
            vec!["dateFalseFormat"]
        );
        assert!(Date::new("%d/%m/%Y").validate(&json!("15/01/2024"), None).is_ok());
    }

    // === RegexMatch ===

    #[test]
    fn test_regex() {
        let v = RegexMatch::new(r"^[A-Z]{2}\d{3}$").unwrap();
        assert!(v.validate(&json!("AB123"), None).is_ok());
        assert_eq!(codes(v.validate(&json!("ab123"), None)), vec!["regexNotMatch"]);
    }

    // === formats ===

    #[test]
    fn test_email_address() {
        assert!(EmailAddress.validate(&json!("jane@example.com"), None).is_ok());
        assert!(EmailAddress.validate(&json!("not-an-email"), None).is_err());
    }

    #[test]
    fn test_uri() {
        assert!(Uri.validate(&json!("https://example.com/a"), None).is_ok());
        assert!(Uri.validate(&json!("nope"), None).is_err());
    }

    #[test]
    fn test_uuid() {
        assert!(
            UuidFormat
                .validate(&json!("67e55044-10b1-426f-9247-bb680e5fe0c8"), None)
                .is_ok()
        );
        assert!(UuidFormat.validate(&json!("123"), None).is_err());
    }

    // === Identical ===

    #[test]
    fn test_identical_uses_context() {
        let v = Identical::new("password");
        let context = json!({"password": "s3cret"});
        let context = context.as_object();
        assert!(v.validate(&json!("s3cret"), context).is_ok());
        assert_eq!(codes(v.validate(&json!("other"), context)), vec!["notSame"]);
        assert_eq!(codes(v.validate(&json!("s3cret"), None)), vec!["missingToken"]);
    }

    // === registry ===

    #[test]
    fn test_registry_builds_string_length_from_options() {
        let options = json!({"min": 3, "max": 5});
        let built = default_validator_plugins()
            .resolve("StringLength", options.as_object().unwrap())
            .unwrap();
        let v = built.as_any().downcast_ref::<StringLength>().unwrap();
        assert_eq!(v.min(), 3);
        assert_eq!(v.max(), Some(5));
    }

    #[test]
    fn test_registry_rejects_inverted_length_bounds() {
        let options = json!({"min": 6, "max": 5});
        assert!(
            default_validator_plugins()
                .resolve("string_length", options.as_object().unwrap())
                .is_err()
        );
    }

    #[test]
    fn test_registry_rejects_bad_regex() {
        let options = json!({"pattern": "("});
        assert!(
            default_validator_plugins()
                .resolve("regex", options.as_object().unwrap())
                .is_err()
        );
    }
}

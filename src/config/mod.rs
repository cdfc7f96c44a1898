//! Loading input filter specifications from YAML or JSON text

use crate::core::error::ConfigurationError;
use crate::factory::InputFilterSpec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An input filter specification in its wire form
///
/// Several documents can be layered with [`merge`](Self::merge), e.g. a
/// shared base form plus per-application overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputFilterConfig {
    pub spec: Value,
}

impl InputFilterConfig {
    pub fn new(spec: Value) -> Self {
        Self { spec }
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigurationError> {
        let spec: Value = serde_yaml::from_str(yaml)?;
        Ok(Self::new(spec))
    }

    /// Load configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let spec: Value = serde_json::from_str(json)?;
        Ok(Self::new(spec))
    }

    /// Merge configurations; later ones win
    ///
    /// Objects merge key by key (recursively); arrays and scalars are
    /// replaced wholesale. A `null` document contributes nothing.
    pub fn merge(configs: Vec<Self>) -> Self {
        let spec = configs
            .into_iter()
            .map(|config| config.spec)
            .fold(Value::Null, merge_values);
        Self::new(spec)
    }

    /// Typed spec for [`Factory::create_input_filter`](crate::factory::Factory::create_input_filter)
    pub fn into_spec(self) -> Result<InputFilterSpec, ConfigurationError> {
        InputFilterSpec::from_value(&self.spec)
    }
}

impl Default for InputFilterConfig {
    fn default() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

fn merge_values(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (base, Value::Null) => base,
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => {
                        let current = std::mem::take(existing);
                        *existing = merge_values(current, value);
                    }
                    None => {
                        base.insert(key, value);
                    }
                }
            }
            Value::Object(base)
        }
        (_, overlay) => overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_yaml_and_json_agree() {
        let yaml = InputFilterConfig::from_yaml_str(
            r#"
email:
  required: true
  filters:
    - string_trim
"#,
        )
        .unwrap();
        let json = InputFilterConfig::from_json_str(
            r#"{"email": {"required": true, "filters": ["string_trim"]}}"#,
        )
        .unwrap();
        assert_eq!(yaml, json);
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let err = InputFilterConfig::from_yaml_str("email: [").unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_PARSE_ERROR");
    }

    #[test]
    fn test_merge_overrides_nested_keys() {
        let base = InputFilterConfig::new(json!({
            "email": {"required": true, "filters": ["string_trim"]}
        }));
        let overlay = InputFilterConfig::new(json!({
            "email": {"required": false}
        }));
        let merged = InputFilterConfig::merge(vec![base, overlay]);
        assert_eq!(
            merged.spec,
            json!({"email": {"required": false, "filters": ["string_trim"]}})
        );
    }

    #[test]
    fn test_merge_empty_list() {
        assert_eq!(InputFilterConfig::merge(vec![]).spec, Value::Null);
    }

    #[test]
    fn test_into_spec() {
        let spec = InputFilterConfig::new(json!({"type": "collection", "count": 2}))
            .into_spec()
            .unwrap();
        assert_eq!(spec.kind.as_deref(), Some("collection"));
    }
}

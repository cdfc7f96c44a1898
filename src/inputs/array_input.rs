//! Input whose value is a list, filtered and validated element by element

use super::input::{Input, InputInterface};
use crate::core::error::InputFilterError;
use crate::core::plugins::ConfigurableViaSpec;
use crate::core::validation::validators::Context;
use crate::core::value::Messages;
use serde_json::Value;
use std::any::Any;

#[derive(Debug, Clone, Default)]
pub struct ArrayInput {
    input: Input,
}

impl ArrayInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            input: Input::new(name),
        }
    }
}

impl ConfigurableViaSpec for ArrayInput {}

impl InputInterface for ArrayInput {
    fn input(&self) -> &Input {
        &self.input
    }

    fn input_mut(&mut self) -> &mut Input {
        &mut self.input
    }

    fn kind(&self) -> &'static str {
        "array_input"
    }

    /// Only arrays (or null, meaning "no elements") are accepted
    fn set_value(&mut self, value: Value) -> Result<(), InputFilterError> {
        match value {
            Value::Array(_) => {
                self.input.set_value(value);
                Ok(())
            }
            Value::Null => {
                self.input.set_value(Value::Array(Vec::new()));
                Ok(())
            }
            other => Err(InputFilterError::invalid_data(
                self.input.name(),
                "array",
                &other,
            )),
        }
    }

    fn value(&self) -> Value {
        match self.input.raw_value() {
            Some(Value::Array(items)) => Value::Array(
                items
                    .iter()
                    .map(|item| self.input.filter_value(item.clone()))
                    .collect(),
            ),
            _ => Value::Array(Vec::new()),
        }
    }

    /// Every element must pass; an empty list is judged like an empty value
    fn is_valid_with_context(&mut self, context: Option<&Context>) -> bool {
        self.input.clear_messages();
        let Value::Array(items) = self.value() else {
            return false;
        };

        let mut messages = Messages::new();
        if items.is_empty() {
            if let Err(failed) = self.input.check_value(&Value::Array(items), context) {
                messages = failed;
            }
        } else {
            for item in &items {
                if let Err(failed) = self.input.check_value(item, context) {
                    messages.extend(failed);
                }
            }
        }

        let valid = messages.is_empty();
        if !valid {
            self.input.set_failed(messages);
        }
        valid
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::FilterChain;
    use crate::core::validation::filters::StringTrim;
    use crate::core::validation::validators::{Digits, NotEmpty};
    use serde_json::json;
    use std::sync::Arc;

    fn digits_input() -> ArrayInput {
        let mut input = ArrayInput::new("codes");
        input
            .input()
            .filter_chain()
            .write()
            .attach(Arc::new(StringTrim::new()), FilterChain::DEFAULT_PRIORITY);
        input
            .input()
            .validator_chain()
            .write()
            .add_validator(Arc::new(Digits), false);
        input
    }

    #[test]
    fn test_filters_each_element() {
        let mut input = digits_input();
        input.set_value(json!([" 1 ", "2 "])).unwrap();
        assert_eq!(input.value(), json!(["1", "2"]));
        assert_eq!(input.input().raw_value(), Some(&json!([" 1 ", "2 "])));
    }

    #[test]
    fn test_all_elements_valid() {
        let mut input = digits_input();
        input.set_value(json!(["1", "22"])).unwrap();
        assert!(input.is_valid());
    }

    #[test]
    fn test_one_bad_element_fails() {
        let mut input = digits_input();
        input.set_value(json!(["1", "x"])).unwrap();
        assert!(!input.is_valid());
        assert!(input.input().messages().contains_key(Digits::NOT_DIGITS));
    }

    #[test]
    fn test_required_empty_list_fails() {
        let mut input = digits_input();
        input.set_value(json!([])).unwrap();
        assert!(!input.is_valid());
        assert!(input.input().messages().contains_key(NotEmpty::IS_EMPTY));
    }

    #[test]
    fn test_rejects_scalar_value() {
        let mut input = digits_input();
        let err = input.set_value(json!("1")).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATA");
    }
}

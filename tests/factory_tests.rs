//! Integration tests for building inputs and input filters from specifications

use inputfilter::core::validation::filters::{StringToLower, StringTrim};
use inputfilter::prelude::*;
use std::any::Any;
use std::sync::Arc;

/// Custom input kind configured through extra spec keys
#[derive(Debug, Clone, Default)]
struct MoneyInput {
    input: Input,
    currency: Option<String>,
}

impl ConfigurableViaSpec for MoneyInput {
    fn apply_option(&mut self, key: &str, value: &Value) -> Result<bool, ConfigurationError> {
        match key {
            "currency" => {
                self.currency = value.as_str().map(str::to_string);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl InputInterface for MoneyInput {
    fn input(&self) -> &Input {
        &self.input
    }

    fn input_mut(&mut self) -> &mut Input {
        &mut self.input
    }

    fn kind(&self) -> &'static str {
        "money"
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

#[derive(Debug)]
struct Shout;

impl Filter for Shout {
    fn name(&self) -> &str {
        "shout"
    }

    fn filter(&self, value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(format!("{}!", s)),
            other => other,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn money_factory() -> Factory {
    let mut kinds = PluginRegistry::builtin_inputs();
    kinds.register("money", |_: &PluginOptions| {
        Ok(Box::new(MoneyInput::default()) as Box<dyn InputInterface>)
    });
    let mut factory = Factory::new();
    factory.set_input_kinds(Arc::new(kinds));
    factory
}

fn filter_names(input: &dyn InputInterface) -> Vec<String> {
    input
        .input()
        .filter_chain()
        .read()
        .filters()
        .map(|f| f.name().to_string())
        .collect()
}

#[test]
fn test_filters_from_names_and_instances() {
    let factory = Factory::new();
    let input = factory
        .create_input(
            InputSpec::new("foo")
                .filter(FilterSpec::named("string_trim"))
                .filter(FilterSpec::instance(Arc::new(Shout)))
                .filter(
                    FilterSpec::named("string_to_lower").option("encoding", json!("ISO-8859-1")),
                ),
        )
        .unwrap();

    assert_eq!(
        filter_names(input.as_ref()),
        ["string_trim", "shout", "string_to_lower"]
    );
    let chain = input.input().filter_chain().read();
    let filters: Vec<_> = chain.filters().collect();
    assert!(filters[0].as_any().is::<StringTrim>());
    let lower = filters[2].as_any().downcast_ref::<StringToLower>().unwrap();
    assert_eq!(lower.encoding(), "ISO-8859-1");
}

#[test]
fn test_filter_priorities_from_value() {
    let mut input = Factory::new()
        .create_input_from_value(&json!({
            "name": "foo",
            "filters": [
                {"name": "string_trim", "priority": 999},
                {"name": "string_to_upper", "priority": 1001},
                {"name": "string_to_lower"}
            ]
        }))
        .unwrap();

    assert_eq!(
        filter_names(input.as_ref()),
        ["string_to_upper", "string_to_lower", "string_trim"]
    );
    input.set_value(json!(" MiXeD ")).unwrap();
    assert_eq!(input.value(), json!("mixed"));
}

#[test]
fn test_required_allow_empty_resolution() {
    let factory = Factory::new();
    let build = |spec: Value| factory.create_input_from_value(&spec).unwrap();

    let input = build(json!({"name": "a", "required": false}));
    assert!(input.input().allow_empty());

    let input = build(json!({"name": "b", "allow_empty": true}));
    assert!(!input.input().is_required());

    let input = build(json!({"name": "c", "required": false, "allow_empty": false}));
    assert!(!input.input().is_required());
    assert!(!input.input().allow_empty());

    let input = build(json!({"name": "d"}));
    assert!(input.input().is_required());
    assert!(!input.input().allow_empty());
}

#[test]
fn test_flags_and_error_message() {
    let input = Factory::new()
        .create_input_from_value(&json!({
            "name": "code",
            "continue_if_empty": true,
            "break_on_failure": true,
            "error_message": "Bad code"
        }))
        .unwrap();

    let base = input.input();
    assert!(base.continue_if_empty());
    assert!(base.break_on_failure());
    assert_eq!(base.error_message(), Some("Bad code"));
}

#[test]
fn test_custom_input_kind_receives_options() {
    let input = money_factory()
        .create_input_from_value(&json!({
            "name": "price",
            "type": "money",
            "currency": "EUR",
            "unknown_setting": 1
        }))
        .unwrap();

    let money = input.as_any().downcast_ref::<MoneyInput>().unwrap();
    assert_eq!(money.currency.as_deref(), Some("EUR"));
    assert_eq!(money.input().name(), "price");
}

#[test]
fn test_extra_keys_ignored_by_plain_inputs() {
    let mut input = Input::new("plain");
    assert!(!input.apply_option("placeholder", &json!("Your name")).unwrap());

    let built = Factory::new()
        .create_input_from_value(&json!({"name": "plain", "placeholder": "Your name"}))
        .unwrap();
    assert_eq!(built.kind(), "input");
}

#[test]
fn test_unknown_kinds_and_plugins_fail_construction() {
    let factory = Factory::new();

    let err = factory
        .create_input_from_value(&json!({"name": "a", "type": "money"}))
        .unwrap_err();
    assert!(matches!(
        err,
        InputFilterError::Plugin(PluginError::NotFound { kind: PluginKind::Input, .. })
    ));

    let err = factory
        .create_input_filter_from_value(&json!({"type": "wizard"}))
        .unwrap_err();
    assert!(matches!(
        err,
        InputFilterError::Plugin(PluginError::NotFound { kind: PluginKind::InputFilter, .. })
    ));

    let err = factory
        .create_input_from_value(&json!({"name": "a", "validators": ["no_such_validator"]}))
        .unwrap_err();
    assert_eq!(err.error_code(), "PLUGIN_NOT_FOUND");

    let err = factory
        .create_input_from_value(&json!({
            "name": "a",
            "validators": [{"name": "regex", "options": {"pattern": "("}}]
        }))
        .unwrap_err();
    assert_eq!(err.error_code(), "PLUGIN_INVALID_OPTIONS");
}

#[test]
fn test_malformed_specs_are_configuration_errors() {
    let factory = Factory::new();

    let err = factory
        .create_input_from_value(&json!({"name": "a", "filters": [{"options": {}}]}))
        .unwrap_err();
    assert_eq!(err.error_code(), "CONFIG_MISSING_FIELD");

    let err = factory.create_input_filter_from_value(&json!("nope")).unwrap_err();
    assert_eq!(err.error_code(), "CONFIG_INVALID_VALUE");
}

#[test]
fn test_injected_plugin_resolver() {
    let mut filters = PluginRegistry::builtin_filters();
    filters.register("shout", |_: &PluginOptions| Ok(Arc::new(Shout) as Arc<dyn Filter>));
    let factory = Factory::with_plugins(
        Arc::new(filters),
        inputfilter::core::validation::default_validator_plugins(),
    );

    let mut input = factory
        .create_input_from_value(&json!({"name": "a", "filters": ["shout"]}))
        .unwrap();
    input.set_value(json!("hey")).unwrap();
    assert_eq!(input.value(), json!("hey!"));

    assert!(Factory::new()
        .create_input_from_value(&json!({"name": "a", "filters": ["shout"]}))
        .is_err());
}

#[test]
fn test_default_validator_chain_copied_into_each_input() {
    let mut factory = Factory::new();
    let defaults = Shared::new(ValidatorChain::new());
    defaults
        .write()
        .attach_by_name("digits", &PluginOptions::new(), false, ValidatorChain::DEFAULT_PRIORITY)
        .unwrap();
    factory.set_default_validator_chain(defaults.clone());

    let mut a = factory.create_input(InputSpec::new("a")).unwrap();
    let b = factory.create_input(InputSpec::new("b")).unwrap();

    a.set_value(json!("abc")).unwrap();
    assert!(!a.is_valid());
    assert!(a.input().messages().contains_key("notDigits"));

    // a's injected not-empty check stays in a's copy
    assert_eq!(defaults.read().len(), 1);
    assert_eq!(b.input().validator_chain().read().len(), 1);
    assert!(!a.input().validator_chain().ptr_eq(b.input().validator_chain()));
}

#[test]
fn test_lazy_default_chains_are_built_once() {
    let factory = Factory::new();
    let first = factory.default_filter_chain().clone();
    assert!(first.ptr_eq(factory.default_filter_chain()));
    assert!(first.read().is_empty());
}

#[test]
fn test_input_filter_list_form() {
    let mut filter = Factory::new()
        .create_input_filter_from_value(&json!([
            {"name": "first", "filters": ["string_trim"]},
            {"name": "last", "required": false}
        ]))
        .unwrap();

    filter.set_data(json!({"first": " Ada "})).unwrap();
    assert!(filter.is_valid());
    assert_eq!(filter.values(), json!({"first": "Ada", "last": null}));
}

#[test]
fn test_children_registered_in_spec_order() {
    let filter = Factory::new()
        .create_input_filter_from_value(&json!({
            "zeta": {},
            "alpha": {},
            "type": {"name": "type"},
            "mid": {}
        }))
        .unwrap();

    let plain = filter.as_any().downcast_ref::<InputFilter>().unwrap();
    assert_eq!(
        plain.names().collect::<Vec<_>>(),
        ["zeta", "alpha", "type", "mid"]
    );
}

#[test]
fn test_collection_spec_with_template_and_count() {
    let mut template = InputFilter::new();
    template.add_input(Input::new("sku"));

    let spec = InputFilterSpec::new()
        .kind("collection")
        .entry("input_filter", template)
        .entry("count", json!(3));
    let filter = Factory::new().create_input_filter(spec).unwrap();

    assert_eq!(filter.kind(), "collection");
    let collection = filter
        .as_any()
        .downcast_ref::<CollectionInputFilter>()
        .unwrap();
    assert_eq!(collection.count(), 3);
    let template = collection
        .input_filter()
        .as_any()
        .downcast_ref::<InputFilter>()
        .unwrap();
    assert_eq!(template.names().collect::<Vec<_>>(), ["sku"]);
}

#[test]
fn test_prebuilt_children_pass_through() {
    let mut nested = InputFilter::new();
    nested.add_input(Input::new("zip"));
    let mut code = Input::new("code");
    code.set_required(false);

    let filter = Factory::new()
        .create_input_filter(
            InputFilterSpec::new()
                .entry("code", code)
                .entry("address", nested)
                .input(InputSpec::new("email")),
        )
        .unwrap();

    let plain = filter.as_any().downcast_ref::<InputFilter>().unwrap();
    assert!(!plain.input("code").unwrap().input().is_required());
    assert!(plain.get("address").and_then(Entry::as_filter).is_some());
    assert!(plain.has("email"));
}

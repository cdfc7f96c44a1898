//! Integration tests for input filters: validation passes, context-aware
//! validators, nested filters and validation groups

use inputfilter::prelude::*;

fn signup() -> Box<dyn InputFilterInterface> {
    Factory::new()
        .create_input_filter_from_value(&json!({
            "username": {
                "filters": ["string_trim"],
                "validators": [{"name": "string_length", "options": {"min": 3}}]
            },
            "password": {"validators": [{"name": "string_length", "options": {"min": 8}}]},
            "password_confirm": {
                "validators": [{"name": "identical", "options": {"token": "password"}}]
            },
            "newsletter": {"required": false},
            "address": {
                "type": "input_filter",
                "city": {"filters": ["string_trim"]},
                "zip": {"validators": ["digits"]}
            }
        }))
        .unwrap()
}

fn valid_data() -> Value {
    json!({
        "username": " jane ",
        "password": "long enough",
        "password_confirm": "long enough",
        "address": {"city": " Nantes ", "zip": "44000"}
    })
}

#[test]
fn test_valid_submission() {
    let mut form = signup();
    form.set_data(valid_data()).unwrap();

    assert!(form.is_valid());
    assert!(form.messages().is_empty());
    assert_eq!(
        form.values(),
        json!({
            "username": "jane",
            "password": "long enough",
            "password_confirm": "long enough",
            "newsletter": null,
            "address": {"city": "Nantes", "zip": "44000"}
        })
    );
}

#[test]
fn test_identical_reads_sibling_value() {
    let mut form = signup();
    let mut data = valid_data();
    data["password_confirm"] = json!("something else");
    form.set_data(data).unwrap();

    assert!(!form.is_valid());
    let messages = form.messages();
    let confirm = messages.get("password_confirm").and_then(|m| m.as_input()).unwrap();
    assert!(confirm.contains_key("notSame"));
    assert_eq!(messages.get("password"), None);
}

#[test]
fn test_messages_only_for_invalid_inputs() {
    let mut form = signup();
    form.set_data(json!({
        "username": "jo",
        "password": "long enough",
        "password_confirm": "long enough",
        "address": {"city": "Nantes", "zip": "44 000"}
    }))
    .unwrap();

    assert!(!form.is_valid());
    let messages = serde_json::to_value(form.messages()).unwrap();
    let object = messages.as_object().unwrap();
    assert_eq!(object.len(), 2);
    assert!(object["username"].get("stringLengthTooShort").is_some());
    assert!(object["address"]["zip"].get("notDigits").is_some());
}

#[test]
fn test_missing_required_inputs_reported_after_present_ones() {
    let mut form = signup();
    form.set_data(json!({"username": "x"})).unwrap();

    assert!(!form.is_valid());
    let plain = form.as_any().downcast_ref::<InputFilter>().unwrap();
    assert_eq!(
        plain.invalid_input_names(),
        ["username", "password", "password_confirm", "address"]
    );
    assert_eq!(plain.valid_input_names(), ["newsletter"]);
}

#[test]
fn test_validation_group_limits_the_pass() {
    let mut form = signup();
    form.set_validation_group(&["username".into(), GroupItem::nested("address", ["zip"])])
        .unwrap();
    form.set_data(json!({"username": "jane", "address": {"zip": "44000"}}))
        .unwrap();

    assert!(form.is_valid());
    assert_eq!(
        form.values(),
        json!({"username": "jane", "address": {"zip": "44000"}})
    );

    form.clear_validation_group();
    assert!(!form.is_valid());
}

#[test]
fn test_validation_group_rejects_unknown_names() {
    let mut form = signup();

    let err = form.set_validation_group(&["phone".into()]).unwrap_err();
    assert_eq!(err.error_code(), "UNKNOWN_NAME");

    let err = form
        .set_validation_group(&[GroupItem::nested("address", ["country"])])
        .unwrap_err();
    assert!(matches!(
        err,
        InputFilterError::UnknownName(UnknownNameError::Nested { ref name, .. }) if name == "address"
    ));
}

#[test]
fn test_unknown_data_keys() {
    let mut filter = InputFilter::new();
    filter.add_input(Input::new("a"));
    filter.set_data(json!({"a": "1", "b": "2"})).unwrap();

    assert!(filter.has_unknown());
    assert_eq!(Value::Object(filter.unknown()), json!({"b": "2"}));
}

#[test]
fn test_get_mut_and_remove() {
    let mut filter = InputFilter::new();
    filter.add_input(Input::new("a")).add_input(Input::new("b"));

    filter
        .get_mut("a")
        .and_then(Entry::as_input_mut)
        .unwrap()
        .input_mut()
        .set_required(false);
    assert!(!filter.input("a").unwrap().input().is_required());

    assert!(filter.remove("b").is_some());
    assert_eq!(filter.names().collect::<Vec<_>>(), ["a"]);
}

#[test]
fn test_set_data_rejects_scalar_for_nested_filter() {
    let mut form = signup();
    let mut data = valid_data();
    data["address"] = json!("Nantes");

    let err = form.set_data(data).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_DATA");
}

#[test]
fn test_messages_serialize_as_nested_json() {
    let mut form = signup();
    form.set_data(json!({
        "username": "jane",
        "password": "long enough",
        "password_confirm": "long enough",
        "address": {"zip": "x"}
    }))
    .unwrap();

    assert!(!form.is_valid());
    assert_eq!(
        serde_json::to_value(form.messages()).unwrap(),
        json!({
            "address": {
                "zip": {"notDigits": "The input must contain only digits"},
                "city": {"isEmpty": "Value is required and can't be empty"}
            }
        })
    );
}

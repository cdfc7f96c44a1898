//! Signup form validated from a YAML specification
//!
//! Run with `RUST_LOG=inputfilter=debug` to see how the factory builds the form.

use inputfilter::prelude::*;
use tracing_subscriber::EnvFilter;

const SIGNUP_FORM: &str = r#"
username:
  filters:
    - string_trim
    - string_to_lower
  validators:
    - name: string_length
      options: { min: 3, max: 20 }
email:
  filters: [string_trim]
  validators: [email_address]
password:
  validators:
    - name: string_length
      options: { min: 8 }
password_confirm:
  validators:
    - name: identical
      options: { token: password }
  error_message: Passwords do not match
age:
  required: false
  filters: [to_int]
  validators:
    - name: between
      options: { min: 13, max: 120 }
addresses:
  type: collection
  input_filter:
    city:
      filters: [string_trim]
    zip:
      validators: [digits]
"#;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("📝 InputFilter-RS Signup Example\n");

    let spec = InputFilterConfig::from_yaml_str(SIGNUP_FORM)?.into_spec()?;
    let factory = Factory::new();
    let mut form = factory.create_input_filter(spec)?;

    let submissions = [
        json!({
            "username": "  Alice  ",
            "email": "alice@example.com",
            "password": "correct horse",
            "password_confirm": "correct horse",
            "age": "34",
            "addresses": [{"city": " Lyon ", "zip": "69001"}]
        }),
        json!({
            "username": "al",
            "email": "not-an-email",
            "password": "short",
            "password_confirm": "different",
            "addresses": [{"city": "Paris", "zip": "75 001"}]
        }),
    ];

    for data in submissions {
        form.set_data(data)?;
        if form.is_valid() {
            println!("✅ valid: {}", form.values());
        } else {
            println!(
                "❌ invalid:\n{}",
                serde_json::to_string_pretty(&form.messages())?
            );
        }
        println!();
    }

    Ok(())
}

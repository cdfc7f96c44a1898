//! Value helpers shared by inputs, chains and filters

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Failure code → human readable message, in the order failures occurred
pub type Messages = IndexMap<String, String>;

/// Messages of a validation pass, shaped like the validated graph
///
/// An input reports a flat [`Messages`] map; an input filter reports one
/// entry per invalid child; a collection reports one entry per invalid index.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ValidationMessages {
    Input(Messages),
    Group(IndexMap<String, ValidationMessages>),
}

impl ValidationMessages {
    pub fn is_empty(&self) -> bool {
        match self {
            ValidationMessages::Input(m) => m.is_empty(),
            ValidationMessages::Group(g) => g.is_empty(),
        }
    }

    /// Child messages by name (or index, for collections)
    pub fn get(&self, key: &str) -> Option<&ValidationMessages> {
        match self {
            ValidationMessages::Group(g) => g.get(key),
            ValidationMessages::Input(_) => None,
        }
    }

    /// The flat message map, when this node describes a single input
    pub fn as_input(&self) -> Option<&Messages> {
        match self {
            ValidationMessages::Input(m) => Some(m),
            ValidationMessages::Group(_) => None,
        }
    }
}

impl Default for ValidationMessages {
    fn default() -> Self {
        ValidationMessages::Group(IndexMap::new())
    }
}

/// Build a single-entry message map
pub fn failure(code: &str, message: impl Into<String>) -> Messages {
    let mut messages = Messages::new();
    messages.insert(code.to_string(), message.into());
    messages
}

/// Semantic emptiness: null, empty string or empty sequence
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A reference-counted, lockable handle
///
/// Chains are handed around through this type so that two inputs can share
/// one pipeline when the caller asks for it. Cloning the handle shares the
/// value; to get an independent copy clone the *contents* instead
/// (`Shared::new(handle.read().clone())`).
pub struct Shared<T>(Arc<RwLock<T>>);

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// `true` when both handles point at the same value
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone> Shared<T> {
    /// Independent copy of the current contents
    pub fn deep_clone(&self) -> Self {
        Self::new(self.read().clone())
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shared").field(&*self.read()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_values() {
        assert!(is_empty_value(&json!(null)));
        assert!(is_empty_value(&json!("")));
        assert!(is_empty_value(&json!([])));
    }

    #[test]
    fn test_non_empty_values() {
        assert!(!is_empty_value(&json!("0")));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!(false)));
        assert!(!is_empty_value(&json!({})));
        assert!(!is_empty_value(&json!(" ")));
    }

    #[test]
    fn test_shared_clone_is_same_reference() {
        let a = Shared::new(vec![1]);
        let b = a.clone();
        b.write().push(2);
        assert!(a.ptr_eq(&b));
        assert_eq!(*a.read(), vec![1, 2]);
    }

    #[test]
    fn test_shared_deep_clone_is_independent() {
        let a = Shared::new(vec![1]);
        let b = a.deep_clone();
        b.write().push(2);
        assert!(!a.ptr_eq(&b));
        assert_eq!(*a.read(), vec![1]);
    }

    #[test]
    fn test_validation_messages_serialize_untagged() {
        let mut group = IndexMap::new();
        group.insert(
            "email".to_string(),
            ValidationMessages::Input(failure("isEmpty", "required")),
        );
        let json = serde_json::to_value(ValidationMessages::Group(group)).unwrap();
        assert_eq!(json, json!({"email": {"isEmpty": "required"}}));
    }
}

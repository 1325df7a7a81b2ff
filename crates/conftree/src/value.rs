//! Values stored in a config tree.

use serde::{Deserialize, Serialize};

use crate::config::CommentedConfig;
use crate::error::Found;

/// A value held by one config entry.
///
/// Scalars are stored directly, lists own their items, and a nested config
/// is owned by the entry that holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Explicit absence of a value (distinct from a missing key).
    Null,

    /// Boolean scalar.
    Bool(bool),

    /// Integer scalar.
    Integer(i64),

    /// Floating point scalar.
    Float(f64),

    /// String scalar.
    String(String),

    /// Ordered sequence of values.
    List(Vec<Value>),

    /// Nested sub-tree.
    Config(CommentedConfig),
}

impl Value {
    /// Check if this is a scalar value.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::List(_) | Value::Config(_))
    }

    /// Check if this is a list value.
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Check if this is a nested config.
    pub fn is_config(&self) -> bool {
        matches!(self, Value::Config(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as a float, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_config(&self) -> Option<&CommentedConfig> {
        match self {
            Value::Config(config) => Some(config),
            _ => None,
        }
    }

    pub fn as_config_mut(&mut self) -> Option<&mut CommentedConfig> {
        match self {
            Value::Config(config) => Some(config),
            _ => None,
        }
    }

    /// Short name of the value's kind, for messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Config(_) => "config",
        }
    }

    pub(crate) fn found(&self) -> Found {
        match self {
            Value::List(_) => Found::List,
            _ => Found::Scalar,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<CommentedConfig> for Value {
    fn from(config: CommentedConfig) -> Self {
        Value::Config(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnmodifiableConfig;

    #[test]
    fn test_kind_checks() {
        assert!(Value::from(1).is_scalar());
        assert!(Value::Null.is_scalar());
        assert!(Value::from(vec![Value::from("a")]).is_list());
        assert!(Value::from(CommentedConfig::new()).is_config());
        assert!(!Value::from(CommentedConfig::new()).is_scalar());
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from(5).as_i64(), Some(5));
        assert_eq!(Value::from(5).as_f64(), Some(5.0));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from("x").as_i64(), None);
        assert_eq!(Value::from(2.5).kind_name(), "float");
    }

    #[test]
    fn test_serde_json_untagged() {
        let value: Value = serde_json::from_str(r#"[1, 2.5, "s", null, true, {"k": 1}]"#).unwrap();
        let items = value.as_list().unwrap();
        assert_eq!(items[0], Value::Integer(1));
        assert_eq!(items[1], Value::Float(2.5));
        assert_eq!(items[2], Value::String("s".into()));
        assert_eq!(items[3], Value::Null);
        assert_eq!(items[4], Value::Bool(true));
        let nested = items[5].as_config().unwrap();
        assert_eq!(nested.value_map().get("k"), Some(&Value::Integer(1)));

        let back = serde_json::to_string(&value).unwrap();
        assert_eq!(back, r#"[1,2.5,"s",null,true,{"k":1}]"#);
    }
}

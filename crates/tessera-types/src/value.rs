//! Wire values exchanged between scripts and the ledger
//!
//! Values are encoded as tagged JSON objects, `{"type": "Int", "value": "42"}`.
//! Integers travel as decimal strings so that 128-bit values survive JSON
//! number handling.

use serde::{Deserialize, Serialize};
use std::fmt;
use tessera_primitives::Address;

/// A language-level value in its ledger-exchange form
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// No value
    Void,
    /// Optional value (`nil` when `None`)
    Optional(Option<Box<Value>>),
    /// Boolean
    Bool(bool),
    /// UTF-8 string
    String(String),
    /// Account address
    Address(Address),
    /// Arbitrary-precision integer (bounded to 128 bits here)
    Int(#[serde(with = "decimal")] i128),
    /// Unsigned 64-bit integer
    UInt64(#[serde(with = "decimal")] u64),
    /// Homogeneous array
    Array(Vec<Value>),
    /// Key/value pairs in insertion order
    Dictionary(Vec<DictionaryEntry>),
    /// Struct instance
    Struct(Composite),
    /// Event instance
    Event(Composite),
    /// Contract value
    Contract(Composite),
}

/// Entry of a [`Value::Dictionary`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    /// Key
    pub key: Value,
    /// Value
    pub value: Value,
}

/// Composite value (struct, event, contract)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composite {
    /// Fully qualified type identifier
    pub id: String,
    /// Fields in declaration order
    pub fields: Vec<Field>,
}

/// Named field of a [`Composite`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Field value
    pub value: Value,
}

impl Composite {
    /// Create a composite with the given type id and fields
    pub fn new(id: impl Into<String>, fields: Vec<(String, Value)>) -> Self {
        Self {
            id: id.into(),
            fields: fields
                .into_iter()
                .map(|(name, value)| Field { name, value })
                .collect(),
        }
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }
}

impl Value {
    /// Type identifier as written in a parameter list, e.g. `Int`, `[String]`, `Address?`
    ///
    /// Element types of empty containers and `nil` cannot be inferred and
    /// fall back to `AnyStruct` / `Never`.
    pub fn type_id(&self) -> String {
        match self {
            Value::Void => "Void".to_string(),
            Value::Optional(Some(inner)) => format!("{}?", inner.type_id()),
            Value::Optional(None) => "Never?".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::String(_) => "String".to_string(),
            Value::Address(_) => "Address".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::UInt64(_) => "UInt64".to_string(),
            Value::Array(values) => match values.first() {
                Some(first) => format!("[{}]", first.type_id()),
                None => "[AnyStruct]".to_string(),
            },
            Value::Dictionary(entries) => match entries.first() {
                Some(entry) => format!("{{{}: {}}}", entry.key.type_id(), entry.value.type_id()),
                None => "{String: AnyStruct}".to_string(),
            },
            Value::Struct(c) | Value::Event(c) | Value::Contract(c) => c.id.clone(),
        }
    }

    /// Integer content, if this is an integer value
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Value::Int(v) => Some(*v),
            Value::UInt64(v) => Some(i128::from(*v)),
            _ => None,
        }
    }

    /// String content, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Address content, if this is an address value
    pub fn as_address(&self) -> Option<Address> {
        match self {
            Value::Address(a) => Some(*a),
            _ => None,
        }
    }

    /// Boolean content, if this is a boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Composite content, if this is a struct, event or contract value
    pub fn as_composite(&self) -> Option<&Composite> {
        match self {
            Value::Struct(c) | Value::Event(c) | Value::Contract(c) => Some(c),
            _ => None,
        }
    }

    /// Wrap a value in `Optional`
    pub fn some(value: Value) -> Self {
        Value::Optional(Some(Box::new(value)))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => f.write_str("()"),
            Value::Optional(None) => f.write_str("nil"),
            Value::Optional(Some(inner)) => write!(f, "{inner}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Address(a) => write!(f, "{a}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::Array(values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Value::Dictionary(entries) => {
                f.write_str("{")?;
                for (i, e) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", e.key, e.value)?;
                }
                f.write_str("}")
            }
            Value::Struct(c) | Value::Event(c) | Value::Contract(c) => {
                write!(f, "{}(", c.id)?;
                for (i, field) in c.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.value)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Address> for Value {
    fn from(a: Address) -> Self {
        Value::Address(a)
    }
}

impl From<i128> for Value {
    fn from(v: i128) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt64(v)
    }
}

mod decimal {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::fmt::Display;
    use std::str::FromStr;

    pub fn serialize<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_int_encodes_as_string() {
        let json = serde_json::to_value(Value::Int(-42)).unwrap();
        assert_eq!(json, json!({"type": "Int", "value": "-42"}));

        let big = Value::Int(i128::MAX);
        let back: Value = serde_json::from_value(serde_json::to_value(&big).unwrap()).unwrap();
        assert_eq!(back, big);
    }

    #[test]
    fn test_void_has_no_value() {
        let json = serde_json::to_value(Value::Void).unwrap();
        assert_eq!(json, json!({"type": "Void"}));
        let back: Value = serde_json::from_value(json!({"type": "Void"})).unwrap();
        assert_eq!(back, Value::Void);
    }

    #[test]
    fn test_optional_nil() {
        let json = serde_json::to_value(Value::Optional(None)).unwrap();
        assert_eq!(json, json!({"type": "Optional", "value": null}));
    }

    #[test]
    fn test_address_encoding() {
        let json = serde_json::to_value(Value::Address(Address::from_u64(1))).unwrap();
        assert_eq!(json, json!({"type": "Address", "value": "0x0000000000000001"}));
    }

    #[test]
    fn test_composite_encoding() {
        let value = Value::Struct(Composite::new(
            "S.test.Point",
            vec![("x".to_string(), Value::Int(1))],
        ));
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "Struct",
                "value": {
                    "id": "S.test.Point",
                    "fields": [{"name": "x", "value": {"type": "Int", "value": "1"}}]
                }
            })
        );
    }

    #[test]
    fn test_type_ids() {
        assert_eq!(Value::Int(1).type_id(), "Int");
        assert_eq!(Value::from("hi").type_id(), "String");
        assert_eq!(Value::some(Value::Bool(true)).type_id(), "Bool?");
        assert_eq!(Value::Array(vec![Value::UInt64(1)]).type_id(), "[UInt64]");
        assert_eq!(Value::Array(vec![]).type_id(), "[AnyStruct]");
        assert_eq!(
            Value::Dictionary(vec![DictionaryEntry {
                key: Value::from("a"),
                value: Value::Int(1),
            }])
            .type_id(),
            "{String: Int}"
        );
        assert_eq!(
            Value::Struct(Composite::new("S.test.Foo", vec![])).type_id(),
            "S.test.Foo"
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(3).to_string(), "3");
        assert_eq!(Value::from("x").to_string(), "\"x\"");
        assert_eq!(
            Value::Array(vec![Value::Int(1), Value::Int(2)]).to_string(),
            "[1, 2]"
        );
        assert_eq!(Value::Optional(None).to_string(), "nil");
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::UInt64(5).as_int(), Some(5));
        assert_eq!(Value::Bool(true).as_int(), None);
        assert_eq!(Value::from("s").as_str(), Some("s"));
        let c = Composite::new("T", vec![("a".to_string(), Value::Bool(false))]);
        assert_eq!(c.field("a"), Some(&Value::Bool(false)));
        assert_eq!(c.field("b"), None);
    }

    proptest::proptest! {
        #[test]
        fn prop_int_decimal_form(v in proptest::prelude::any::<i128>()) {
            let json = serde_json::to_value(Value::Int(v)).unwrap();
            proptest::prop_assert_eq!(&json["value"], &serde_json::Value::String(v.to_string()));
            let back: Value = serde_json::from_value(json).unwrap();
            proptest::prop_assert_eq!(back, Value::Int(v));
        }
    }
}

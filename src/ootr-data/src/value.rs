//! Engine values.
//!
//! Every field read out of the randomizer's tables is held as a [`Value`].
//! The literal cases serialize with plain JSON semantics. The remaining cases
//! describe things the engine can hold but JSON cannot, and serializing one of
//! them fails.

use indexmap::IndexMap;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Insertion-ordered mapping with string keys
pub type Dict = IndexMap<String, Value>;

/// A value taken from the engine's data tables
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<Value>),
    List(Vec<Value>),
    Dict(Dict),
    /// Positive infinity, used by the engine to mean "no upper bound"
    Uncapped,
    /// An expression that is not a plain literal, kept as source text
    Opaque(String),
}

impl Value {
    /// Build a float, folding positive infinity into [`Value::Uncapped`]
    pub fn from_f64(f: f64) -> Self {
        if f == f64::INFINITY {
            Value::Uncapped
        } else {
            Value::Float(f)
        }
    }

    /// Elements of a tuple or list
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) | Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Positive infinity, in either representation
    pub fn is_uncapped(&self) -> bool {
        match self {
            Value::Uncapped => true,
            Value::Float(f) => *f == f64::INFINITY,
            _ => false,
        }
    }

    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Uncapped => "infinity",
            Value::Opaque(_) => "expression",
        }
    }

    /// Variant name plus length for sequences, e.g. `tuple of 3 elements`
    pub fn describe(&self) -> String {
        match self.as_sequence() {
            Some(items) => format!("{} of {} elements", self.kind(), items.len()),
            None => self.kind().to_string(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Dict> for Value {
    fn from(d: Dict) -> Self {
        Value::Dict(d)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::None => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Float(f) => Err(S::Error::custom(format!(
                "non-finite float {f} is not JSON serializable"
            ))),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Tuple(items) | Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Dict(dict) => {
                let mut map = serializer.serialize_map(Some(dict.len()))?;
                for (k, v) in dict {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Uncapped => Err(S::Error::custom(
                "infinity is not JSON serializable outside of a capped field",
            )),
            Value::Opaque(text) => Err(S::Error::custom(format!(
                "expression `{text}` is not JSON serializable"
            ))),
        }
    }
}

/// Build a [`Dict`] from literal pairs
#[macro_export]
macro_rules! dict {
    () => { $crate::value::Dict::new() };
    ($($k:expr => $v:expr),+ $(,)?) => {{
        let mut d = $crate::value::Dict::new();
        $( d.insert(::std::string::String::from($k), $crate::Value::from($v)); )+
        d
    }};
}

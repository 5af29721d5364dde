//! Typed configuration values.
//!
//! The type of every key is fixed by the built-in defaults. Later layers only
//! supply text (environment, command line) or TOML scalars (files), which are
//! coerced to the type of the value they replace. A value that cannot be
//! coerced is rejected as a whole.

use std::fmt;

const TRUTHY: [&str; 4] = ["1", "true", "yes", "on"];
const FALSY: [&str; 4] = ["0", "false", "no", "off"];

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
        }
    }

    /// Convert `raw` to the same type as `self`.
    pub fn coerce_text(&self, raw: &str) -> Option<Value> {
        match self {
            Value::Bool(_) => parse_bool(raw).map(Value::Bool),
            Value::Int(_) => raw.trim().parse::<i64>().ok().map(Value::Int),
            Value::Float(_) => raw.trim().parse::<f64>().ok().map(Value::Float),
            Value::Str(_) => Some(Value::Str(raw.to_string())),
        }
    }

    /// Convert a TOML scalar to the same type as `self`.
    ///
    /// Strings go through [`Value::coerce_text`], so `max_len = "40"` is as
    /// valid as `max_len = 40`.
    pub fn coerce_toml(&self, raw: &toml::Value) -> Option<Value> {
        match (self, raw) {
            (_, toml::Value::String(text)) => self.coerce_text(text),
            (Value::Bool(_), toml::Value::Boolean(b)) => Some(Value::Bool(*b)),
            (Value::Int(_), toml::Value::Integer(i)) => Some(Value::Int(*i)),
            (Value::Float(_), toml::Value::Float(f)) => Some(Value::Float(*f)),
            (Value::Float(_), toml::Value::Integer(i)) => Some(Value::Float(*i as f64)),
            (Value::Str(_), toml::Value::Boolean(b)) => Some(Value::Str(b.to_string())),
            (Value::Str(_), toml::Value::Integer(i)) => Some(Value::Str(i.to_string())),
            (Value::Str(_), toml::Value::Float(f)) => Some(Value::Str(f.to_string())),
            _ => None,
        }
    }

    /// `false`, zero and the empty string.
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::Str(s) => s.is_empty(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
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
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    let token = raw.trim().to_ascii_lowercase();
    if TRUTHY.contains(&token.as_str()) {
        Some(true)
    } else if FALSY.contains(&token.as_str()) {
        Some(false)
    } else {
        None
    }
}

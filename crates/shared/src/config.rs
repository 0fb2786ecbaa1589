//! Typed values for the sectioned config file.
//!
//! Every option is persisted as a small JSON object carrying a kind tag and a
//! string-encoded value, e.g. `{"type":"int","value":"10"}`. Structured data is
//! itself serialized to a string before being wrapped, so the file only ever
//! holds one line of JSON per option.

use serde::{Deserialize, Serialize};

/// Token written for `true`. Decoding accepts only this exact text.
pub const TRUE_TOKEN: &str = "True";
/// Token written for `false`.
pub const FALSE_TOKEN: &str = "False";

/// Kind tag stored next to every payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Int,
    Float,
    Bool,
    Str,
    Json,
}

impl ValueKind {
    /// Wire tag used in the `type` field.
    pub fn tag(self) -> &'static str {
        match self {
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
            ValueKind::Str => "str",
            ValueKind::Json => "json",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "int" => Some(ValueKind::Int),
            "float" => Some(ValueKind::Float),
            "bool" => Some(ValueKind::Bool),
            "str" => Some(ValueKind::Str),
            "json" => Some(ValueKind::Json),
            _ => None,
        }
    }
}

/// A decoded config value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Json(serde_json::Value),
}

/// On-disk envelope: `{"type": <tag>, "value": <string>}`.
#[derive(Debug, Serialize)]
struct TaggedPayload<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    value: String,
}

impl ConfigValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ConfigValue::Int(_) => ValueKind::Int,
            ConfigValue::Float(_) => ValueKind::Float,
            ConfigValue::Bool(_) => ValueKind::Bool,
            ConfigValue::Str(_) => ValueKind::Str,
            ConfigValue::Json(_) => ValueKind::Json,
        }
    }

    /// String form of the value, without the kind envelope.
    pub fn encode_value(&self) -> String {
        match self {
            ConfigValue::Int(v) => v.to_string(),
            // Debug keeps a fractional part ("1.0"), so the text still reads as a float.
            ConfigValue::Float(v) => format!("{:?}", v),
            ConfigValue::Bool(true) => TRUE_TOKEN.to_string(),
            ConfigValue::Bool(false) => FALSE_TOKEN.to_string(),
            ConfigValue::Str(s) => s.clone(),
            ConfigValue::Json(v) => v.to_string(),
        }
    }

    /// Full payload string as written into the config file.
    pub fn to_payload(&self) -> String {
        let payload = TaggedPayload {
            kind: self.kind().tag(),
            value: self.encode_value(),
        };
        // A struct of two strings always serializes.
        serde_json::to_string(&payload).unwrap_or_default()
    }

    /// Decode a string-encoded value for the given kind.
    ///
    /// Returns `None` when the text does not parse as that kind.
    pub fn decode(kind: ValueKind, value: &str) -> Option<Self> {
        match kind {
            ValueKind::Int => value.trim().parse().ok().map(ConfigValue::Int),
            ValueKind::Float => value.trim().parse().ok().map(ConfigValue::Float),
            ValueKind::Bool => Some(ConfigValue::Bool(value == TRUE_TOKEN)),
            ValueKind::Str => Some(ConfigValue::Str(value.to_string())),
            ValueKind::Json => serde_json::from_str(value).ok().map(ConfigValue::Json),
        }
    }

    /// Decode a full payload string. Any malformed input yields `None`.
    pub fn from_payload(raw: &str) -> Option<Self> {
        let envelope: serde_json::Value = serde_json::from_str(raw).ok()?;
        let kind = ValueKind::from_tag(envelope.get("type")?.as_str()?)?;
        let value = match envelope.get("value")? {
            serde_json::Value::String(s) => s.clone(),
            // Hand-edited files sometimes drop the quotes around numbers.
            serde_json::Value::Number(n) => n.to_string(),
            _ => return None,
        };
        Self::decode(kind, &value)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Floats, and integers widened to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(v) => Some(*v),
            ConfigValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ConfigValue::Json(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        ConfigValue::Int(v)
    }
}

impl From<i32> for ConfigValue {
    fn from(v: i32) -> Self {
        ConfigValue::Int(v.into())
    }
}

impl From<u32> for ConfigValue {
    fn from(v: u32) -> Self {
        ConfigValue::Int(v.into())
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        ConfigValue::Float(v)
    }
}

impl From<f32> for ConfigValue {
    fn from(v: f32) -> Self {
        ConfigValue::Float(v.into())
    }
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Bool(v)
    }
}

impl From<String> for ConfigValue {
    fn from(v: String) -> Self {
        ConfigValue::Str(v)
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        ConfigValue::Str(v.to_string())
    }
}

/// Scalars are tagged by their own kind; only arrays, objects and null are
/// stored as structured data.
impl From<serde_json::Value> for ConfigValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Bool(b) => ConfigValue::Bool(b),
            serde_json::Value::String(s) => ConfigValue::Str(s),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => ConfigValue::Int(i),
                (None, Some(f)) if !n.is_u64() => ConfigValue::Float(f),
                _ => ConfigValue::Json(serde_json::Value::Number(n)),
            },
            other => ConfigValue::Json(other),
        }
    }
}

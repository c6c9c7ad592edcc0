//! Values as the scripting engine presents them.

use crate::entity::EntityRef;

/// Opaque identity of a live script closure.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct FunctionId(pub u64);

/// A script-level value.
///
/// Numbers follow the script engine: `Number` is always a double, and integers
/// only stay integers as `BigInt`.
#[derive(Clone, Debug, PartialEq)]
pub enum ScriptValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(i64),
    String(String),
    /// Array buffer contents.
    Bytes(Vec<u8>),
    Array(Vec<ScriptValue>),
    /// Plain object with its own enumerable properties, in insertion order.
    Object(Vec<(String, ScriptValue)>),
    Vector2([f32; 2]),
    Vector3([f32; 3]),
    Rgba([u8; 4]),
    Entity(EntityRef),
    /// A closure. Never leaves the process.
    Function(FunctionId),
}

impl ScriptValue {
    /// Short name of the value's shape, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::BigInt(_) => "bigint",
            Self::String(_) => "string",
            Self::Bytes(_) => "arraybuffer",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Vector2(_) => "vector2",
            Self::Vector3(_) => "vector3",
            Self::Rgba(_) => "rgba",
            Self::Entity(_) => "entity",
            Self::Function(_) => "function",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of `Number` and `BigInt`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::BigInt(n) => Some(*n as f64),
            _ => None,
        }
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for ScriptValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<EntityRef> for ScriptValue {
    fn from(e: EntityRef) -> Self {
        Self::Entity(e)
    }
}

//! # Engine Values
//!
//! The translation layer between [`ScriptValue`] and the engine-wide [`EngineValue`].
//!
//! ## Numeric Policy
//! - `Number` ↔ `Double`, `BigInt` ↔ `Int`. Script values therefore round-trip exactly.
//! - `UInt` only originates on the engine side. It becomes `BigInt` when it fits in
//!   an `i64` and `Number` otherwise, the one lossy direction.
//!
//! ## Invariants
//! - **Recursion Safety**: All recursive operations are bounded by `MAX_DEPTH`.
//! - **Propagation**: A nested unsupported value fails the whole conversion.

use crate::MAX_DEPTH;
use crate::entity::EntityRef;
use crate::script::ScriptValue;

/// Failures converting a script value into an [`EngineValue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The value has no engine representation (e.g. a closure).
    UnsupportedType(&'static str),
    /// The nested depth of the value exceeded `MAX_DEPTH`.
    DepthLimitExceeded,
}

impl std::fmt::Display for ValueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedType(ty) => write!(f, "unsupported type: {}", ty),
            Self::DepthLimitExceeded => write!(f, "value nested deeper than {} levels", MAX_DEPTH),
        }
    }
}

impl std::error::Error for ValueError {}

pub type Result<T> = std::result::Result<T, ValueError>;

/// The engine-wide dynamic value.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineValue {
    /// Absent value (script `undefined`).
    None,
    Nil,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    String(String),
    /// Opaque bytes. Never interpreted as text.
    ByteArray(Vec<u8>),
    List(Vec<EngineValue>),
    Dict(Vec<(String, EngineValue)>),
    BaseObject(EntityRef),
    Vector2([f32; 2]),
    Vector3([f32; 3]),
    Rgba([u8; 4]),
}

impl EngineValue {
    /// Converts a script value into its engine form.
    ///
    /// # Errors
    /// Returns `ValueError::UnsupportedType` for closures anywhere in the value and
    /// `ValueError::DepthLimitExceeded` for values nested too deeply.
    pub fn from_script(value: &ScriptValue) -> Result<Self> {
        from_script_impl(value, 0)
    }

    /// Converts back into a script value. Total over all variants.
    pub fn to_script(&self) -> ScriptValue {
        match self {
            Self::None => ScriptValue::Undefined,
            Self::Nil => ScriptValue::Null,
            Self::Bool(b) => ScriptValue::Bool(*b),
            Self::Int(v) => ScriptValue::BigInt(*v),
            Self::UInt(v) => match i64::try_from(*v) {
                Ok(v) => ScriptValue::BigInt(v),
                Err(_) => ScriptValue::Number(*v as f64),
            },
            Self::Double(v) => ScriptValue::Number(*v),
            Self::String(s) => ScriptValue::String(s.clone()),
            Self::ByteArray(b) => ScriptValue::Bytes(b.clone()),
            Self::List(items) => ScriptValue::Array(items.iter().map(Self::to_script).collect()),
            Self::Dict(entries) => ScriptValue::Object(
                entries.iter().map(|(k, v)| (k.clone(), v.to_script())).collect(),
            ),
            Self::BaseObject(e) => ScriptValue::Entity(*e),
            Self::Vector2(v) => ScriptValue::Vector2(*v),
            Self::Vector3(v) => ScriptValue::Vector3(*v),
            Self::Rgba(v) => ScriptValue::Rgba(*v),
        }
    }

    /// Short name of the variant, for logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::ByteArray(_) => "byte-array",
            Self::List(_) => "list",
            Self::Dict(_) => "dict",
            Self::BaseObject(_) => "base-object",
            Self::Vector2(_) => "vector2",
            Self::Vector3(_) => "vector3",
            Self::Rgba(_) => "rgba",
        }
    }
}

impl TryFrom<&ScriptValue> for EngineValue {
    type Error = ValueError;

    fn try_from(value: &ScriptValue) -> Result<Self> {
        Self::from_script(value)
    }
}

fn from_script_impl(value: &ScriptValue, depth: usize) -> Result<EngineValue> {
    if depth > MAX_DEPTH {
        return Err(ValueError::DepthLimitExceeded);
    }

    let converted = match value {
        ScriptValue::Undefined => EngineValue::None,
        ScriptValue::Null => EngineValue::Nil,
        ScriptValue::Bool(b) => EngineValue::Bool(*b),
        ScriptValue::Number(n) => EngineValue::Double(*n),
        ScriptValue::BigInt(n) => EngineValue::Int(*n),
        ScriptValue::String(s) => EngineValue::String(s.clone()),
        ScriptValue::Bytes(b) => EngineValue::ByteArray(b.clone()),
        ScriptValue::Array(items) => {
            let mut list = Vec::with_capacity(items.len());
            for item in items {
                list.push(from_script_impl(item, depth + 1)?);
            }
            EngineValue::List(list)
        },
        ScriptValue::Object(entries) => {
            let mut dict = Vec::with_capacity(entries.len());
            for (key, item) in entries {
                dict.push((key.clone(), from_script_impl(item, depth + 1)?));
            }
            EngineValue::Dict(dict)
        },
        ScriptValue::Vector2(v) => EngineValue::Vector2(*v),
        ScriptValue::Vector3(v) => EngineValue::Vector3(*v),
        ScriptValue::Rgba(v) => EngineValue::Rgba(*v),
        ScriptValue::Entity(e) => EngineValue::BaseObject(*e),
        ScriptValue::Function(_) => return Err(ValueError::UnsupportedType(value.type_name())),
    };
    Ok(converted)
}

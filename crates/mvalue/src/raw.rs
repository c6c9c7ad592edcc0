//! # Raw Codec
//!
//! Writes a single [`ScriptValue`] straight to a rawpack buffer.
//!
//! This path skips the engine value model entirely. It is opaque to the native
//! core and only round-trips through [`from_raw_bytes`]. Native handles have no
//! byte form here: entities and closures make encoding fail.

use rawpack::Decoder;
use rawpack::Encoder;
use rawpack::Tag;

use crate::MAX_DEPTH;
use crate::script::ScriptValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The underlying rawpack buffer was malformed or misused.
    Pack(rawpack::Error),
    /// The value holds something with no byte form.
    UnsupportedType(&'static str),
    /// The nested depth of the value exceeded `MAX_DEPTH`.
    DepthLimitExceeded,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pack(e) => write!(f, "rawpack error: {}", e),
            Self::UnsupportedType(ty) => write!(f, "{} cannot be written as raw bytes", ty),
            Self::DepthLimitExceeded => write!(f, "value nested deeper than {} levels", MAX_DEPTH),
        }
    }
}

impl std::error::Error for Error {}

impl From<rawpack::Error> for Error {
    fn from(e: rawpack::Error) -> Self {
        Self::Pack(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Encodes a script value, or returns `None` if it has no byte form.
///
/// An absent result is a hard failure for the value, not a null.
pub fn to_raw_bytes(value: &ScriptValue) -> Option<Vec<u8>> {
    encode(value).ok()
}

/// Encodes a script value, reporting why it could not be written.
pub fn encode(value: &ScriptValue) -> Result<Vec<u8>> {
    let mut enc = Encoder::new();
    encode_impl(&mut enc, value, 0)?;
    Ok(enc.into_bytes()?)
}

fn encode_impl(enc: &mut Encoder, value: &ScriptValue, depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::DepthLimitExceeded);
    }

    match value {
        ScriptValue::Undefined => enc.undefined()?,
        ScriptValue::Null => enc.null()?,
        ScriptValue::Bool(b) => enc.bool(*b)?,
        ScriptValue::Number(n) => enc.f64(*n)?,
        ScriptValue::BigInt(n) => enc.i64(*n)?,
        ScriptValue::String(s) => enc.str(s)?,
        ScriptValue::Bytes(b) => enc.bytes(b)?,
        ScriptValue::Array(items) => {
            enc.array_begin()?;
            for item in items {
                encode_impl(enc, item, depth + 1)?;
            }
            enc.array_end()?;
        },
        ScriptValue::Object(entries) => {
            enc.object_begin()?;
            for (key, item) in entries {
                enc.str(key)?;
                encode_impl(enc, item, depth + 1)?;
            }
            enc.object_end()?;
        },
        ScriptValue::Vector2(v) => enc.vector2(*v)?,
        ScriptValue::Vector3(v) => enc.vector3(*v)?,
        ScriptValue::Rgba(v) => enc.rgba(*v)?,
        ScriptValue::Entity(_) | ScriptValue::Function(_) => {
            return Err(Error::UnsupportedType(value.type_name()));
        }
    }
    Ok(())
}

/// Decodes a buffer produced by [`to_raw_bytes`].
pub fn from_raw_bytes(bytes: &[u8]) -> Result<ScriptValue> {
    let mut dec = Decoder::open(bytes)?;
    let value = decode_impl(&mut dec, 0)?;
    dec.finish()?;
    Ok(value)
}

fn decode_impl(dec: &mut Decoder, depth: usize) -> Result<ScriptValue> {
    if depth > MAX_DEPTH {
        return Err(Error::DepthLimitExceeded);
    }

    let value = match dec.peek_tag()? {
        Tag::Undefined => { dec.undefined()?; ScriptValue::Undefined },
        Tag::Null => { dec.null()?; ScriptValue::Null },
        Tag::True | Tag::False => ScriptValue::Bool(dec.bool()?),
        Tag::F64 => ScriptValue::Number(dec.f64()?),
        Tag::I64 => ScriptValue::BigInt(dec.i64()?),
        Tag::String => ScriptValue::String(dec.str()?.to_string()),
        Tag::Bytes => ScriptValue::Bytes(dec.bytes()?.to_vec()),
        Tag::Array => {
            let mut iter = dec.array()?;
            let mut items = Vec::new();
            while let Some(mut item) = iter.next()? {
                items.push(decode_impl(&mut item, depth + 1)?);
            }
            ScriptValue::Array(items)
        },
        Tag::Object => {
            let mut iter = dec.object()?;
            let mut entries = Vec::new();
            while let Some((key, mut item)) = iter.next()? {
                entries.push((key.to_string(), decode_impl(&mut item, depth + 1)?));
            }
            ScriptValue::Object(entries)
        },
        Tag::Vector2 => ScriptValue::Vector2(dec.vector2()?),
        Tag::Vector3 => ScriptValue::Vector3(dec.vector3()?),
        Tag::Rgba => ScriptValue::Rgba(dec.rgba()?),
    };
    Ok(value)
}

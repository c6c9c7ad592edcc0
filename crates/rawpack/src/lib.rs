//! # Rawpack
//!
//! The byte format behind raw-emit arguments: one script value per buffer,
//! written without going through the engine value model.
//!
//! ## Philosophy
//!
//! - **One Value Per Buffer**: A buffer carries a header and exactly one root item.
//!   Raw buffers are positional on the remote side, so there is no framing of many values.
//! - **TLV Architecture**: `[Tag][Length?][Value]` structure enables safe skipping.
//! - **Bounded**: Encoders track scopes explicitly. Decoders are zero-copy, bounds-checked views.
//!
//! ## Format
//!
//! - **Header**: `[Magic: 1b][Version: 1b]`
//! - **Scalars**: `[Tag: 1b][Data: N]`
//! - **Blobs**: `[Tag: 1b][Len: 4b][Data: Len]`
//! - **Containers**: `[Tag: 1b][Len: 4b][Body: Len]`
//!
//! All integers and floats are Little-Endian.

#[cfg(test)]
mod tests;

/// First byte of every rawpack buffer.
pub const MAGIC: u8 = 0xA1;

/// Format revision written after the magic byte.
pub const VERSION: u8 = 0x01;

/// Rawpack serialization and deserialization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Byte does not correspond to a valid rawpack `Tag`.
    InvalidTag(u8),
    /// Buffer does not start with the rawpack magic byte.
    BadMagic(u8),
    /// Buffer was written by an unknown format revision.
    UnsupportedVersion(u8),
    /// String data is not valid UTF-8.
    InvalidUtf8,
    /// Closing a scope that does not match the active scope stack.
    ScopeMismatch { expected: Scope, actual: Scope },
    /// Attempted to close a scope when only the Root remains.
    ScopeUnderflow,
    /// Attempted to finalize the buffer with open scopes.
    ScopeStillOpen,
    /// Attempted to finalize a buffer holding no value.
    EmptyBuffer,
    /// Buffer exhausted while reading.
    UnexpectedEnd,
    /// Bytes left over after the root value.
    TrailingBytes(usize),
    /// Blob or container length exceeds `u32::MAX`.
    BlobTooLarge(usize),
    /// Structural Violation: Attempted to write a second root value.
    TooManyItems,
    /// Structural Violation: Object keys must be strings.
    InvalidObjectKey,
    /// Structural Violation: Object closed after a key without its value.
    DanglingKey,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidTag(b) => write!(f, "Invalid Tag byte: {:#04x}", b),
            Error::BadMagic(b) => write!(f, "Not a rawpack buffer (first byte {:#04x})", b),
            Error::UnsupportedVersion(v) => write!(f, "Unsupported rawpack version {}", v),
            Error::ScopeMismatch { expected, actual } => {
                write!(f, "Scope Mismatch: expected {:?}, found {:?}", expected, actual)
            }
            Error::TrailingBytes(n) => write!(f, "{} trailing bytes after root value", n),
            _ => write!(f, "{:?}", self),
        }
    }
}

impl std::error::Error for Error {}

/// Specialized `Result` for rawpack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Identifies the type of the encoded value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    // Unit-like
    Undefined = 0x01,
    Null = 0x02,
    True = 0x03,
    False = 0x04,

    // Fixed-width scalars
    F64 = 0x05,
    I64 = 0x06,

    // Blobs (Tag + u32 Len + Bytes)
    String = 0x10,
    Bytes = 0x11,

    // Containers (Tag + u32 Len + Body)
    Array = 0x20,
    Object = 0x21,

    // Engine math types (fixed width)
    Vector2 = 0x30,
    Vector3 = 0x31,
    Rgba = 0x32,
}

impl Tag {
    /// Returns the Tag variant for a given byte, or `None` if invalid.
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Tag::Undefined),
            0x02 => Some(Tag::Null),
            0x03 => Some(Tag::True),
            0x04 => Some(Tag::False),
            0x05 => Some(Tag::F64),
            0x06 => Some(Tag::I64),
            0x10 => Some(Tag::String),
            0x11 => Some(Tag::Bytes),
            0x20 => Some(Tag::Array),
            0x21 => Some(Tag::Object),
            0x30 => Some(Tag::Vector2),
            0x31 => Some(Tag::Vector3),
            0x32 => Some(Tag::Rgba),
            _ => None,
        }
    }

    /// Width of the payload for fixed-size tags, `None` for length-prefixed tags.
    fn fixed_width(self) -> Option<usize> {
        match self {
            Tag::Undefined | Tag::Null | Tag::True | Tag::False => Some(0),
            Tag::F64 | Tag::I64 => Some(8),
            Tag::Vector2 => Some(8),
            Tag::Vector3 => Some(12),
            Tag::Rgba => Some(4),
            Tag::String | Tag::Bytes | Tag::Array | Tag::Object => None,
        }
    }
}

/// Internal state tracking for the `Encoder` stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The virtual root; allows exactly one item.
    Root,
    /// Ordered sequence; allows any number of items.
    Array,
    /// Alternating string keys and values.
    Object,
}

/// An active container scope on the `Encoder` stack.
struct Frame {
    start: usize,
    scope: Scope,
    count: usize,
}

/// A bounded, state-machine driven encoder for a single raw value.
///
/// # Structural Invariants
///
/// 1.  **Root Scope**: Exactly one item may be written at the root.
/// 2.  **Object Scopes**: Items alternate key, value. Keys must be strings,
///     and the scope cannot close on a key.
/// 3.  The encoder must end in the Root scope to finalize bytes.
pub struct Encoder {
    buf: Vec<u8>,
    /// Bottom is always `Scope::Root`.
    stack: Vec<Frame>,
}

impl Encoder {
    /// Creates a new encoder and writes the buffer header.
    pub fn new() -> Self {
        let mut buf = Vec::with_capacity(64);
        buf.push(MAGIC);
        buf.push(VERSION);
        Self {
            buf,
            stack: vec![Frame { start: 2, scope: Scope::Root, count: 0 }],
        }
    }

    /// Consumes the encoder and returns the final byte vector.
    ///
    /// # Errors
    /// Returns `Error::ScopeStillOpen` if a container is open, or
    /// `Error::EmptyBuffer` if no root value was written.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        if self.stack.len() > 1 {
            return Err(Error::ScopeStillOpen);
        }
        if self.stack[0].count == 0 {
            return Err(Error::EmptyBuffer);
        }
        Ok(self.buf)
    }

    fn current_frame(&mut self) -> &mut Frame {
        let top = self.stack.len() - 1;
        &mut self.stack[top]
    }

    fn check_write(&mut self, tag: Tag) -> Result<()> {
        let frame = self.current_frame();
        match frame.scope {
            Scope::Root if frame.count >= 1 => Err(Error::TooManyItems),
            Scope::Object if frame.count % 2 == 0 && tag != Tag::String => Err(Error::InvalidObjectKey),
            _ => Ok(()),
        }
    }

    fn on_item_written(&mut self) {
        self.current_frame().count += 1;
    }

    fn write_tag(&mut self, tag: Tag) -> Result<()> {
        self.check_write(tag)?;
        self.buf.push(tag as u8);
        Ok(())
    }

    fn write_blob(&mut self, tag: Tag, v: &[u8]) -> Result<()> {
        let len = v.len();
        if len > u32::MAX as usize { return Err(Error::BlobTooLarge(len)); }
        self.write_tag(tag)?;
        self.buf.extend_from_slice(&(len as u32).to_le_bytes());
        self.buf.extend_from_slice(v);
        self.on_item_written();
        Ok(())
    }

    fn begin_scope(&mut self, tag: Tag, scope: Scope) -> Result<()> {
        self.check_write(tag)?;

        self.buf.push(tag as u8);
        self.buf.extend_from_slice(&[0, 0, 0, 0]); // Length placeholder

        self.stack.push(Frame {
            start: self.buf.len(),
            scope,
            count: 0,
        });
        Ok(())
    }

    fn end_scope(&mut self, expected: Scope) -> Result<()> {
        if self.stack.len() <= 1 {
            return Err(Error::ScopeUnderflow);
        }

        let frame = self.current_frame();
        if frame.scope != expected {
            return Err(Error::ScopeMismatch { expected, actual: frame.scope });
        }
        if frame.scope == Scope::Object && frame.count % 2 == 1 {
            return Err(Error::DanglingKey);
        }

        let Some(frame) = self.stack.pop() else {
            return Err(Error::ScopeUnderflow);
        };
        let body_len = self.buf.len() - frame.start;
        if body_len > u32::MAX as usize {
            return Err(Error::BlobTooLarge(body_len));
        }

        let len_pos = frame.start - 4;
        self.buf[len_pos..frame.start].copy_from_slice(&(body_len as u32).to_le_bytes());

        self.on_item_written();
        Ok(())
    }

    fn write_fixed(&mut self, tag: Tag, bytes: &[u8]) -> Result<()> {
        self.write_tag(tag)?;
        self.buf.extend_from_slice(bytes);
        self.on_item_written();
        Ok(())
    }

    /// Encodes `undefined`.
    pub fn undefined(&mut self) -> Result<()> { self.write_fixed(Tag::Undefined, &[]) }
    /// Encodes `null`.
    pub fn null(&mut self) -> Result<()> { self.write_fixed(Tag::Null, &[]) }

    /// Encodes a boolean value.
    pub fn bool(&mut self, v: bool) -> Result<()> {
        self.write_fixed(if v { Tag::True } else { Tag::False }, &[])
    }

    /// Encodes a double (LE).
    pub fn f64(&mut self, v: f64) -> Result<()> { self.write_fixed(Tag::F64, &v.to_le_bytes()) }
    /// Encodes a signed 64-bit integer (LE).
    pub fn i64(&mut self, v: i64) -> Result<()> { self.write_fixed(Tag::I64, &v.to_le_bytes()) }

    /// Encodes a UTF-8 string blob.
    pub fn str(&mut self, v: &str) -> Result<()> { self.write_blob(Tag::String, v.as_bytes()) }
    /// Encodes an opaque byte blob.
    pub fn bytes(&mut self, v: &[u8]) -> Result<()> { self.write_blob(Tag::Bytes, v) }

    /// Encodes a 2-component float vector.
    pub fn vector2(&mut self, v: [f32; 2]) -> Result<()> {
        let mut raw = [0u8; 8];
        raw[..4].copy_from_slice(&v[0].to_le_bytes());
        raw[4..].copy_from_slice(&v[1].to_le_bytes());
        self.write_fixed(Tag::Vector2, &raw)
    }

    /// Encodes a 3-component float vector.
    pub fn vector3(&mut self, v: [f32; 3]) -> Result<()> {
        let mut raw = [0u8; 12];
        for (i, c) in v.iter().enumerate() {
            raw[i * 4..i * 4 + 4].copy_from_slice(&c.to_le_bytes());
        }
        self.write_fixed(Tag::Vector3, &raw)
    }

    /// Encodes an RGBA color.
    pub fn rgba(&mut self, v: [u8; 4]) -> Result<()> { self.write_fixed(Tag::Rgba, &v) }

    /// Begins an Array container.
    ///
    /// # Invariants
    /// - Must be closed via `array_end()`.
    pub fn array_begin(&mut self) -> Result<()> { self.begin_scope(Tag::Array, Scope::Array) }
    /// Ends an Array container.
    pub fn array_end(&mut self) -> Result<()> { self.end_scope(Scope::Array) }

    /// Begins an Object container.
    ///
    /// # Invariants
    /// - Must be closed via `object_end()`.
    /// - **Strict:** Children alternate `str()` key and value.
    pub fn object_begin(&mut self) -> Result<()> { self.begin_scope(Tag::Object, Scope::Object) }
    /// Ends an Object container.
    pub fn object_end(&mut self) -> Result<()> { self.end_scope(Scope::Object) }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// A zero-copy, bounds-checked cursor over a byte slice.
///
/// Reading advances the internal cursor. Container reads return new
/// `Decoder` instances restricted to the container's body.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    /// Creates a decoder over a headerless slice.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Validates the buffer header and returns a decoder over the root value.
    pub fn open(buf: &'a [u8]) -> Result<Self> {
        let mut dec = Self::new(buf);
        let magic = dec.read_u8()?;
        if magic != MAGIC {
            return Err(Error::BadMagic(magic));
        }
        let version = dec.read_u8()?;
        if version != VERSION {
            return Err(Error::UnsupportedVersion(version));
        }
        Ok(dec)
    }

    /// Returns the remaining bytes in the view.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Fails unless the view has been fully consumed.
    pub fn finish(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(Error::TrailingBytes(n)),
        }
    }

    /// Peeks the next Tag without advancing.
    pub fn peek_tag(&self) -> Result<Tag> {
        let Some(&b) = self.buf.first() else { return Err(Error::UnexpectedEnd) };
        Tag::from_u8(b).ok_or(Error::InvalidTag(b))
    }

    fn read_u8(&mut self) -> Result<u8> {
        let Some((&b, rest)) = self.buf.split_first() else { return Err(Error::UnexpectedEnd) };
        self.buf = rest;
        Ok(b)
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.buf.len() { return Err(Error::UnexpectedEnd); }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.read_bytes(N)?.try_into().map_err(|_| Error::UnexpectedEnd)
    }

    fn read_len(&mut self) -> Result<usize> {
        Ok(u32::from_le_bytes(self.read_array()?) as usize)
    }

    fn check_tag(&mut self, expected: Tag) -> Result<()> {
        let tag = self.peek_tag()?;
        if tag != expected {
            return Err(Error::InvalidTag(tag as u8));
        }
        self.read_u8()?;
        Ok(())
    }

    /// Skips the next item and its nested children.
    pub fn skip(&mut self) -> Result<()> {
        let tag = self.peek_tag()?;
        self.read_u8()?;
        let len = match tag.fixed_width() {
            Some(width) => width,
            None => self.read_len()?,
        };
        self.read_bytes(len)?;
        Ok(())
    }

    /// Decodes `undefined`.
    pub fn undefined(&mut self) -> Result<()> { self.check_tag(Tag::Undefined) }
    /// Decodes `null`.
    pub fn null(&mut self) -> Result<()> { self.check_tag(Tag::Null) }

    /// Decodes a bool.
    pub fn bool(&mut self) -> Result<bool> {
        match self.peek_tag()? {
            Tag::True => { self.read_u8()?; Ok(true) },
            Tag::False => { self.read_u8()?; Ok(false) },
            tag => Err(Error::InvalidTag(tag as u8)),
        }
    }

    /// Decodes f64 (LE).
    pub fn f64(&mut self) -> Result<f64> { self.check_tag(Tag::F64)?; Ok(f64::from_le_bytes(self.read_array()?)) }
    /// Decodes i64 (LE).
    pub fn i64(&mut self) -> Result<i64> { self.check_tag(Tag::I64)?; Ok(i64::from_le_bytes(self.read_array()?)) }

    /// Decodes a string slice (UTF-8).
    pub fn str(&mut self) -> Result<&'a str> {
        self.check_tag(Tag::String)?;
        let len = self.read_len()?;
        std::str::from_utf8(self.read_bytes(len)?).map_err(|_| Error::InvalidUtf8)
    }

    /// Decodes a byte slice.
    pub fn bytes(&mut self) -> Result<&'a [u8]> {
        self.check_tag(Tag::Bytes)?;
        let len = self.read_len()?;
        self.read_bytes(len)
    }

    fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Decodes a 2-component float vector.
    pub fn vector2(&mut self) -> Result<[f32; 2]> {
        self.check_tag(Tag::Vector2)?;
        Ok([self.read_f32()?, self.read_f32()?])
    }

    /// Decodes a 3-component float vector.
    pub fn vector3(&mut self) -> Result<[f32; 3]> {
        self.check_tag(Tag::Vector3)?;
        Ok([self.read_f32()?, self.read_f32()?, self.read_f32()?])
    }

    /// Decodes an RGBA color.
    pub fn rgba(&mut self) -> Result<[u8; 4]> {
        self.check_tag(Tag::Rgba)?;
        self.read_array()
    }

    fn enter_container(&mut self, expected: Tag) -> Result<Decoder<'a>> {
        self.check_tag(expected)?;
        let len = self.read_len()?;
        Ok(Decoder::new(self.read_bytes(len)?))
    }

    /// Decodes an Array into an iterator.
    pub fn array(&mut self) -> Result<ArrayIter<'a>> {
        Ok(ArrayIter { dec: self.enter_container(Tag::Array)? })
    }

    /// Decodes an Object into an iterator.
    pub fn object(&mut self) -> Result<ObjectIter<'a>> {
        Ok(ObjectIter { dec: self.enter_container(Tag::Object)? })
    }
}

/// Iterator for items within an Array.
#[derive(Debug)]
pub struct ArrayIter<'a> {
    dec: Decoder<'a>,
}

impl<'a> ArrayIter<'a> {
    /// Returns a Decoder for the next item, or `None` at the end.
    ///
    /// A truncated item is an error, not the end of the array.
    pub fn next(&mut self) -> Result<Option<Decoder<'a>>> {
        if self.dec.remaining() == 0 {
            return Ok(None);
        }
        let mut probe = self.dec.clone();
        probe.skip()?;
        let len = self.dec.remaining() - probe.remaining();
        Ok(Some(Decoder::new(self.dec.read_bytes(len)?)))
    }
}

/// Iterator for key/value pairs within an Object.
#[derive(Debug)]
pub struct ObjectIter<'a> {
    dec: Decoder<'a>,
}

impl<'a> ObjectIter<'a> {
    /// Returns `(Key, ValueDecoder)` for the next entry, or `None`.
    pub fn next(&mut self) -> Result<Option<(&'a str, Decoder<'a>)>> {
        if self.dec.remaining() == 0 {
            return Ok(None);
        }
        let key = self.dec.str()?;
        let mut probe = self.dec.clone();
        probe.skip()?;
        let len = self.dec.remaining() - probe.remaining();
        Ok(Some((key, Decoder::new(self.dec.read_bytes(len)?))))
    }
}

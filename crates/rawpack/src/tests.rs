use crate::*;

fn single(write: impl FnOnce(&mut Encoder) -> Result<()>) -> Result<Vec<u8>> {
    let mut enc = Encoder::new();
    write(&mut enc)?;
    enc.into_bytes()
}

// ============================================================================
//  HEADER
// ============================================================================

#[test]
fn test_header_is_written() -> Result<()> {
    let bytes = single(|e| e.null())?;
    assert_eq!(&bytes[..2], &[MAGIC, VERSION]);
    assert_eq!(bytes[2], Tag::Null as u8);
    Ok(())
}

#[test]
fn test_open_rejects_foreign_buffers() {
    assert_eq!(Decoder::open(&[]).unwrap_err(), Error::UnexpectedEnd);
    assert_eq!(Decoder::open(&[0x00, VERSION]).unwrap_err(), Error::BadMagic(0x00));
    assert_eq!(Decoder::open(&[MAGIC, 0x7F]).unwrap_err(), Error::UnsupportedVersion(0x7F));
}

// ============================================================================
//  SCALARS
// ============================================================================

#[test]
fn test_scalars_decode() -> Result<()> {
    let bytes = single(|e| e.f64(-2.5))?;
    assert_eq!(Decoder::open(&bytes)?.f64()?, -2.5);

    let bytes = single(|e| e.i64(i64::MIN))?;
    assert_eq!(Decoder::open(&bytes)?.i64()?, i64::MIN);

    let bytes = single(|e| e.bool(false))?;
    assert!(!Decoder::open(&bytes)?.bool()?);

    let bytes = single(|e| e.undefined())?;
    Decoder::open(&bytes)?.undefined()?;
    Ok(())
}

#[test]
fn test_math_types() -> Result<()> {
    let bytes = single(|e| e.vector3([1.0, -2.0, 3.5]))?;
    assert_eq!(Decoder::open(&bytes)?.vector3()?, [1.0, -2.0, 3.5]);

    let bytes = single(|e| e.vector2([0.25, 8.0]))?;
    assert_eq!(Decoder::open(&bytes)?.vector2()?, [0.25, 8.0]);

    let bytes = single(|e| e.rgba([255, 0, 128, 7]))?;
    assert_eq!(Decoder::open(&bytes)?.rgba()?, [255, 0, 128, 7]);
    Ok(())
}

#[test]
fn test_blobs_are_not_text() -> Result<()> {
    let bytes = single(|e| e.bytes(&[0xFF, 0xFE, 0x00]))?;
    let mut dec = Decoder::open(&bytes)?;
    assert!(dec.clone().str().is_err());
    assert_eq!(dec.bytes()?, &[0xFF, 0xFE, 0x00]);
    dec.finish()
}

// ============================================================================
//  CONTAINERS
// ============================================================================

#[test]
fn test_array_nested() -> Result<()> {
    let bytes = single(|e| {
        e.array_begin()?;
            e.array_begin()?;
                e.i64(10)?;
            e.array_end()?;
            e.str("x")?;
        e.array_end()
    })?;

    let mut dec = Decoder::open(&bytes)?;
    let mut outer = dec.array()?;
    let mut inner = outer.next()?.expect("inner").array()?;
    assert_eq!(inner.next()?.expect("ten").i64()?, 10);
    assert!(inner.next()?.is_none());
    assert_eq!(outer.next()?.expect("x").str()?, "x");
    assert!(outer.next()?.is_none());
    dec.finish()
}

#[test]
fn test_object_entries() -> Result<()> {
    let bytes = single(|e| {
        e.object_begin()?;
            e.str("a")?;
            e.f64(1.0)?;
            e.str("b")?;
            e.object_begin()?;
            e.object_end()?;
        e.object_end()
    })?;

    let mut dec = Decoder::open(&bytes)?;
    let mut obj = dec.object()?;
    let (k1, mut v1) = obj.next()?.expect("a");
    assert_eq!(k1, "a");
    assert_eq!(v1.f64()?, 1.0);
    let (k2, mut v2) = obj.next()?.expect("b");
    assert_eq!(k2, "b");
    assert!(v2.object()?.next()?.is_none());
    assert!(obj.next()?.is_none());
    Ok(())
}

// ============================================================================
//  STRUCTURAL VIOLATIONS
// ============================================================================

#[test]
fn test_root_holds_one_value() {
    let mut enc = Encoder::new();
    enc.null().unwrap();
    assert_eq!(enc.i64(1).unwrap_err(), Error::TooManyItems);
}

#[test]
fn test_empty_buffer_rejected() {
    assert_eq!(Encoder::new().into_bytes().unwrap_err(), Error::EmptyBuffer);
}

#[test]
fn test_open_scope_rejected() {
    let mut enc = Encoder::new();
    enc.array_begin().unwrap();
    assert_eq!(enc.into_bytes().unwrap_err(), Error::ScopeStillOpen);
}

#[test]
fn test_object_key_must_be_string() {
    let mut enc = Encoder::new();
    enc.object_begin().unwrap();
    assert_eq!(enc.i64(3).unwrap_err(), Error::InvalidObjectKey);
}

#[test]
fn test_object_dangling_key() {
    let mut enc = Encoder::new();
    enc.object_begin().unwrap();
    enc.str("k").unwrap();
    assert_eq!(enc.object_end().unwrap_err(), Error::DanglingKey);
}

#[test]
fn test_scope_mismatch() {
    let mut enc = Encoder::new();
    enc.array_begin().unwrap();
    assert_eq!(
        enc.object_end().unwrap_err(),
        Error::ScopeMismatch { expected: Scope::Object, actual: Scope::Array }
    );
    assert_eq!(Encoder::new().array_end().unwrap_err(), Error::ScopeUnderflow);
}

// ============================================================================
//  MALFORMED INPUT
// ============================================================================

#[test]
fn test_truncated_container_is_error() -> Result<()> {
    let bytes = single(|e| {
        e.array_begin()?;
        e.str("hello")?;
        e.array_end()
    })?;

    let cut = &bytes[..bytes.len() - 2];
    let mut dec = Decoder::open(cut)?;
    assert_eq!(dec.array().unwrap_err(), Error::UnexpectedEnd);
    Ok(())
}

#[test]
fn test_trailing_bytes_detected() -> Result<()> {
    let mut bytes = single(|e| e.null())?;
    bytes.push(Tag::Null as u8);
    let mut dec = Decoder::open(&bytes)?;
    dec.null()?;
    assert_eq!(dec.finish().unwrap_err(), Error::TrailingBytes(1));
    Ok(())
}

#[test]
fn test_invalid_tag() {
    let mut dec = Decoder::new(&[0xEE]);
    assert_eq!(dec.skip().unwrap_err(), Error::InvalidTag(0xEE));
}

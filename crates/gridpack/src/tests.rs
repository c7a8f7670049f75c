use crate::*;

// ============================================================================
//  SCALARS
// ============================================================================

#[test]
fn test_integers_and_unit() -> Result<()> {
    let mut enc = Encoder::new();
    enc.u32(0)?;
    enc.u32(u32::MAX)?;
    enc.s32(i32::MIN)?;
    enc.unit()?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);

    assert_eq!(dec.u32()?, 0);
    assert_eq!(dec.u32()?, u32::MAX);
    assert_eq!(dec.s32()?, i32::MIN);
    dec.unit()?;
    dec.finish()
}

#[test]
fn test_strings() -> Result<()> {
    let mut enc = Encoder::new();
    enc.str("53..7....")?;
    enc.str("")?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);

    assert_eq!(dec.str()?, "53..7....");
    assert_eq!(dec.str()?, "");
    assert_eq!(dec.remaining(), 0);
    Ok(())
}

#[test]
fn test_wrong_scalar_tag() -> Result<()> {
    let mut enc = Encoder::new();
    enc.s32(-1)?;
    let bytes = enc.into_bytes()?;

    let err = Decoder::new(&bytes).u32().unwrap_err();
    assert_eq!(err, Error::UnexpectedTag { expected: Tag::U32, found: Tag::S32 });
    Ok(())
}

// ============================================================================
//  CONTAINERS
// ============================================================================

#[test]
fn test_map_entries_in_order() -> Result<()> {
    let mut enc = Encoder::new();
    enc.map_begin()?;
    enc.entry_u32("id", 7)?;
    enc.entry_str("grid", "1.2")?;
    enc.map_end()?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);
    let mut map = dec.map()?;

    let (key, mut val) = map.next()?.unwrap();
    assert_eq!(key, "id");
    assert_eq!(val.u32()?, 7);

    let (key, mut val) = map.next()?.unwrap();
    assert_eq!(key, "grid");
    assert_eq!(val.str()?, "1.2");

    assert!(map.next()?.is_none());
    dec.finish()
}

#[test]
fn test_outcome_arms() -> Result<()> {
    let mut enc = Encoder::new();
    enc.ok_begin()?;
    enc.variant_begin("SolverDestroyed")?;
    enc.unit()?;
    enc.variant_end()?;
    enc.ok_end()?;
    enc.err_begin()?;
    enc.s32(4)?;
    enc.err_end()?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);

    let Ok(mut ok) = dec.outcome()? else { panic!("expected Ok arm") };
    let (name, mut payload) = ok.variant()?;
    assert_eq!(name, "SolverDestroyed");
    payload.unit()?;

    let Err(mut err) = dec.outcome()? else { panic!("expected Err arm") };
    assert_eq!(err.s32()?, 4);
    dec.finish()
}

#[test]
fn test_skip_nested() -> Result<()> {
    let mut enc = Encoder::new();
    enc.map_begin()?;
    enc.variant_begin("ignored")?;
    enc.map_begin()?;
    enc.entry_str("deep", "value")?;
    enc.map_end()?;
    enc.variant_end()?;
    enc.map_end()?;
    enc.u32(99)?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);
    dec.skip()?;
    assert_eq!(dec.u32()?, 99);
    dec.finish()
}

// ============================================================================
//  STRUCTURAL STRICTNESS
// ============================================================================

#[test]
fn test_map_rejects_bare_scalar() {
    let mut enc = Encoder::new();
    enc.map_begin().unwrap();
    assert_eq!(enc.u32(1).unwrap_err(), Error::InvalidMapEntry);
}

#[test]
fn test_variant_requires_one_payload() {
    let mut enc = Encoder::new();
    enc.variant_begin("empty").unwrap();
    assert_eq!(enc.variant_end().unwrap_err(), Error::EmptyScope(Scope::Variant));

    let mut enc = Encoder::new();
    enc.variant_begin("crowded").unwrap();
    enc.unit().unwrap();
    assert_eq!(enc.unit().unwrap_err(), Error::TooManyItems(Scope::Variant));
}

#[test]
fn test_outcome_requires_one_item() {
    let mut enc = Encoder::new();
    enc.err_begin().unwrap();
    assert_eq!(enc.err_end().unwrap_err(), Error::EmptyScope(Scope::Outcome));
}

#[test]
fn test_scope_mismatch_and_underflow() {
    let mut enc = Encoder::new();
    enc.map_begin().unwrap();
    assert_eq!(
        enc.variant_end().unwrap_err(),
        Error::ScopeMismatch { expected: Scope::Variant, actual: Scope::Map }
    );

    let mut enc = Encoder::new();
    assert_eq!(enc.map_end().unwrap_err(), Error::ScopeUnderflow);
}

#[test]
fn test_unclosed_scope() {
    let mut enc = Encoder::new();
    enc.map_begin().unwrap();
    assert_eq!(enc.into_bytes().unwrap_err(), Error::ScopeStillOpen);
}

// ============================================================================
//  HOSTILE INPUT
// ============================================================================

#[test]
fn test_truncated_container() -> Result<()> {
    let mut enc = Encoder::new();
    enc.map_begin()?;
    enc.entry_str("grid", "123456789")?;
    enc.map_end()?;
    let bytes = enc.into_bytes()?;

    for cut in 0..bytes.len() {
        let mut dec = Decoder::new(&bytes[..cut]);
        assert!(dec.map().is_err(), "prefix of {} bytes decoded", cut);
    }
    Ok(())
}

#[test]
fn test_length_prefix_overruns_buffer() {
    // Str tag claiming 16 bytes with only 3 present
    let bytes = [0x10, 16, 0, 0, 0, b'a', b'b', b'c'];
    assert_eq!(Decoder::new(&bytes).str().unwrap_err(), Error::UnexpectedEnd);
}

#[test]
fn test_invalid_tag_byte() {
    let bytes = [0xEE];
    let mut dec = Decoder::new(&bytes);
    assert_eq!(dec.peek_tag().unwrap_err(), Error::InvalidTag(0xEE));
    assert_eq!(dec.skip().unwrap_err(), Error::InvalidTag(0xEE));
}

#[test]
fn test_invalid_utf8() {
    let bytes = [0x10, 2, 0, 0, 0, 0xC3, 0x28];
    assert_eq!(Decoder::new(&bytes).str().unwrap_err(), Error::InvalidUtf8);
}

#[test]
fn test_trailing_bytes() -> Result<()> {
    let mut enc = Encoder::new();
    enc.unit()?;
    enc.unit()?;
    let bytes = enc.into_bytes()?;

    let mut dec = Decoder::new(&bytes);
    dec.unit()?;
    assert_eq!(dec.finish().unwrap_err(), Error::TrailingBytes(1));
    Ok(())
}

//! # Gridpack
//!
//! A small, bounded TLV format for the envelopes exchanged with a solver engine.
//!
//! ## Philosophy
//!
//! - **Strict Writer**: The `Encoder` tracks open scopes explicitly and refuses
//!   structurally invalid output (a map entry that is not a variant, an empty
//!   variant, a second payload).
//! - **Checked Reader**: The `Decoder` is a zero-copy view. Every length prefix is
//!   checked against the bytes actually present before anything is read.
//!
//! ## Format
//!
//! - **Scalars**: `[Tag: 1b][Data: 0|4b]`
//! - **Strings**: `[Tag: 1b][Len: 4b][UTF-8: Len]`
//! - **Containers**: `[Tag: 1b][Len: 4b][Body: Len]`
//!
//! All integers are Little-Endian.

#[cfg(test)]
mod tests;

/// Encoding and decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Byte does not correspond to any `Tag`.
    #[error("invalid tag byte {0:#04x}")]
    InvalidTag(u8),
    /// A valid tag was found where a different one was required.
    #[error("expected {expected:?}, found {found:?}")]
    UnexpectedTag { expected: Tag, found: Tag },
    /// String data is not valid UTF-8.
    #[error("string is not valid utf-8")]
    InvalidUtf8,
    /// Buffer exhausted while reading, or a length prefix overruns the buffer.
    #[error("unexpected end of buffer")]
    UnexpectedEnd,
    /// Bytes remain after the value that should have filled the buffer.
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
    /// Blob or container body does not fit the u32 length prefix.
    #[error("{0} bytes do not fit a u32 length prefix")]
    TooLarge(usize),
    /// Closing a scope that is not the innermost open scope.
    #[error("closing {expected:?} while {actual:?} is open")]
    ScopeMismatch { expected: Scope, actual: Scope },
    /// Closing a scope when only the root remains.
    #[error("no open scope to close")]
    ScopeUnderflow,
    /// Finalizing while scopes are still open.
    #[error("scope still open")]
    ScopeStillOpen,
    /// A second item written into a single-item scope.
    #[error("{0:?} scope holds exactly one item")]
    TooManyItems(Scope),
    /// A single-item scope closed without its item.
    #[error("{0:?} scope closed without an item")]
    EmptyScope(Scope),
    /// Something other than a variant written directly into a map.
    #[error("map entries must be variants")]
    InvalidMapEntry,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Type marker preceding every encoded value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Unit = 0x01,
    U32 = 0x02,
    S32 = 0x03,

    // Blobs (Tag + u32 Len + Bytes)
    Str = 0x10,

    // Containers (Tag + u32 Len + Body)
    Map = 0x20,
    Variant = 0x21,
    Ok = 0x30,
    Err = 0x31,
}

impl Tag {
    pub fn from_u8(b: u8) -> Option<Self> {
        Some(match b {
            0x01 => Tag::Unit,
            0x02 => Tag::U32,
            0x03 => Tag::S32,
            0x10 => Tag::Str,
            0x20 => Tag::Map,
            0x21 => Tag::Variant,
            0x30 => Tag::Ok,
            0x31 => Tag::Err,
            _ => return None,
        })
    }
}

/// Open scopes tracked by the `Encoder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Accepts any number of items.
    Root,
    /// Accepts only variants (key/value entries).
    Map,
    /// Named payload; exactly one item after the name.
    Variant,
    /// `Ok` or `Err` arm; exactly one item.
    Outcome,
}

impl Scope {
    fn single(self) -> bool {
        matches!(self, Scope::Variant | Scope::Outcome)
    }
}

struct Open {
    scope: Scope,
    body_start: usize,
    items: usize,
}

/// Scope-checked writer with back-patched length prefixes.
///
/// The encoder must be back at the root scope before `into_bytes` succeeds.
pub struct Encoder {
    buf: Vec<u8>,
    stack: Vec<Open>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(256),
            stack: vec![Open { scope: Scope::Root, body_start: 0, items: 0 }],
        }
    }

    /// Consumes the encoder and returns the finished buffer.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        if self.stack.len() > 1 {
            return Err(Error::ScopeStillOpen);
        }
        Ok(self.buf)
    }

    fn top(&mut self) -> &mut Open {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn admit(&mut self, tag: Tag) -> Result<()> {
        let open = self.top();
        match open.scope {
            Scope::Root => Ok(()),
            Scope::Map if tag != Tag::Variant => Err(Error::InvalidMapEntry),
            Scope::Map => Ok(()),
            s if open.items >= 1 => Err(Error::TooManyItems(s)),
            _ => Ok(()),
        }
    }

    fn written(&mut self) {
        self.top().items += 1;
    }

    fn scalar(&mut self, tag: Tag, data: &[u8]) -> Result<()> {
        self.admit(tag)?;
        self.buf.push(tag as u8);
        self.buf.extend_from_slice(data);
        self.written();
        Ok(())
    }

    fn open(&mut self, tag: Tag, scope: Scope) -> Result<()> {
        self.admit(tag)?;
        self.buf.push(tag as u8);
        self.buf.extend_from_slice(&[0; 4]);
        self.stack.push(Open { scope, body_start: self.buf.len(), items: 0 });
        Ok(())
    }

    fn close(&mut self, expected: Scope) -> Result<()> {
        if self.stack.len() <= 1 {
            return Err(Error::ScopeUnderflow);
        }
        let open = self.top();
        if open.scope != expected {
            return Err(Error::ScopeMismatch { expected, actual: open.scope });
        }
        if open.scope.single() && open.items == 0 {
            return Err(Error::EmptyScope(open.scope));
        }

        let body_start = open.body_start;
        self.stack.pop();
        let body_len = self.buf.len() - body_start;
        let len = u32::try_from(body_len).map_err(|_| Error::TooLarge(body_len))?;
        self.buf[body_start - 4..body_start].copy_from_slice(&len.to_le_bytes());
        self.written();
        Ok(())
    }

    pub fn unit(&mut self) -> Result<()> {
        self.scalar(Tag::Unit, &[])
    }

    pub fn u32(&mut self, v: u32) -> Result<()> {
        self.scalar(Tag::U32, &v.to_le_bytes())
    }

    pub fn s32(&mut self, v: i32) -> Result<()> {
        self.scalar(Tag::S32, &v.to_le_bytes())
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn str(&mut self, v: &str) -> Result<()> {
        let len = u32::try_from(v.len()).map_err(|_| Error::TooLarge(v.len()))?;
        self.scalar(Tag::Str, &len.to_le_bytes())?;
        self.buf.extend_from_slice(v.as_bytes());
        Ok(())
    }

    /// Opens a map. Only `variant_begin` may be written directly inside it.
    pub fn map_begin(&mut self) -> Result<()> {
        self.open(Tag::Map, Scope::Map)
    }

    pub fn map_end(&mut self) -> Result<()> {
        self.close(Scope::Map)
    }

    /// Opens a named variant. Exactly one payload item must follow.
    pub fn variant_begin(&mut self, name: &str) -> Result<()> {
        self.open(Tag::Variant, Scope::Variant)?;
        self.str(name)?;
        // the name is metadata, not the payload
        self.top().items = 0;
        Ok(())
    }

    pub fn variant_end(&mut self) -> Result<()> {
        self.close(Scope::Variant)
    }

    /// Opens the `Ok` arm of an outcome. Exactly one item must follow.
    pub fn ok_begin(&mut self) -> Result<()> {
        self.open(Tag::Ok, Scope::Outcome)
    }

    pub fn ok_end(&mut self) -> Result<()> {
        self.close(Scope::Outcome)
    }

    /// Opens the `Err` arm of an outcome. Exactly one item must follow.
    pub fn err_begin(&mut self) -> Result<()> {
        self.open(Tag::Err, Scope::Outcome)
    }

    pub fn err_end(&mut self) -> Result<()> {
        self.close(Scope::Outcome)
    }

    /// Writes `key => u32` into the current map.
    pub fn entry_u32(&mut self, key: &str, v: u32) -> Result<()> {
        self.variant_begin(key)?;
        self.u32(v)?;
        self.variant_end()
    }

    /// Writes `key => s32` into the current map.
    pub fn entry_s32(&mut self, key: &str, v: i32) -> Result<()> {
        self.variant_begin(key)?;
        self.s32(v)?;
        self.variant_end()
    }

    /// Writes `key => str` into the current map.
    pub fn entry_str(&mut self, key: &str, v: &str) -> Result<()> {
        self.variant_begin(key)?;
        self.str(v)?;
        self.variant_end()
    }
}

/// Zero-copy, bounds-checked reader.
///
/// Container reads return a new `Decoder` restricted to the container body.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Fails with `TrailingBytes` unless the view has been fully consumed.
    pub fn finish(&self) -> Result<()> {
        match self.buf.len() {
            0 => Ok(()),
            n => Err(Error::TrailingBytes(n)),
        }
    }

    pub fn peek_tag(&self) -> Result<Tag> {
        let b = *self.buf.first().ok_or(Error::UnexpectedEnd)?;
        Tag::from_u8(b).ok_or(Error::InvalidTag(b))
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.buf.len() {
            return Err(Error::UnexpectedEnd);
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn take_4(&mut self) -> Result<[u8; 4]> {
        let mut out = [0; 4];
        out.copy_from_slice(self.take(4)?);
        Ok(out)
    }

    fn expect(&mut self, expected: Tag) -> Result<()> {
        let found = self.peek_tag()?;
        if found != expected {
            return Err(Error::UnexpectedTag { expected, found });
        }
        self.take(1)?;
        Ok(())
    }

    fn prefixed(&mut self) -> Result<&'a [u8]> {
        let len = u32::from_le_bytes(self.take_4()?) as usize;
        self.take(len)
    }

    fn body(&mut self, expected: Tag) -> Result<Decoder<'a>> {
        self.expect(expected)?;
        Ok(Decoder::new(self.prefixed()?))
    }

    /// Skips the next item, including any nested children.
    pub fn skip(&mut self) -> Result<()> {
        let tag = self.peek_tag()?;
        self.take(1)?;
        match tag {
            Tag::Unit => {}
            Tag::U32 | Tag::S32 => {
                self.take(4)?;
            }
            Tag::Str | Tag::Map | Tag::Variant | Tag::Ok | Tag::Err => {
                self.prefixed()?;
            }
        }
        Ok(())
    }

    pub fn unit(&mut self) -> Result<()> {
        self.expect(Tag::Unit)
    }

    pub fn u32(&mut self) -> Result<u32> {
        self.expect(Tag::U32)?;
        Ok(u32::from_le_bytes(self.take_4()?))
    }

    pub fn s32(&mut self) -> Result<i32> {
        self.expect(Tag::S32)?;
        Ok(i32::from_le_bytes(self.take_4()?))
    }

    pub fn str(&mut self) -> Result<&'a str> {
        self.expect(Tag::Str)?;
        std::str::from_utf8(self.prefixed()?).map_err(|_| Error::InvalidUtf8)
    }

    /// Enters a map and iterates its `(key, value)` entries.
    pub fn map(&mut self) -> Result<Entries<'a>> {
        Ok(Entries { dec: self.body(Tag::Map)? })
    }

    /// Returns `(name, payload)` of a variant.
    pub fn variant(&mut self) -> Result<(&'a str, Decoder<'a>)> {
        let mut inner = self.body(Tag::Variant)?;
        let name = inner.str()?;
        Ok((name, inner))
    }

    /// Returns the body of an `Ok` or `Err` arm.
    pub fn outcome(&mut self) -> Result<std::result::Result<Decoder<'a>, Decoder<'a>>> {
        match self.peek_tag()? {
            Tag::Ok => Ok(Ok(self.body(Tag::Ok)?)),
            Tag::Err => Ok(Err(self.body(Tag::Err)?)),
            found => Err(Error::UnexpectedTag { expected: Tag::Ok, found }),
        }
    }
}

/// Iterator over the entries of a map.
#[derive(Debug)]
pub struct Entries<'a> {
    dec: Decoder<'a>,
}

impl<'a> Entries<'a> {
    /// Returns the next `(key, value)` pair, or `None` at the end of the map.
    pub fn next(&mut self) -> Result<Option<(&'a str, Decoder<'a>)>> {
        if self.dec.remaining() == 0 {
            return Ok(None);
        }
        let (key, value) = self.dec.variant()?;
        Ok(Some((key, value)))
    }
}

//! # Fixed-Width ABI Tuple Codec
//!
//! Encoding used by the marketplace contracts for every structured value they
//! keep in global state or boxes. Only static types are supported:
//!
//! | ABI type | Rust type | Width |
//! |----------|-----------|-------|
//! | `byte` | `u8` | 1 |
//! | `uint64` | `u64` (big-endian) | 8 |
//! | `address` | [`Address`](crate::Address) | 32 |
//! | `T[N]` / `byte[N]` | `[T; N]` | `N * width(T)` |
//! | `(A, B, ...)` | struct implementing [`AbiCodec`] | sum of fields |
//!
//! No dynamic or optional fields exist, so every schema has a width known at
//! compile time and `decode(encode(x)) == x` holds for every value.

use crate::error::DecodeError;

// ════════════════════════════════════════════════════════════════════════════
// READER
// ════════════════════════════════════════════════════════════════════════════

/// Cursor over an encoded tuple.
#[derive(Debug)]
pub struct AbiReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> AbiReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Take the next `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::UnexpectedEnd {
                offset: self.offset,
                needed: n - self.remaining(),
            });
        }
        let out = &self.bytes[self.offset..self.offset + n];
        self.offset += n;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    /// Read a big-endian `uint64`.
    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        let raw = self.read_bytes::<8>()?;
        Ok(u64::from_be_bytes(raw))
    }

    pub fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let offset = self.offset;
        let slice = self.take(N)?;
        slice
            .try_into()
            .map_err(|_| DecodeError::UnexpectedEnd { offset, needed: N })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// WRITER
// ════════════════════════════════════════════════════════════════════════════

/// Append-only buffer for encoding a tuple.
#[derive(Debug, Default)]
pub struct AbiWriter {
    buf: Vec<u8>,
}

impl AbiWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn put_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CODEC TRAIT
// ════════════════════════════════════════════════════════════════════════════

/// A statically known, fixed-width ABI schema.
///
/// Implementors only describe field order through `write_to` / `read_from`;
/// the provided `encode` / `decode` enforce the exact-width contract.
pub trait AbiCodec: Sized {
    /// Schema name used in error messages.
    const NAME: &'static str;
    /// Encoded width in bytes.
    const WIDTH: usize;

    fn write_to(&self, w: &mut AbiWriter);

    fn read_from(r: &mut AbiReader<'_>) -> Result<Self, DecodeError>;

    /// Encode into exactly `WIDTH` bytes.
    fn encode(&self) -> Vec<u8> {
        let mut w = AbiWriter::with_capacity(Self::WIDTH);
        self.write_to(&mut w);
        w.into_bytes()
    }

    /// Decode a complete value.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::InvalidLength`] if `bytes.len() != WIDTH`
    /// - any field-level error raised by `read_from`
    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() != Self::WIDTH {
            return Err(DecodeError::InvalidLength {
                schema: Self::NAME,
                expected: Self::WIDTH,
                actual: bytes.len(),
            });
        }
        let mut r = AbiReader::new(bytes);
        let value = Self::read_from(&mut r)?;
        if r.remaining() != 0 {
            return Err(DecodeError::InvalidLength {
                schema: Self::NAME,
                expected: r.offset(),
                actual: bytes.len(),
            });
        }
        Ok(value)
    }
}

impl AbiCodec for u8 {
    const NAME: &'static str = "byte";
    const WIDTH: usize = 1;

    fn write_to(&self, w: &mut AbiWriter) {
        w.put_u8(*self);
    }

    fn read_from(r: &mut AbiReader<'_>) -> Result<Self, DecodeError> {
        r.read_u8()
    }
}

impl AbiCodec for u64 {
    const NAME: &'static str = "uint64";
    const WIDTH: usize = 8;

    fn write_to(&self, w: &mut AbiWriter) {
        w.put_u64(*self);
    }

    fn read_from(r: &mut AbiReader<'_>) -> Result<Self, DecodeError> {
        r.read_u64()
    }
}

impl<T: AbiCodec, const N: usize> AbiCodec for [T; N] {
    const NAME: &'static str = "static array";
    const WIDTH: usize = T::WIDTH * N;

    fn write_to(&self, w: &mut AbiWriter) {
        for item in self {
            item.write_to(w);
        }
    }

    fn read_from(r: &mut AbiReader<'_>) -> Result<Self, DecodeError> {
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(T::read_from(r)?);
        }
        let offset = r.offset();
        items
            .try_into()
            .map_err(|_| DecodeError::UnexpectedEnd { offset, needed: 0 })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u64_is_big_endian() {
        assert_eq!(0x0102u64.encode(), vec![0, 0, 0, 0, 0, 0, 1, 2]);
        assert_eq!(u64::decode(&[0, 0, 0, 0, 0, 0, 1, 2]), Ok(0x0102));
    }

    #[test]
    fn test_u64_wrong_length() {
        let err = u64::decode(&[1, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidLength {
                schema: "uint64",
                expected: 8,
                actual: 3
            }
        );
    }

    #[test]
    fn test_static_array_width_and_order() {
        let arr: [u64; 3] = [1, 2, 3];
        let bytes = arr.encode();
        assert_eq!(bytes.len(), <[u64; 3]>::WIDTH);
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[16..24], &3u64.to_be_bytes());
        assert_eq!(<[u64; 3]>::decode(&bytes), Ok(arr));
    }

    #[test]
    fn test_byte_array_passthrough() {
        let raw = [0xAAu8; 32];
        assert_eq!(raw.encode(), raw.to_vec());
        assert_eq!(<[u8; 32]>::decode(&raw), Ok(raw));
    }

    #[test]
    fn test_nested_array() {
        let nested: [[u64; 2]; 2] = [[1, 2], [3, 4]];
        let bytes = nested.encode();
        assert_eq!(bytes.len(), 32);
        assert_eq!(<[[u64; 2]; 2]>::decode(&bytes), Ok(nested));
    }

    #[test]
    fn test_reader_unexpected_end() {
        let mut r = AbiReader::new(&[1, 2]);
        assert_eq!(r.read_u8(), Ok(1));
        let err = r.read_u64().unwrap_err();
        assert_eq!(err, DecodeError::UnexpectedEnd { offset: 1, needed: 7 });
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(
            <[u64; 2]>::decode(&[]),
            Err(DecodeError::InvalidLength { expected: 16, actual: 0, .. })
        ));
    }
}

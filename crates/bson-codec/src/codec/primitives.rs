//! Primitive encoding/decoding for the document wire format.
//!
//! All multi-byte integers and floats are little-endian. Strings come in two
//! shapes: cstrings (bytes followed by 0x00, used for keys and regex parts)
//! and length-prefixed strings (`i32 len+1 | bytes | 0x00`).

use crate::error::{DecodeError, EncodeError};
use crate::limits::{LENGTH_PREFIX_SIZE, MAX_DOCUMENT_SIZE, MAX_STRING_LEN, OBJECT_ID_SIZE};
use crate::model::ObjectId;

// =============================================================================
// DECODING
// =============================================================================

/// Reader for decoding binary data.
///
/// Wraps a byte slice and provides methods for reading primitives
/// with bounds checking and error handling.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the remaining bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Returns the number of remaining bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        let Some(&byte) = self.data.get(self.pos) else {
            return Err(DecodeError::Truncated { context });
        };
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining_len() {
            return Err(DecodeError::Truncated { context });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Reads exactly `N` bytes into an array.
    #[inline]
    pub fn read_array<const N: usize>(
        &mut self,
        context: &'static str,
    ) -> Result<[u8; N], DecodeError> {
        let bytes = self.read_bytes(N, context)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Reads a little-endian i32.
    #[inline]
    pub fn read_i32(&mut self, context: &'static str) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.read_array(context)?))
    }

    /// Reads a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self, context: &'static str) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.read_array(context)?))
    }

    /// Reads a little-endian i64.
    #[inline]
    pub fn read_i64(&mut self, context: &'static str) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.read_array(context)?))
    }

    /// Reads a little-endian f64. NaN payloads are preserved.
    #[inline]
    pub fn read_f64(&mut self, context: &'static str) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.read_array(context)?))
    }

    /// Reads a 12-byte object identifier.
    #[inline]
    pub fn read_object_id(&mut self, context: &'static str) -> Result<ObjectId, DecodeError> {
        let bytes: [u8; OBJECT_ID_SIZE] = self.read_array(context)?;
        Ok(ObjectId::from_bytes(bytes))
    }

    /// Reads a 0x00-terminated UTF-8 string, borrowing from the input.
    pub fn read_cstr(&mut self, field: &'static str) -> Result<&'a str, DecodeError> {
        let rest = self.remaining();
        let Some(end) = rest.iter().position(|&b| b == 0) else {
            return Err(DecodeError::Truncated { context: field });
        };
        let s = std::str::from_utf8(&rest[..end]).map_err(|_| DecodeError::InvalidUtf8 { field })?;
        self.pos += end + 1;
        Ok(s)
    }

    /// Reads a length-prefixed string: `i32 len+1 | bytes | 0x00`.
    ///
    /// The final byte is taken as the terminator. In strict mode it must be
    /// 0x00; otherwise it is dropped without inspection.
    pub fn read_string(
        &mut self,
        strict: bool,
        field: &'static str,
    ) -> Result<String, DecodeError> {
        let len = self.read_i32(field)?;
        if len < 1 {
            return Err(DecodeError::InvalidLength {
                field,
                len: len as i64,
            });
        }
        let bytes = self.read_bytes(len as usize, field)?;
        let (body, terminator) = bytes.split_at(bytes.len() - 1);
        if strict && terminator[0] != 0 {
            return Err(DecodeError::MissingTerminator { field });
        }
        // Validate UTF-8 on borrowed slice, then allocate once
        std::str::from_utf8(body)
            .map(|s| s.to_string())
            .map_err(|_| DecodeError::InvalidUtf8 { field })
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer for encoding binary data.
///
/// Length fields that precede their content are written as placeholders with
/// [`Writer::reserve_length`] and filled in by [`Writer::patch_length`] once
/// the content size is known.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a little-endian i32.
    #[inline]
    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian u32.
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian i64.
    #[inline]
    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian f64.
    #[inline]
    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a 12-byte object identifier.
    #[inline]
    pub fn write_object_id(&mut self, id: &ObjectId) {
        self.buf.extend_from_slice(id.bytes());
    }

    /// Writes bytes followed by a 0x00 terminator.
    ///
    /// The caller must ensure `s` has no embedded 0x00 byte; see
    /// [`has_interior_nul`].
    #[inline]
    pub fn write_cstring(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
    }

    /// Writes a length-prefixed string: `i32 len+1 | bytes | 0x00`.
    pub fn write_string(&mut self, s: &str, field: &'static str) -> Result<(), EncodeError> {
        if s.len() > MAX_STRING_LEN {
            return Err(EncodeError::LengthExceedsLimit {
                field,
                len: s.len(),
                max: MAX_STRING_LEN,
            });
        }
        self.write_i32((s.len() + 1) as i32);
        self.write_cstring(s);
        Ok(())
    }

    /// Writes a 4-byte placeholder and returns its offset.
    #[inline]
    pub fn reserve_length(&mut self) -> usize {
        let offset = self.buf.len();
        self.buf.extend_from_slice(&[0u8; LENGTH_PREFIX_SIZE]);
        offset
    }

    /// Fills the placeholder at `offset` with the number of bytes written
    /// since it was reserved, the placeholder included.
    pub fn patch_length(&mut self, offset: usize, field: &'static str) -> Result<(), EncodeError> {
        let len = self.buf.len() - offset;
        if len > MAX_DOCUMENT_SIZE {
            return Err(EncodeError::LengthExceedsLimit {
                field,
                len,
                max: MAX_DOCUMENT_SIZE,
            });
        }
        self.buf[offset..offset + LENGTH_PREFIX_SIZE].copy_from_slice(&(len as i32).to_le_bytes());
        Ok(())
    }
}

/// Returns true if `s` contains a 0x00 byte and so cannot be a cstring.
#[inline]
pub fn has_interior_nul(s: &str) -> bool {
    s.as_bytes().contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i32_little_endian() {
        let mut writer = Writer::new();
        writer.write_i32(0x0102_0304);
        assert_eq!(writer.as_bytes(), &[0x04, 0x03, 0x02, 0x01]);

        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_i32("test").unwrap(), 0x0102_0304);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_integer_roundtrip() {
        for v in [0i64, 1, -1, i32::MAX as i64 + 1, i64::MIN, i64::MAX] {
            let mut writer = Writer::new();
            writer.write_i64(v);
            let mut reader = Reader::new(writer.as_bytes());
            assert_eq!(reader.read_i64("test").unwrap(), v, "failed for {}", v);
        }
    }

    #[test]
    fn test_f64_nan_preserved() {
        let mut writer = Writer::new();
        writer.write_f64(f64::NAN);

        let mut reader = Reader::new(writer.as_bytes());
        assert!(reader.read_f64("test").unwrap().is_nan());
    }

    #[test]
    fn test_string_layout() {
        let mut writer = Writer::new();
        writer.write_string("hi", "test").unwrap();
        assert_eq!(writer.as_bytes(), &[3, 0, 0, 0, b'h', b'i', 0]);
    }

    #[test]
    fn test_string_roundtrip() {
        for s in ["", "hello", "unicode: \u{1F600}"] {
            let mut writer = Writer::new();
            writer.write_string(s, "test").unwrap();

            let mut reader = Reader::new(writer.as_bytes());
            assert_eq!(reader.read_string(true, "test").unwrap(), s);
        }
    }

    #[test]
    fn test_string_zero_length_rejected() {
        let data = [0u8, 0, 0, 0, 0];
        let mut reader = Reader::new(&data);
        assert!(matches!(
            reader.read_string(false, "test"),
            Err(DecodeError::InvalidLength { len: 0, .. })
        ));
    }

    #[test]
    fn test_string_negative_length_rejected() {
        let data = (-5i32).to_le_bytes();
        let mut reader = Reader::new(&data);
        assert!(matches!(
            reader.read_string(false, "test"),
            Err(DecodeError::InvalidLength { len: -5, .. })
        ));
    }

    #[test]
    fn test_string_missing_terminator() {
        let data = [3u8, 0, 0, 0, b'h', b'i', b'!'];

        let mut lenient = Reader::new(&data);
        assert_eq!(lenient.read_string(false, "test").unwrap(), "hi");

        let mut strict = Reader::new(&data);
        assert!(matches!(
            strict.read_string(true, "test"),
            Err(DecodeError::MissingTerminator { .. })
        ));
    }

    #[test]
    fn test_string_invalid_utf8() {
        let data = [3u8, 0, 0, 0, 0xFF, 0xFE, 0];
        let mut reader = Reader::new(&data);
        assert!(matches!(
            reader.read_string(false, "test"),
            Err(DecodeError::InvalidUtf8 { .. })
        ));
    }

    #[test]
    fn test_cstr() {
        let data = b"key\0rest";
        let mut reader = Reader::new(data);
        assert_eq!(reader.read_cstr("key").unwrap(), "key");
        assert_eq!(reader.remaining(), b"rest");
    }

    #[test]
    fn test_cstr_unterminated() {
        let mut reader = Reader::new(b"key");
        assert!(matches!(
            reader.read_cstr("key"),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_reserve_and_patch_length() {
        let mut writer = Writer::new();
        writer.write_byte(0xAA);
        let offset = writer.reserve_length();
        writer.write_bytes(&[1, 2, 3]);
        writer.patch_length(offset, "test").unwrap();
        assert_eq!(writer.as_bytes(), &[0xAA, 7, 0, 0, 0, 1, 2, 3]);
    }

    #[test]
    fn test_object_id_roundtrip() {
        let id = ObjectId::from_bytes([1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);

        let mut writer = Writer::new();
        writer.write_object_id(&id);

        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_object_id("test").unwrap(), id);
    }

    #[test]
    fn test_truncated() {
        let data = [0u8; 5];
        let mut reader = Reader::new(&data);
        assert!(matches!(
            reader.read_bytes(10, "test"),
            Err(DecodeError::Truncated { .. })
        ));
        // A failed read leaves the position untouched.
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_interior_nul() {
        assert!(has_interior_nul("a\0b"));
        assert!(!has_interior_nul("ab"));
    }
}

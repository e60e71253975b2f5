//! Document framing and the top-level encode/decode entry points.
//!
//! A document is `i32 total length | elements | 0x00`. Arrays use the same
//! framing with keys `"0".."n-1"`.

use crate::codec::primitives::{Reader, Writer};
use crate::codec::value::{check_declared_length, decode_value, encode_value, resolve_custom};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{LENGTH_PREFIX_SIZE, MAX_NESTING_DEPTH};
use crate::model::{Document, ElementType, Value};
use crate::validate::validate_key;

// =============================================================================
// OPTIONS
// =============================================================================

/// How 64-bit integers are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegerWidth {
    /// Write `Int64` values that fit in 32 bits as int32.
    #[default]
    Smallest,
    /// Always write `Int64` as int64.
    Preserve,
}

/// Options for encoding documents.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Width policy for `Value::Int64`.
    pub integer_width: IntegerWidth,
    /// Reject storage-unsafe keys (leading `$`, embedded `.`).
    ///
    /// The reference keys `$ref`, `$id` and `$db` are always allowed.
    pub check_keys: bool,
    /// Maximum nesting depth; the root document is depth 1.
    pub max_depth: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            integer_width: IntegerWidth::Smallest,
            check_keys: false,
            max_depth: MAX_NESTING_DEPTH,
        }
    }
}

impl EncodeOptions {
    /// Creates default encoding options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options that validate keys for storage.
    pub fn strict_keys() -> Self {
        Self {
            check_keys: true,
            ..Self::default()
        }
    }

    pub fn with_integer_width(mut self, integer_width: IntegerWidth) -> Self {
        self.integer_width = integer_width;
        self
    }

    pub fn with_check_keys(mut self, check_keys: bool) -> Self {
        self.check_keys = check_keys;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Options for decoding documents.
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Enforce declared lengths and canonical scalar bytes.
    ///
    /// When disabled (the default), length prefixes of documents and
    /// code-with-scope values are advisory: parsing runs to the 0x00
    /// terminator, trailing bytes are ignored and any non-zero boolean byte
    /// is true.
    pub strict: bool,
    /// Maximum nesting depth; the root document is depth 1.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_depth: MAX_NESTING_DEPTH,
        }
    }
}

impl DecodeOptions {
    /// Creates default (lenient) decoding options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates strict decoding options.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Decodes a document, returning it as [`Value::Document`].
pub fn decode(input: &[u8]) -> Result<Value, DecodeError> {
    decode_with_options(input, DecodeOptions::new())
}

/// Decodes a document with explicit options, returning it as
/// [`Value::Document`].
pub fn decode_with_options(input: &[u8], options: DecodeOptions) -> Result<Value, DecodeError> {
    decode_document_with_options(input, options).map(Value::Document)
}

/// Decodes a document.
pub fn decode_document(input: &[u8]) -> Result<Document, DecodeError> {
    decode_document_with_options(input, DecodeOptions::new())
}

/// Decodes a document with explicit options.
pub fn decode_document_with_options(
    input: &[u8],
    options: DecodeOptions,
) -> Result<Document, DecodeError> {
    if input.is_empty() {
        return Err(DecodeError::EmptyInput);
    }
    if input.len() < LENGTH_PREFIX_SIZE {
        return Err(DecodeError::RootTooShort { len: input.len() });
    }

    let mut reader = Reader::new(input);
    let doc = decode_document_body(&mut reader, &options, 1, "document")?;

    let trailing = reader.remaining_len();
    if trailing > 0 {
        if options.strict {
            return Err(DecodeError::TrailingBytes { count: trailing });
        }
        log::debug!("ignoring {} bytes after the document terminator", trailing);
    }
    Ok(doc)
}

/// Decodes a framed document at the reader's position.
pub(crate) fn decode_document_body(
    reader: &mut Reader<'_>,
    options: &DecodeOptions,
    depth: usize,
    context: &'static str,
) -> Result<Document, DecodeError> {
    if depth > options.max_depth {
        return Err(DecodeError::DepthExceeded {
            max: options.max_depth,
        });
    }
    let start = reader.position();
    let declared = reader.read_i32(context)?;
    log::trace!("decoding {} at offset {} (declared {} bytes)", context, start, declared);

    let mut doc = Document::new();
    while let Some(element_type) = read_element_type(reader, context)? {
        let key = reader.read_cstr("key")?;
        let value = decode_value(reader, element_type, options, depth)?;
        doc.insert(key, value);
    }

    check_declared_length(declared, reader.position() - start, options, context)?;
    Ok(doc)
}

/// Decodes a framed array at the reader's position.
pub(crate) fn decode_array_body(
    reader: &mut Reader<'_>,
    options: &DecodeOptions,
    depth: usize,
) -> Result<Vec<Value>, DecodeError> {
    if depth > options.max_depth {
        return Err(DecodeError::DepthExceeded {
            max: options.max_depth,
        });
    }
    let start = reader.position();
    let declared = reader.read_i32("array")?;

    let mut items = Vec::new();
    while let Some(element_type) = read_element_type(reader, "array")? {
        let key = reader.read_cstr("key")?;
        if options.strict && key.parse::<usize>().ok() != Some(items.len()) {
            return Err(DecodeError::InvalidArrayKey {
                expected: items.len(),
                found: key.to_string(),
            });
        }
        items.push(decode_value(reader, element_type, options, depth)?);
    }

    check_declared_length(declared, reader.position() - start, options, "array")?;
    Ok(items)
}

/// Reads an element type byte; `None` at the 0x00 terminator.
fn read_element_type(
    reader: &mut Reader<'_>,
    context: &'static str,
) -> Result<Option<ElementType>, DecodeError> {
    let offset = reader.position();
    let type_code = reader.read_byte(context)?;
    if type_code == 0x00 {
        return Ok(None);
    }
    ElementType::from_u8(type_code)
        .map(Some)
        .ok_or(DecodeError::UnknownType { type_code, offset })
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a document or array root with default options.
pub fn encode(value: &Value) -> Result<Vec<u8>, EncodeError> {
    encode_with_options(value, EncodeOptions::new())
}

/// Encodes a document with default options.
pub fn encode_document(doc: &Document) -> Result<Vec<u8>, EncodeError> {
    let options = EncodeOptions::new();
    let mut writer = Writer::with_capacity(256);
    encode_document_body(&mut writer, doc, &options, 1)?;
    Ok(writer.into_bytes())
}

/// Encodes a document or array root with explicit options.
///
/// A host-object root is converted through its hook first. Any other root
/// is rejected with [`EncodeError::InvalidRoot`].
pub fn encode_with_options(value: &Value, options: EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    let resolved;
    let root = match value {
        Value::Custom(object) => {
            resolved = resolve_custom("", object)?;
            &resolved
        }
        other => other,
    };

    let mut writer = Writer::with_capacity(256);
    match root {
        Value::Document(doc) => encode_document_body(&mut writer, doc, &options, 1)?,
        Value::Array(items) => encode_array_body(&mut writer, items, &options, 1)?,
        other => {
            return Err(EncodeError::InvalidRoot {
                found: other.type_name(),
            });
        }
    }
    Ok(writer.into_bytes())
}

/// Writes a framed document.
pub(crate) fn encode_document_body(
    writer: &mut Writer,
    doc: &Document,
    options: &EncodeOptions,
    depth: usize,
) -> Result<(), EncodeError> {
    if depth > options.max_depth {
        return Err(EncodeError::DepthExceeded {
            max: options.max_depth,
        });
    }
    let offset = writer.reserve_length();
    for (key, value) in doc {
        if options.check_keys {
            validate_key(key)?;
        }
        encode_value(writer, key, value, options, depth)?;
    }
    writer.write_byte(0x00);
    writer.patch_length(offset, "document")?;
    log::trace!(
        "encoded document: {} elements, {} bytes, depth {}",
        doc.len(),
        writer.len() - offset,
        depth
    );
    Ok(())
}

/// Writes a framed array with decimal index keys.
pub(crate) fn encode_array_body(
    writer: &mut Writer,
    items: &[Value],
    options: &EncodeOptions,
    depth: usize,
) -> Result<(), EncodeError> {
    if depth > options.max_depth {
        return Err(EncodeError::DepthExceeded {
            max: options.max_depth,
        });
    }
    let offset = writer.reserve_length();
    for (i, value) in items.iter().enumerate() {
        encode_value(writer, &i.to_string(), value, options, depth)?;
    }
    writer.write_byte(0x00);
    writer.patch_length(offset, "array")?;
    log::trace!("encoded array: {} items, depth {}", items.len(), depth);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::model::{AsBson, CodeWithScope, DocumentBuilder};

    fn nested(levels: usize) -> Document {
        let mut doc = Document::new();
        doc.insert("leaf", true);
        for _ in 1..levels {
            let mut outer = Document::new();
            outer.insert("n", doc);
            doc = outer;
        }
        doc
    }

    #[test]
    fn test_empty_document() {
        let bytes = encode_document(&Document::new()).unwrap();
        assert_eq!(bytes, vec![5, 0, 0, 0, 0]);
        assert_eq!(decode_document(&bytes).unwrap(), Document::new());
    }

    #[test]
    fn test_length_prefix_matches_size() {
        let doc = DocumentBuilder::new()
            .field("javascript", "rocks")
            .field("mongodb", "rocks")
            .build();
        let bytes = encode_document(&doc).unwrap();
        assert_eq!(bytes.len(), 0x2e);
        assert_eq!(&bytes[..4], &[0x2e, 0, 0, 0]);
        assert_eq!(*bytes.last().unwrap(), 0);
    }

    #[test]
    fn test_roundtrip_preserves_order() {
        let doc = DocumentBuilder::new()
            .field("z", 1)
            .field("a", 2)
            .field("m", 3)
            .build();
        let decoded = decode_document(&encode_document(&doc).unwrap()).unwrap();
        assert_eq!(decoded.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
        assert_eq!(decoded, doc);
    }

    #[test]
    fn test_array_root() {
        let items = Value::Array(vec!["foo".into(), "bar".into(), "baz".into()]);
        let bytes = encode(&items).unwrap();
        assert_eq!(bytes.len(), 0x26);
        assert_eq!(&bytes[4..7], &[0x02, b'0', 0]);

        // Decoding always yields a document keyed by index.
        let doc = decode_document(&bytes).unwrap();
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["0", "1", "2"]);
    }

    #[test]
    fn test_invalid_root() {
        for value in [Value::Null, Value::Int32(1), Value::from("value"), Value::Boolean(true)] {
            assert!(matches!(
                encode(&value),
                Err(EncodeError::InvalidRoot { .. })
            ));
        }
    }

    struct Wrapper(Document);

    impl AsBson for Wrapper {
        fn as_bson(&self) -> Option<Value> {
            Some(Value::Document(self.0.clone()))
        }
    }

    #[test]
    fn test_custom_root() {
        let doc = DocumentBuilder::new().field("a", 1).build();
        let bytes = encode(&Value::custom(Wrapper(doc.clone()))).unwrap();
        assert_eq!(bytes, encode_document(&doc).unwrap());
    }

    #[test]
    fn test_empty_and_short_input() {
        assert_eq!(decode(&[]), Err(DecodeError::EmptyInput));
        assert_eq!(decode(&[5, 0, 0]), Err(DecodeError::RootTooShort { len: 3 }));
    }

    #[test]
    fn test_missing_terminator_is_truncated() {
        assert!(matches!(
            decode(&[5, 0, 0, 0]),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_unknown_type_offset() {
        let input = b"\x0c\x00\x00\x00\x69a\x00\x00\x00\x00\x00\x00";
        assert_eq!(
            decode(input),
            Err(DecodeError::UnknownType {
                type_code: 0x69,
                offset: 4
            })
        );
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = encode_document(&Document::new()).unwrap();
        bytes.push(0xAB);
        assert!(decode(&bytes).is_ok());
        assert_eq!(
            decode_with_options(&bytes, DecodeOptions::strict()),
            Err(DecodeError::TrailingBytes { count: 1 })
        );
    }

    #[test]
    fn test_strict_length_mismatch() {
        let mut bytes = encode_document(&DocumentBuilder::new().field("a", 1).build()).unwrap();
        bytes[0] = 0x99;
        assert!(decode(&bytes).is_ok());
        assert!(matches!(
            decode_with_options(&bytes, DecodeOptions::strict()),
            Err(DecodeError::LengthMismatch { declared: 0x99, .. })
        ));
    }

    #[test]
    fn test_strict_array_keys() {
        // {"a": ["x"]} with the array key written as "5".
        let doc = DocumentBuilder::new().array("a", |a| a.push("x")).build();
        let mut bytes = encode_document(&doc).unwrap();
        let key_pos = bytes.iter().position(|&b| b == b'0').unwrap();
        bytes[key_pos] = b'5';

        assert!(decode(&bytes).is_ok());
        assert_eq!(
            decode_with_options(&bytes, DecodeOptions::strict()),
            Err(DecodeError::InvalidArrayKey {
                expected: 0,
                found: "5".to_string()
            })
        );
    }

    #[test]
    fn test_decode_depth_limit() {
        let bytes = encode_document(&nested(10)).unwrap();
        assert!(decode_with_options(&bytes, DecodeOptions::new().with_max_depth(10)).is_ok());
        assert_eq!(
            decode_with_options(&bytes, DecodeOptions::new().with_max_depth(9)),
            Err(DecodeError::DepthExceeded { max: 9 })
        );
    }

    #[test]
    fn test_encode_depth_limit() {
        let doc = Value::Document(nested(MAX_NESTING_DEPTH + 1));
        assert_eq!(
            encode(&doc),
            Err(EncodeError::DepthExceeded {
                max: MAX_NESTING_DEPTH
            })
        );
        assert!(encode(&Value::Document(nested(MAX_NESTING_DEPTH))).is_ok());
    }

    #[test]
    fn test_scope_counts_toward_depth() {
        let scope = nested(3);
        let doc = DocumentBuilder::new()
            .field("c", CodeWithScope::new("x", scope))
            .build();
        let options = EncodeOptions::new().with_max_depth(3);
        assert!(encode_with_options(&Value::Document(doc.clone()), options).is_err());
        let options = EncodeOptions::new().with_max_depth(4);
        assert!(encode_with_options(&Value::Document(doc), options).is_ok());
    }

    #[test]
    fn test_check_keys() {
        let doc = DocumentBuilder::new().field("$set", 1).build();
        assert!(encode_document(&doc).is_ok());
        assert_eq!(
            encode_with_options(&Value::Document(doc), EncodeOptions::strict_keys()),
            Err(EncodeError::Validation(ValidationError::KeyStartsWithDollar {
                path: "$set".to_string()
            }))
        );

        let nested_dot = DocumentBuilder::new()
            .document("outer", |o| o.field("a.b", 1))
            .build();
        assert!(matches!(
            encode_with_options(&Value::Document(nested_dot), EncodeOptions::strict_keys()),
            Err(EncodeError::Validation(ValidationError::KeyContainsDot { .. }))
        ));
    }

    #[test]
    fn test_duplicate_wire_keys_keep_last_value() {
        // {"a": 1, "a": 2}
        let input = b"\x13\x00\x00\x00\x10a\x00\x01\x00\x00\x00\x10a\x00\x02\x00\x00\x00\x00";
        let doc = decode_document(input).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.get_i32("a"), Some(2));
    }
}

//! Element encoding/decoding.
//!
//! An element is `type byte | cstring key | payload`. This module owns the
//! per-type payload layouts; document and array framing lives in
//! [`crate::codec::document`].

use crate::codec::document::{
    decode_array_body, decode_document_body, encode_array_body, encode_document_body,
    DecodeOptions, EncodeOptions, IntegerWidth,
};
use crate::codec::primitives::{has_interior_nul, Reader, Writer};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{LENGTH_PREFIX_SIZE, MAX_DOCUMENT_SIZE};
use crate::model::{
    Binary, BinarySubtype, CodeWithScope, Convertible, DbPointer, ElementType, Regex, Timestamp,
    Value,
};

// =============================================================================
// DECODING
// =============================================================================

/// Decodes the payload of an element whose type byte has been read.
///
/// `depth` is the nesting depth of the enclosing document.
pub fn decode_value(
    reader: &mut Reader<'_>,
    element_type: ElementType,
    options: &DecodeOptions,
    depth: usize,
) -> Result<Value, DecodeError> {
    let value = match element_type {
        ElementType::Double => Value::Double(reader.read_f64("double")?),
        ElementType::String => Value::String(reader.read_string(options.strict, "string")?),
        ElementType::Document => {
            Value::Document(decode_document_body(reader, options, depth + 1, "document")?)
        }
        ElementType::Array => Value::Array(decode_array_body(reader, options, depth + 1)?),
        ElementType::Binary => Value::Binary(decode_binary(reader, options)?),
        ElementType::Undefined => Value::Undefined,
        ElementType::ObjectId => Value::ObjectId(reader.read_object_id("object id")?),
        ElementType::Boolean => Value::Boolean(decode_bool(reader, options)?),
        ElementType::DateTime => Value::DateTime(reader.read_i64("date")?),
        ElementType::Null => Value::Null,
        ElementType::Regex => {
            let pattern = reader.read_cstr("regex pattern")?.to_string();
            let flags = reader.read_cstr("regex flags")?.to_string();
            Value::Regex(Regex { pattern, flags })
        }
        ElementType::DbPointer => {
            let namespace = reader.read_string(options.strict, "db pointer namespace")?;
            let id = reader.read_object_id("db pointer id")?;
            Value::DbPointer(DbPointer { namespace, id })
        }
        ElementType::Code => Value::Code(reader.read_string(options.strict, "code")?),
        ElementType::Symbol => Value::Symbol(reader.read_string(options.strict, "symbol")?),
        ElementType::CodeWithScope => {
            Value::CodeWithScope(decode_code_with_scope(reader, options, depth)?)
        }
        ElementType::Int32 => Value::Int32(reader.read_i32("int32")?),
        ElementType::Timestamp => {
            let increment = reader.read_u32("timestamp increment")?;
            let seconds = reader.read_u32("timestamp seconds")?;
            Value::Timestamp(Timestamp { increment, seconds })
        }
        ElementType::Int64 => Value::Int64(reader.read_i64("int64")?),
        ElementType::MinKey => Value::MinKey,
        ElementType::MaxKey => Value::MaxKey,
    };
    Ok(value)
}

fn decode_bool(reader: &mut Reader<'_>, options: &DecodeOptions) -> Result<bool, DecodeError> {
    let byte = reader.read_byte("bool")?;
    match byte {
        0x00 => Ok(false),
        0x01 => Ok(true),
        _ if options.strict => Err(DecodeError::InvalidBool { value: byte }),
        _ => Ok(true),
    }
}

fn decode_binary(reader: &mut Reader<'_>, options: &DecodeOptions) -> Result<Binary, DecodeError> {
    let len = reader.read_i32("binary")?;
    if len < 0 {
        return Err(DecodeError::InvalidLength {
            field: "binary",
            len: len as i64,
        });
    }
    let len = len as usize;
    let subtype = BinarySubtype::from_u8(reader.read_byte("binary subtype")?);

    if subtype != BinarySubtype::ByteArray {
        let bytes = reader.read_bytes(len, "binary")?;
        return Ok(Binary::with_subtype(subtype, bytes));
    }

    // Legacy layout: the outer length counts the repeated inner length.
    let inner = reader.read_i32("binary")?;
    let room = len.saturating_sub(LENGTH_PREFIX_SIZE);
    let inner_len = match usize::try_from(inner) {
        Ok(n) if len >= LENGTH_PREFIX_SIZE && n <= room => n,
        _ => {
            return Err(DecodeError::InvalidLength {
                field: "binary",
                len: inner as i64,
            });
        }
    };
    if inner_len != room {
        if options.strict {
            return Err(DecodeError::InvalidLength {
                field: "binary",
                len: inner as i64,
            });
        }
        log::debug!(
            "byte array inner length {} is shorter than outer length {}",
            inner_len,
            room
        );
    }
    let bytes = reader.read_bytes(inner_len, "binary")?.to_vec();
    // The outer length is authoritative for where the next element starts.
    reader.read_bytes(room - inner_len, "binary")?;
    Ok(Binary::with_subtype(subtype, bytes))
}

fn decode_code_with_scope(
    reader: &mut Reader<'_>,
    options: &DecodeOptions,
    depth: usize,
) -> Result<CodeWithScope, DecodeError> {
    let start = reader.position();
    let declared = reader.read_i32("code with scope")?;
    let code = reader.read_string(options.strict, "code with scope")?;
    let scope = decode_document_body(reader, options, depth + 1, "code with scope scope")?;
    check_declared_length(declared, reader.position() - start, options, "code with scope")?;
    Ok(CodeWithScope { code, scope })
}

/// Compares a declared length with the bytes actually parsed.
///
/// Mismatches are errors in strict mode and logged otherwise.
pub(crate) fn check_declared_length(
    declared: i32,
    actual: usize,
    options: &DecodeOptions,
    context: &'static str,
) -> Result<(), DecodeError> {
    if i64::from(declared) == actual as i64 {
        return Ok(());
    }
    if options.strict {
        return Err(DecodeError::LengthMismatch {
            context,
            declared: declared as i64,
            actual,
        });
    }
    log::debug!(
        "{} declares {} bytes but {} were parsed; continuing",
        context,
        declared,
        actual
    );
    Ok(())
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes one element: type byte, key and payload.
///
/// `depth` is the nesting depth of the enclosing document.
pub fn encode_value(
    writer: &mut Writer,
    key: &str,
    value: &Value,
    options: &EncodeOptions,
    depth: usize,
) -> Result<(), EncodeError> {
    let resolved;
    let value = match value {
        Value::Custom(object) => {
            resolved = resolve_custom(key, object)?;
            &resolved
        }
        other => other,
    };

    if has_interior_nul(key) {
        return Err(EncodeError::InvalidKey {
            key: key.to_string(),
        });
    }

    let element_type = wire_type(value, options).ok_or_else(|| EncodeError::UnsupportedValue {
        key: key.to_string(),
        type_name: value.type_name(),
    })?;
    writer.write_byte(element_type as u8);
    writer.write_cstring(key);
    encode_payload(writer, key, value, element_type, options, depth)
}

/// Runs a host object's conversion hook once.
///
/// The hook must produce a native value; `None` or another host object is
/// rejected.
pub fn resolve_custom(key: &str, object: &Convertible) -> Result<Value, EncodeError> {
    log::debug!("converting {} under key {:?}", object.type_name(), key);
    match object.resolve() {
        Some(Value::Custom(_)) | None => Err(EncodeError::UnsupportedValue {
            key: key.to_string(),
            type_name: object.type_name(),
        }),
        Some(value) => Ok(value),
    }
}

/// Returns the type code a value is written with.
fn wire_type(value: &Value, options: &EncodeOptions) -> Option<ElementType> {
    match value {
        Value::Int64(n)
            if options.integer_width == IntegerWidth::Smallest && i32::try_from(*n).is_ok() =>
        {
            Some(ElementType::Int32)
        }
        other => other.element_type(),
    }
}

fn encode_payload(
    writer: &mut Writer,
    key: &str,
    value: &Value,
    element_type: ElementType,
    options: &EncodeOptions,
    depth: usize,
) -> Result<(), EncodeError> {
    match value {
        Value::Double(n) => writer.write_f64(*n),
        Value::String(s) => writer.write_string(s, "string")?,
        Value::Document(doc) => encode_document_body(writer, doc, options, depth + 1)?,
        Value::Array(items) => encode_array_body(writer, items, options, depth + 1)?,
        Value::Binary(binary) => encode_binary(writer, binary)?,
        Value::Undefined | Value::Null | Value::MinKey | Value::MaxKey => {}
        Value::ObjectId(id) => writer.write_object_id(id),
        Value::Boolean(b) => writer.write_byte(if *b { 0x01 } else { 0x00 }),
        Value::DateTime(millis) => writer.write_i64(*millis),
        Value::Regex(regex) => {
            if has_interior_nul(&regex.pattern) {
                return Err(EncodeError::InvalidCString {
                    field: "regex pattern",
                });
            }
            if has_interior_nul(&regex.flags) {
                return Err(EncodeError::InvalidCString {
                    field: "regex flags",
                });
            }
            writer.write_cstring(&regex.pattern);
            writer.write_cstring(&regex.flags);
        }
        Value::DbPointer(pointer) => {
            writer.write_string(&pointer.namespace, "db pointer namespace")?;
            writer.write_object_id(&pointer.id);
        }
        Value::Code(code) => writer.write_string(code, "code")?,
        Value::Symbol(symbol) => writer.write_string(symbol, "symbol")?,
        Value::CodeWithScope(cws) => {
            let offset = writer.reserve_length();
            writer.write_string(&cws.code, "code with scope")?;
            encode_document_body(writer, &cws.scope, options, depth + 1)?;
            writer.patch_length(offset, "code with scope")?;
        }
        Value::Int32(n) => writer.write_i32(*n),
        Value::Timestamp(ts) => {
            writer.write_u32(ts.increment);
            writer.write_u32(ts.seconds);
        }
        Value::Int64(n) => {
            if element_type == ElementType::Int32 {
                writer.write_i32(*n as i32);
            } else {
                writer.write_i64(*n);
            }
        }
        Value::Custom(object) => {
            return Err(EncodeError::UnsupportedValue {
                key: key.to_string(),
                type_name: object.type_name(),
            });
        }
    }
    Ok(())
}

fn encode_binary(writer: &mut Writer, binary: &Binary) -> Result<(), EncodeError> {
    let len = binary.bytes.len();
    let max = MAX_DOCUMENT_SIZE - 2 * LENGTH_PREFIX_SIZE;
    if len > max {
        return Err(EncodeError::LengthExceedsLimit {
            field: "binary",
            len,
            max,
        });
    }
    if binary.subtype == BinarySubtype::ByteArray {
        writer.write_i32((len + LENGTH_PREFIX_SIZE) as i32);
        writer.write_byte(binary.subtype.to_u8());
        writer.write_i32(len as i32);
    } else {
        writer.write_i32(len as i32);
        writer.write_byte(binary.subtype.to_u8());
    }
    writer.write_bytes(&binary.bytes);
    Ok(())
}

//! Storage-key validation.
//!
//! Documents bound for storage must not use keys that query languages treat
//! as operators (leading `$`) or path separators (embedded `.`). Encoding does
//! not require this; callers opt in with [`EncodeOptions::check_keys`] or by
//! calling [`validate_keys`] directly.
//!
//! [`EncodeOptions::check_keys`]: crate::codec::EncodeOptions::check_keys

use crate::error::ValidationError;
use crate::model::{Document, Value};

/// Keys of the reference form, which are allowed despite the leading `$`.
const REFERENCE_KEYS: [&str; 3] = ["$ref", "$id", "$db"];

/// Validates a single key.
pub fn validate_key(key: &str) -> Result<(), ValidationError> {
    check_key(key, key)
}

/// Validates every key in a document, recursing into nested documents,
/// arrays and code scopes.
///
/// Errors report the dotted path to the offending key.
pub fn validate_keys(doc: &Document) -> Result<(), ValidationError> {
    validate_document(doc, "")
}

fn validate_document(doc: &Document, prefix: &str) -> Result<(), ValidationError> {
    for (key, value) in doc {
        let path = join_path(prefix, key);
        check_key(key, &path)?;
        validate_value(value, &path)?;
    }
    Ok(())
}

fn validate_value(value: &Value, path: &str) -> Result<(), ValidationError> {
    match value {
        Value::Document(doc) => validate_document(doc, path),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                validate_value(item, &join_path(path, &i.to_string()))?;
            }
            Ok(())
        }
        Value::CodeWithScope(cws) => validate_document(&cws.scope, path),
        // Host objects are checked after conversion, during encoding.
        _ => Ok(()),
    }
}

fn check_key(key: &str, path: &str) -> Result<(), ValidationError> {
    if key.starts_with('$') && !REFERENCE_KEYS.contains(&key) {
        return Err(ValidationError::KeyStartsWithDollar {
            path: path.to_string(),
        });
    }
    if key.contains('.') {
        return Err(ValidationError::KeyContainsDot {
            path: path.to_string(),
        });
    }
    Ok(())
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

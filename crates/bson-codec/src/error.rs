//! Error types for encoding, decoding, identifiers and key validation.

use thiserror::Error;

/// Error categories shared by every error type in this crate.
///
/// Each concrete error maps onto exactly one kind, so callers can branch on
/// the category without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The root value is not a document, or the input is not a document.
    InvalidRoot,
    /// A value that cannot be represented on the wire.
    UnsupportedValue,
    /// An element type byte outside the type registry.
    UnknownType,
    /// The input ends before the element being parsed.
    TruncatedInput,
    /// Identifier text that is not 24 hexadecimal characters.
    Format,
    /// A key or cstring that cannot be written or violates key policy.
    InvalidKey,
    /// Structurally invalid input: bad lengths, UTF-8, depth, strict checks.
    MalformedInput,
}

impl ErrorKind {
    /// Returns the kind's name (e.g., "InvalidRootError").
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRoot => "InvalidRootError",
            ErrorKind::UnsupportedValue => "UnsupportedValueError",
            ErrorKind::UnknownType => "UnknownTypeError",
            ErrorKind::TruncatedInput => "TruncatedInputError",
            ErrorKind::Format => "FormatError",
            ErrorKind::InvalidKey => "InvalidKeyError",
            ErrorKind::MalformedInput => "MalformedInputError",
        }
    }
}

/// Error during binary decoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    // === InvalidRootError ===
    #[error("cannot decode an empty buffer")]
    EmptyInput,

    #[error("input of {len} bytes is too short to hold a document")]
    RootTooShort { len: usize },

    // === UnknownTypeError ===
    #[error("unknown element type 0x{type_code:02x} at offset {offset}")]
    UnknownType { type_code: u8, offset: usize },

    // === TruncatedInputError ===
    #[error("unexpected end of input while reading {context}")]
    Truncated { context: &'static str },

    // === MalformedInputError ===
    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    #[error("invalid {field} length {len}")]
    InvalidLength { field: &'static str, len: i64 },

    #[error("nesting depth exceeds maximum {max}")]
    DepthExceeded { max: usize },

    #[error("{context} declares {declared} bytes but {actual} were parsed")]
    LengthMismatch {
        context: &'static str,
        declared: i64,
        actual: usize,
    },

    #[error("{count} trailing bytes after the document terminator")]
    TrailingBytes { count: usize },

    #[error("invalid bool value: {value} (expected 0x00 or 0x01)")]
    InvalidBool { value: u8 },

    #[error("{field} is not followed by a 0x00 terminator")]
    MissingTerminator { field: &'static str },

    #[error("array element key {found:?} does not match index {expected}")]
    InvalidArrayKey { expected: usize, found: String },
}

impl DecodeError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::EmptyInput | DecodeError::RootTooShort { .. } => ErrorKind::InvalidRoot,
            DecodeError::UnknownType { .. } => ErrorKind::UnknownType,
            DecodeError::Truncated { .. } => ErrorKind::TruncatedInput,
            _ => ErrorKind::MalformedInput,
        }
    }
}

/// Error during binary encoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("root value must be a document or array, found {found}")]
    InvalidRoot { found: &'static str },

    #[error("value under key {key:?} of type {type_name} has no BSON representation")]
    UnsupportedValue {
        key: String,
        type_name: &'static str,
    },

    #[error("key {key:?} contains an embedded 0x00 byte")]
    InvalidKey { key: String },

    #[error("{field} contains an embedded 0x00 byte")]
    InvalidCString { field: &'static str },

    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("nesting depth exceeds maximum {max}")]
    DepthExceeded { max: usize },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl EncodeError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EncodeError::InvalidRoot { .. } => ErrorKind::InvalidRoot,
            EncodeError::UnsupportedValue { .. } => ErrorKind::UnsupportedValue,
            EncodeError::InvalidKey { .. }
            | EncodeError::InvalidCString { .. }
            | EncodeError::Validation(_) => ErrorKind::InvalidKey,
            EncodeError::LengthExceedsLimit { .. } | EncodeError::DepthExceeded { .. } => {
                ErrorKind::MalformedInput
            }
        }
    }
}

/// Error parsing an object identifier from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectIdError {
    #[error("object id must be 24 hex characters, found {len}")]
    InvalidLength { len: usize },

    #[error("invalid hex character {c:?} at index {index}")]
    InvalidCharacter { c: char, index: usize },
}

impl ObjectIdError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Format
    }
}

impl From<hex::FromHexError> for ObjectIdError {
    fn from(err: hex::FromHexError) -> Self {
        match err {
            hex::FromHexError::InvalidHexCharacter { c, index } => {
                ObjectIdError::InvalidCharacter { c, index }
            }
            // Length was checked before decoding; keep the hex crate's view anyway.
            hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
                ObjectIdError::InvalidLength { len: 0 }
            }
        }
    }
}

/// Error raised by storage-key validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("key {path:?} must not start with '$'")]
    KeyStartsWithDollar { path: String },

    #[error("key {path:?} must not contain '.'")]
    KeyContainsDot { path: String },
}

impl ValidationError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidKey
    }
}

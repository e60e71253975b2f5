//! A binary document codec with 12-byte object identifiers.
//!
//! This crate converts ordered, dynamically typed documents to and from a
//! compact length-prefixed binary representation, and generates globally
//! unique identifiers with an embedded creation time.
//!
//! # Quick Start
//!
//! ```rust
//! use bson_codec::{decode, encode, DocumentBuilder, ObjectId, Value};
//!
//! let doc = DocumentBuilder::new()
//!     .object_id("_id", ObjectId::new())
//!     .field("name", "Alice")
//!     .field("score", 4.2)
//!     .array("tags", |t| t.push("a").push("b"))
//!     .build();
//!
//! // Encode to binary
//! let bytes = encode(&Value::Document(doc.clone())).unwrap();
//!
//! // Decode back
//! let decoded = decode(&bytes).unwrap();
//! assert_eq!(decoded, Value::Document(doc));
//! ```
//!
//! # Modules
//!
//! - [`model`]: Documents, values, extended types and identifiers
//! - [`codec`]: Binary encoding/decoding
//! - [`validate`]: Storage-key validation
//! - [`error`]: Error types
//! - [`limits`]: Size and nesting limits
//!
//! # Security
//!
//! The decoder is designed to safely handle untrusted input:
//! - Every read is bounds-checked and fails with an error, never a panic
//! - Nesting depth is bounded
//! - Unknown element types are rejected
//!
//! By default declared lengths are advisory, matching what existing
//! producers emit. Use [`DecodeOptions::strict`] to enforce them.
//!
//! # Wire Format
//!
//! ```text
//! document := int32 total_length, element*, 0x00
//! element  := type_byte, cstring key, payload
//! ```
//!
//! All integers are little-endian except inside object identifiers.

pub mod codec;
pub mod error;
pub mod limits;
pub mod model;
pub mod validate;

// Re-export commonly used types at crate root
pub use codec::{
    decode, decode_document, decode_document_with_options, decode_with_options, encode,
    encode_document, encode_with_options, DecodeOptions, EncodeOptions, IntegerWidth,
};
pub use error::{DecodeError, EncodeError, ErrorKind, ObjectIdError, ValidationError};
pub use model::{
    default_generator, ArrayBuilder, AsBson, Binary, BinarySubtype, CodeWithScope, Convertible,
    DbPointer, DbRef, Document, DocumentBuilder, ElementType, ObjectId, ObjectIdGenerator, Regex,
    Timestamp, Value,
};
pub use validate::{validate_key, validate_keys};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

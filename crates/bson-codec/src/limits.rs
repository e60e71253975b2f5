//! Limits for encoding and decoding.
//!
//! Documents carry their sizes in signed 32-bit length fields, which bounds
//! everything the encoder may produce. Nesting depth is bounded separately so
//! that hostile input cannot exhaust the stack of the recursive decoder.

/// Maximum encoded size of a document, in bytes.
pub const MAX_DOCUMENT_SIZE: usize = i32::MAX as usize;

/// Maximum byte length of a string payload (excluding the terminator).
pub const MAX_STRING_LEN: usize = MAX_DOCUMENT_SIZE - 1;

/// Default maximum nesting depth of documents, arrays and code scopes.
pub const MAX_NESTING_DEPTH: usize = 100;

/// Smallest well-formed document: length field plus terminator.
pub const MIN_DOCUMENT_SIZE: usize = 5;

/// Size of the little-endian length prefix in front of documents and strings.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Size of a raw object identifier.
pub const OBJECT_ID_SIZE: usize = 12;

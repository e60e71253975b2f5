//! Data model types.
//!
//! This module contains the in-memory representation of documents:
//! - Ordered documents
//! - Values and the extended scalar types
//! - Object identifiers and their generator
//! - Builders (ergonomic construction)

pub mod builder;
pub mod document;
pub mod oid;
pub mod value;

pub use builder::{ArrayBuilder, DocumentBuilder};
pub use document::Document;
pub use oid::{default_generator, ObjectId, ObjectIdGenerator};
pub use value::{
    AsBson, Binary, BinarySubtype, CodeWithScope, Convertible, DbPointer, DbRef, ElementType,
    Regex, Timestamp, Value,
};

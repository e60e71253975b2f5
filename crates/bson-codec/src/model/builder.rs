//! Builder API for ergonomic document construction.
//!
//! # Example
//!
//! ```rust
//! use bson_codec::model::builder::DocumentBuilder;
//! use bson_codec::Value;
//!
//! let doc = DocumentBuilder::new()
//!     .field("name", "Alice")
//!     .field("age", 30)
//!     .document("address", |a| a
//!         .field("city", "Lisbon")
//!     )
//!     .array("tags", |t| t.push("admin").push("ops"))
//!     .build();
//!
//! assert_eq!(doc.get_str("name"), Some("Alice"));
//! assert_eq!(doc.get_array("tags").map(|t| t.len()), Some(2));
//! ```

use crate::model::{Binary, CodeWithScope, DbRef, Document, ObjectId, Regex, Timestamp, Value};

/// Builder for constructing a [`Document`].
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    doc: Document,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field. Setting a key twice keeps the first position and the
    /// last value.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.doc.insert(key, value);
        self
    }

    /// Adds a nested document built by `f`.
    pub fn document<F>(self, key: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(DocumentBuilder) -> DocumentBuilder,
    {
        let nested = f(DocumentBuilder::new()).build();
        self.field(key, Value::Document(nested))
    }

    /// Adds an array built by `f`.
    pub fn array<F>(self, key: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(ArrayBuilder) -> ArrayBuilder,
    {
        let items = f(ArrayBuilder::new()).build();
        self.field(key, Value::Array(items))
    }

    pub fn null(self, key: impl Into<String>) -> Self {
        self.field(key, Value::Null)
    }

    /// Adds an integer using the smallest variant that holds it.
    pub fn integer(self, key: impl Into<String>, n: i64) -> Self {
        self.field(key, Value::integer(n))
    }

    pub fn date(self, key: impl Into<String>, millis: i64) -> Self {
        self.field(key, Value::DateTime(millis))
    }

    pub fn object_id(self, key: impl Into<String>, id: ObjectId) -> Self {
        self.field(key, Value::ObjectId(id))
    }

    pub fn binary(self, key: impl Into<String>, binary: Binary) -> Self {
        self.field(key, Value::Binary(binary))
    }

    pub fn regex(self, key: impl Into<String>, pattern: &str, flags: &str) -> Self {
        self.field(key, Value::Regex(Regex::new(pattern, flags)))
    }

    pub fn code(self, key: impl Into<String>, code: impl Into<String>) -> Self {
        self.field(key, Value::Code(code.into()))
    }

    /// Adds code with a scope document built by `f`.
    pub fn code_with_scope<F>(self, key: impl Into<String>, code: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(DocumentBuilder) -> DocumentBuilder,
    {
        let scope = f(DocumentBuilder::new()).build();
        self.field(key, Value::CodeWithScope(CodeWithScope::new(code, scope)))
    }

    pub fn symbol(self, key: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.field(key, Value::Symbol(symbol.into()))
    }

    pub fn timestamp(self, key: impl Into<String>, increment: u32, seconds: u32) -> Self {
        self.field(key, Value::Timestamp(Timestamp::new(increment, seconds)))
    }

    pub fn db_ref(self, key: impl Into<String>, reference: DbRef) -> Self {
        self.field(key, reference)
    }

    /// Consumes the builder.
    pub fn build(self) -> Document {
        self.doc
    }
}

/// Builder for constructing an array value.
#[derive(Debug, Clone, Default)]
pub struct ArrayBuilder {
    items: Vec<Value>,
}

impl ArrayBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, value: impl Into<Value>) -> Self {
        self.items.push(value.into());
        self
    }

    /// Appends a nested document built by `f`.
    pub fn document<F>(self, f: F) -> Self
    where
        F: FnOnce(DocumentBuilder) -> DocumentBuilder,
    {
        let nested = f(DocumentBuilder::new()).build();
        self.push(Value::Document(nested))
    }

    /// Appends a nested array built by `f`.
    pub fn array<F>(self, f: F) -> Self
    where
        F: FnOnce(ArrayBuilder) -> ArrayBuilder,
    {
        let nested = f(ArrayBuilder::new()).build();
        self.push(Value::Array(nested))
    }

    /// Consumes the builder.
    pub fn build(self) -> Vec<Value> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_order_and_nesting() {
        let doc = DocumentBuilder::new()
            .field("a", 1)
            .document("b", |b| b.field("c", true))
            .array("d", |d| d.push(1).array(|inner| inner.push("x")).document(|e| e.null("f")))
            .build();

        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["a", "b", "d"]);
        assert_eq!(doc.get_document("b").and_then(|b| b.get_bool("c")), Some(true));

        let d = doc.get_array("d").unwrap();
        assert_eq!(d.len(), 3);
        assert_eq!(d[1], Value::Array(vec![Value::from("x")]));
        assert!(d[2].as_document().unwrap().get("f").unwrap().is_null());
    }

    #[test]
    fn test_builder_overwrite() {
        let doc = DocumentBuilder::new()
            .field("x", 1)
            .field("y", 2)
            .field("x", 3)
            .build();
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(doc.get_i32("x"), Some(3));
    }

    #[test]
    fn test_builder_extended_types() {
        let id = ObjectId::from_bytes([7; 12]);
        let doc = DocumentBuilder::new()
            .integer("small", 5)
            .integer("big", 1 << 40)
            .timestamp("ts", 1, 2)
            .code_with_scope("fn", "x + 1", |s| s.field("x", 1))
            .db_ref("owner", DbRef::new("users", id))
            .build();

        assert_eq!(doc.get("small"), Some(&Value::Int32(5)));
        assert_eq!(doc.get("big"), Some(&Value::Int64(1 << 40)));
        assert_eq!(doc.get("ts"), Some(&Value::Timestamp(Timestamp::new(1, 2))));
        assert_eq!(
            doc.get("owner").and_then(Value::as_db_ref).map(|r| r.collection),
            Some("users".to_string())
        );
    }
}

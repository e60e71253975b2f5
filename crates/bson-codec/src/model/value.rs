//! Value types for documents.
//!
//! [`Value`] is the closed set of kinds a document element can hold. Host
//! objects that are not one of these kinds enter through [`Value::Custom`]
//! and the [`AsBson`] conversion hook.

use std::fmt;
use std::sync::Arc;

use crate::model::{Document, ObjectId};

/// Element type codes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElementType {
    Double = 0x01,
    String = 0x02,
    Document = 0x03,
    Array = 0x04,
    Binary = 0x05,
    /// Deprecated.
    Undefined = 0x06,
    ObjectId = 0x07,
    Boolean = 0x08,
    DateTime = 0x09,
    Null = 0x0A,
    Regex = 0x0B,
    /// Deprecated.
    DbPointer = 0x0C,
    /// Code without scope.
    Code = 0x0D,
    Symbol = 0x0E,
    CodeWithScope = 0x0F,
    Int32 = 0x10,
    Timestamp = 0x11,
    Int64 = 0x12,
    MaxKey = 0x7F,
    MinKey = 0xFF,
}

impl ElementType {
    /// Creates an ElementType from its wire representation.
    pub fn from_u8(v: u8) -> Option<ElementType> {
        match v {
            0x01 => Some(ElementType::Double),
            0x02 => Some(ElementType::String),
            0x03 => Some(ElementType::Document),
            0x04 => Some(ElementType::Array),
            0x05 => Some(ElementType::Binary),
            0x06 => Some(ElementType::Undefined),
            0x07 => Some(ElementType::ObjectId),
            0x08 => Some(ElementType::Boolean),
            0x09 => Some(ElementType::DateTime),
            0x0A => Some(ElementType::Null),
            0x0B => Some(ElementType::Regex),
            0x0C => Some(ElementType::DbPointer),
            0x0D => Some(ElementType::Code),
            0x0E => Some(ElementType::Symbol),
            0x0F => Some(ElementType::CodeWithScope),
            0x10 => Some(ElementType::Int32),
            0x11 => Some(ElementType::Timestamp),
            0x12 => Some(ElementType::Int64),
            0x7F => Some(ElementType::MaxKey),
            0xFF => Some(ElementType::MinKey),
            _ => None,
        }
    }
}

/// Binary blob subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinarySubtype {
    Generic,
    Function,
    /// Legacy subtype whose payload repeats the length.
    ByteArray,
    Uuid,
    Md5,
    /// 5..=127, reserved for future use.
    Reserved(u8),
    /// 128..=255.
    UserDefined(u8),
}

impl BinarySubtype {
    /// Creates a BinarySubtype from its wire representation. Every byte maps
    /// to a subtype.
    pub fn from_u8(v: u8) -> BinarySubtype {
        match v {
            0 => BinarySubtype::Generic,
            1 => BinarySubtype::Function,
            2 => BinarySubtype::ByteArray,
            3 => BinarySubtype::Uuid,
            4 => BinarySubtype::Md5,
            5..=127 => BinarySubtype::Reserved(v),
            _ => BinarySubtype::UserDefined(v),
        }
    }

    /// Returns the wire representation.
    pub fn to_u8(self) -> u8 {
        match self {
            BinarySubtype::Generic => 0,
            BinarySubtype::Function => 1,
            BinarySubtype::ByteArray => 2,
            BinarySubtype::Uuid => 3,
            BinarySubtype::Md5 => 4,
            BinarySubtype::Reserved(v) | BinarySubtype::UserDefined(v) => v,
        }
    }
}

/// A binary blob with its subtype.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binary {
    pub subtype: BinarySubtype,
    pub bytes: Vec<u8>,
}

impl Binary {
    /// Creates a generic binary blob.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            subtype: BinarySubtype::Generic,
            bytes: bytes.into(),
        }
    }

    /// Creates a binary blob with an explicit subtype.
    pub fn with_subtype(subtype: BinarySubtype, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            subtype,
            bytes: bytes.into(),
        }
    }
}

/// A regular expression. Flags are carried verbatim in caller order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Regex {
    pub pattern: String,
    pub flags: String,
}

impl Regex {
    pub fn new(pattern: impl Into<String>, flags: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            flags: flags.into(),
        }
    }
}

/// Source code with a lexical scope document.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeWithScope {
    pub code: String,
    pub scope: Document,
}

impl CodeWithScope {
    pub fn new(code: impl Into<String>, scope: Document) -> Self {
        Self {
            code: code.into(),
            scope,
        }
    }
}

/// Replication timestamp: an ordinal within a second, and the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    pub increment: u32,
    pub seconds: u32,
}

impl Timestamp {
    pub fn new(increment: u32, seconds: u32) -> Self {
        Self { increment, seconds }
    }
}

/// Deprecated namespace/identifier pointer (wire type 0x0C).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbPointer {
    pub namespace: String,
    pub id: ObjectId,
}

/// A reference to a document in another collection.
///
/// On the wire this is an ordinary embedded document with the keys `$ref`,
/// `$id` and, when a database is set, `$db`.
#[derive(Debug, Clone, PartialEq)]
pub struct DbRef {
    pub collection: String,
    pub id: Value,
    pub database: Option<String>,
}

impl DbRef {
    pub fn new(collection: impl Into<String>, id: impl Into<Value>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
            database: None,
        }
    }

    /// Sets the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Returns the document form.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::with_capacity(3);
        doc.insert("$ref", Value::String(self.collection.clone()));
        doc.insert("$id", self.id.clone());
        if let Some(db) = &self.database {
            doc.insert("$db", Value::String(db.clone()));
        }
        doc
    }

    /// Recognizes the document form.
    ///
    /// Requires a string `$ref` and an `$id` in the first two positions, an
    /// optional string `$db` after them, and nothing else.
    pub fn from_document(doc: &Document) -> Option<DbRef> {
        let mut iter = doc.iter();
        let collection = match iter.next()? {
            (k, Value::String(s)) if k == "$ref" => s.clone(),
            _ => return None,
        };
        let id = match iter.next()? {
            (k, v) if k == "$id" => v.clone(),
            _ => return None,
        };
        let database = match iter.next() {
            None => None,
            Some((k, Value::String(s))) if k == "$db" => Some(s.clone()),
            Some(_) => return None,
        };
        if iter.next().is_some() {
            return None;
        }
        Some(DbRef {
            collection,
            id,
            database,
        })
    }
}

/// Conversion hook for host objects that are not native values.
///
/// The encoder calls [`AsBson::as_bson`] exactly once per occurrence and
/// encodes the returned value in its place. Returning `None`, or another
/// [`Value::Custom`], makes the encoder reject the object.
pub trait AsBson: Send + Sync {
    fn as_bson(&self) -> Option<Value>;

    /// Name reported in errors when the object cannot be encoded.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A shared handle to a host object carrying an [`AsBson`] hook.
///
/// Two handles are equal only if they point to the same object.
#[derive(Clone)]
pub struct Convertible(Arc<dyn AsBson>);

impl Convertible {
    pub fn new<T: AsBson + 'static>(object: T) -> Self {
        Self(Arc::new(object))
    }

    /// Runs the conversion hook.
    pub fn resolve(&self) -> Option<Value> {
        self.0.as_bson()
    }

    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }
}

impl fmt::Debug for Convertible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Convertible").field(&self.type_name()).finish()
    }
}

impl PartialEq for Convertible {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A document element value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Double(f64),
    String(String),
    Document(Document),
    Array(Vec<Value>),
    Binary(Binary),
    Undefined,
    ObjectId(ObjectId),
    Boolean(bool),
    /// Milliseconds since the Unix epoch.
    DateTime(i64),
    Null,
    Regex(Regex),
    DbPointer(DbPointer),
    /// Code without scope.
    Code(String),
    Symbol(String),
    CodeWithScope(CodeWithScope),
    Int32(i32),
    Timestamp(Timestamp),
    Int64(i64),
    MinKey,
    MaxKey,
    /// Host object resolved by the encoder; never produced by decoding.
    Custom(Convertible),
}

impl Value {
    /// Picks the smallest integer variant that holds `n` exactly.
    pub fn integer(n: i64) -> Value {
        match i32::try_from(n) {
            Ok(small) => Value::Int32(small),
            Err(_) => Value::Int64(n),
        }
    }

    /// Wraps a host object with a conversion hook.
    pub fn custom<T: AsBson + 'static>(object: T) -> Value {
        Value::Custom(Convertible::new(object))
    }

    /// Returns the element type, or `None` for [`Value::Custom`].
    ///
    /// `Int64` reports its declared type; the encoder may still narrow it.
    pub fn element_type(&self) -> Option<ElementType> {
        Some(match self {
            Value::Double(_) => ElementType::Double,
            Value::String(_) => ElementType::String,
            Value::Document(_) => ElementType::Document,
            Value::Array(_) => ElementType::Array,
            Value::Binary(_) => ElementType::Binary,
            Value::Undefined => ElementType::Undefined,
            Value::ObjectId(_) => ElementType::ObjectId,
            Value::Boolean(_) => ElementType::Boolean,
            Value::DateTime(_) => ElementType::DateTime,
            Value::Null => ElementType::Null,
            Value::Regex(_) => ElementType::Regex,
            Value::DbPointer(_) => ElementType::DbPointer,
            Value::Code(_) => ElementType::Code,
            Value::Symbol(_) => ElementType::Symbol,
            Value::CodeWithScope(_) => ElementType::CodeWithScope,
            Value::Int32(_) => ElementType::Int32,
            Value::Timestamp(_) => ElementType::Timestamp,
            Value::Int64(_) => ElementType::Int64,
            Value::MinKey => ElementType::MinKey,
            Value::MaxKey => ElementType::MaxKey,
            Value::Custom(_) => return None,
        })
    }

    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Document(_) => "document",
            Value::Array(_) => "array",
            Value::Binary(_) => "binary",
            Value::Undefined => "undefined",
            Value::ObjectId(_) => "objectId",
            Value::Boolean(_) => "bool",
            Value::DateTime(_) => "date",
            Value::Null => "null",
            Value::Regex(_) => "regex",
            Value::DbPointer(_) => "dbPointer",
            Value::Code(_) => "javascript",
            Value::Symbol(_) => "symbol",
            Value::CodeWithScope(_) => "javascriptWithScope",
            Value::Int32(_) => "int",
            Value::Timestamp(_) => "timestamp",
            Value::Int64(_) => "long",
            Value::MinKey => "minKey",
            Value::MaxKey => "maxKey",
            Value::Custom(c) => c.type_name(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns either integer variant widened to i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(n) => Some(*n as i64),
            Value::Int64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Value::ObjectId(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the reference if this is a document in reference form.
    pub fn as_db_ref(&self) -> Option<DbRef> {
        self.as_document().and_then(DbRef::from_document)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Document> for Value {
    fn from(v: Document) -> Self {
        Value::Document(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Value::ObjectId(v)
    }
}

impl From<Binary> for Value {
    fn from(v: Binary) -> Self {
        Value::Binary(v)
    }
}

impl From<Regex> for Value {
    fn from(v: Regex) -> Self {
        Value::Regex(v)
    }
}

impl From<CodeWithScope> for Value {
    fn from(v: CodeWithScope) -> Self {
        Value::CodeWithScope(v)
    }
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DbPointer> for Value {
    fn from(v: DbPointer) -> Self {
        Value::DbPointer(v)
    }
}

impl From<DbRef> for Value {
    fn from(v: DbRef) -> Self {
        Value::Document(v.to_document())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_from_u8() {
        for code in 0u8..=255 {
            if let Some(t) = ElementType::from_u8(code) {
                assert_eq!(t as u8, code);
            }
        }
        assert_eq!(ElementType::from_u8(0x00), None);
        assert_eq!(ElementType::from_u8(0x13), None);
        assert_eq!(ElementType::from_u8(0x69), None);
        assert_eq!(ElementType::from_u8(0x7F), Some(ElementType::MaxKey));
        assert_eq!(ElementType::from_u8(0xFF), Some(ElementType::MinKey));
    }

    #[test]
    fn test_binary_subtype_total() {
        for v in 0u8..=255 {
            assert_eq!(BinarySubtype::from_u8(v).to_u8(), v);
        }
        assert_eq!(BinarySubtype::from_u8(2), BinarySubtype::ByteArray);
        assert_eq!(BinarySubtype::from_u8(9), BinarySubtype::Reserved(9));
        assert_eq!(BinarySubtype::from_u8(128), BinarySubtype::UserDefined(128));
    }

    #[test]
    fn test_integer_picks_smallest() {
        assert_eq!(Value::integer(1), Value::Int32(1));
        assert_eq!(Value::integer(i32::MIN as i64), Value::Int32(i32::MIN));
        assert_eq!(Value::integer(2147483649), Value::Int64(2147483649));
        assert_eq!(Value::integer(-2147483649), Value::Int64(-2147483649));
    }

    #[test]
    fn test_db_ref_document_form() {
        let id = ObjectId::parse_str("123456789012345678901234").unwrap();
        let r = DbRef::new("foo", id);
        let doc = r.to_document();
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["$ref", "$id"]);
        assert_eq!(DbRef::from_document(&doc), Some(r.clone()));

        let with_db = r.database("admin");
        let doc = with_db.to_document();
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["$ref", "$id", "$db"]);
        assert_eq!(Value::from(with_db.clone()).as_db_ref(), Some(with_db));
    }

    #[test]
    fn test_db_ref_rejects_other_shapes() {
        let mut doc = Document::new();
        doc.insert("$id", 1);
        doc.insert("$ref", "foo");
        assert_eq!(DbRef::from_document(&doc), None);

        let mut doc = Document::new();
        doc.insert("$ref", "foo");
        doc.insert("$id", 1);
        doc.insert("extra", true);
        assert_eq!(DbRef::from_document(&doc), None);
    }

    struct Point {
        x: i32,
        y: i32,
    }

    impl AsBson for Point {
        fn as_bson(&self) -> Option<Value> {
            let mut doc = Document::new();
            doc.insert("x", self.x);
            doc.insert("y", self.y);
            Some(Value::Document(doc))
        }
    }

    #[test]
    fn test_convertible_identity_equality() {
        let a = Convertible::new(Point { x: 1, y: 2 });
        let b = a.clone();
        let c = Convertible::new(Point { x: 1, y: 2 });
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.type_name().ends_with("Point"));
        assert!(format!("{:?}", a).contains("Point"));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int32(5).as_i64(), Some(5));
        assert_eq!(Value::Int64(5).as_i32(), None);
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert!(Value::Null.is_null());
        assert_eq!(Value::custom(Point { x: 0, y: 0 }).element_type(), None);
        assert_eq!(Value::MinKey.element_type(), Some(ElementType::MinKey));
    }
}

//! PDF value model.
//!
//! A closed set of variants covers every value the decoder can produce.
//! Names are kept as raw tokens (with their leading `/`) and dictionary keys
//! carry that slash too, so `/Type` is looked up as `"/Type"`.

use std::collections::HashMap;
use std::fmt;

/// Dictionary of name keys (including the leading `/`) to values.
pub type Dictionary = HashMap<String, Value>;

/// An unclassified lexical atom as produced by the token reader.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(Vec<u8>);

impl Token {
    /// Create a token from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw bytes of the token.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Token text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// Check whether the token is exactly `literal`.
    pub fn is(&self, literal: &[u8]) -> bool {
        self.0 == literal
    }

    /// Whether this token is a name (starts with `/`).
    pub fn is_name(&self) -> bool {
        self.0.first() == Some(&b'/')
    }

    /// Length of the token in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the token is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32, gen: u16) -> Self {
        Self { id, gen }
    }

    /// Build a reference from two decoded integers, rejecting values that do
    /// not fit an object number or generation.
    pub fn from_numbers(id: i64, gen: i64) -> Option<Self> {
        Some(Self {
            id: u32::try_from(id).ok()?,
            gen: u16::try_from(gen).ok()?,
        })
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

/// A decoded PDF value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Numeric(i64),
    /// Real (floating-point) value
    Real(f64),
    /// Literal string bytes, escapes already decoded
    String(Vec<u8>),
    /// Hexadecimal string, decoded to binary
    Hex(Vec<u8>),
    /// Array of values
    Array(Vec<Value>),
    /// Dictionary (name -> value)
    Dictionary(Dictionary),
    /// Indirect reference (`N G R`) or object header (`N G obj`)
    ObjectRef(ObjectRef),
    /// A `stream` keyword was seen; the body is not decoded
    Stream,
    /// Unclassified token: names, `endobj`, `>>`, `]` and other keywords
    Token(Token),
}

impl Value {
    /// Get the type name of this value (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Boolean(_) => "Boolean",
            Value::Numeric(_) => "Numeric",
            Value::Real(_) => "Real",
            Value::String(_) => "String",
            Value::Hex(_) => "Hex",
            Value::Array(_) => "Array",
            Value::Dictionary(_) => "Dictionary",
            Value::ObjectRef(_) => "ObjectRef",
            Value::Stream => "Stream",
            Value::Token(_) => "Token",
        }
    }

    /// Try to cast to dictionary.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Value::ObjectRef(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Numeric(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value of an integer or real.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Numeric(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Name text including the leading `/`.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Value::Token(t) if t.is_name() => t.as_str(),
            _ => None,
        }
    }

    /// Check if value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if value is exactly the unclassified token `literal`.
    pub fn is_token(&self, literal: &[u8]) -> bool {
        matches!(self, Value::Token(t) if t.is(literal))
    }
}

/// One decoded indirect object: header numbers plus the values found
/// between `obj` and `endobj`.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDeclaration {
    /// Object number and generation from the header
    pub reference: ObjectRef,
    /// Values in declaration order (one in well-formed files)
    pub values: Vec<Value>,
}

impl ObjectDeclaration {
    /// Create an empty declaration for `reference`.
    pub fn new(reference: ObjectRef) -> Self {
        Self {
            reference,
            values: Vec::with_capacity(2),
        }
    }

    /// First value of the object.
    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }

    /// First value, if it is a dictionary.
    pub fn dictionary(&self) -> Option<&Dictionary> {
        self.first().and_then(Value::as_dict)
    }

    /// Consume the declaration and return its first value as a dictionary.
    pub fn into_dictionary(self) -> Option<Dictionary> {
        match self.values.into_iter().next() {
            Some(Value::Dictionary(d)) => Some(d),
            _ => None,
        }
    }

    /// First value, if it is an array.
    pub fn array(&self) -> Option<&[Value]> {
        self.first().and_then(Value::as_array)
    }
}

//! Typed in-memory values and their JSON projection
//!
//! [`Value`] is the object graph that the structural codecs produce on decode
//! and consume on encode. Leaf variants correspond one-to-one with the
//! built-in ABI types; compound variants mirror the ABI type constructors.

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value as Json};

use crate::asset::{Asset, Symbol};
use crate::builder::PagedBuilder;
use crate::hexstring::util::hex_of_bytes;
use crate::int::Integer;
use crate::name::Name;

/// Caller-defined value that knows its ABI type and how to write itself
///
/// The binary codec defers to [`write_abi`](AbiObject::write_abi) when the
/// type at the current position has no built-in binary capability, after
/// checking that [`abi_type`](AbiObject::abi_type) names that type.
pub trait AbiObject: Debug + Send + Sync {
    /// Name of the ABI type this value is an instance of
    fn abi_type(&self) -> &str;

    /// Appends the binary form of this value, returning the number of bytes written
    fn write_abi(&self, buf: &mut PagedBuilder) -> usize;

    fn to_json(&self) -> Json;
}

/// Struct instance: the name of its ABI type and its fields, in wire order
///
/// Base fields come first, as they are laid out on the wire. Equality
/// compares fields by name, regardless of their order.
#[derive(Clone, Debug, Default)]
pub struct Struct {
    name: String,
    fields: Vec<(String, Value)>,
}

impl Struct {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder-style field append
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(field, value);
        self
    }

    /// Sets `field`, replacing an earlier value of the same name in place
    pub fn push(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find_map(|(name, value)| (name == field).then_some(value))
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl PartialEq for Struct {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .all(|(name, value)| other.get(name) == Some(value))
    }
}

#[derive(Clone, Debug)]
pub enum Value {
    /// Absent optional value
    Null,
    Bool(bool),
    Int(Integer),
    Float32(f32),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Name(Name),
    Symbol(Symbol),
    Asset(Asset),
    Array(Vec<Value>),
    Struct(Struct),
    /// Variant branch, tagged with the branch type name
    Variant(String, Box<Value>),
    /// Opaque value of the `any` type, never validated
    Unvalidated(Json),
    Object(Arc<dyn AbiObject>),
}

impl Value {
    /// Canonical JSON projection
    ///
    /// Integers of at most 32 bits and floats are numbers, wider integers
    /// are decimal strings, bytes are lowercase hex, and variants are
    /// `[tag, value]` pairs.
    #[must_use]
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => i.to_json(),
            Value::Float32(x) => Json::from(f64::from(*x)),
            Value::Float64(x) => Json::from(*x),
            Value::String(s) => Json::String(s.clone()),
            Value::Bytes(bytes) => Json::String(hex_of_bytes(bytes)),
            Value::Name(n) => Json::String(n.to_string()),
            Value::Symbol(s) => Json::String(s.to_string()),
            Value::Asset(a) => Json::String(a.to_string()),
            Value::Array(elems) => Json::Array(elems.iter().map(Value::to_json).collect()),
            Value::Struct(s) => Json::Object(
                s.fields()
                    .map(|(name, value)| (name.to_owned(), value.to_json()))
                    .collect::<Map<String, Json>>(),
            ),
            Value::Variant(tag, value) => Json::Array(vec![Json::String(tag.clone()), value.to_json()]),
            Value::Unvalidated(json) => json.clone(),
            Value::Object(obj) => obj.to_json(),
        }
    }

    /// Name of the ABI type this value is unambiguously an instance of
    ///
    /// Arrays, `Null`, variants and opaque values carry no such name.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Value::Bool(_) => Some("bool"),
            Value::Int(i) => Some(i.kind().abi_name()),
            Value::Float32(_) => Some("float32"),
            Value::Float64(_) => Some("float64"),
            Value::String(_) => Some("string"),
            Value::Bytes(_) => Some("bytes"),
            Value::Name(_) => Some("name"),
            Value::Symbol(_) => Some("symbol"),
            Value::Asset(_) => Some("asset"),
            Value::Struct(s) => Some(s.name()),
            Value::Object(obj) => Some(obj.abi_type()),
            Value::Null | Value::Array(_) | Value::Variant(..) | Value::Unvalidated(_) => None,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(elems) => Some(elems),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float32(a), Value::Float32(b)) => a.to_bits() == b.to_bits(),
            (Value::Float64(a), Value::Float64(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Name(a), Value::Name(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Asset(a), Value::Asset(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::Variant(ta, a), Value::Variant(tb, b)) => ta == tb && a == b,
            (Value::Unvalidated(a), Value::Unvalidated(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                a.abi_type() == b.abi_type() && a.to_json() == b.to_json()
            }
            _ => false,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

macro_rules! impl_from {
    ( $( $src:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$src> for Value {
                fn from(v: $src) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from!(
    bool => Bool,
    Integer => Int,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    u64 => Int,
    f32 => Float32,
    f64 => Float64,
    String => String,
    &str => String,
    Name => Name,
    Symbol => Symbol,
    Asset => Asset,
    Vec<Value> => Array,
    Struct => Struct,
);

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

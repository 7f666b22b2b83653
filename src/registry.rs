//! Type descriptors and the per-call type registry
//!
//! A [`TypeDescriptor`] names a type and states what it can do: construct a
//! typed [`Value`] from JSON, read and write its binary form, produce a
//! default value, and declare its own shape for schema synthesis. Every
//! descriptor is a `&'static dyn TypeDescriptor`: built-in leaves are the
//! statics in [`builtins`], and caller types are statically declared tables
//! ([`StructType`], [`VariantType`], [`AliasType`]) or their own impls.
//!
//! A [`Registry`] is built for each call from the immutable built-in table,
//! overlaid with the descriptors supplied by the caller.

use std::collections::HashMap;
use std::fmt::Debug;
use std::str::FromStr;

use lazy_static::lazy_static;
use log::debug;
use serde_json::Value as Json;

use crate::asset::{Asset, Symbol};
use crate::builder::PagedBuilder;
use crate::conv::{Decode, Encode};
use crate::error::ValueError;
use crate::hexstring::util::bytes_of_hex;
use crate::int::{IntKind, Integer};
use crate::name::Name;
use crate::parse::{ParseResult, Parser, SliceParser};
use crate::value::Value;

/// Binary read and write capability of a leaf type
pub trait BinaryCodec: Send + Sync {
    fn read(&self, p: &mut SliceParser<'_>) -> ParseResult<Value>;

    /// Appends the binary form of `value`, returning the number of bytes written
    fn write(&self, value: &Value, buf: &mut PagedBuilder) -> Result<usize, ValueError>;

    /// Fewest bytes any value of this type occupies
    fn min_width(&self) -> usize {
        1
    }
}

/// Named type and its capabilities
pub trait TypeDescriptor: Send + Sync {
    /// Name under which the type is registered and referenced in schemas
    fn abi_name(&self) -> &str;

    /// Constructs a typed value from its JSON projection
    ///
    /// Only called for descriptors without a [`shape`](TypeDescriptor::shape).
    fn construct(&self, json: &Json) -> Result<Value, ValueError> {
        Err(ValueError::mismatch("structured value", json))
    }

    fn binary(&self) -> Option<&dyn BinaryCodec> {
        None
    }

    /// Value taken by a binary-extension field of this type that is absent from the input
    fn default_value(&self) -> Option<Value> {
        None
    }

    /// Declared structure, for types that are not leaves
    fn shape(&self) -> Option<Shape> {
        None
    }
}

impl Debug for dyn TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TypeDescriptor({})", self.abi_name())
    }
}

/// Identity of a descriptor, independent of its name
#[must_use]
pub fn descriptor_addr(d: &dyn TypeDescriptor) -> *const () {
    d as *const dyn TypeDescriptor as *const ()
}

/// Reference to a type from a field, branch or alias, with its suffix markers
#[derive(Clone, Copy)]
pub struct TypeRef {
    pub descriptor: &'static dyn TypeDescriptor,
    pub is_array: bool,
    pub is_optional: bool,
    pub is_extension: bool,
}

impl TypeRef {
    #[must_use]
    pub const fn new(descriptor: &'static dyn TypeDescriptor) -> Self {
        Self {
            descriptor,
            is_array: false,
            is_optional: false,
            is_extension: false,
        }
    }

    #[must_use]
    pub const fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    #[must_use]
    pub const fn extension(mut self) -> Self {
        self.is_extension = true;
        self
    }

    /// Full type string, e.g. `string[]?`
    #[must_use]
    pub fn type_name(&self) -> String {
        let mut name = self.descriptor.abi_name().to_owned();
        if self.is_array {
            name.push_str("[]");
        }
        if self.is_optional {
            name.push('?');
        }
        if self.is_extension {
            name.push('$');
        }
        name
    }
}

impl Debug for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.type_name())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Field {
    pub name: &'static str,
    pub ty: TypeRef,
}

/// Declared structure of a non-leaf descriptor
#[derive(Clone, Copy, Debug)]
pub enum Shape {
    Struct {
        base: Option<&'static dyn TypeDescriptor>,
        fields: &'static [Field],
    },
    Variant(&'static [TypeRef]),
    Alias(TypeRef),
}

/// Statically declared struct type
#[derive(Debug)]
pub struct StructType {
    pub name: &'static str,
    pub base: Option<&'static dyn TypeDescriptor>,
    pub fields: &'static [Field],
}

impl TypeDescriptor for StructType {
    fn abi_name(&self) -> &str {
        self.name
    }

    fn shape(&self) -> Option<Shape> {
        Some(Shape::Struct {
            base: self.base,
            fields: self.fields,
        })
    }
}

/// Statically declared tagged union
#[derive(Debug)]
pub struct VariantType {
    pub name: &'static str,
    pub branches: &'static [TypeRef],
}

impl TypeDescriptor for VariantType {
    fn abi_name(&self) -> &str {
        self.name
    }

    fn shape(&self) -> Option<Shape> {
        Some(Shape::Variant(self.branches))
    }
}

/// Statically declared alias
#[derive(Debug)]
pub struct AliasType {
    pub name: &'static str,
    pub target: TypeRef,
}

impl TypeDescriptor for AliasType {
    fn abi_name(&self) -> &str {
        self.name
    }

    fn shape(&self) -> Option<Shape> {
        Some(Shape::Alias(self.target))
    }
}

/// Built-in leaf type with a binary layout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    Bool,
    Int(IntKind),
    Float32,
    Float64,
    String,
    Bytes,
    Name,
    Symbol,
    Asset,
}

fn parse_text<T: FromStr<Err = ValueError>>(what: &'static str, json: &Json) -> Result<T, ValueError> {
    match json {
        Json::String(s) => s.parse(),
        other => Err(ValueError::mismatch(what, other)),
    }
}

fn float_of_json(what: &'static str, json: &Json) -> Result<f64, ValueError> {
    match json {
        Json::Number(n) => n.as_f64().ok_or_else(|| ValueError::invalid(what, n.to_string())),
        Json::String(s) => s.trim().parse().map_err(|_| ValueError::invalid(what, s.as_str())),
        other => Err(ValueError::mismatch(what, other)),
    }
}

fn bytes_of_json(json: &Json) -> Result<Vec<u8>, ValueError> {
    match json {
        Json::String(s) => Ok(bytes_of_hex(s)?),
        Json::Array(elems) => elems
            .iter()
            .map(|elem| {
                elem.as_u64()
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or_else(|| ValueError::invalid("byte", elem.to_string()))
            })
            .collect(),
        other => Err(ValueError::mismatch("bytes", other)),
    }
}

impl TypeDescriptor for Builtin {
    fn abi_name(&self) -> &str {
        match self {
            Builtin::Bool => "bool",
            Builtin::Int(kind) => kind.abi_name(),
            Builtin::Float32 => "float32",
            Builtin::Float64 => "float64",
            Builtin::String => "string",
            Builtin::Bytes => "bytes",
            Builtin::Name => "name",
            Builtin::Symbol => "symbol",
            Builtin::Asset => "asset",
        }
    }

    fn construct(&self, json: &Json) -> Result<Value, ValueError> {
        match self {
            Builtin::Bool => match json {
                Json::Bool(b) => Ok(Value::Bool(*b)),
                other => Err(ValueError::mismatch("bool", other)),
            },
            Builtin::Int(kind) => Integer::from_json(*kind, json).map(Value::Int),
            Builtin::Float32 => float_of_json("float32", json).map(|x| Value::Float32(x as f32)),
            Builtin::Float64 => float_of_json("float64", json).map(Value::Float64),
            Builtin::String => match json {
                Json::String(s) => Ok(Value::String(s.clone())),
                other => Err(ValueError::mismatch("string", other)),
            },
            Builtin::Bytes => bytes_of_json(json).map(Value::Bytes),
            Builtin::Name => parse_text::<Name>("name", json).map(Value::Name),
            Builtin::Symbol => parse_text::<Symbol>("symbol", json).map(Value::Symbol),
            Builtin::Asset => parse_text::<Asset>("asset", json).map(Value::Asset),
        }
    }

    fn binary(&self) -> Option<&dyn BinaryCodec> {
        Some(self)
    }

    fn default_value(&self) -> Option<Value> {
        Some(match self {
            Builtin::Bool => Value::Bool(false),
            Builtin::Int(kind) => Value::Int(Integer::zero(*kind)),
            Builtin::Float32 => Value::Float32(0.0),
            Builtin::Float64 => Value::Float64(0.0),
            Builtin::String => Value::String(String::new()),
            Builtin::Bytes => Value::Bytes(Vec::new()),
            Builtin::Name => Value::Name(Name::default()),
            Builtin::Symbol => Value::Symbol(Symbol::default()),
            Builtin::Asset => Value::Asset(Asset::default()),
        })
    }
}

impl BinaryCodec for Builtin {
    fn read(&self, p: &mut SliceParser<'_>) -> ParseResult<Value> {
        Ok(match self {
            Builtin::Bool => Value::Bool(p.take_bool()?),
            Builtin::Int(kind) => Value::Int(Integer::read(*kind, p)?),
            Builtin::Float32 => Value::Float32(p.take_f32()?),
            Builtin::Float64 => Value::Float64(p.take_f64()?),
            Builtin::String => Value::String(p.take_string()?),
            Builtin::Bytes => Value::Bytes(p.take_bytes()?),
            Builtin::Name => Value::Name(Name::parse(p)?),
            Builtin::Symbol => Value::Symbol(Symbol::parse(p)?),
            Builtin::Asset => Value::Asset(Asset::parse(p)?),
        })
    }

    fn write(&self, value: &Value, buf: &mut PagedBuilder) -> Result<usize, ValueError> {
        Ok(match (self, value) {
            (Builtin::Bool, Value::Bool(b)) => b.write_to(buf),
            (Builtin::Int(kind), Value::Int(i)) if i.kind() == *kind => i.write_to(buf),
            (Builtin::Int(kind), Value::Int(i)) => i.cast(*kind)?.write_to(buf),
            (Builtin::Float32, Value::Float32(x)) => x.write_to(buf),
            (Builtin::Float64, Value::Float64(x)) => x.write_to(buf),
            (Builtin::String, Value::String(s)) => s.write_to(buf),
            (Builtin::Bytes, Value::Bytes(bytes)) => bytes.write_to(buf),
            (Builtin::Name, Value::Name(n)) => n.write_to(buf),
            (Builtin::Symbol, Value::Symbol(s)) => s.write_to(buf),
            (Builtin::Asset, Value::Asset(a)) => a.write_to(buf),
            // typed value of another kind: coerce through its JSON projection
            _ => {
                let coerced = self.construct(&value.to_json())?;
                return self.write(&coerced, buf);
            }
        })
    }

    fn min_width(&self) -> usize {
        match self {
            Builtin::Int(IntKind::VarInt32 | IntKind::VarUint32) => 1,
            Builtin::Int(kind) => kind.bits() as usize / 8,
            Builtin::Float32 => 4,
            Builtin::Float64 | Builtin::Name | Builtin::Symbol => 8,
            Builtin::Asset => 16,
            Builtin::Bool | Builtin::String | Builtin::Bytes => 1,
        }
    }
}

/// Opaque leaf whose values are passed through unvalidated
///
/// Has no binary layout.
#[derive(Debug)]
pub struct AnyType;

impl TypeDescriptor for AnyType {
    fn abi_name(&self) -> &str {
        "any"
    }

    fn construct(&self, json: &Json) -> Result<Value, ValueError> {
        Ok(Value::Unvalidated(json.clone()))
    }

    fn default_value(&self) -> Option<Value> {
        Some(Value::Unvalidated(Json::Null))
    }
}

/// Descriptors of the built-in types
pub mod builtins {
    use super::{AnyType, Builtin};
    use crate::int::IntKind;

    pub static BOOL: Builtin = Builtin::Bool;
    pub static INT8: Builtin = Builtin::Int(IntKind::Int8);
    pub static INT16: Builtin = Builtin::Int(IntKind::Int16);
    pub static INT32: Builtin = Builtin::Int(IntKind::Int32);
    pub static INT64: Builtin = Builtin::Int(IntKind::Int64);
    pub static INT128: Builtin = Builtin::Int(IntKind::Int128);
    pub static UINT8: Builtin = Builtin::Int(IntKind::Uint8);
    pub static UINT16: Builtin = Builtin::Int(IntKind::Uint16);
    pub static UINT32: Builtin = Builtin::Int(IntKind::Uint32);
    pub static UINT64: Builtin = Builtin::Int(IntKind::Uint64);
    pub static UINT128: Builtin = Builtin::Int(IntKind::Uint128);
    pub static VARINT32: Builtin = Builtin::Int(IntKind::VarInt32);
    pub static VARUINT32: Builtin = Builtin::Int(IntKind::VarUint32);
    pub static FLOAT32: Builtin = Builtin::Float32;
    pub static FLOAT64: Builtin = Builtin::Float64;
    pub static STRING: Builtin = Builtin::String;
    pub static BYTES: Builtin = Builtin::Bytes;
    pub static NAME: Builtin = Builtin::Name;
    pub static SYMBOL: Builtin = Builtin::Symbol;
    pub static ASSET: Builtin = Builtin::Asset;
    pub static ANY: AnyType = AnyType;
}

lazy_static! {
    static ref BUILTINS: HashMap<&'static str, &'static dyn TypeDescriptor> = {
        use builtins::*;
        let all: [&'static dyn TypeDescriptor; 21] = [
            &BOOL, &INT8, &INT16, &INT32, &INT64, &INT128, &UINT8, &UINT16, &UINT32, &UINT64,
            &UINT128, &VARINT32, &VARUINT32, &FLOAT32, &FLOAT64, &STRING, &BYTES, &NAME,
            &SYMBOL, &ASSET, &ANY,
        ];
        all.into_iter().map(|d| (d.abi_name(), d)).collect()
    };
}

/// Descriptors visible to a single call: the built-ins, overlaid with the
/// caller's descriptors
#[derive(Clone, Debug)]
pub struct Registry {
    table: HashMap<&'static str, &'static dyn TypeDescriptor>,
}

impl Registry {
    /// Registry holding only the built-in types
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            table: BUILTINS.clone(),
        }
    }

    /// Built-ins overlaid with `extra`, later descriptors replacing earlier ones of the same name
    #[must_use]
    pub fn new(extra: &[&'static dyn TypeDescriptor]) -> Self {
        let mut registry = Self::builtin();
        for &descriptor in extra {
            registry.register(descriptor);
        }
        registry
    }

    pub fn register(&mut self, descriptor: &'static dyn TypeDescriptor) {
        let name = descriptor.abi_name();
        if let Some(prev) = self.table.insert(name, descriptor) {
            if descriptor_addr(prev) != descriptor_addr(descriptor) && Self::is_builtin(name) {
                debug!("caller descriptor overrides built-in type `{name}`");
            }
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'static dyn TypeDescriptor> {
        self.table.get(name).copied()
    }

    #[must_use]
    pub fn is_builtin(name: &str) -> bool {
        BUILTINS.contains_key(name)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Builder;
    use serde_json::json;

    fn write_hex(d: &dyn TypeDescriptor, v: &Value) -> Result<String, ValueError> {
        let mut buf = PagedBuilder::new();
        d.binary().unwrap().write(v, &mut buf)?;
        Ok(buf.into_hex())
    }

    #[test]
    fn builtin_table() {
        let registry = Registry::builtin();
        for name in [
            "bool", "int8", "int16", "int32", "int64", "int128", "uint8", "uint16", "uint32",
            "uint64", "uint128", "varint32", "varuint32", "float32", "float64", "string",
            "bytes", "name", "symbol", "asset", "any",
        ] {
            assert_eq!(registry.get(name).map(|d| d.abi_name()), Some(name));
        }
        assert!(registry.get("foo").is_none());
        assert!(registry.get("any").unwrap().binary().is_none());
        assert!(Registry::is_builtin("varuint32"));
        assert!(!Registry::is_builtin("string[]"));
        assert!(!Registry::is_builtin("foo"));
    }

    #[test]
    fn construct_leaves() {
        assert_eq!(builtins::BOOL.construct(&json!(true)), Ok(Value::Bool(true)));
        assert!(builtins::BOOL.construct(&json!(1)).is_err());
        assert_eq!(
            builtins::BYTES.construct(&json!("dead")),
            Ok(Value::Bytes(vec![0xde, 0xad]))
        );
        assert_eq!(
            builtins::BYTES.construct(&json!([1, 2])),
            Ok(Value::Bytes(vec![1, 2]))
        );
        assert_eq!(
            builtins::NAME.construct(&json!("two")),
            Ok(Value::Name("two".parse().unwrap()))
        );
        assert_eq!(
            builtins::ANY.construct(&json!({"k": [1]})),
            Ok(Value::Unvalidated(json!({"k": [1]})))
        );
        assert!(builtins::UINT8.construct(&json!(-1)).is_err());
    }

    #[test]
    fn write_coerces() {
        assert_eq!(write_hex(&builtins::INT8, &Value::from(2u64)), Ok("02".into()));
        assert_eq!(
            write_hex(&builtins::NAME, &Value::from("two")),
            Ok("00000000000028cf".into())
        );
        assert!(write_hex(&builtins::UINT8, &Value::from(300u16)).is_err());
        assert!(write_hex(&builtins::STRING, &Value::from(1u8)).is_err());
    }

    #[test]
    fn override_builtin() {
        static MY_STRING: AliasType = AliasType {
            name: "string",
            target: TypeRef::new(&builtins::BYTES),
        };
        let registry = Registry::new(&[&MY_STRING]);
        let d = registry.get("string").unwrap();
        assert_eq!(descriptor_addr(d), descriptor_addr(&MY_STRING));
        assert!(descriptor_addr(Registry::builtin().get("string").unwrap()) != descriptor_addr(d));
    }

    #[test]
    fn leaf_widths() {
        let width = |d: &dyn TypeDescriptor| d.binary().map(|codec| codec.min_width());
        assert_eq!(width(&builtins::UINT128), Some(16));
        assert_eq!(width(&builtins::INT8), Some(1));
        assert_eq!(width(&builtins::VARUINT32), Some(1));
        assert_eq!(width(&builtins::ASSET), Some(16));
        assert_eq!(width(&builtins::STRING), Some(1));
    }

    #[test]
    fn type_ref_names() {
        let r = TypeRef::new(&builtins::STRING).array().optional();
        assert_eq!(r.type_name(), "string[]?");
        assert_eq!(TypeRef::new(&builtins::INT8).extension().type_name(), "int8$");
    }
}

//! Call-level entry points
//!
//! [`encode`] and [`decode`] each build their collaborators fresh for the
//! call: the schema document (loaded from [`CallOptions::abi`], or
//! synthesized from a descriptor when none is given), a [`Registry`] with the
//! caller's descriptors overlaid on the built-ins, and the [`TypeGraph`] of
//! the target type. Nothing is cached between calls.

use std::borrow::Cow;

use log::debug;
use serde_json::Value as Json;

use crate::builder::{Builder, PagedBuilder};
use crate::codec::path::CodingPath;
use crate::codec::Codec;
use crate::error::{AbiError, ErrorKind};
use crate::hexstring::HexString;
use crate::parse::SliceParser;
use crate::registry::{Registry, TypeDescriptor};
use crate::schema::{Abi, AbiSource, TypeGraph, TypeId};
use crate::synth::ROOT_ALIAS;
use crate::value::Value;

pub use crate::synth::{synthesize, Synthesized};

/// Target type of a call
#[derive(Clone, Copy, Debug)]
pub enum TypeSpec<'a> {
    /// Type name, resolved against the call's schema and registry
    Name(&'a str),
    /// Descriptor, registered for the call and used to synthesize a schema
    /// when none is supplied
    Descriptor(&'static dyn TypeDescriptor),
}

impl<'a> From<&'a str> for TypeSpec<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl From<&'static dyn TypeDescriptor> for TypeSpec<'_> {
    fn from(descriptor: &'static dyn TypeDescriptor) -> Self {
        Self::Descriptor(descriptor)
    }
}

/// Value to be encoded
#[derive(Clone, Copy, Debug)]
pub enum Source<'a> {
    Typed(&'a Value),
    Json(&'a Json),
}

impl<'a> From<&'a Value> for Source<'a> {
    fn from(value: &'a Value) -> Self {
        Self::Typed(value)
    }
}

impl<'a> From<&'a Json> for Source<'a> {
    fn from(json: &'a Json) -> Self {
        Self::Json(json)
    }
}

/// Data to be decoded
#[derive(Clone, Copy, Debug)]
pub enum Input<'a> {
    Binary(&'a [u8]),
    /// Binary data in hex-encoded form
    Hex(&'a str),
    Json(&'a Json),
}

#[derive(Clone, Debug, Default)]
pub struct CallOptions<'a> {
    pub abi: Option<AbiSource>,
    /// Descriptors overlaid on the built-ins for this call
    pub types: &'a [&'static dyn TypeDescriptor],
}

impl<'a> CallOptions<'a> {
    #[must_use]
    pub fn with_abi(abi: impl Into<AbiSource>) -> Self {
        Self {
            abi: Some(abi.into()),
            types: &[],
        }
    }

    #[must_use]
    pub fn types(mut self, types: &'a [&'static dyn TypeDescriptor]) -> Self {
        self.types = types;
        self
    }
}

/// Per-call schema, registry and root type graph
struct Prepared {
    registry: Registry,
    graph: TypeGraph,
    root: String,
}

impl Prepared {
    fn new(spec: TypeSpec<'_>, options: CallOptions<'_>) -> Result<Self, AbiError> {
        let mut registry = Registry::builtin();
        let (abi, root) = match (options.abi, spec) {
            (Some(source), TypeSpec::Name(name)) => (source.load()?, name.to_owned()),
            (Some(source), TypeSpec::Descriptor(descriptor)) => {
                registry.register(descriptor);
                (source.load()?, descriptor.abi_name().to_owned())
            }
            (None, TypeSpec::Descriptor(descriptor)) => {
                let synthesized = synthesize(descriptor);
                for &ty in &synthesized.types {
                    registry.register(ty);
                }
                (synthesized.abi, ROOT_ALIAS.to_owned())
            }
            (None, TypeSpec::Name(name)) => (Abi::new(), name.to_owned()),
        };
        for &ty in options.types {
            registry.register(ty);
        }
        let graph = abi.resolve(&root);
        debug!(
            "prepared call for `{root}`: {} schema nodes",
            graph.len()
        );
        Ok(Self {
            registry,
            graph,
            root,
        })
    }

    fn codec(&self) -> Codec<'_> {
        Codec::new(&self.graph, &self.registry)
    }
}

/// Encodes `source` into its binary form
///
/// When `type_spec` is `None`, the type is taken from a typed source value;
/// untyped JSON, arrays and `null` carry no type and fail with
/// [`ErrorKind::AmbiguousSourceType`].
pub fn encode<'a>(
    source: impl Into<Source<'a>>,
    type_spec: Option<TypeSpec<'a>>,
    options: CallOptions<'_>,
) -> Result<Vec<u8>, AbiError> {
    let source = source.into();
    let spec = match (type_spec, source) {
        (Some(spec), _) => spec,
        (None, Source::Typed(value)) => match value.type_name() {
            Some(name) => TypeSpec::Name(name),
            None => {
                return Err(AbiError::new(
                    ErrorKind::AmbiguousSourceType,
                    &CodingPath::default(),
                    "cannot infer a type for the source value",
                ))
            }
        },
        (None, Source::Json(_)) => {
            return Err(AbiError::new(
                ErrorKind::AmbiguousSourceType,
                &CodingPath::default(),
                "untyped JSON source requires an explicit type",
            ))
        }
    };
    let prepared = Prepared::new(spec, options)?;
    let codec = prepared.codec();
    let mut path = CodingPath::root(&prepared.root);
    let value = match source {
        Source::Typed(value) => Cow::Borrowed(value),
        Source::Json(json) => Cow::Owned(codec.construct(TypeId(0), Some(json), &mut path)?),
    };
    let mut buf = PagedBuilder::new();
    codec.write(TypeId(0), &value, &mut buf, &mut path)?;
    Ok(buf.into_vec())
}

/// Decodes `input` as a typed value of `type_spec`
///
/// Binary and hex input go through the binary codec; JSON input through
/// the object codec.
pub fn decode<'a>(
    input: Input<'_>,
    type_spec: impl Into<TypeSpec<'a>>,
    options: CallOptions<'_>,
) -> Result<Value, AbiError> {
    let prepared = Prepared::new(type_spec.into(), options)?;
    let codec = prepared.codec();
    let mut path = CodingPath::root(&prepared.root);
    match input {
        Input::Binary(bytes) => read_all(&codec, bytes, &mut path),
        Input::Hex(hex) => {
            let bytes = HexString::from_hex(hex).map_err(|e| {
                AbiError::non_conforming(&path, format!("invalid hex input: {e}")).with_source(e)
            })?;
            read_all(&codec, bytes.as_bytes(), &mut path)
        }
        Input::Json(json) => codec.construct(TypeId(0), Some(json), &mut path),
    }
}

fn read_all(codec: &Codec<'_>, bytes: &[u8], path: &mut CodingPath) -> Result<Value, AbiError> {
    let mut p = SliceParser::new(bytes);
    let value = codec.read(TypeId(0), &mut p, path)?;
    cfg_if::cfg_if! {
        if #[cfg(feature = "check_complete_parse")] {
            if !p.is_exhausted() {
                return Err(AbiError::non_conforming(
                    path,
                    format!("{} trailing bytes left unconsumed after decoding", crate::parse::Parser::remainder(&p)),
                ));
            }
        }
    }
    Ok(value)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ValueError;
    use crate::parse::{ParseResult, Parser};
    use crate::registry::{builtins, AliasType, BinaryCodec, Field, StructType, TypeRef};
    use crate::value::{AbiObject, Struct};
    use crate::{hex, Encode};
    use serde_json::json;
    use std::sync::Arc;

    const FOO_BAR: &str = r#"{
        "version": "eosio::abi/1.1",
        "types": [
            {"new_type_name": "a", "type": "a"},
            {"new_type_name": "b1", "type": "b2"},
            {"new_type_name": "b2", "type": "b1"},
            {"new_type_name": "u1", "type": "u2"},
            {"new_type_name": "u2", "type": "uint32"}
        ],
        "structs": [
            {"name": "foo", "base": "", "fields": [
                {"name": "one", "type": "string"},
                {"name": "two", "type": "int8"}
            ]},
            {"name": "bar", "base": "foo", "fields": [
                {"name": "three", "type": "name?"},
                {"name": "four", "type": "string[]?"}
            ]},
            {"name": "later", "base": "", "fields": [
                {"name": "id", "type": "uint8"},
                {"name": "memo", "type": "string$"},
                {"name": "when", "type": "uint32$"}
            ]}
        ]
    }"#;

    fn with_abi() -> CallOptions<'static> {
        CallOptions::with_abi(AbiSource::Json(FOO_BAR.to_owned()))
    }

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn struct_with_base_hex() {
        init();
        let json = json!({"one": "one", "two": 2, "three": "two", "four": ["f", "o", "u", "r"]});
        let bytes = encode(&json, Some(TypeSpec::Name("bar")), with_abi()).unwrap();
        assert_eq!(
            HexString::from(bytes).to_hex(),
            "036f6e65020100000000000028cf01040166016f01750172"
        );
        let value = decode(
            Input::Hex("036f6e65020100000000000028cf01040166016f01750172"),
            "bar",
            with_abi(),
        )
        .unwrap();
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn round_trip_typed() {
        init();
        let value = Value::Struct(
            Struct::new("bar")
                .with("one", "x")
                .with("two", -7i8)
                .with("three", Value::Null)
                .with("four", Value::Array(vec![])),
        );
        let bytes = encode(&value, None, with_abi()).unwrap();
        let back = decode(Input::Binary(&bytes), "bar", with_abi()).unwrap();
        assert_eq!(back, value);
        assert_eq!(back.to_json(), value.to_json());
    }

    #[test]
    fn json_stability_builtins() {
        init();
        let cases = [
            ("bool", json!(true)),
            ("int8", json!(-128)),
            ("uint16", json!(65535)),
            ("int32", json!(-5)),
            ("uint32", json!(4294967295u32)),
            ("int64", json!("-9223372036854775808")),
            ("uint64", json!("18446744073709551615")),
            ("int128", json!("-170141183460469231731687303715884105728")),
            ("uint128", json!("340282366920938463463374607431768211455")),
            ("varint32", json!(-64)),
            ("varuint32", json!(300)),
            ("float32", json!(1.5)),
            ("float64", json!(-0.25)),
            ("string", json!("héllo")),
            ("bytes", json!("00ff10")),
            ("name", json!("eosio.token")),
            ("symbol", json!("4,EOS")),
            ("asset", json!("1.0000 EOS")),
            ("string[]", json!(["a", "b"])),
            ("uint8?", json!(null)),
        ];
        for (ty, json) in cases {
            let bytes = encode(&json, Some(TypeSpec::Name(ty)), CallOptions::default()).unwrap();
            let back = decode(Input::Binary(&bytes), ty, CallOptions::default()).unwrap();
            assert_eq!(back.to_json(), json, "{ty}");
        }
    }

    #[test]
    fn optional_and_array_shapes() {
        let none = encode(&json!(null), Some(TypeSpec::Name("bool?")), CallOptions::default()).unwrap();
        assert_eq!(none, [0x00]);
        let empty = encode(&json!([]), Some(TypeSpec::Name("string[]")), CallOptions::default()).unwrap();
        assert_eq!(empty, [0x00]);
        assert_eq!(
            decode(Input::Binary(&[0x00]), "bool?", CallOptions::default()).ok(),
            Some(Value::Null)
        );
        assert_eq!(
            decode(Input::Binary(&[0x01, 0x01]), "bool?", CallOptions::default()).ok(),
            Some(Value::Bool(true))
        );
        assert_eq!(
            decode(Input::Binary(&[0x00]), "string[]", CallOptions::default()).ok(),
            Some(Value::Array(vec![]))
        );
    }

    #[test]
    fn alias_transparency() {
        let json = json!(123456);
        let via_alias = encode(&json, Some(TypeSpec::Name("u1")), with_abi()).unwrap();
        let direct = encode(&json, Some(TypeSpec::Name("uint32")), with_abi()).unwrap();
        assert_eq!(via_alias, direct);
        assert_eq!(
            decode(Input::Binary(&direct), "u1", with_abi()).unwrap().to_json(),
            json
        );
    }

    #[test]
    fn failures() {
        let err = decode(Input::Binary(&[0x00]), "nonsense", with_abi()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownType);
        for name in ["a", "b1"] {
            let err = decode(Input::Binary(&[0x00]), name, with_abi()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::CircularType);
            let err = encode(&json!(1), Some(TypeSpec::Name(name)), with_abi()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::CircularType);
        }
        let err = decode(Input::Binary(&[0x03, 0x6f]), "foo", with_abi()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferUnderrun);
        let err = decode(Input::Hex("0g"), "bool", with_abi()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonConformingValue);
        let err = decode(
            Input::Binary(&[]),
            "foo",
            CallOptions::with_abi(AbiSource::Json("{\"structs\": 1}".into())),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn ambiguous_source() {
        let err = encode(&json!({"one": "x"}), None, with_abi()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmbiguousSourceType);
        let err = encode(&Value::Array(vec![]), None, with_abi()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmbiguousSourceType);
        let inferred = encode(&Value::from(7u16), None, CallOptions::default()).unwrap();
        assert_eq!(inferred, [0x07, 0x00]);
    }

    #[test]
    fn binary_extension_forward_compat() {
        let old = decode(Input::Binary(&[0x05]), "later", with_abi()).unwrap();
        assert_eq!(old.to_json(), json!({"id": 5, "memo": "", "when": 0}));
        let partial = decode(Input::Hex("05026869"), "later", with_abi()).unwrap();
        assert_eq!(partial.to_json(), json!({"id": 5, "memo": "hi", "when": 0}));
        let err = decode(Input::Hex("0502686900"), "later", with_abi()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferUnderrun);
        let short = encode(&json!({"id": 5}), Some(TypeSpec::Name("later")), with_abi()).unwrap();
        assert_eq!(short, [0x05]);
    }

    #[test]
    fn extension_gap_round_trips() {
        let gap = json!({"id": 5, "when": 7});
        let bytes = encode(&gap, Some(TypeSpec::Name("later")), with_abi()).unwrap();
        assert_eq!(bytes, hex!("050007000000").into_vec());
        let back = decode(Input::Binary(&bytes), "later", with_abi()).unwrap();
        assert_eq!(back.to_json(), json!({"id": 5, "memo": "", "when": 7}));
        let constructed = decode(Input::Json(&gap), "later", with_abi()).unwrap();
        assert_eq!(constructed, back);
    }

    #[test]
    fn binary_and_document_schema_sources() {
        let abi = Abi::from_json(FOO_BAR).unwrap();
        let blob = abi.to_bytes();
        let json = json!({"one": "a", "two": 1});
        let from_blob = encode(
            &json,
            Some(TypeSpec::Name("foo")),
            CallOptions::with_abi(AbiSource::Binary(blob)),
        )
        .unwrap();
        let from_doc = encode(&json, Some(TypeSpec::Name("foo")), CallOptions::with_abi(abi)).unwrap();
        assert_eq!(from_blob, from_doc);
    }

    static POINT: StructType = StructType {
        name: "point",
        base: None,
        fields: &[
            Field { name: "x", ty: TypeRef::new(&builtins::INT32) },
            Field { name: "y", ty: TypeRef::new(&builtins::INT32) },
        ],
    };

    static SEGMENT: StructType = StructType {
        name: "segment",
        base: None,
        fields: &[
            Field { name: "from", ty: TypeRef::new(&POINT) },
            Field { name: "to", ty: TypeRef::new(&POINT) },
            Field { name: "label", ty: TypeRef::new(&LABEL).optional() },
        ],
    };

    static LABEL: AliasType = AliasType {
        name: "label",
        target: TypeRef::new(&builtins::STRING),
    };

    #[test]
    fn synthesized_schema() {
        init();
        let json = json!({"from": {"x": 1, "y": 2}, "to": {"x": -1, "y": 0}, "label": "ab"});
        let bytes = encode(&json, Some(TypeSpec::Descriptor(&SEGMENT)), CallOptions::default()).unwrap();
        assert!(HexString::from(bytes.clone()).eq_hex("0100000002000000ffffffff0000000001026162"));
        let back = decode(Input::Binary(&bytes), TypeSpec::Descriptor(&SEGMENT), CallOptions::default())
            .unwrap();
        assert_eq!(back.to_json(), json);
        assert_eq!(back.type_name(), Some("segment"));

        let no_label = decode(
            Input::Hex("0100000002000000ffffffff0000000000"),
            TypeSpec::Descriptor(&SEGMENT),
            CallOptions::default(),
        )
        .unwrap();
        assert_eq!(no_label.as_struct().and_then(|s| s.get("label")), Some(&Value::Null));
    }

    /// Leaf type that stores its text upper-cased
    struct Upper;

    impl TypeDescriptor for Upper {
        fn abi_name(&self) -> &str {
            "upper"
        }

        fn construct(&self, json: &Json) -> Result<Value, ValueError> {
            match json {
                Json::String(s) => Ok(Value::String(s.to_uppercase())),
                other => Err(ValueError::mismatch("string", other)),
            }
        }

        fn binary(&self) -> Option<&dyn BinaryCodec> {
            Some(self)
        }
    }

    impl BinaryCodec for Upper {
        fn read(&self, p: &mut SliceParser<'_>) -> ParseResult<Value> {
            p.take_string().map(Value::String)
        }

        fn write(&self, value: &Value, buf: &mut PagedBuilder) -> Result<usize, ValueError> {
            match value {
                Value::String(s) => Ok(s.write_to(buf)),
                other => Err(ValueError::mismatch("string", &other.to_json())),
            }
        }
    }

    static UPPER: Upper = Upper;

    #[test]
    fn caller_types_overlay_builtins() {
        let types: &[&'static dyn TypeDescriptor] = &[&UPPER];
        let bytes = encode(
            &json!("hi"),
            Some(TypeSpec::Name("upper")),
            CallOptions::default().types(types),
        )
        .unwrap();
        assert_eq!(bytes, hex!("024849").into_vec());
        let err = encode(&json!("hi"), Some(TypeSpec::Name("upper")), CallOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownType);
        let err = encode(&json!(1), Some(TypeSpec::Name("upper")), CallOptions::default().types(types))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonConformingValue);
    }

    #[cfg(feature = "check_complete_parse")]
    #[test]
    fn trailing_bytes_rejected() {
        let err = decode(Input::Hex("0100"), "bool", CallOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonConformingValue);
    }

    #[derive(Debug, Encode)]
    struct Point {
        x: i32,
        y: i32,
    }

    impl AbiObject for Point {
        fn abi_type(&self) -> &str {
            "point"
        }

        fn write_abi(&self, buf: &mut PagedBuilder) -> usize {
            self.write_to(buf)
        }

        fn to_json(&self) -> Json {
            json!({"x": self.x, "y": self.y})
        }
    }

    #[test]
    fn self_writing_values() {
        let point = Value::Object(Arc::new(Point { x: 1, y: -1 }));
        let bytes = encode(&point, None, CallOptions::default()).unwrap();
        assert_eq!(bytes, hex!("01000000ffffffff").into_vec());
        let in_struct = Value::Struct(
            Struct::new("segment")
                .with("from", point.clone())
                .with("to", point.clone())
                .with("label", Value::Null),
        );
        let bytes = encode(&in_struct, Some(TypeSpec::Descriptor(&SEGMENT)), CallOptions::default())
            .unwrap();
        assert_eq!(bytes, hex!("01000000ffffffff01000000ffffffff00").into_vec());
        let err = encode(&point, Some(TypeSpec::Descriptor(&SEGMENT)), CallOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonConformingValue);
    }
}

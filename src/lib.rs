//! Schema-driven serialization engine for contract ABIs
//!
//! # Overview
//!
//! This library converts contract data between three representations: the
//! compact, length-prefixed binary wire format; an in-memory typed object
//! graph ([`Value`]); and its JSON projection. Every conversion is governed by
//! an [`Abi`], a runtime-inspectable schema document declaring aliases,
//! structs (with optional base structs) and tagged-union variants.
//!
//! The two entry points are [`encode`] and [`decode`]. Each call assembles its
//! own collaborators: the schema document (supplied, or synthesized from a
//! type's declared shape via [`synthesize`]), a [`Registry`] of leaf
//! [`TypeDescriptor`]s, and the resolved [`TypeGraph`] of the target type.
//! The structural [`Codec`](codec::Codec) then walks that graph, delegating
//! leaves to their descriptors and recursing through aliases and structs.
//!
//! # Layers
//!
//! Underneath the dynamic layer sit the static transcoding traits [`Encode`]
//! and [`Decode`], which fix the binary layout of Rust types known at compile
//! time: the primitives, the domain leaves ([`Name`], [`Symbol`], [`Asset`]),
//! and the schema document itself, whose binary form is self-describing.
//! They are built on the [`Parser`] and [`Target`] abstractions, which the
//! dynamic codecs share.
//!
//! # Wire format
//!
//! Fixed-width integers and floats are little-endian. `varuint32` is LEB128
//! and `varint32` its zig-zag counterpart. Strings and byte strings carry a
//! `varuint32` length prefix, arrays a `varuint32` element count. An optional
//! value is preceded by a presence byte, and a struct is its base struct's
//! fields followed by its own.

extern crate self as abi_codec;

pub mod asset;
pub mod builder;
pub mod codec;
pub mod conv;
pub mod error;
pub mod hexstring;
pub mod int;
pub mod name;
pub mod parse;
pub mod prim;
pub mod registry;
pub mod schema;
pub mod serializer;
pub mod synth;
pub mod value;
pub mod varint;

pub use crate::asset::{Asset, Symbol};
pub use crate::builder::{Builder, PagedBuilder};
pub use crate::codec::path::CodingPath;
pub use crate::conv::{target::Target, Decode, Encode};
pub use crate::error::{AbiError, ErrorKind, SchemaError, ValueError};
pub use crate::hexstring::HexString;
pub use crate::int::{IntKind, Integer};
pub use crate::name::Name;
pub use crate::parse::{error::ParseError, sliceparser::SliceParser, ParseResult, Parser};
pub use crate::registry::{Registry, TypeDescriptor};
pub use crate::schema::{Abi, AbiSource, TypeGraph};
pub use crate::serializer::{decode, encode, CallOptions, Input, Source, TypeSpec};
pub use crate::synth::{synthesize, Synthesized};
pub use crate::value::{AbiObject, Struct, Value};
pub use crate::varint::{VarInt32, VarUint32};

pub use ::abi_derive::{Decode, Encode};

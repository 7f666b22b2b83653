//! Core of the static binary-conversion API
//!
//! This module contains definitions for the transcoding traits `Encode` and
//! `Decode`, which are motivationally equivalent to the `Serialize` and
//! `Deserialize` traits defined in `serde`, but fixed to the ABI binary layout.
//!
//! They are used for Rust types whose layout is known at compile time: the
//! primitives (see [`crate::prim`] and [`crate::varint`]), the domain leaf
//! types, and the ABI document itself (see [`crate::schema`]), whose
//! self-describing binary form is built entirely out of these traits.
//! Values whose shape is only known at runtime are handled by the
//! schema-driven codecs in [`crate::codec`], which are in turn built on the
//! same [`Parser`] and [`Target`] primitives.
//!
//! The sub-module [`target`] offers an abstraction along the lines of
//! [`std::io::Write`], namely the [`Target`] trait, which is the dual to
//! [`crate::parse::Parser`].
//!
//! Derive macros for `Encode` and `Decode` are provided by the sub-crate
//! `abi_derive`, for structs whose fields are laid out in declaration order.

use crate::parse::{ParseResult, Parser, SliceParser};

use self::target::Target;

pub mod error;
pub mod target;

pub use error::{DecodeError, DecodeResult};

/// Trait for types that support serialization into the ABI binary form
///
/// Implementing [`Encode`] can be as simple as providing a definition of the
/// required method [`write_to`](Encode::write_to).
pub trait Encode {
    /// Appends the serialized bytes of this value to a generic buffer,
    /// returning the exact number of bytes written
    ///
    /// The natural definition of this method is structurally inductive on the
    /// fields of the type in question.
    fn write_to<U: Target>(&self, buf: &mut U) -> usize;

    /// Creates a new buffer and fills it with the serialized bytes of this value.
    #[must_use]
    #[inline]
    fn encode<U: Target>(&self) -> U {
        let mut buf: U = U::create();
        let _ = self.write_to::<U>(&mut buf);
        buf
    }

    /// Creates a [`Vec<u8>`] and fills it with the serialized bytes of this value.
    #[must_use]
    #[inline]
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        let _ = self.write_to(&mut buf);
        buf
    }

    /// Computes, without allocation, the number of bytes in the serialized form of `self`
    #[must_use]
    #[inline]
    fn enc_len(&self) -> usize {
        self.write_to(&mut std::io::sink())
    }
}

/// Trait providing methods for deserializing binary data into values of a certain type
///
/// The required method [`parse`](Decode::parse) reads exactly one value from the
/// current position of a [`Parser`], and is the building block for decoding
/// compound values field by field.
pub trait Decode {
    /// Reads one value of type `Self` from the parser
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self>
    where
        Self: Sized;

    /// Decodes a value of type `Self` from a complete byte buffer
    ///
    /// When the `check_complete_parse` feature is enabled, input with
    /// unconsumed trailing bytes is rejected with [`DecodeError::NonEmpty`].
    fn try_decode<U: AsRef<[u8]>>(inp: U) -> DecodeResult<Self>
    where
        Self: Sized,
    {
        let mut p = SliceParser::new(inp.as_ref());
        let ret = Self::parse(&mut p)?;
        cfg_if::cfg_if! {
            if #[cfg(feature = "check_complete_parse")] {
                if !p.is_exhausted() {
                    return Err(DecodeError::NonEmpty { residual: p.remainder() });
                }
            }
        }
        Ok(ret)
    }
}

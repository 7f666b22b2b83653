//! Static binary layout of primitive and generic container types
//!
//! Fixed-width numbers are little-endian. `String` and `Vec<u8>`-like
//! containers are prefixed with a varuint32 count, `Option<T>` with a
//! presence byte, and `bool` is a single `0x00` or `0x01`.

use crate::conv::{target::Target, Decode, Encode};
use crate::parse::{ParseResult, Parser};
use crate::varint::write_groups;

impl Encode for () {
    fn write_to<U: Target>(&self, _: &mut U) -> usize {
        0
    }
}

impl Decode for () {
    #[inline]
    fn parse<P: Parser>(_: &mut P) -> ParseResult<()> {
        Ok(())
    }
}

impl Encode for bool {
    fn write_to<U: Target>(&self, buf: &mut U) -> usize {
        buf.push_one(u8::from(*self))
    }
}

impl Decode for bool {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        p.take_bool()
    }
}

macro_rules! impl_fixed {
    ( $( $t:ty => $take:ident ),* $(,)? ) => {
        $(
            impl Encode for $t {
                #[inline]
                fn write_to<U: Target>(&self, buf: &mut U) -> usize {
                    buf.push_many(self.to_le_bytes())
                }
            }

            impl Decode for $t {
                #[inline]
                fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
                    p.$take()
                }
            }
        )*
    };
}

impl_fixed!(
    u8 => take_u8,
    i8 => take_i8,
    u16 => take_u16,
    i16 => take_i16,
    u32 => take_u32,
    i32 => take_i32,
    u64 => take_u64,
    i64 => take_i64,
    u128 => take_u128,
    i128 => take_i128,
    f32 => take_f32,
    f64 => take_f64,
);

/// Writes a varuint32 length prefix for a container of `len` elements
///
/// Lengths beyond `u32::MAX` cannot be represented on the wire and are
/// rejected by the dynamic codec before reaching this point.
#[inline]
pub(crate) fn write_len<U: Target>(len: usize, buf: &mut U) -> usize {
    write_groups(len as u32, buf)
}

impl Encode for String {
    fn write_to<U: Target>(&self, buf: &mut U) -> usize {
        self.as_str().write_to(buf)
    }
}

impl Encode for str {
    fn write_to<U: Target>(&self, buf: &mut U) -> usize {
        buf.anticipate(self.len() + 1);
        write_len(self.len(), buf) + buf.push_all(self.as_bytes())
    }
}

impl Decode for String {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        p.take_string()
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn write_to<U: Target>(&self, buf: &mut U) -> usize {
        self.iter()
            .fold(write_len(self.len(), buf), |acc, elem| acc + elem.write_to(buf))
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        let count = p.take_varuint32()? as usize;
        // each element occupies at least one byte
        let mut ret = Vec::with_capacity(count.min(p.remainder()));
        for _ in 0..count {
            ret.push(T::parse(p)?);
        }
        Ok(ret)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn write_to<U: Target>(&self, buf: &mut U) -> usize {
        match self {
            Some(val) => buf.push_one(0x01) + val.write_to(buf),
            None => buf.push_one(0x00),
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        if p.take_bool()? {
            Ok(Some(T::parse(p)?))
        } else {
            Ok(None)
        }
    }
}

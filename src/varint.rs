//! Variable-length 32-bit integers
//!
//! `varuint32` stores an unsigned value in groups of seven bits, least
//! significant group first, with the high bit of every byte except the last
//! set as a continuation marker. `varint32` maps a signed value onto the
//! unsigned encoding by zig-zag interleaving, so that values of small
//! magnitude stay short regardless of sign: `0, -1, 1, -2, 2, ...` become
//! `0, 1, 2, 3, 4, ...`.
//!
//! The newtypes [`VarUint32`] and [`VarInt32`] carry the variable-length
//! layout through [`Encode`] and [`Decode`]; plain `u32` and `i32` use the
//! fixed-width layout.

use std::fmt::Display;

use crate::conv::target::Target;
use crate::conv::{Decode, Encode};
use crate::parse::{ParseResult, Parser};

/// Folds a terminated run of seven-bit groups into its integer value
///
/// The caller guarantees that `bytes` holds at most
/// [`VARUINT32_MAX_BYTES`](crate::parse::VARUINT32_MAX_BYTES) groups, so the
/// result always fits in a `u64`.
#[must_use]
pub(crate) fn fold_groups(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .enumerate()
        .fold(0u64, |acc, (ix, &byte)| acc | (u64::from(byte & 0x7f) << (7 * ix)))
}

/// Writes the seven-bit-group encoding of `value`, returning the number of bytes written
pub(crate) fn write_groups<U: Target>(mut value: u32, buf: &mut U) -> usize {
    let mut written = 0;
    loop {
        let group = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            break written + buf.push_one(group);
        }
        written += buf.push_one(group | 0x80);
    }
}

#[inline]
#[must_use]
pub(crate) const fn zigzag(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

#[inline]
#[must_use]
pub(crate) const fn unzigzag(raw: u32) -> i32 {
    ((raw >> 1) as i32) ^ -((raw & 1) as i32)
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Default, Debug)]
#[repr(transparent)]
pub struct VarUint32(pub u32);

impl VarUint32 {
    pub const fn into_inner(self) -> u32 {
        self.0
    }
}

impl From<u32> for VarUint32 {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Display for VarUint32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Encode for VarUint32 {
    fn write_to<U: Target>(&self, buf: &mut U) -> usize {
        write_groups(self.0, buf)
    }
}

impl Decode for VarUint32 {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        p.take_varuint32().map(Self)
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Default, Debug)]
#[repr(transparent)]
pub struct VarInt32(pub i32);

impl VarInt32 {
    pub const fn into_inner(self) -> i32 {
        self.0
    }
}

impl From<i32> for VarInt32 {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl Display for VarInt32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Encode for VarInt32 {
    fn write_to<U: Target>(&self, buf: &mut U) -> usize {
        write_groups(zigzag(self.0), buf)
    }
}

impl Decode for VarInt32 {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        p.take_varint32().map(Self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{hex, Builder, HexString, PagedBuilder};

    #[test]
    fn varuint32_conv() {
        assert_eq!(VarUint32(0).encode::<HexString>(), hex!("00"));
        assert_eq!(VarUint32(1).encode::<HexString>(), hex!("01"));
        assert_eq!(VarUint32(128).encode::<HexString>(), hex!("8001"));
        assert_eq!(VarUint32(300).encode::<HexString>(), hex!("ac02"));
        assert_eq!(VarUint32(u32::MAX).encode::<HexString>(), hex!("ffffffff0f"));
        assert_eq!(VarUint32::try_decode(hex!("ac02")).ok(), Some(VarUint32(300)));
    }

    #[test]
    fn varint32_conv() {
        assert_eq!(VarInt32(0).encode::<HexString>(), hex!("00"));
        assert_eq!(VarInt32(-1).encode::<HexString>(), hex!("01"));
        assert_eq!(VarInt32(1).encode::<HexString>(), hex!("02"));
        assert_eq!(VarInt32(-64).encode::<HexString>(), hex!("7f"));
        assert_eq!(VarInt32(64).encode::<HexString>(), hex!("8001"));
        assert_eq!(VarInt32(i32::MIN).encode::<PagedBuilder>().into_hex(), "ffffffff0f");
    }

    #[test]
    fn zigzag_inverse() {
        for n in [0, 1, -1, 63, -64, 1 << 20, i32::MAX, i32::MIN] {
            assert_eq!(unzigzag(zigzag(n)), n);
        }
    }
}

//! Integer leaves of every width
//!
//! All integer leaf types share one in-memory representation, [`Integer`],
//! which pairs an [`IntKind`] with a [`BigInt`] magnitude. The value is
//! bounds-checked against its kind on construction, so that the binary
//! writers can narrow it without further checks, and 64- and 128-bit values
//! never pass through a floating-point representation.

use std::fmt::Display;
use std::str::FromStr;

use lazy_static::lazy_static;
use num_bigint::BigInt;
use num_traits::{One, ToPrimitive, Zero};
use serde_json::Value as Json;

use crate::conv::target::Target;
use crate::error::{BoundsError, ValueError};
use crate::parse::{ParseResult, Parser};
use crate::varint::{write_groups, zigzag};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntKind {
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uint128,
    VarInt32,
    VarUint32,
}

/// Every integer kind, in declaration order
pub const INT_KINDS: [IntKind; 12] = [
    IntKind::Int8,
    IntKind::Int16,
    IntKind::Int32,
    IntKind::Int64,
    IntKind::Int128,
    IntKind::Uint8,
    IntKind::Uint16,
    IntKind::Uint32,
    IntKind::Uint64,
    IntKind::Uint128,
    IntKind::VarInt32,
    IntKind::VarUint32,
];

lazy_static! {
    static ref BOUNDS: Vec<(BigInt, BigInt)> = INT_KINDS
        .iter()
        .map(|kind| {
            let bits = kind.bits();
            if kind.is_signed() {
                let half = BigInt::one() << (bits - 1);
                (-half.clone(), half - 1)
            } else {
                (BigInt::zero(), (BigInt::one() << bits) - 1)
            }
        })
        .collect();
}

impl IntKind {
    /// Name of the built-in ABI type of this kind
    #[must_use]
    pub const fn abi_name(self) -> &'static str {
        match self {
            IntKind::Int8 => "int8",
            IntKind::Int16 => "int16",
            IntKind::Int32 => "int32",
            IntKind::Int64 => "int64",
            IntKind::Int128 => "int128",
            IntKind::Uint8 => "uint8",
            IntKind::Uint16 => "uint16",
            IntKind::Uint32 => "uint32",
            IntKind::Uint64 => "uint64",
            IntKind::Uint128 => "uint128",
            IntKind::VarInt32 => "varint32",
            IntKind::VarUint32 => "varuint32",
        }
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            IntKind::Int8 | IntKind::Uint8 => 8,
            IntKind::Int16 | IntKind::Uint16 => 16,
            IntKind::Int32 | IntKind::Uint32 | IntKind::VarInt32 | IntKind::VarUint32 => 32,
            IntKind::Int64 | IntKind::Uint64 => 64,
            IntKind::Int128 | IntKind::Uint128 => 128,
        }
    }

    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            IntKind::Int8
                | IntKind::Int16
                | IntKind::Int32
                | IntKind::Int64
                | IntKind::Int128
                | IntKind::VarInt32
        )
    }

    /// Whether values of this kind project to JSON numbers rather than decimal strings
    #[must_use]
    pub const fn is_json_number(self) -> bool {
        self.bits() <= 32
    }

    fn bounds(self) -> &'static (BigInt, BigInt) {
        &BOUNDS[self as usize]
    }

    #[must_use]
    pub fn min(self) -> &'static BigInt {
        &self.bounds().0
    }

    #[must_use]
    pub fn max(self) -> &'static BigInt {
        &self.bounds().1
    }
}

impl Display for IntKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.abi_name())
    }
}

/// Bounds-checked integer of a given [`IntKind`]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Integer {
    kind: IntKind,
    value: BigInt,
}

impl Integer {
    /// Constructs an `Integer`, rejecting values outside of the range of `kind`
    pub fn new(kind: IntKind, value: impl Into<BigInt>) -> Result<Self, BoundsError<BigInt>> {
        let value = BoundsError::restrict(value.into(), kind.min().clone(), kind.max().clone())?;
        Ok(Self { kind, value })
    }

    #[must_use]
    pub fn zero(kind: IntKind) -> Self {
        Self {
            kind,
            value: BigInt::zero(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> IntKind {
        self.kind
    }

    #[must_use]
    pub fn value(&self) -> &BigInt {
        &self.value
    }

    /// Re-validates the magnitude of `self` as an integer of another kind
    pub fn cast(&self, kind: IntKind) -> Result<Self, BoundsError<BigInt>> {
        Self::new(kind, self.value.clone())
    }

    /// Constructs an `Integer` from its JSON projection
    ///
    /// Accepts integral JSON numbers of any kind, and decimal strings, which
    /// are the only lossless form for values beyond 53 bits.
    pub fn from_json(kind: IntKind, json: &Json) -> Result<Self, ValueError> {
        let value = match json {
            Json::Number(n) => {
                if let Some(v) = n.as_i64() {
                    BigInt::from(v)
                } else if let Some(v) = n.as_u64() {
                    BigInt::from(v)
                } else {
                    return Err(ValueError::invalid(kind.abi_name(), n.to_string()));
                }
            }
            Json::String(s) => BigInt::from_str(s.trim())
                .map_err(|_| ValueError::invalid(kind.abi_name(), s.as_str()))?,
            other => return Err(ValueError::mismatch(kind.abi_name(), other)),
        };
        Ok(Self::new(kind, value)?)
    }

    /// JSON projection: a number for kinds of at most 32 bits, otherwise a decimal string
    #[must_use]
    pub fn to_json(&self) -> Json {
        match self.value.to_i64() {
            Some(v) if self.kind.is_json_number() => Json::from(v),
            _ => Json::String(self.value.to_string()),
        }
    }

    /// Little-endian two's-complement bytes of the value, widened or
    /// narrowed to exactly `width` bytes
    fn le_bytes<const N: usize>(&self) -> [u8; N] {
        let fill = if self.value.sign() == num_bigint::Sign::Minus {
            0xff
        } else {
            0x00
        };
        let mut bytes = self.value.to_signed_bytes_le();
        bytes.resize(N, fill);
        let mut arr = [fill; N];
        arr.copy_from_slice(&bytes);
        arr
    }

    /// Writes the binary layout of this integer's kind
    pub fn write_to<U: Target>(&self, buf: &mut U) -> usize {
        match self.kind {
            IntKind::Int8 | IntKind::Uint8 => buf.push_many(self.le_bytes::<1>()),
            IntKind::Int16 | IntKind::Uint16 => buf.push_many(self.le_bytes::<2>()),
            IntKind::Int32 | IntKind::Uint32 => buf.push_many(self.le_bytes::<4>()),
            IntKind::Int64 | IntKind::Uint64 => buf.push_many(self.le_bytes::<8>()),
            IntKind::Int128 | IntKind::Uint128 => buf.push_many(self.le_bytes::<16>()),
            IntKind::VarUint32 => write_groups(u32::from_le_bytes(self.le_bytes::<4>()), buf),
            IntKind::VarInt32 => {
                write_groups(zigzag(i32::from_le_bytes(self.le_bytes::<4>())), buf)
            }
        }
    }

    /// Reads one integer of the given kind
    pub fn read<P: Parser>(kind: IntKind, p: &mut P) -> ParseResult<Self> {
        let value = match kind {
            IntKind::Int8 => BigInt::from(p.take_i8()?),
            IntKind::Int16 => BigInt::from(p.take_i16()?),
            IntKind::Int32 => BigInt::from(p.take_i32()?),
            IntKind::Int64 => BigInt::from(p.take_i64()?),
            IntKind::Int128 => BigInt::from(p.take_i128()?),
            IntKind::Uint8 => BigInt::from(p.take_u8()?),
            IntKind::Uint16 => BigInt::from(p.take_u16()?),
            IntKind::Uint32 => BigInt::from(p.take_u32()?),
            IntKind::Uint64 => BigInt::from(p.take_u64()?),
            IntKind::Uint128 => BigInt::from(p.take_u128()?),
            IntKind::VarInt32 => BigInt::from(p.take_varint32()?),
            IntKind::VarUint32 => BigInt::from(p.take_varuint32()?),
        };
        Ok(Self { kind, value })
    }
}

impl Display for Integer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.value, f)
    }
}

macro_rules! impl_from_prim {
    ( $( $t:ty => $kind:ident ),* $(,)? ) => {
        $(
            impl From<$t> for Integer {
                fn from(v: $t) -> Self {
                    Self { kind: IntKind::$kind, value: BigInt::from(v) }
                }
            }
        )*
    };
}

impl_from_prim!(
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    i128 => Int128,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
    u128 => Uint128,
);

impl From<crate::varint::VarUint32> for Integer {
    fn from(v: crate::varint::VarUint32) -> Self {
        Self {
            kind: IntKind::VarUint32,
            value: BigInt::from(v.0),
        }
    }
}

impl From<crate::varint::VarInt32> for Integer {
    fn from(v: crate::varint::VarInt32) -> Self {
        Self {
            kind: IntKind::VarInt32,
            value: BigInt::from(v.0),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{hex, Builder, PagedBuilder, SliceParser};

    fn enc(i: &Integer) -> String {
        let mut b = PagedBuilder::new();
        i.write_to(&mut b);
        b.into_hex()
    }

    #[test]
    fn bounds() {
        assert_eq!(IntKind::Int8.min(), &BigInt::from(-128));
        assert_eq!(IntKind::Uint16.max(), &BigInt::from(0xffff));
        assert_eq!(IntKind::Uint128.max(), &BigInt::from(u128::MAX));
        assert!(Integer::new(IntKind::Uint8, 256).is_err());
        assert!(Integer::new(IntKind::Uint8, -1).is_err());
        assert!(Integer::new(IntKind::Int128, i128::MIN).is_ok());
    }

    #[test]
    fn narrowing_writes() {
        assert_eq!(enc(&Integer::from(-1i8)), "ff");
        assert_eq!(enc(&Integer::from(2i8)), "02");
        assert_eq!(enc(&Integer::from(u128::MAX)), "ff".repeat(16));
        assert_eq!(enc(&Integer::from(-2i64)), "feffffffffffffff");
        assert_eq!(enc(&Integer::from(u32::MAX)), "ffffffff");
        assert_eq!(
            enc(&Integer::new(IntKind::VarUint32, 300).unwrap()),
            "ac02"
        );
        assert_eq!(enc(&Integer::new(IntKind::VarInt32, -1).unwrap()), "01");
    }

    #[test]
    fn reads() {
        let bytes = hex!("feffffffffffffff");
        let mut p = SliceParser::new(bytes.as_bytes());
        assert_eq!(
            Integer::read(IntKind::Int64, &mut p),
            Ok(Integer::from(-2i64))
        );
        let bytes = hex!("ffffffffffffffff");
        let mut p = SliceParser::new(bytes.as_bytes());
        assert_eq!(
            Integer::read(IntKind::Uint64, &mut p).map(|i| i.to_string()),
            Ok(u64::MAX.to_string())
        );
    }

    #[test]
    fn json_projection() {
        let big = Integer::from(u64::MAX);
        assert_eq!(big.to_json(), Json::String("18446744073709551615".into()));
        assert_eq!(
            Integer::from_json(IntKind::Uint64, &big.to_json()),
            Ok(big)
        );
        assert_eq!(Integer::from(7u8).to_json(), Json::from(7));
        assert_eq!(
            Integer::from_json(IntKind::Int16, &Json::from(-3)),
            Ok(Integer::from(-3i16))
        );
        assert!(Integer::from_json(IntKind::Int8, &Json::from(1.5)).is_err());
        assert!(Integer::from_json(IntKind::Int8, &Json::from("300")).is_err());
        assert!(Integer::from_json(IntKind::Int8, &Json::Bool(true)).is_err());
    }
}

//! Validated conversion to and from hex-encoded strings
//!
//! Byte strings appear as hex in two places: the JSON projection of the
//! `bytes` leaf type, and as one of the accepted input forms of
//! [`decode`](crate::serializer::decode). Two strings that are equivalent up
//! to case represent identical data, but this crate always emits lowercase.
//!
//! # `HexString`
//!
//! [`HexString`] is a byte buffer that is parsed from and displayed as a
//! hex-string. `From` conversions are binary-based, and `TryFrom` is a
//! fallible parse from hex-encoded text, so there is no ambiguity as to how
//! a string-like argument is interpreted.
//!
//! For lightweight construction of `HexString` values in tests and
//! examples, the [`hex`] macro is also provided.

use crate::conv::target::Target;
use crate::error::HexConvError;
use std::convert::TryFrom;

pub(crate) mod util {
    use crate::error::HexConvError;

    const DIGITS: &[u8; 16] = b"0123456789abcdef";

    /// Reverse lookup from ASCII byte to nibble value, `0xff` for non-hex
    const NIBBLES: [u8; 256] = {
        let mut table = [0xffu8; 256];
        let mut ix = 0;
        while ix < 10 {
            table[b'0' as usize + ix] = ix as u8;
            ix += 1;
        }
        ix = 0;
        while ix < 6 {
            table[b'a' as usize + ix] = 10 + ix as u8;
            table[b'A' as usize + ix] = 10 + ix as u8;
            ix += 1;
        }
        table
    };

    /// Formats a sequence of bytes into an undelimited lowercase hexadecimal `String`
    #[must_use]
    pub fn hex_of_bytes(bytes: &[u8]) -> String {
        let mut hex = String::with_capacity(bytes.len() * 2);
        for &byte in bytes {
            hex.push(DIGITS[(byte >> 4) as usize] as char);
            hex.push(DIGITS[(byte & 0xf) as usize] as char);
        }
        hex
    }

    /// Attempt to parse a hexadecimally encoded string, returning either
    /// the decoded bytes or an error containing the invalid string.
    ///
    /// # Errors
    ///
    /// Odd-length input fails with `OddParity`; any character outside of
    /// `[0-9a-fA-F]` fails with `NonHex`.
    pub fn bytes_of_hex(src: &str) -> Result<Vec<u8>, HexConvError> {
        let ascii = src.as_bytes();
        if ascii.len() % 2 != 0 {
            return Err(HexConvError::OddParity(src.to_owned()));
        }
        let mut dst = Vec::with_capacity(ascii.len() / 2);
        for pair in ascii.chunks_exact(2) {
            let hi = NIBBLES[pair[0] as usize];
            let lo = NIBBLES[pair[1] as usize];
            if hi == 0xff || lo == 0xff {
                return Err(HexConvError::NonHex(src.to_owned()));
            }
            dst.push((hi << 4) | lo);
        }
        Ok(dst)
    }

    /// Zero-alloc short-circuiting equality test between hex-strings and
    /// byte-arrays
    ///
    /// Returns `false` when `src` is not valid hex.
    #[must_use]
    pub fn eq_hex_bytes(src: &str, tgt: &[u8]) -> bool {
        let ascii = src.as_bytes();
        if ascii.len() != tgt.len() * 2 {
            return false;
        }
        ascii.chunks_exact(2).zip(tgt).all(|(pair, &byte)| {
            let hi = NIBBLES[pair[0] as usize];
            let lo = NIBBLES[pair[1] as usize];
            hi != 0xff && lo != 0xff && (hi << 4) | lo == byte
        })
    }
}

/// Byte buffer that is parsed from and displayed as a hex-encoded string
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[repr(transparent)]
pub struct HexString {
    bytes: Vec<u8>,
}

impl HexString {
    /// Constructs a new, empty `HexString`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    #[inline(always)]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    /// Destructs a `HexString` into its underlying byte-vector
    #[inline]
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the number of bytes in `self`
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns a lowercase hexadecimal encoding of `self`,
    /// with two characters encoding each byte in order.
    ///
    /// # Examples
    ///
    /// ```
    /// # use abi_codec::HexString;
    /// assert_eq!(HexString::new().to_hex(), "");
    /// assert_eq!(HexString::from(vec![0xde, 0xad, 0xbe, 0xef]).to_hex(), "deadbeef");
    /// ```
    #[must_use]
    pub fn to_hex(&self) -> String {
        util::hex_of_bytes(&self.bytes)
    }

    /// Attempt to parse a hexadecimally encoded string into the sequence of
    /// bytes it represents
    pub fn from_hex<S>(hex: S) -> Result<Self, HexConvError>
    where
        S: AsRef<str>,
    {
        Ok(Self {
            bytes: util::bytes_of_hex(hex.as_ref())?,
        })
    }

    /// Returns `true` if `other` is a hex-string that represents the
    /// same byte-sequence as `self`.
    #[must_use]
    pub fn eq_hex<S>(&self, other: &S) -> bool
    where
        S: AsRef<str> + ?Sized,
    {
        util::eq_hex_bytes(other.as_ref(), self.as_bytes())
    }
}

impl AsRef<[u8]> for HexString {
    fn as_ref(&self) -> &[u8] {
        self.bytes.as_ref()
    }
}

impl std::fmt::Debug for HexString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("HexString").field(&self.to_hex()).finish()
    }
}

impl std::fmt::Display for HexString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Target for HexString {
    fn anticipate(&mut self, extra: usize) {
        self.bytes.anticipate(extra)
    }

    fn create() -> Self {
        Self::new()
    }

    fn push_one(&mut self, b: u8) -> usize {
        self.bytes.push_one(b)
    }

    fn push_all(&mut self, buf: &[u8]) -> usize {
        self.bytes.push_all(buf)
    }
}

impl From<HexString> for Vec<u8> {
    fn from(val: HexString) -> Self {
        val.bytes
    }
}

impl From<Vec<u8>> for HexString {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<&[u8]> for HexString {
    fn from(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }
}

impl<const N: usize> From<[u8; N]> for HexString {
    fn from(arr: [u8; N]) -> Self {
        Self {
            bytes: arr.to_vec(),
        }
    }
}

impl TryFrom<&str> for HexString {
    type Error = HexConvError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for HexString {
    type Error = HexConvError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(s)
    }
}

/// Constructs a [`HexString`] from a hex literal, panicking on invalid input
#[macro_export]
macro_rules! hex {
    ( $s:expr ) => {
        match $crate::hexstring::HexString::from_hex($s) {
            Ok(h) => h,
            Err(e) => panic!("hex! failed to parse `{}`: {}", $s, e),
        }
    };
}

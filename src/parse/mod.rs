//! Custom parsing model with byte-level precision
//!
//! This module, along with its submodules, provides the fundamental
//! definitions related to the abstract task of processing raw sequences
//! of binary data into the low-level fragments at the leaf nodes of
//! an arbitrarily complex ABI type.
//!
//! For type-aware parsing, in other words, parsing Rust types directly
//! rather than as an unstructured sequence of primitives, see the
//! [`Decode`](crate::conv::Decode) trait. For schema-driven parsing of
//! values whose shape is only known at runtime, see [`crate::codec::binary`].
//!
//! # Layout
//!
//! The top-level of this module defines the [`Parser`] trait. There are two
//! sub-modules:
//!   * `error` defines the hierarchy of error cases that can be returned when a
//!     call to a `Parser` method fails.
//!   * `sliceparser` defines [`SliceParser`], the cursor over a borrowed byte-slice
//!     that every decode call in this crate uses.

pub mod error;
pub mod sliceparser;

pub use error::{ParseError, ParseResult};
use error::{TokenError, WindowError};

/// Maximum number of bytes in the encoding of a 32-bit variable-length integer
pub const VARUINT32_MAX_BYTES: usize = 5;

/// # Parser
///
/// Abstraction over a stateful, single-use cursor into an immutable byte-buffer,
/// with default implementations for the monomorphic `take_*` primitives of the
/// ABI binary format.
///
/// ## Model
///
///  * The Parser-object is constructed over an immutable byte-buffer.
///  * All parsing is done in a non-backtracking fashion; a byte can only be
///    consumed once, and only after every preceding byte has been consumed.
///  * Lookahead over the unconsumed bytes is permitted through [`Parser::view`],
///    which is how self-terminating values locate their final byte before
///    consuming anything.
///
/// ## Invariants
///
/// * A fresh parser has `offset() == 0`.
/// * `remainder()` is the largest `n` for which `consume(n)` succeeds.
/// * A failed `take_*` or `consume` call leaves `offset()` unchanged. There are
///   no partial reads.
pub trait Parser {
    /// Computes the current value of the offset into the Parser's buffer.
    fn offset(&self) -> usize;

    /// Returns the unconsumed portion of the buffer without consuming it.
    fn view(&self) -> &[u8];

    /// Computes the remaining number of bytes that can be safely consumed.
    fn remainder(&self) -> usize {
        self.view().len()
    }

    /// Attempt to consume and return a slice of length `nbytes`,
    /// starting from the first unconsumed byte in the buffer.
    ///
    /// # Invariants
    ///
    /// This method **MUST** return `Ok(s)` when and only when `nbytes` does
    /// not exceed [`remainder`](Parser::remainder), and in such cases `s.len()`
    /// must equal `nbytes`. Otherwise nothing is consumed.
    fn consume(&mut self, nbytes: usize) -> ParseResult<&[u8]>;

    /// Returns the error value for a read of `requested` bytes that cannot be satisfied
    fn underrun(&self, requested: usize) -> ParseError {
        ParseError::Window(WindowError::Underrun {
            offset: self.offset(),
            requested,
            remaining: self.remainder(),
        })
    }

    /// Consumes and returns a single byte from the current offset position
    fn consume_byte(&mut self) -> ParseResult<u8> {
        Ok(self.consume(1)?[0])
    }

    /// Consumes `N` bytes and returns them in array-form
    fn consume_arr<const N: usize>(&mut self) -> ParseResult<[u8; N]> {
        let mut arr = [0u8; N];
        arr.copy_from_slice(self.consume(N)?);
        Ok(arr)
    }

    /// Consumes one byte and returns it as a `u8` value
    #[inline]
    fn take_u8(&mut self) -> ParseResult<u8> {
        self.consume_byte()
    }

    /// Consumes one byte and returns it as an `i8` value
    #[inline]
    fn take_i8(&mut self) -> ParseResult<i8> {
        Ok(self.consume_byte()? as i8)
    }

    /// Consumes two bytes and returns the corresponding `u16` value
    ///
    /// As with all fixed-width multi-byte numeric `take_X` methods,
    /// this method performs a little-endian conversion with
    /// respect to the individual bytes consumed.
    #[inline]
    fn take_u16(&mut self) -> ParseResult<u16> {
        self.consume_arr::<2>().map(u16::from_le_bytes)
    }

    #[inline]
    fn take_i16(&mut self) -> ParseResult<i16> {
        self.consume_arr::<2>().map(i16::from_le_bytes)
    }

    #[inline]
    fn take_u32(&mut self) -> ParseResult<u32> {
        self.consume_arr::<4>().map(u32::from_le_bytes)
    }

    #[inline]
    fn take_i32(&mut self) -> ParseResult<i32> {
        self.consume_arr::<4>().map(i32::from_le_bytes)
    }

    #[inline]
    fn take_u64(&mut self) -> ParseResult<u64> {
        self.consume_arr::<8>().map(u64::from_le_bytes)
    }

    #[inline]
    fn take_i64(&mut self) -> ParseResult<i64> {
        self.consume_arr::<8>().map(i64::from_le_bytes)
    }

    #[inline]
    fn take_u128(&mut self) -> ParseResult<u128> {
        self.consume_arr::<16>().map(u128::from_le_bytes)
    }

    #[inline]
    fn take_i128(&mut self) -> ParseResult<i128> {
        self.consume_arr::<16>().map(i128::from_le_bytes)
    }

    #[inline]
    fn take_f32(&mut self) -> ParseResult<f32> {
        self.consume_arr::<4>().map(f32::from_le_bytes)
    }

    #[inline]
    fn take_f64(&mut self) -> ParseResult<f64> {
        self.consume_arr::<8>().map(f64::from_le_bytes)
    }

    /// Consumes a single byte and returns the boolean value it represents
    ///
    /// The only valid boolean encodings are `0x01` for `true`
    /// and `0x00` for `false`. The same byte layout is used for the
    /// presence flag of optional values.
    ///
    /// # Errors
    ///
    /// If the consume operation itself fails, returns the original error.
    /// Otherwise, returns `InvalidBoolean` containing the invalid byte; the
    /// byte is not consumed in that case.
    #[inline]
    fn take_bool(&mut self) -> ParseResult<bool> {
        let head = self.view().first().copied();
        match head {
            Some(0x00) => self.consume(1).map(|_| false),
            Some(0x01) => self.consume(1).map(|_| true),
            Some(byte) => Err(TokenError::InvalidBoolean(byte).into()),
            None => Err(self.underrun(1)),
        }
    }

    /// Locates a varuint32 at the head of the unconsumed bytes, returning its
    /// encoded width and its value, without consuming anything.
    ///
    /// The terminating byte is the first byte whose high bit is clear.
    fn peek_varuint32(&self) -> ParseResult<(usize, u32)> {
        let view = self.view();
        match view
            .iter()
            .take(VARUINT32_MAX_BYTES)
            .position(|&byte| byte & 0x80 == 0)
        {
            Some(ix) => {
                let raw = crate::varint::fold_groups(&view[..=ix]);
                match u32::try_from(raw) {
                    Ok(value) => Ok((ix + 1, value)),
                    Err(_) => Err(TokenError::VarintRange(raw).into()),
                }
            }
            None if view.len() < VARUINT32_MAX_BYTES => Err(self.underrun(view.len() + 1)),
            None => Err(TokenError::VarintOverflow {
                limit: VARUINT32_MAX_BYTES,
            }
            .into()),
        }
    }

    /// Consumes an unsigned 32-bit variable-length integer
    ///
    /// Seven bits per byte, least-significant group first, with the high bit
    /// of every byte but the last set.
    fn take_varuint32(&mut self) -> ParseResult<u32> {
        let (width, value) = self.peek_varuint32()?;
        self.consume(width)?;
        Ok(value)
    }

    /// Consumes a zig-zag encoded signed 32-bit variable-length integer
    fn take_varint32(&mut self) -> ParseResult<i32> {
        self.take_varuint32().map(crate::varint::unzigzag)
    }

    /// Consumes and returns a `Vec<u8>` of length `nbytes`
    #[inline]
    fn take_dynamic(&mut self, nbytes: usize) -> ParseResult<Vec<u8>> {
        self.consume(nbytes).map(Vec::from)
    }

    /// Consumes a varuint32 length prefix followed by that many raw bytes
    ///
    /// The prefix is only consumed when the payload is fully available.
    fn take_bytes(&mut self) -> ParseResult<Vec<u8>> {
        let (width, len) = self.peek_varuint32()?;
        let len = len as usize;
        if self.remainder() - width < len {
            return Err(self.underrun(width + len));
        }
        self.consume(width)?;
        self.take_dynamic(len)
    }

    /// Consumes a varuint32-length-prefixed UTF-8 string
    fn take_string(&mut self) -> ParseResult<String> {
        let (width, len) = self.peek_varuint32()?;
        let len = len as usize;
        let payload = match self.view().get(width..width + len) {
            Some(payload) => payload.to_vec(),
            None => return Err(self.underrun(width + len)),
        };
        let s = String::from_utf8(payload)?;
        self.consume(width + len)?;
        Ok(s)
    }
}

pub use sliceparser::SliceParser;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fixed_width_little_endian() {
        let mut p = SliceParser::new(&[0x01, 0x02, 0x03, 0x04, 0xff]);
        assert_eq!(p.take_u16(), Ok(0x0201));
        assert_eq!(p.take_u16(), Ok(0x0403));
        assert_eq!(p.take_i8(), Ok(-1));
        assert_eq!(p.remainder(), 0);
    }

    #[test]
    fn underrun_is_non_destructive() {
        let mut p = SliceParser::new(&[0xaa, 0xbb, 0xcc]);
        assert!(p.take_u32().unwrap_err().is_underrun());
        assert_eq!(p.offset(), 0);
        assert_eq!(p.take_u16(), Ok(0xbbaa));
        assert!(p.take_u16().unwrap_err().is_underrun());
        assert_eq!(p.offset(), 2);
    }

    #[test]
    fn varuint32_groups() {
        let mut p = SliceParser::new(&[0x00, 0x7f, 0x80, 0x01, 0xff, 0xff, 0xff, 0xff, 0x0f]);
        assert_eq!(p.take_varuint32(), Ok(0));
        assert_eq!(p.take_varuint32(), Ok(127));
        assert_eq!(p.take_varuint32(), Ok(128));
        assert_eq!(p.take_varuint32(), Ok(u32::MAX));
        assert_eq!(p.remainder(), 0);
    }

    #[test]
    fn varuint32_failures() {
        let mut p = SliceParser::new(&[0x80, 0x80]);
        assert!(p.take_varuint32().unwrap_err().is_underrun());
        assert_eq!(p.offset(), 0);

        let mut p = SliceParser::new(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01]);
        assert_eq!(
            p.take_varuint32(),
            Err(TokenError::VarintOverflow { limit: 5 }.into())
        );
        assert_eq!(p.offset(), 0);

        let mut p = SliceParser::new(&[0xff, 0xff, 0xff, 0xff, 0x1f]);
        assert_eq!(
            p.take_varuint32(),
            Err(TokenError::VarintRange(0x1_ffff_ffff).into())
        );
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn varint32_zigzag() {
        let mut p = SliceParser::new(&[0x00, 0x01, 0x02, 0x03, 0xfe, 0xff, 0xff, 0xff, 0x0f]);
        assert_eq!(p.take_varint32(), Ok(0));
        assert_eq!(p.take_varint32(), Ok(-1));
        assert_eq!(p.take_varint32(), Ok(1));
        assert_eq!(p.take_varint32(), Ok(-2));
        assert_eq!(p.take_varint32(), Ok(i32::MAX));
    }

    #[test]
    fn strings_and_bytes() {
        let mut p = SliceParser::new(b"\x03one\x02\xde\xad\x05ab");
        assert_eq!(p.take_string().as_deref(), Ok("one"));
        assert_eq!(p.take_bytes(), Ok(vec![0xde, 0xad]));
        let before = p.offset();
        assert!(p.take_string().unwrap_err().is_underrun());
        assert_eq!(p.offset(), before);
    }

    #[test]
    fn invalid_utf8_is_not_consumed() {
        let mut p = SliceParser::new(&[0x02, 0xc3, 0x28]);
        assert!(matches!(
            p.take_string(),
            Err(ParseError::Token(TokenError::InvalidUtf8(_)))
        ));
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn booleans() {
        let mut p = SliceParser::new(&[0x01, 0x00, 0x02]);
        assert_eq!(p.take_bool(), Ok(true));
        assert_eq!(p.take_bool(), Ok(false));
        assert_eq!(p.take_bool(), Err(TokenError::InvalidBoolean(2).into()));
        assert_eq!(p.offset(), 2);
    }
}

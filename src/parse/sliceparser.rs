//! Cursor over a borrowed byte-slice
//!
//! [`SliceParser`] is the only [`Parser`] implementation in this crate. It
//! never copies the buffer it is created over; it tracks a single offset
//! that advances monotonically as bytes are consumed.

use super::{ParseResult, Parser};

/// Offset-tracking [`Parser`] over a lifetime-annotated immutable slice
///
/// A `SliceParser` is created for exactly one decode call and dropped at its end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliceParser<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> SliceParser<'a> {
    /// Creates a `SliceParser` positioned at the first byte of `buf`
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    /// Returns the total length of the underlying buffer
    #[must_use]
    pub const fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if the underlying buffer contains zero bytes
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns `true` if every byte of the buffer has been consumed
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.offset == self.buf.len()
    }
}

impl<'a> From<&'a [u8]> for SliceParser<'a> {
    fn from(buf: &'a [u8]) -> Self {
        Self::new(buf)
    }
}

impl Parser for SliceParser<'_> {
    #[inline]
    fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    fn view(&self) -> &[u8] {
        &self.buf[self.offset..]
    }

    fn consume(&mut self, nbytes: usize) -> ParseResult<&[u8]> {
        if nbytes > self.remainder() {
            return Err(self.underrun(nbytes));
        }
        let start = self.offset;
        self.offset += nbytes;
        Ok(&self.buf[start..self.offset])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn consume_tracks_offset() {
        let mut p = SliceParser::new(b"abcdef");
        assert_eq!(p.consume(2), Ok(&b"ab"[..]));
        assert_eq!(p.offset(), 2);
        assert_eq!(p.view(), b"cdef");
        assert_eq!(p.consume(0), Ok(&b""[..]));
        assert!(p.consume(5).is_err());
        assert_eq!(p.consume(4), Ok(&b"cdef"[..]));
        assert!(p.is_exhausted());
    }
}

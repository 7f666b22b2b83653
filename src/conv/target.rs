//! Write-side dual of [`Parser`](crate::parse::Parser)
//!
//! A [`Target`] is anything that serialized bytes can be appended to. Every
//! `push_*` method returns the number of bytes it wrote, so that
//! [`Encode::write_to`](crate::conv::Encode::write_to) implementations can
//! report their width by summing the results of their constituent writes.

pub trait Target {
    /// Hints that at least `extra` more bytes are about to be written
    fn anticipate(&mut self, extra: usize);

    fn push_one(&mut self, b: u8) -> usize;

    fn push_all(&mut self, buf: &[u8]) -> usize;

    fn push_many<const N: usize>(&mut self, arr: [u8; N]) -> usize {
        self.push_all(&arr)
    }

    fn create() -> Self;
}

/// Zero-allocation target that only counts the bytes written to it
pub type ByteCounter = std::io::Sink;

impl Target for ByteCounter {
    #[inline]
    fn anticipate(&mut self, _: usize) {}

    #[inline]
    fn push_one(&mut self, _: u8) -> usize {
        1
    }

    #[inline]
    fn push_all(&mut self, buf: &[u8]) -> usize {
        buf.len()
    }

    #[inline]
    fn push_many<const N: usize>(&mut self, _: [u8; N]) -> usize {
        N
    }

    fn create() -> Self {
        std::io::sink()
    }
}

impl Target for Vec<u8> {
    #[inline]
    fn anticipate(&mut self, extra: usize) {
        self.reserve(extra)
    }

    #[inline]
    fn push_one(&mut self, b: u8) -> usize {
        self.push(b);
        1
    }

    #[inline]
    fn push_all(&mut self, buf: &[u8]) -> usize {
        self.extend_from_slice(buf);
        buf.len()
    }

    fn create() -> Self {
        Self::new()
    }
}

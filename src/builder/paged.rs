//! Builder over a page-granular backing buffer

use num_integer::Integer;

use crate::conv::target::Target;

/// Growth increment, in bytes, of a [`PagedBuilder`]'s backing buffer
pub const PAGE_SIZE: usize = 1024;

/// Write cursor over an owned buffer that grows a page at a time
///
/// The backing buffer is always a whole number of pages. It is only grown
/// when the next write would overflow it, and then by the smallest number of
/// pages that fits the write. [`finalize`](crate::Builder::finalize) returns
/// exactly the bytes written.
#[derive(Clone, Debug)]
pub struct PagedBuilder {
    buf: Vec<u8>,
    pos: usize,
}

impl PagedBuilder {
    /// Creates a builder with a single zeroed page
    #[must_use]
    pub fn new() -> Self {
        Self::with_pages(1)
    }

    #[must_use]
    pub fn with_pages(pages: usize) -> Self {
        Self {
            buf: vec![0; pages * PAGE_SIZE],
            pos: 0,
        }
    }

    /// Current size of the backing buffer, in bytes
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes written so far
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    fn reserve(&mut self, extra: usize) {
        let needed = self.pos + extra;
        if needed > self.buf.len() {
            let pages = Integer::div_ceil(&(needed - self.buf.len()), &PAGE_SIZE);
            self.buf.resize(self.buf.len() + pages * PAGE_SIZE, 0);
        }
    }
}

impl Default for PagedBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Target for PagedBuilder {
    fn anticipate(&mut self, extra: usize) {
        self.reserve(extra)
    }

    fn push_one(&mut self, b: u8) -> usize {
        self.reserve(1);
        self.buf[self.pos] = b;
        self.pos += 1;
        1
    }

    fn push_all(&mut self, buf: &[u8]) -> usize {
        self.reserve(buf.len());
        self.buf[self.pos..self.pos + buf.len()].copy_from_slice(buf);
        self.pos += buf.len();
        buf.len()
    }

    fn create() -> Self {
        Self::new()
    }
}

impl super::Builder for PagedBuilder {
    type Final = Vec<u8>;

    fn finalize(mut self) -> Self::Final {
        self.buf.truncate(self.pos);
        self.buf
    }

    fn len(&self) -> usize {
        self.pos
    }
}

//! Extension trait for Targets that are filled once and then frozen
//!
//! This module is dedicated to the definition of the `Builder` trait, a
//! sub-trait of `Target`, borrowing the name from the ubiquitous Haskell
//! package `bytestring`.
//!
//! # Design
//!
//! A `Builder` is a kind of `Target` that can be optimized for a
//! potentially large number of append operations. `Builder` types also
//! include a `Final` type, which freezes the contents of the `Builder` and
//! contains exactly the bytes written to it, in order.
//!
//! # Layout
//!
//! The only implementing type is [`PagedBuilder`], defined in the
//! submodule `paged`, which is the writer used by the schema-driven binary
//! codec.

use crate::conv::target::Target;
use crate::hexstring::util::hex_of_bytes;

/// `Target` extension trait with a terminal freezing operation
pub trait Builder
where
    Self: Target + Sized,
{
    /// Type suitable for presenting the finalized contents of a `Builder` object
    type Final: Into<Vec<u8>>;

    /// Converts a `Self` value into a `Self::Final` value once
    /// it is fully built.
    fn finalize(self) -> Self::Final;

    /// Consume the Builder object and return a vector of its contents
    fn into_vec(self) -> Vec<u8> {
        self.finalize().into()
    }

    /// Return a string consisting of the raw hexadecimal sequence of words in the Builder
    fn into_hex(self) -> String {
        hex_of_bytes(&self.into_vec())
    }

    /// Determine the number of bytes written to the Builder so far
    fn len(&self) -> usize;

    /// Returns `true` if nothing has been written yet
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub mod paged;

pub use paged::{PagedBuilder, PAGE_SIZE};

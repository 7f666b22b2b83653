//! Error types used to report failure in low-level parsing
//!
//! This module contains the hierarchy of types representing specific
//! classes of error that may arise as a result of calls to
//! [`Parser`](crate::parse::Parser) methods.
//!
//! # Layout
//!
//! The primary type is [`ParseError`], along with the alias
//! [`ParseResult<T>`]. Its two refinements group errors by provenance:
//! [`WindowError`] for reads that would run past the end of the buffer,
//! and [`TokenError`] for bytes that were read successfully but do not
//! form a legal value of the type being parsed.

use std::{
    convert::Infallible,
    fmt::{Display, Formatter, Result},
    string::FromUtf8Error,
};

/// Any error that may be encountered within `Parser`-related code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A read would have consumed bytes past the end of the buffer.
    ///
    /// No bytes are consumed when this error is returned.
    Window(WindowError),
    /// The bytes in the buffer do not form a legal value of the
    /// type being parsed.
    Token(TokenError),
}

impl ParseError {
    /// Returns `true` if this error was caused by running out of bytes
    #[must_use]
    pub const fn is_underrun(&self) -> bool {
        matches!(self, ParseError::Window(WindowError::Underrun { .. }))
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            ParseError::Window(err) => write!(f, "buffer error: {}", err),
            ParseError::Token(err) => write!(f, "token error: {}", err),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Window(_) => None,
            ParseError::Token(TokenError::InvalidUtf8(err)) => Some(err),
            ParseError::Token(_) => None,
        }
    }
}

impl From<Infallible> for ParseError {
    fn from(void: Infallible) -> Self {
        match void {}
    }
}

/// Type alias for Result with an error type of [`ParseError`]
///
/// Most `Parser` methods, and every `Decode::parse` implementation,
/// return `ParseResult<T>` for some `T`.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Errors related to the bounds of the parse-buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowError {
    /// Error case when a method that attempts to consume some number
    /// of bytes from the buffer would pass its final byte in doing so.
    Underrun {
        offset: usize,
        requested: usize,
        remaining: usize,
    },
}

impl From<WindowError> for ParseError {
    fn from(err: WindowError) -> Self {
        Self::Window(err)
    }
}

impl Display for WindowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match *self {
            WindowError::Underrun {
                offset,
                requested,
                remaining,
            } => {
                if remaining == 0 {
                    write!(
                        f,
                        "cannot read {} bytes at offset {}: buffer has been fully consumed",
                        requested, offset
                    )
                } else {
                    write!(
                        f,
                        "cannot read {} bytes at offset {}: only {} bytes remaining",
                        requested, offset, remaining
                    )
                }
            }
        }
    }
}

/// Errors arising from unexpected tokens in the buffer
///
/// Includes illegal boolean bytes, non-UTF-8 strings, and variable-length
/// integers that do not terminate within their maximum width.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TokenError {
    /// Byte parsed as a boolean (or presence flag) was neither `0x00` nor `0x01`
    InvalidBoolean(u8),
    /// Length-prefixed string contents were not valid UTF-8
    InvalidUtf8(FromUtf8Error),
    /// Variable-length integer did not terminate within `limit` bytes
    VarintOverflow { limit: usize },
    /// Variable-length integer terminated but its value does not fit in 32 bits
    VarintRange(u64),
}

impl From<TokenError> for ParseError {
    fn from(tok_e: TokenError) -> Self {
        Self::Token(tok_e)
    }
}

impl From<FromUtf8Error> for ParseError {
    fn from(err: FromUtf8Error) -> Self {
        Self::Token(TokenError::InvalidUtf8(err))
    }
}

impl Display for TokenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::InvalidBoolean(byte) => {
                write!(f, "expected boolean := (0x01 | 0x00), got 0x{byte:02x}")
            }
            Self::InvalidUtf8(err) => {
                write!(f, "length-prefixed string is not valid UTF-8: {}", err)
            }
            Self::VarintOverflow { limit } => {
                write!(
                    f,
                    "variable-length integer failed to terminate within {} bytes",
                    limit
                )
            }
            Self::VarintRange(raw) => {
                write!(f, "variable-length integer {} exceeds 32 bits", raw)
            }
        }
    }
}

//! General error types
//!
//! This module contains the error types that are shared across more than one
//! layer of the crate: value-level validation failures ([`ValueError`] and its
//! refinements [`BoundsError`], [`LengthError`] and [`HexConvError`]), schema
//! loading failures ([`SchemaError`]), and the call-level [`AbiError`] that
//! every entry point in [`crate::serializer`] returns.
//!
//! Errors specific to the low-level parser live in [`crate::parse::error`],
//! and errors of the static `Decode` API in [`crate::conv::error`].

use std::error::Error;
use std::fmt::{Debug, Display};

use num_bigint::BigInt;

use crate::codec::path::CodingPath;
use crate::conv::error::DecodeError;
use crate::parse::error::ParseError;

/// Enumerated error type for failures related to values that impose a check
/// on the number of elements (characters, for textual leaves) they contain.
#[derive(Clone, PartialEq, PartialOrd, Eq, Ord, Debug)]
pub enum LengthError {
    /// Restriction on maximum element-count exceeded
    TooLong { limit: usize, actual: usize },
    /// Requirement of precise element-count not satisfied
    WrongLength { exact: usize, actual: usize },
}

impl LengthError {
    /// Returns `Ok(actual)` if `actual` does not exceed `limit`
    pub fn check_max(actual: usize, limit: usize) -> Result<usize, Self> {
        if actual > limit {
            Err(Self::TooLong { limit, actual })
        } else {
            Ok(actual)
        }
    }
}

impl Display for LengthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LengthError::TooLong { limit, actual } => {
                write!(
                    f,
                    "{actual}-element value exceeded limit of {limit} elements"
                )
            }
            LengthError::WrongLength { exact, actual } => {
                write!(
                    f,
                    "{actual}-element value violated requirement of {exact} elements"
                )
            }
        }
    }
}

impl Error for LengthError {}

/// Error type representing all possible conditions for invalidity
/// encountered when attempting to parse a string-type as a series
/// of hex-encoded bytes.
#[derive(Clone, PartialEq, Eq, Ord, PartialOrd)]
pub enum HexConvError {
    /// Error case for odd-length strings
    OddParity(String),
    /// Error case for strings containing non-hex characters,
    /// i.e. anything not in `[0-9a-fA-F]`.
    NonHex(String),
}

impl Debug for HexConvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OddParity(invalid) => {
                write!(f, "non-even length-parity for string `{}`", invalid)
            }
            Self::NonHex(invalid) => write!(f, "non-hex character found in string `{}`", invalid),
        }
    }
}

impl Display for HexConvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OddParity(_) => {
                write!(f, "hex-conversion failed on odd-length string")
            }
            Self::NonHex(_) => {
                write!(f, "hex-conversion failed on non-hex character")
            }
        }
    }
}

impl Error for HexConvError {}

/// Error type representing invalidity of numeric values based on an
/// inclusive lower and upper bound.
///
/// * `Underflow {..}` contains the illegal value in question, as well as the lower bound it falls below
/// * `Overflow {..}` contains the illegal value in question, as well as the upper bound it falls above
///
/// Integer leaves of every width are validated through `BoundsError<BigInt>`,
/// so that the same check covers 128-bit values and decimal-string input.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum BoundsError<Ext: Debug> {
    Underflow { min: Ext, val: Ext },
    Overflow { max: Ext, val: Ext },
}

impl<Ext: Debug + PartialOrd> BoundsError<Ext> {
    /// Checks that `val` falls into the range `[min, max]`, returning
    /// `Ok(val)` if this condition holds.
    pub fn restrict(val: Ext, min: Ext, max: Ext) -> Result<Ext, Self> {
        if val < min {
            Err(Self::Underflow { min, val })
        } else if val > max {
            Err(Self::Overflow { max, val })
        } else {
            Ok(val)
        }
    }
}

impl<Ext: Debug + Display> Display for BoundsError<Ext> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundsError::Underflow { ref min, ref val } => {
                write!(f, "provided value {} less than minimum bound {}", val, min)
            }
            BoundsError::Overflow { ref max, ref val } => {
                write!(
                    f,
                    "provided value {} greater than maximum bound {}",
                    val, max
                )
            }
        }
    }
}

impl<Ext: Display + Debug> Error for BoundsError<Ext> {}

/// Failure to construct a typed leaf value from its JSON projection or text form
#[derive(Clone, Debug, PartialEq)]
pub enum ValueError {
    /// The JSON value is of a kind the leaf type cannot be constructed from
    Mismatch {
        expected: &'static str,
        found: String,
    },
    Bounds(BoundsError<BigInt>),
    Length(LengthError),
    Hex(HexConvError),
    /// Text that does not parse as the leaf type
    Invalid { what: &'static str, text: String },
}

impl ValueError {
    pub(crate) fn mismatch(expected: &'static str, found: &serde_json::Value) -> Self {
        let found = match found {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "boolean",
            serde_json::Value::Number(_) => "number",
            serde_json::Value::String(_) => "string",
            serde_json::Value::Array(_) => "array",
            serde_json::Value::Object(_) => "object",
        };
        Self::Mismatch {
            expected,
            found: found.to_owned(),
        }
    }

    pub(crate) fn invalid(what: &'static str, text: impl Into<String>) -> Self {
        Self::Invalid {
            what,
            text: text.into(),
        }
    }
}

impl Display for ValueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueError::Mismatch { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            ValueError::Bounds(err) => Display::fmt(err, f),
            ValueError::Length(err) => Display::fmt(err, f),
            ValueError::Hex(err) => Display::fmt(err, f),
            ValueError::Invalid { what, text } => {
                write!(f, "`{text}` is not a valid {what}")
            }
        }
    }
}

impl Error for ValueError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ValueError::Bounds(err) => Some(err),
            ValueError::Length(err) => Some(err),
            ValueError::Hex(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BoundsError<BigInt>> for ValueError {
    fn from(err: BoundsError<BigInt>) -> Self {
        Self::Bounds(err)
    }
}

impl From<LengthError> for ValueError {
    fn from(err: LengthError) -> Self {
        Self::Length(err)
    }
}

impl From<HexConvError> for ValueError {
    fn from(err: HexConvError) -> Self {
        Self::Hex(err)
    }
}

/// Failure to load a schema document
#[derive(Debug)]
pub enum SchemaError {
    Json(serde_json::Error),
    Binary(DecodeError),
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::Json(err) => write!(f, "malformed JSON schema: {}", err),
            SchemaError::Binary(err) => write!(f, "malformed binary schema: {}", err),
        }
    }
}

impl Error for SchemaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SchemaError::Json(err) => Some(err),
            SchemaError::Binary(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<DecodeError> for SchemaError {
    fn from(err: DecodeError) -> Self {
        Self::Binary(err)
    }
}

/// Discriminant of an [`AbiError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No alias, struct, variant or registered descriptor matches the type name
    UnknownType,
    /// The value, or the bytes, do not conform to the type being coded
    NonConformingValue,
    /// The binary input ended before the type was fully decoded
    BufferUnderrun,
    /// An alias chain or base chain refers back to itself
    CircularType,
    /// No type was given and none can be inferred from the source value
    AmbiguousSourceType,
    /// The operation is not available for the type
    Unsupported,
    /// The schema document could not be loaded
    Schema,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::UnknownType => "unknown type",
            ErrorKind::NonConformingValue => "non-conforming value",
            ErrorKind::BufferUnderrun => "buffer underrun",
            ErrorKind::CircularType => "circular type",
            ErrorKind::AmbiguousSourceType => "ambiguous source type",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::Schema => "schema error",
        };
        f.write_str(label)
    }
}

/// Call-level error returned by [`encode`](crate::serializer::encode),
/// [`decode`](crate::serializer::decode) and the structural codecs
///
/// Carries the [`CodingPath`] that was being processed when the failure
/// occurred, which is empty for failures that precede any coding.
#[derive(Debug)]
pub struct AbiError {
    kind: ErrorKind,
    path: CodingPath,
    detail: String,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl AbiError {
    pub fn new(kind: ErrorKind, path: &CodingPath, detail: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.clone(),
            detail: detail.into(),
            source: None,
        }
    }

    /// Attaches an underlying cause
    #[must_use]
    pub fn with_source<E: Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn unknown_type(path: &CodingPath, name: &str) -> Self {
        Self::new(ErrorKind::UnknownType, path, format!("unknown type `{name}`"))
    }

    pub fn circular(path: &CodingPath, name: &str) -> Self {
        Self::new(
            ErrorKind::CircularType,
            path,
            format!("type `{name}` refers back to itself"),
        )
    }

    pub fn unsupported(path: &CodingPath, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, path, detail)
    }

    pub fn non_conforming(path: &CodingPath, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::NonConformingValue, path, detail)
    }

    /// Classifies a low-level parser failure: running out of bytes is a
    /// [`BufferUnderrun`](ErrorKind::BufferUnderrun), any other malformed
    /// token is a [`NonConformingValue`](ErrorKind::NonConformingValue).
    pub fn from_parse(err: ParseError, path: &CodingPath) -> Self {
        let kind = if err.is_underrun() {
            ErrorKind::BufferUnderrun
        } else {
            ErrorKind::NonConformingValue
        };
        Self::new(kind, path, err.to_string()).with_source(err)
    }

    pub fn from_value(err: ValueError, type_name: &str, path: &CodingPath) -> Self {
        Self::new(
            ErrorKind::NonConformingValue,
            path,
            format!("invalid value for `{type_name}`: {err}"),
        )
        .with_source(err)
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn path(&self) -> &CodingPath {
        &self.path
    }

    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl Display for AbiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)?;
        if !self.path.is_empty() {
            write!(f, " (at {})", self.path)?;
        }
        Ok(())
    }
}

impl Error for AbiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.source {
            Some(err) => Some(err.as_ref()),
            None => None,
        }
    }
}

impl From<SchemaError> for AbiError {
    fn from(err: SchemaError) -> Self {
        Self::new(ErrorKind::Schema, &CodingPath::default(), err.to_string()).with_source(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn dummy<T: Send + Sync>() {}

    #[test]
    fn errors_threadsafe() {
        dummy::<ValueError>();
        dummy::<SchemaError>();
        dummy::<AbiError>();
    }

    #[test]
    fn restrict_bigint() {
        let min = BigInt::from(-128);
        let max = BigInt::from(127);
        assert_eq!(
            BoundsError::restrict(BigInt::from(5), min.clone(), max.clone()),
            Ok(BigInt::from(5))
        );
        assert_eq!(
            BoundsError::restrict(BigInt::from(128), min.clone(), max.clone()),
            Err(BoundsError::Overflow {
                max: max.clone(),
                val: BigInt::from(128)
            })
        );
        assert!(matches!(
            BoundsError::restrict(BigInt::from(-129), min, max),
            Err(BoundsError::Underflow { .. })
        ));
    }

    #[test]
    fn parse_error_classification() {
        use crate::parse::error::{TokenError, WindowError};
        let path = CodingPath::default();
        let under = ParseError::Window(WindowError::Underrun {
            offset: 0,
            requested: 1,
            remaining: 0,
        });
        assert_eq!(
            AbiError::from_parse(under, &path).kind(),
            ErrorKind::BufferUnderrun
        );
        let bad = ParseError::Token(TokenError::InvalidBoolean(2));
        assert_eq!(
            AbiError::from_parse(bad, &path).kind(),
            ErrorKind::NonConformingValue
        );
    }
}

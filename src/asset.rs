//! Token symbols and fixed-point amounts
//!
//! A [`Symbol`] is a `u64` whose low byte is the decimal precision and whose
//! next (up to seven) bytes are the uppercase code, first character lowest.
//! Its text form is `"<precision>,<CODE>"`, e.g. `"4,EOS"`.
//!
//! An [`Asset`] is an `i64` count of the smallest unit, followed by its
//! symbol. Its text form places the decimal point according to the symbol
//! precision, e.g. `"1.0000 EOS"`.

use std::fmt::Display;
use std::str::FromStr;

use abi_derive::{Decode, Encode};

use crate::error::{LengthError, ValueError};

/// Maximum number of characters in a symbol code
pub const SYMBOL_CODE_MAX_LEN: usize = 7;

/// Largest supported decimal precision
pub const MAX_PRECISION: u8 = 18;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Debug, Encode, Decode)]
#[repr(transparent)]
pub struct Symbol(u64);

impl Symbol {
    /// Builds a symbol from a precision and an uppercase code of 1 to 7 characters
    pub fn new(precision: u8, code: &str) -> Result<Self, ValueError> {
        if precision > MAX_PRECISION {
            return Err(ValueError::invalid("symbol precision", precision.to_string()));
        }
        LengthError::check_max(code.len(), SYMBOL_CODE_MAX_LEN)?;
        if code.is_empty() || !code.bytes().all(|c| c.is_ascii_uppercase()) {
            return Err(ValueError::invalid("symbol code", code));
        }
        let raw = code
            .bytes()
            .enumerate()
            .fold(u64::from(precision), |acc, (ix, c)| {
                acc | (u64::from(c) << (8 * (ix + 1)))
            });
        Ok(Self(raw))
    }

    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn precision(self) -> u8 {
        (self.0 & 0xff) as u8
    }

    /// The symbol code, stopping at the first zero byte
    #[must_use]
    pub fn code(self) -> String {
        self.0.to_le_bytes()[1..]
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as char)
            .collect()
    }
}

impl FromStr for Symbol {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (precision, code) = s
            .split_once(',')
            .ok_or_else(|| ValueError::invalid("symbol", s))?;
        let precision = precision
            .trim()
            .parse::<u8>()
            .map_err(|_| ValueError::invalid("symbol", s))?;
        Self::new(precision, code.trim())
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.precision(), self.code())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug, Encode, Decode)]
pub struct Asset {
    pub amount: i64,
    pub symbol: Symbol,
}

impl Asset {
    #[must_use]
    pub const fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }
}

impl FromStr for Asset {
    type Err = ValueError;

    /// Parses `"<amount> <CODE>"`; the number of fractional digits in the
    /// amount is the symbol precision.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValueError::invalid("asset", s);
        let (number, code) = s.trim().split_once(' ').ok_or_else(invalid)?;
        let (negative, digits) = match number.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, number),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty()
            || !whole.bytes().all(|c| c.is_ascii_digit())
            || !frac.bytes().all(|c| c.is_ascii_digit())
            || (digits.contains('.') && frac.is_empty())
        {
            return Err(invalid());
        }
        let precision = u8::try_from(frac.len()).map_err(|_| invalid())?;
        let symbol = Symbol::new(precision, code.trim())?;
        let magnitude = format!("{whole}{frac}")
            .parse::<i128>()
            .map_err(|_| invalid())?;
        let signed = if negative { -magnitude } else { magnitude };
        let amount = i64::try_from(signed).map_err(|_| invalid())?;
        Ok(Self { amount, symbol })
    }
}

impl Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let precision = u32::from(self.symbol.precision());
        let magnitude = self.amount.unsigned_abs();
        let sign = if self.amount < 0 { "-" } else { "" };
        if precision == 0 {
            write!(f, "{sign}{magnitude} {}", self.symbol.code())
        } else {
            let scale = 10u128.pow(precision);
            let whole = u128::from(magnitude) / scale;
            let frac = u128::from(magnitude) % scale;
            write!(
                f,
                "{sign}{whole}.{frac:0width$} {}",
                self.symbol.code(),
                width = precision as usize
            )
        }
    }
}

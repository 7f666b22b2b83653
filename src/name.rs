//! Compact account names
//!
//! A [`Name`] packs up to 13 characters of the alphabet `.12345a-z` into a
//! `u64`. The first twelve characters take five bits each, starting from the
//! most significant end; the thirteenth takes the low four bits, and so is
//! restricted to `.12345a-j`. Trailing `.` characters are insignificant, and
//! the empty name is `0`.

use std::fmt::Display;
use std::str::FromStr;

use abi_derive::{Decode, Encode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{LengthError, ValueError};

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// Maximum number of characters in the text form of a [`Name`]
pub const NAME_MAX_LEN: usize = 13;

const fn char_value(c: u8) -> Option<u64> {
    match c {
        b'.' => Some(0),
        b'1'..=b'5' => Some((c - b'1') as u64 + 1),
        b'a'..=b'z' => Some((c - b'a') as u64 + 6),
        _ => None,
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Debug, Encode, Decode)]
#[repr(transparent)]
pub struct Name(u64);

impl Name {
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl FromStr for Name {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LengthError::check_max(s.len(), NAME_MAX_LEN)?;
        let mut raw = 0u64;
        for (ix, &c) in s.as_bytes().iter().enumerate() {
            let value = char_value(c).ok_or_else(|| ValueError::invalid("name", s))?;
            if ix < NAME_MAX_LEN - 1 {
                raw |= value << (64 - 5 * (ix + 1));
            } else if value > 0x0f {
                return Err(ValueError::invalid("name", s));
            } else {
                raw |= value;
            }
        }
        Ok(Self(raw))
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut text = [b'.'; NAME_MAX_LEN];
        let mut tmp = self.0;
        for ix in 0..NAME_MAX_LEN {
            let (mask, shift) = if ix == 0 { (0x0f, 4) } else { (0x1f, 5) };
            text[NAME_MAX_LEN - 1 - ix] = CHARMAP[(tmp & mask) as usize];
            tmp >>= shift;
        }
        let len = text.iter().rposition(|&c| c != b'.').map_or(0, |ix| ix + 1);
        // every byte of CHARMAP is ASCII
        f.write_str(std::str::from_utf8(&text[..len]).map_err(|_| std::fmt::Error)?)
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::conv::{Decode, Encode};
    use crate::{hex, HexString};

    #[test]
    fn packing() {
        let two: Name = "two".parse().unwrap();
        assert_eq!(two.encode::<HexString>(), hex!("00000000000028cf"));
        assert_eq!(two.to_string(), "two");
        assert_eq!(Name::try_decode(hex!("00000000000028cf")), Ok(two));
        assert_eq!(Name::default().to_string(), "");
    }

    #[test]
    fn full_width_names() {
        for text in ["eosio.token", "abcdefghijkl", "zzzzzzzzzzzzj", "a.b.c", "12345"] {
            let name: Name = text.parse().unwrap();
            assert_eq!(name.to_string(), text);
        }
        assert_eq!("eosio.".parse::<Name>().unwrap().to_string(), "eosio");
    }

    #[test]
    fn rejects() {
        assert!("Upper".parse::<Name>().is_err());
        assert!("six6".parse::<Name>().is_err());
        assert!("abcdefghijklmn".parse::<Name>().is_err());
        assert!("zzzzzzzzzzzzz".parse::<Name>().is_err());
    }

    #[test]
    fn serde_text_form() {
        let name: Name = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"alice\"");
        assert!(serde_json::from_str::<Name>("\"ALICE\"").is_err());
    }
}

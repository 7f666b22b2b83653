//! The ABI schema document
//!
//! An [`Abi`] declares the named types of a contract interface: aliases,
//! structs (each with an optional base struct whose fields come first),
//! and tagged unions ("variants"). The remaining sections (actions, tables,
//! ricardian clauses and action results) are carried through unchanged.
//!
//! A document can be loaded from JSON, through `serde`, or from its own
//! self-describing binary form, through [`Encode`] and [`Decode`]. The
//! sub-module [`resolve`] expands type names into a [`TypeGraph`].
//!
//! # Binary layout
//!
//! In order: the version string; counted lists of aliases, structs, actions,
//! tables and ricardian clauses; two legacy sections (error messages and
//! ABI extensions) that are always written empty and skipped on decode;
//! then the variants and action results, each of which is only present if
//! any bytes remain.

use abi_derive::{Decode, Encode};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::conv::target::Target;
use crate::conv::{Decode, Encode};
use crate::error::SchemaError;
use crate::name::Name;
use crate::parse::{ParseResult, Parser};

pub mod resolve;

pub use resolve::{ResolvedType, TypeGraph, TypeId, TypeKind};

/// Version string of documents produced by this crate
pub const ABI_VERSION: &str = "eosio::abi/1.1";

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct AbiTypeDef {
    pub new_type_name: String,
    #[serde(rename = "type")]
    pub type_: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct AbiField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct AbiStruct {
    pub name: String,
    /// Name of the base struct, or the empty string for none
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub fields: Vec<AbiField>,
}

impl AbiStruct {
    #[must_use]
    pub fn base(&self) -> Option<&str> {
        if self.base.is_empty() {
            None
        } else {
            Some(&self.base)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct AbiAction {
    pub name: Name,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub ricardian_contract: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct AbiTable {
    pub name: Name,
    #[serde(default)]
    pub index_type: String,
    #[serde(default)]
    pub key_names: Vec<String>,
    #[serde(default)]
    pub key_types: Vec<String>,
    #[serde(rename = "type")]
    pub type_: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct AbiClause {
    pub id: String,
    pub body: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct AbiVariant {
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct AbiActionResult {
    pub name: Name,
    pub result_type: String,
}

/// Entry of the legacy error-message section, read and discarded
#[derive(Decode)]
struct LegacyErrorMessage {
    _error_code: u64,
    _error_msg: String,
}

/// Entry of the legacy ABI-extension section, read and discarded
#[derive(Decode)]
struct LegacyExtension {
    _tag: u16,
    _value: Vec<u8>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Abi {
    pub version: String,
    pub types: Vec<AbiTypeDef>,
    pub structs: Vec<AbiStruct>,
    pub actions: Vec<AbiAction>,
    pub tables: Vec<AbiTable>,
    pub ricardian_clauses: Vec<AbiClause>,
    pub variants: Vec<AbiVariant>,
    pub action_results: Vec<AbiActionResult>,
}

impl Abi {
    /// Creates an empty document carrying the current version string
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: ABI_VERSION.to_owned(),
            ..Self::default()
        }
    }

    /// Loads a document from its JSON text
    ///
    /// Missing sections default to empty, and unknown keys are ignored.
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads a document from an already-parsed JSON value
    pub fn from_json_value(json: Json) -> Result<Self, SchemaError> {
        Ok(serde_json::from_value(json)?)
    }

    /// Loads a document from its self-describing binary form
    pub fn from_binary(bytes: &[u8]) -> Result<Self, SchemaError> {
        Ok(Self::try_decode(bytes)?)
    }

    pub fn to_json(&self) -> Result<Json, SchemaError> {
        Ok(serde_json::to_value(self)?)
    }

    /// First alias declared as `name`
    #[must_use]
    pub fn find_alias(&self, name: &str) -> Option<&AbiTypeDef> {
        self.types.iter().find(|def| def.new_type_name == name)
    }

    /// First struct declared as `name`
    #[must_use]
    pub fn find_struct(&self, name: &str) -> Option<&AbiStruct> {
        self.structs.iter().find(|def| def.name == name)
    }

    /// First variant declared as `name`
    #[must_use]
    pub fn find_variant(&self, name: &str) -> Option<&AbiVariant> {
        self.variants.iter().find(|def| def.name == name)
    }

    fn section_lengths(&self) -> [usize; 7] {
        [
            self.types.len(),
            self.structs.len(),
            self.actions.len(),
            self.tables.len(),
            self.ricardian_clauses.len(),
            self.variants.len(),
            self.action_results.len(),
        ]
    }

    /// Structural equality: documents are equal when their binary encodings are
    ///
    /// Documents whose sections differ in length are rejected without encoding.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        self.section_lengths() == other.section_lengths() && self.to_bytes() == other.to_bytes()
    }
}

impl PartialEq for Abi {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Encode for Abi {
    fn write_to<U: Target>(&self, buf: &mut U) -> usize {
        self.version.write_to(buf)
            + self.types.write_to(buf)
            + self.structs.write_to(buf)
            + self.actions.write_to(buf)
            + self.tables.write_to(buf)
            + self.ricardian_clauses.write_to(buf)
            + buf.push_one(0x00)
            + buf.push_one(0x00)
            + self.variants.write_to(buf)
            + self.action_results.write_to(buf)
    }
}

/// Reads a counted section that may be entirely absent at the end of the input
fn parse_trailing<T: Decode, P: Parser>(p: &mut P) -> ParseResult<Vec<T>> {
    if p.remainder() == 0 {
        Ok(Vec::new())
    } else {
        Vec::<T>::parse(p)
    }
}

impl Decode for Abi {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        let version = String::parse(p)?;
        let types = Vec::parse(p)?;
        let structs = Vec::parse(p)?;
        let actions = Vec::parse(p)?;
        let tables = Vec::parse(p)?;
        let ricardian_clauses = Vec::parse(p)?;
        let _ = Vec::<LegacyErrorMessage>::parse(p)?;
        let _ = Vec::<LegacyExtension>::parse(p)?;
        let variants = parse_trailing(p)?;
        let action_results = parse_trailing(p)?;
        Ok(Self {
            version,
            types,
            structs,
            actions,
            tables,
            ricardian_clauses,
            variants,
            action_results,
        })
    }
}

/// Where a call obtains its schema document from
#[derive(Clone, Debug)]
pub enum AbiSource {
    Document(Abi),
    Json(String),
    Binary(Vec<u8>),
}

impl AbiSource {
    pub fn load(self) -> Result<Abi, SchemaError> {
        match self {
            AbiSource::Document(abi) => Ok(abi),
            AbiSource::Json(text) => Abi::from_json(&text),
            AbiSource::Binary(bytes) => Abi::from_binary(&bytes),
        }
    }
}

impl From<Abi> for AbiSource {
    fn from(abi: Abi) -> Self {
        Self::Document(abi)
    }
}

//! Register maps described in JSON.
//!
//! ```json
//! {
//!   "revision": "1.0b",
//!   "registers": [
//!     { "desc": "VS", "offset": "0x08", "size": 4, "default": "0x00010000", "read_only": "0xffffffff" },
//!     { "desc": "RES3", "offset": "0x38", "size": 3784, "read_only": "0xffffffffffffffff", "reserved": true }
//!   ]
//! }
//! ```
//!
//! Numbers are JSON integers or strings (`0x`-prefixed hex or decimal, `_` separators allowed).
//! A mask may also be a list of per-chunk words for wide registers. Entries without an `id` get
//! their position in the list; entries without a `spec_rev` use the map's `revision`.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::regs::{BitPattern, RegisterDescriptor, RegisterId, RegisterMap, SpecRevision};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterMapFile {
    #[serde(default)]
    pub revision: Option<String>,
    pub registers: Vec<RegisterEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterEntry {
    #[serde(default)]
    pub id: Option<u16>,
    pub desc: String,
    pub offset: Number,
    pub size: usize,
    #[serde(default)]
    pub spec_rev: Option<String>,
    #[serde(default)]
    pub default: Option<Pattern>,
    #[serde(default)]
    pub read_only: Option<Pattern>,
    #[serde(default)]
    pub impl_specific: Option<Pattern>,
    #[serde(default)]
    pub reserved: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(u64),
    Text(String),
}

impl Number {
    pub fn value(&self) -> Result<u64, ConfigError> {
        match self {
            Number::Int(value) => Ok(*value),
            Number::Text(text) => parse_u64(text),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Pattern {
    Word(Number),
    Words(Vec<Number>),
}

impl Pattern {
    fn to_bits(&self) -> Result<BitPattern, ConfigError> {
        match self {
            Pattern::Word(word) => Ok(BitPattern::Word(word.value()?)),
            Pattern::Words(words) => words
                .iter()
                .map(Number::value)
                .collect::<Result<Vec<u64>, _>>()
                .map(BitPattern::Words),
        }
    }
}

/// Parses `0x`-prefixed hex or decimal, ignoring `_` separators.
pub fn parse_u64(text: &str) -> Result<u64, ConfigError> {
    let cleaned: String = text.trim().chars().filter(|c| *c != '_').collect();
    let parsed = match cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => cleaned.parse::<u64>(),
    };
    parsed.map_err(|_| ConfigError::InvalidNumber(text.to_string()))
}

impl RegisterMapFile {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn into_register_map(self) -> Result<RegisterMap, ConfigError> {
        let default_rev = self
            .revision
            .as_deref()
            .map(str::parse::<SpecRevision>)
            .transpose()?;

        let mut map = RegisterMap::new();
        for (index, entry) in self.registers.into_iter().enumerate() {
            let rev = match entry.spec_rev.as_deref() {
                Some(rev) => rev.parse()?,
                None => default_rev.ok_or_else(|| ConfigError::MissingRevision {
                    desc: entry.desc.clone(),
                })?,
            };
            let id = RegisterId(entry.id.unwrap_or(index as u16));

            let mut descriptor =
                RegisterDescriptor::new(entry.desc, entry.offset.value()?, entry.size, rev)?;
            if let Some(default) = &entry.default {
                descriptor = descriptor.with_default(default.to_bits()?);
            }
            if let Some(read_only) = &entry.read_only {
                descriptor = descriptor.with_read_only(read_only.to_bits()?);
            }
            if let Some(impl_specific) = &entry.impl_specific {
                descriptor = descriptor.with_impl_specific(impl_specific.to_bits()?);
            }
            if entry.reserved {
                descriptor = descriptor.reserved();
            }

            map.insert(id, descriptor)?;
        }
        Ok(map)
    }
}

/// Parses a JSON register map.
pub fn parse_register_map(json: &str) -> Result<RegisterMap, ConfigError> {
    RegisterMapFile::from_json(json)?.into_register_map()
}

/// Reads and parses a JSON register map file.
pub fn load_register_map(path: &Path) -> Result<RegisterMap, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_register_map(&json)
}

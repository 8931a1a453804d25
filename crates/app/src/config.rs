//! Quota configuration for the terminal shell.
//!
//! Quotas live in a small TOML file:
//!
//! ```toml
//! [quotas]
//! "1.RND" = 10
//! "2.Marinarie" = 7
//! ```
//!
//! Without a file, the built-in exam table below applies.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use quiz_core::model::{CategoryName, CategoryQuotas};

/// The exam's category draw table, used when no quota file is given.
const DEFAULT_QUOTAS: [(&str, usize); 5] = [
    ("1.RND", 10),
    ("2.Marinarie", 7),
    ("3.Conducere si manevra", 7),
    ("4.Prim ajutor", 1),
    ("5.Legislatie", 1),
];

#[derive(Debug)]
pub enum ConfigError {
    Read(std::io::Error),
    Parse(toml::de::Error),
    InvalidCategory(String),
    Empty,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read(err) => write!(f, "cannot read quota file: {err}"),
            ConfigError::Parse(err) => write!(f, "cannot parse quota file: {err}"),
            ConfigError::InvalidCategory(err) => write!(f, "invalid quota category: {err}"),
            ConfigError::Empty => write!(f, "quota file lists no categories"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize)]
struct QuotaFile {
    quotas: BTreeMap<String, usize>,
}

/// Load quotas from a TOML file.
pub fn load_quotas(path: &Path) -> Result<CategoryQuotas, ConfigError> {
    let raw = fs::read_to_string(path).map_err(ConfigError::Read)?;
    let parsed: QuotaFile = toml::from_str(&raw).map_err(ConfigError::Parse)?;
    if parsed.quotas.is_empty() {
        return Err(ConfigError::Empty);
    }

    let mut quotas = CategoryQuotas::new();
    for (name, count) in parsed.quotas {
        let category =
            CategoryName::new(name).map_err(|err| ConfigError::InvalidCategory(err.to_string()))?;
        quotas.set(category, count);
    }
    Ok(quotas)
}

/// Built-in quota table.
pub fn default_quotas() -> Result<CategoryQuotas, ConfigError> {
    let mut quotas = CategoryQuotas::new();
    for (name, count) in DEFAULT_QUOTAS {
        let category =
            CategoryName::new(name).map_err(|err| ConfigError::InvalidCategory(err.to_string()))?;
        quotas.set(category, count);
    }
    Ok(quotas)
}

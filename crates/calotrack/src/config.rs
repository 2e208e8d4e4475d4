//! TOML flags files.
//!
//! A flags file holds any subset of the [`InputFlags`] fields; missing fields
//! take the task defaults. Enum values are parsed leniently.

use calotrack_protocol::InputFlags;
use std::path::Path;

use crate::balance::BalanceEffContOptions;
use crate::error::ConfigError;

/// Load base flags from a TOML file.
pub fn load_flags_file(path: &Path) -> Result<InputFlags, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load balance-task options from a TOML file.
pub fn load_balance_options(path: &Path) -> Result<BalanceEffContOptions, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

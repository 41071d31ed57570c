//! Host ledger configuration
//!
//! Transaction fees and minimum-reserve (rent) parameters. Defaults match the
//! public network the escrow was first deployed on; a JSON file may override
//! any subset of fields.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use types::numeric::Lamports;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Minimum-reserve parameters.
///
/// An account must hold at least [`Rent::minimum_balance`] lamports for its
/// data size to stay allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rent {
    /// Rental rate in lamports per byte-year
    pub lamports_per_byte_year: Lamports,
    /// Years of rent an account must prepay to be exempt
    pub exemption_threshold_years: u64,
    /// Bytes charged for every account on top of its data
    pub account_storage_overhead: u64,
}

impl Default for Rent {
    fn default() -> Self {
        Self {
            lamports_per_byte_year: 3480,
            exemption_threshold_years: 2,
            account_storage_overhead: 128,
        }
    }
}

impl Rent {
    /// Minimum reserve for an account holding `data_len` bytes.
    pub fn minimum_balance(&self, data_len: usize) -> Lamports {
        let bytes = self.account_storage_overhead.saturating_add(data_len as u64);
        bytes
            .saturating_mul(self.lamports_per_byte_year)
            .saturating_mul(self.exemption_threshold_years)
    }
}

/// Host ledger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Fee charged to the fee payer per signature on a committed transaction
    pub fee_per_signature: Lamports,
    /// Minimum-reserve parameters
    pub rent: Rent,
    /// Committed message hashes remembered for replay rejection; the oldest
    /// hash is forgotten once the window is full
    pub replay_window: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            fee_per_signature: 5000,
            rent: Rent::default(),
            replay_window: 65_536,
        }
    }
}

impl LedgerConfig {
    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

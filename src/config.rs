//! Wallet configuration
//!
//! The owner set and confirmation threshold are supplied once, when the
//! ledger is created. They are stored as pretty-printed JSON.

use crate::identity::Identity;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

/// Configuration file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Construction-time wallet configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Owner identities, in owner-position order
    pub owners: Vec<Identity>,
    /// Confirmations needed before a transaction may execute
    pub required_confirmations: usize,
    /// Optional human-readable label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl LedgerConfig {
    pub fn new(owners: Vec<Identity>, required_confirmations: usize) -> Self {
        Self {
            owners,
            required_confirmations,
            label: None,
        }
    }

    /// Attach a label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.required_confirmations, self.owners.len())
    }

    /// Load a configuration from a JSON file
    ///
    /// Only the file format is checked here; owner and threshold rules are
    /// enforced when the ledger is built.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = fs::File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Save the configuration as JSON, replacing the target atomically
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = path.with_extension("tmp");
        let file = fs::File::create(&temp_path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;

        fs::rename(&temp_path, path)?;
        Ok(())
    }
}

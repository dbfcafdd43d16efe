//! Transaction types for replay.
//!
//! A [`TransactionRecord`] is an already-fetched transaction: the envelope the
//! user submitted and the result metadata the ledger produced when it was
//! applied. Retrieving it from a network is somebody else's job; the CLI loads
//! it from a JSON file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::encoding::try_base64_decode;

/// Transaction hash (32 bytes, hex encoded in JSON)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TransactionHash(pub String);

impl TransactionHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this looks like a 64-char hex hash.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == 64 && self.0.chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl std::fmt::Display for TransactionHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A previously executed transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionRecord {
    /// Transaction hash
    pub hash: TransactionHash,

    /// Base64 XDR `TransactionEnvelope`
    pub envelope_xdr: String,

    /// Base64 XDR `TransactionResult`
    #[serde(default)]
    pub result_xdr: String,

    /// Base64 XDR `TransactionResultMeta`
    pub result_meta_xdr: String,

    /// Ledger the transaction was included in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger: Option<u32>,
}

impl TransactionRecord {
    /// Load a transaction record from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read transaction file {}", path.display()))?;
        let record: Self = serde_json::from_str(&data)
            .with_context(|| format!("failed to parse transaction file {}", path.display()))?;
        record.check()?;
        Ok(record)
    }

    /// Shallow sanity check: required payloads are present and base64.
    ///
    /// Structural XDR validation happens later, in key extraction and in the
    /// simulator.
    pub fn check(&self) -> Result<()> {
        if self.envelope_xdr.trim().is_empty() {
            anyhow::bail!("transaction {} has an empty envelope_xdr", self.hash);
        }
        if try_base64_decode(&self.envelope_xdr).is_none() {
            anyhow::bail!("transaction {} envelope_xdr is not valid base64", self.hash);
        }
        if self.result_meta_xdr.trim().is_empty() {
            anyhow::bail!("transaction {} has an empty result_meta_xdr", self.hash);
        }
        Ok(())
    }
}

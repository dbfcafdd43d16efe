//! Simulator protocol types.
//!
//! These are serialized as JSON on the simulator's stdin/stdout, so field names
//! are part of the wire format.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::network::Network;
use crate::record::RecordKey;

/// Everything the simulator needs to re-execute one transaction.
///
/// Built once per branch and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplayRequest {
    /// Base64 XDR `TransactionEnvelope`
    pub envelope_xdr: String,

    /// Base64 XDR `TransactionResultMeta`
    pub result_meta_xdr: String,

    /// Known ledger entries (canonical key → base64 XDR `LedgerEntry`)
    #[serde(default)]
    pub ledger_entries: HashMap<RecordKey, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<Network>,

    /// WASM artifact to execute instead of the on-ledger contract code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wasm_path: Option<PathBuf>,
}

impl ReplayRequest {
    pub fn new(envelope_xdr: impl Into<String>, result_meta_xdr: impl Into<String>) -> Self {
        Self {
            envelope_xdr: envelope_xdr.into(),
            result_meta_xdr: result_meta_xdr.into(),
            ledger_entries: HashMap::new(),
            network: None,
            wasm_path: None,
        }
    }

    pub fn with_entries(mut self, entries: HashMap<RecordKey, String>) -> Self {
        self.ledger_entries = entries;
        self
    }

    pub fn with_network(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }

    pub fn with_wasm_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.wasm_path = Some(path.into());
        self
    }
}

/// Outcome status reported by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExecutionStatus {
    Success,
    Error,
    #[default]
    Unknown,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Success => "success",
            ExecutionStatus::Error => "error",
            ExecutionStatus::Unknown => "unknown",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionStatus::Success)
    }
}

impl From<String> for ExecutionStatus {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => ExecutionStatus::Success,
            "error" => ExecutionStatus::Error,
            _ => ExecutionStatus::Unknown,
        }
    }
}

impl From<ExecutionStatus> for String {
    fn from(status: ExecutionStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ReplayResponse {
    #[serde(default)]
    pub status: ExecutionStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Diagnostic events in emission order
    #[serde(default)]
    pub events: Vec<String>,

    /// Execution logs in emission order
    #[serde(default)]
    pub logs: Vec<String>,
}

impl ReplayResponse {
    pub fn success() -> Self {
        Self {
            status: ExecutionStatus::Success,
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Error,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn with_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events = events.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_logs<I, S>(mut self, logs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.logs = logs.into_iter().map(Into::into).collect();
        self
    }

    /// The error text, or `""` when absent.
    pub fn error_text(&self) -> &str {
        self.error.as_deref().unwrap_or("")
    }
}

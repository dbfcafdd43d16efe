//! Replay session artifact.
//!
//! A [`ReplaySession`] records what a replay produced: one [`BranchRecord`] per
//! branch and, for two-branch runs, the [`ComparisonResult`]. It is written as
//! pretty JSON so it can be attached to a bug report or diffed by hand.
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = ReplaySession::new(tx.hash.clone());
//! session.record_branch("primary:mainnet", Target::Network(Network::Mainnet), &outcome.primary);
//! session.record_branch("compare:testnet", Target::Network(Network::Testnet), &outcome.compare);
//! session.comparison = outcome.comparison();
//! session.write_to(Path::new("./session.json"))?;
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use erst_types::paths::atomic_write_json;
use erst_types::{ReplayResponse, Target, TransactionHash};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::compare::ComparisonResult;
use crate::error::ErrorKind;
use crate::orchestrator::BranchResult;

/// Current session file format.
pub const SESSION_SCHEMA_VERSION: u32 = 1;

/// Outcome of one branch as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRecord {
    pub label: String,
    pub target: Target,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ReplayResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl BranchRecord {
    pub fn from_result(label: impl Into<String>, target: Target, result: &BranchResult) -> Self {
        let label = label.into();
        match result {
            Ok(response) => Self {
                label,
                target,
                response: Some(response.clone()),
                error: None,
                error_kind: None,
            },
            Err(e) => Self {
                label,
                target,
                response: None,
                // The label is already recorded; keep only the cause.
                error: Some(e.error.to_string()),
                error_kind: Some(e.kind()),
            },
        }
    }

    pub fn succeeded(&self) -> bool {
        self.response.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaySession {
    pub id: Uuid,
    pub tx_hash: TransactionHash,
    pub created_at: DateTime<Utc>,
    pub schema_version: u32,
    #[serde(default)]
    pub branches: Vec<BranchRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonResult>,
}

impl ReplaySession {
    pub fn new(tx_hash: TransactionHash) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx_hash,
            created_at: Utc::now(),
            schema_version: SESSION_SCHEMA_VERSION,
            branches: Vec::new(),
            comparison: None,
        }
    }

    pub fn record_branch(&mut self, label: impl Into<String>, target: Target, result: &BranchResult) {
        self.branches
            .push(BranchRecord::from_result(label, target, result));
    }

    pub fn with_comparison(mut self, comparison: Option<ComparisonResult>) -> Self {
        self.comparison = comparison;
        self
    }

    /// Write the session atomically as pretty JSON.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        atomic_write_json(path, self)
            .with_context(|| format!("Failed to write session {}", path.display()))
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session {}", path.display()))?;
        let session: Self = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse session {}", path.display()))?;
        if session.schema_version > SESSION_SCHEMA_VERSION {
            bail!(
                "session {} uses schema version {} (supported: {})",
                path.display(),
                session.schema_version,
                SESSION_SCHEMA_VERSION
            );
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare;
    use crate::error::{BranchError, ReplayError};
    use erst_types::Network;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/session.json");

        let ok: BranchResult = Ok(ReplayResponse::success().with_events(["e1"]));
        let failed: BranchResult = Err(BranchError::new(
            "compare:mainnet",
            ReplayError::Cancelled,
        ));

        let mut session = ReplaySession::new(TransactionHash::new("ab".repeat(32)));
        session.record_branch("primary:testnet", Target::Network(Network::Testnet), &ok);
        session.record_branch("compare:mainnet", Target::Network(Network::Mainnet), &failed);
        session.write_to(&path).unwrap();

        let loaded = ReplaySession::read_from(&path).unwrap();
        assert_eq!(loaded, session);
        assert!(loaded.branches[0].succeeded());
        assert_eq!(loaded.branches[1].error.as_deref(), Some("replay cancelled"));
        assert_eq!(loaded.branches[1].error_kind, Some(ErrorKind::Cancelled));
    }

    #[test]
    fn test_comparison_uses_stable_field_names() {
        let left = ReplayResponse::success().with_events(["e1", "e2"]);
        let right = ReplayResponse::success().with_events(["e1", "e3"]);
        let session = ReplaySession::new(TransactionHash::new("cd".repeat(32)))
            .with_comparison(Some(compare(&left, &right)));

        let json = serde_json::to_value(&session).unwrap();
        let diff = &json["comparison"]["event_diffs"][1];
        assert_eq!(diff["index"], 1);
        assert_eq!(diff["left"], "e2");
        assert_eq!(diff["right"], "e3");
        assert_eq!(diff["kind"], "modified");
        assert_eq!(json["schema_version"], SESSION_SCHEMA_VERSION);
    }

    #[test]
    fn test_rejects_newer_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut session = ReplaySession::new(TransactionHash::new("ef".repeat(32)));
        session.schema_version = SESSION_SCHEMA_VERSION + 1;
        session.write_to(&path).unwrap();

        let err = ReplaySession::read_from(&path).unwrap_err();
        assert!(err.to_string().contains("schema version"));
    }
}

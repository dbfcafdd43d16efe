//! Replay error taxonomy.
//!
//! Callers branch on [`ErrorKind`] rather than matching error instances.

use std::fmt;

use erst_ledger_keys::DecodeError;
use erst_state_fetcher::FetchError;
use serde::{Deserialize, Serialize};

use crate::simulation::SimulationError;

/// Coarse error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Decode,
    Fetch,
    Simulation,
    Cancelled,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Decode => "decode",
            ErrorKind::Fetch => "fetch",
            ErrorKind::Simulation => "simulation",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Why a replay (or one branch of it) did not produce a response.
#[derive(Debug)]
pub enum ReplayError {
    /// The result metadata could not be decoded.
    Decode(DecodeError),
    /// Ledger entries could not be retrieved.
    Fetch(FetchError),
    /// The simulator could not produce a response.
    Simulation(SimulationError),
    /// The shared cancellation token fired.
    Cancelled,
    /// A branch task panicked or was aborted.
    Internal(String),
}

impl ReplayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReplayError::Decode(_) => ErrorKind::Decode,
            ReplayError::Fetch(_) => ErrorKind::Fetch,
            ReplayError::Simulation(_) => ErrorKind::Simulation,
            ReplayError::Cancelled => ErrorKind::Cancelled,
            ReplayError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::Decode(e) => write!(f, "{}", e),
            ReplayError::Fetch(e) => write!(f, "{}", e),
            ReplayError::Simulation(e) => write!(f, "{}", e),
            ReplayError::Cancelled => write!(f, "replay cancelled"),
            ReplayError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReplayError::Decode(e) => Some(e),
            ReplayError::Fetch(e) => Some(e),
            ReplayError::Simulation(e) => Some(e),
            ReplayError::Cancelled | ReplayError::Internal(_) => None,
        }
    }
}

impl From<DecodeError> for ReplayError {
    fn from(e: DecodeError) -> Self {
        ReplayError::Decode(e)
    }
}

impl From<FetchError> for ReplayError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Cancelled => ReplayError::Cancelled,
            other => ReplayError::Fetch(other),
        }
    }
}

impl From<SimulationError> for ReplayError {
    fn from(e: SimulationError) -> Self {
        ReplayError::Simulation(e)
    }
}

/// A [`ReplayError`] attributed to the branch that produced it.
#[derive(Debug)]
pub struct BranchError {
    /// Branch label, e.g. `primary:testnet` or `compare:wasm:token.wasm`
    pub branch: String,
    pub error: ReplayError,
}

impl BranchError {
    pub fn new(branch: impl Into<String>, error: ReplayError) -> Self {
        Self {
            branch: branch.into(),
            error,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl fmt::Display for BranchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.branch, self.error)
    }
}

impl std::error::Error for BranchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_cancellation_maps_to_cancelled() {
        let err: ReplayError = FetchError::Cancelled.into();
        assert_eq!(err.kind(), ErrorKind::Cancelled);

        let err: ReplayError = FetchError::InvalidConfig("x".into()).into();
        assert_eq!(err.kind(), ErrorKind::Fetch);
    }

    #[test]
    fn test_branch_error_display_carries_label() {
        let err = BranchError::new("primary:testnet", ReplayError::Cancelled);
        assert_eq!(err.to_string(), "[primary:testnet] replay cancelled");
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::Simulation).unwrap(),
            "\"simulation\""
        );
    }
}

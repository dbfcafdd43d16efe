//! Shared types for the erst workspace.
//!
//! This crate holds the value types exchanged between the key extractor, the
//! entry fetcher, the replay orchestrator and the simulator boundary, so none of
//! those crates has to depend on another just for a struct definition.
//!
//! ## Replay Types
//!
//! The [`replay`] module contains the simulator protocol types:
//! - [`ReplayRequest`](replay::ReplayRequest) - envelope, result meta and known ledger entries
//! - [`ReplayResponse`](replay::ReplayResponse) - status, error, events and logs of one run
//! - [`ExecutionStatus`](replay::ExecutionStatus) - `success` / `error` / `unknown`

pub mod cancel;
pub mod encoding;
pub mod env_utils;
pub mod network;
pub mod paths;
pub mod record;
pub mod replay;
pub mod transaction;

pub use cancel::CancellationToken;
pub use env_utils::{env_bool, env_bool_or, env_string_or, env_var, env_var_or};
pub use network::{Network, Target};
pub use record::{KeySet, RecordKey};
pub use replay::{ExecutionStatus, ReplayRequest, ReplayResponse};
pub use transaction::{TransactionHash, TransactionRecord};

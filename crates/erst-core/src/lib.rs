//! # erst-core
//!
//! Replays a previously executed transaction against one or more targets and
//! explains how the outcomes differ.
//!
//! ## Components
//!
//! - [`simulation`]: the [`SimulationAdapter`] boundary to the execution engine
//! - [`orchestrator`]: [`ReplayOrchestrator`], fetch then simulate per branch
//! - [`compare`]: positional diff of two [`ReplayResponse`](erst_types::ReplayResponse)s
//! - [`session`]: the JSON artifact a replay leaves behind
//! - [`error`]: [`ReplayError`] and its [`ErrorKind`] classification
//!
//! Key extraction lives in `erst-ledger-keys` and entry retrieval in
//! `erst-state-fetcher`; this crate wires them together.

pub mod compare;
pub mod error;
pub mod orchestrator;
pub mod session;
pub mod simulation;

pub use compare::{compare, ComparisonResult, DiffEntry, DiffKind};
pub use error::{BranchError, ErrorKind, ReplayError};
pub use orchestrator::{BranchResult, BranchSpec, PairOutcome, ReplayInputs, ReplayOrchestrator};
pub use session::{BranchRecord, ReplaySession, SESSION_SCHEMA_VERSION};
pub use simulation::{MockSimulator, ProcessSimulator, SimulationAdapter, SimulationError};

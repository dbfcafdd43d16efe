//! # Simulation boundary
//!
//! The engine that actually executes a transaction lives outside this
//! workspace. Replay branches reach it through [`SimulationAdapter`]:
//!
//! - [`ProcessSimulator`]: runs the external simulator binary over stdio JSON
//! - [`MockSimulator`]: in-process adapter for tests and dry runs
//!
//! A transaction that runs and fails is still a successful simulation call:
//! it comes back as a [`ReplayResponse`] with `status: error`. Only failures to
//! obtain a response are [`SimulationError`]s.
//!
//! ## Example Usage
//!
//! ```no_run
//! use erst_core::simulation::{ProcessSimulator, SimulationAdapter};
//! use erst_types::ReplayRequest;
//!
//! # async fn example() -> Result<(), erst_core::simulation::SimulationError> {
//! let sim = ProcessSimulator::from_env();
//! let response = sim.simulate(&ReplayRequest::new("AAAA...", "AAAA...")).await?;
//! println!("{}", response.status);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod mock;
pub mod process;

pub use errors::SimulationError;
pub use mock::MockSimulator;
pub use process::{ProcessSimulator, DEFAULT_SIMULATOR};

use erst_types::{ReplayRequest, ReplayResponse};

/// Executes one replay request.
#[async_trait::async_trait]
pub trait SimulationAdapter: Send + Sync {
    async fn simulate(&self, request: &ReplayRequest) -> Result<ReplayResponse, SimulationError>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "simulator"
    }
}

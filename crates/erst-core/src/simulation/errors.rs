//! Simulator boundary errors.

use std::path::PathBuf;

/// Failures of a simulation call, as opposed to a transaction that ran and
/// reported `status: "error"` (which is a successful call).
#[derive(Debug)]
pub enum SimulationError {
    /// The simulator binary could not be found.
    NotFound {
        /// Path or program name that was looked up
        path: PathBuf,
    },

    /// The simulator process could not be started.
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing the request or reading the response failed.
    Io(std::io::Error),

    /// The engine ran but exited unsuccessfully.
    Engine {
        /// Short description (usually the exit status)
        message: String,
        /// Captured stderr, trimmed
        stderr: String,
    },

    /// The engine's output was not a valid response document.
    InvalidResponse {
        reason: String,
        /// Raw stdout (truncated for display)
        output: String,
    },

    /// The engine did not answer within the configured time.
    Timeout {
        after_ms: u64,
    },
}

const OUTPUT_PREVIEW_CHARS: usize = 200;

fn preview(s: &str) -> String {
    if s.chars().count() <= OUTPUT_PREVIEW_CHARS {
        s.to_string()
    } else {
        let head: String = s.chars().take(OUTPUT_PREVIEW_CHARS).collect();
        format!("{head}...")
    }
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::NotFound { path } => write!(
                f,
                "simulator binary not found: {} (set ERST_SIMULATOR_PATH or pass --simulator)",
                path.display()
            ),
            SimulationError::Spawn { path, source } => {
                write!(f, "failed to start simulator {}: {}", path.display(), source)
            }
            SimulationError::Io(e) => write!(f, "simulator I/O failed: {}", e),
            SimulationError::Engine { message, stderr } => {
                write!(f, "simulator failed: {}", message)?;
                if !stderr.is_empty() {
                    write!(f, "\n{}", preview(stderr))?;
                }
                Ok(())
            }
            SimulationError::InvalidResponse { reason, output } => write!(
                f,
                "invalid simulator response: {} (output: {:?})",
                reason,
                preview(output)
            ),
            SimulationError::Timeout { after_ms } => {
                write!(f, "simulator timed out after {}ms", after_ms)
            }
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Spawn { source, .. } => Some(source),
            SimulationError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SimulationError {
    fn from(e: std::io::Error) -> Self {
        SimulationError::Io(e)
    }
}

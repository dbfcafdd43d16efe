//! Subprocess simulator.
//!
//! The simulator is an external binary speaking JSON over stdio: one
//! [`ReplayRequest`] document on stdin, one [`ReplayResponse`] document on
//! stdout. Diagnostics go to stderr.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use erst_types::env_utils::{env_string_or, env_var};
use erst_types::{ReplayRequest, ReplayResponse};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::errors::SimulationError;
use super::SimulationAdapter;

/// Program looked up on `PATH` when no explicit path is configured.
pub const DEFAULT_SIMULATOR: &str = "erst-sim";

/// Runs the simulator binary once per request.
///
/// The child is killed if the returned future is dropped, so racing
/// `simulate` against a cancellation token does not leak processes.
#[derive(Debug, Clone)]
pub struct ProcessSimulator {
    path: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ProcessSimulator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    /// `ERST_SIMULATOR_PATH` (default `erst-sim`) and optional
    /// `ERST_SIMULATOR_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut sim = Self::new(env_string_or("ERST_SIMULATOR_PATH", DEFAULT_SIMULATOR));
        if let Some(secs) = env_var::<u64>("ERST_SIMULATOR_TIMEOUT_SECS") {
            sim.timeout = Some(Duration::from_secs(secs));
        }
        sim
    }

    /// Extra arguments passed before any request data.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn spawn_error(&self, e: std::io::Error) -> SimulationError {
        if e.kind() == std::io::ErrorKind::NotFound {
            SimulationError::NotFound {
                path: self.path.clone(),
            }
        } else {
            SimulationError::Spawn {
                path: self.path.clone(),
                source: e,
            }
        }
    }
}

#[async_trait::async_trait]
impl SimulationAdapter for ProcessSimulator {
    async fn simulate(&self, request: &ReplayRequest) -> Result<ReplayResponse, SimulationError> {
        let input = serde_json::to_vec(request).map_err(std::io::Error::other)?;

        let mut child = Command::new(&self.path)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;
        debug!(
            simulator = %self.path.display(),
            entries = request.ledger_entries.len(),
            "simulator started"
        );

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| std::io::Error::other("simulator stdin was not captured"))?;
        // Feed stdin from a separate task so a chatty child cannot deadlock
        // on a full stdout pipe while we are still writing.
        let writer = tokio::spawn(async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        });

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| SimulationError::Timeout {
                    after_ms: limit.as_millis() as u64,
                })??,
            None => child.wait_with_output().await?,
        };

        match writer.await {
            Ok(Ok(())) => {}
            // The child exited without reading everything; its exit status says why.
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(SimulationError::Io(e)),
            Err(e) => return Err(SimulationError::Io(std::io::Error::other(e))),
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(SimulationError::Engine {
                message: format!("simulator exited with {}", output.status),
                stderr,
            });
        }
        if !stderr.is_empty() {
            debug!(stderr = %stderr, "simulator diagnostics");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Err(SimulationError::InvalidResponse {
                reason: "empty output".to_string(),
                output: String::new(),
            });
        }
        serde_json::from_str(stdout.trim()).map_err(|e| SimulationError::InvalidResponse {
            reason: e.to_string(),
            output: stdout.into_owned(),
        })
    }

    fn name(&self) -> &str {
        "process"
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    // Run through `sh` so the freshly written file is never exec'd directly.
    fn script(dir: &Path, body: &str) -> ProcessSimulator {
        let path = dir.join("fake-sim.sh");
        std::fs::write(&path, format!("{body}\n")).unwrap();
        ProcessSimulator::new("sh").with_args([path.display().to_string()])
    }

    fn request() -> ReplayRequest {
        ReplayRequest::new("AAAA", "AAAB")
    }

    #[tokio::test]
    async fn test_parses_response_from_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let sim = script(
            dir.path(),
            r#"cat > /dev/null
echo '{"status":"success","events":["e1"],"logs":["l1"]}'"#,
        );

        let resp = sim.simulate(&request()).await.unwrap();
        assert!(resp.status.is_success());
        assert_eq!(resp.events, vec!["e1"]);
        assert_eq!(resp.logs, vec!["l1"]);
    }

    #[tokio::test]
    async fn test_request_is_written_to_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let sim = script(
            dir.path(),
            r#"input=$(cat)
case "$input" in
  *'"envelope_xdr":"AAAA"'*) echo '{"status":"success"}' ;;
  *) echo '{"status":"error","error":"bad input"}' ;;
esac"#,
        );

        let resp = sim.simulate(&request()).await.unwrap();
        assert!(resp.status.is_success(), "{:?}", resp);
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_engine_error() {
        let dir = tempfile::tempdir().unwrap();
        let sim = script(dir.path(), "cat > /dev/null\necho boom >&2\nexit 3");

        match sim.simulate(&request()).await.unwrap_err() {
            SimulationError::Engine { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_garbage_output_is_invalid_response() {
        let dir = tempfile::tempdir().unwrap();
        let sim = script(dir.path(), "cat > /dev/null\necho not-json");

        assert!(matches!(
            sim.simulate(&request()).await.unwrap_err(),
            SimulationError::InvalidResponse { .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_not_found() {
        let sim = ProcessSimulator::new("/nonexistent/erst-sim-binary");
        assert!(matches!(
            sim.simulate(&request()).await.unwrap_err(),
            SimulationError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let sim = script(dir.path(), "sleep 10").with_timeout(Duration::from_millis(100));

        assert!(matches!(
            sim.simulate(&request()).await.unwrap_err(),
            SimulationError::Timeout { after_ms: 100 }
        ));
    }
}

//! In-process simulator for tests.

use std::sync::Arc;
use std::time::Duration;

use erst_types::{ReplayRequest, ReplayResponse};
use parking_lot::Mutex;

use super::errors::SimulationError;
use super::SimulationAdapter;

type SimulateFn = dyn Fn(&ReplayRequest) -> Result<ReplayResponse, SimulationError> + Send + Sync;

/// Closure-backed [`SimulationAdapter`].
///
/// Without a handler every request succeeds with no events and no logs.
/// Every request seen is recorded for later inspection.
#[derive(Default)]
pub struct MockSimulator {
    handler: Option<Arc<SimulateFn>>,
    delay: Option<Duration>,
    requests: Mutex<Vec<ReplayRequest>>,
}

impl MockSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&ReplayRequest) -> Result<ReplayResponse, SimulationError> + Send + Sync + 'static,
    {
        Self {
            handler: Some(Arc::new(handler)),
            ..Self::default()
        }
    }

    /// Sleep before answering, to exercise cancellation and concurrency.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ReplayRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait::async_trait]
impl SimulationAdapter for MockSimulator {
    async fn simulate(&self, request: &ReplayRequest) -> Result<ReplayResponse, SimulationError> {
        self.requests.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.handler {
            Some(handler) => handler(request),
            None => Ok(ReplayResponse::success()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_is_success() {
        let sim = MockSimulator::new();
        let resp = sim.simulate(&ReplayRequest::new("a", "b")).await.unwrap();
        assert!(resp.status.is_success());
        assert!(resp.events.is_empty());
        assert_eq!(sim.call_count(), 1);
    }

    #[tokio::test]
    async fn test_handler_sees_request() {
        let sim = MockSimulator::with_handler(|req| {
            Ok(ReplayResponse::success().with_events([req.envelope_xdr.clone()]))
        });
        let resp = sim.simulate(&ReplayRequest::new("env", "meta")).await.unwrap();
        assert_eq!(resp.events, vec!["env"]);
        assert_eq!(sim.requests()[0].result_meta_xdr, "meta");
    }
}

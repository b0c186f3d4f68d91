//! A scripted backend used to make pipeline behaviour deterministic in tests.

use async_trait::async_trait;
use std::sync::Mutex;

use super::{Backend, BackendParams, BackendResponse, Capabilities};
use crate::error::OrchestratorError;

/// Replays a fixed sequence of results, one per call, in order. Panics if
/// called more times than the script provides — a test bug, not a runtime one.
pub struct MockBackend {
    script: Mutex<std::collections::VecDeque<Result<BackendResponse, OrchestratorError>>>,
}

impl MockBackend {
    pub fn scripted(script: Vec<Result<BackendResponse, OrchestratorError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }

    pub fn always(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            script: Mutex::new(std::iter::repeat_with(move || Ok(BackendResponse::ok(text.clone()))).take(64).collect()),
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            streaming: false,
            system_prompt: true,
            tools: false,
            json_mode: true,
        }
    }

    async fn call(
        &self,
        _prompt: &str,
        _system_prompt: &str,
        _params: &BackendParams,
    ) -> Result<BackendResponse, OrchestratorError> {
        let mut script = self.script.lock().unwrap();
        script
            .pop_front()
            .unwrap_or_else(|| panic!("MockBackend script exhausted"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_script_in_order() {
        let backend = MockBackend::scripted(vec![
            Ok(BackendResponse::ok("first")),
            Ok(BackendResponse::ok("second")),
        ]);
        let first = backend.call("p", "", &BackendParams::default()).await.unwrap();
        let second = backend.call("p", "", &BackendParams::default()).await.unwrap();
        assert_eq!(first.text, "first");
        assert_eq!(second.text, "second");
    }

    #[tokio::test]
    #[should_panic(expected = "script exhausted")]
    async fn panics_when_script_exhausted() {
        let backend = MockBackend::scripted(vec![Ok(BackendResponse::ok("only"))]);
        let _ = backend.call("p", "", &BackendParams::default()).await;
        let _ = backend.call("p", "", &BackendParams::default()).await;
    }
}

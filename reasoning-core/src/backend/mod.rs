//! Backend abstraction (C1) and the retry wrapper (C2).

mod mock;
mod openai_compatible;
mod retry;

pub use mock::MockBackend;
pub use openai_compatible::OpenAiCompatibleBackend;
pub use retry::{call_with_retry, RetryableBackend};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;

/// Recognised backend capabilities. The core reads only `system_prompt` and `json_mode`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub streaming: bool,
    pub system_prompt: bool,
    pub tools: bool,
    pub json_mode: bool,
}

/// Recognised, typed completion parameters. Unknown keys never reach a backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendParams {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
    pub json_mode: Option<bool>,
    pub num_ctx: Option<u32>,
    pub repeat_penalty: Option<f64>,
}

impl BackendParams {
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// `temperature in [0,2]` and `max_tokens >= 1` when present; out-of-range values are clamped.
    pub fn sanitized(mut self) -> Self {
        if let Some(t) = self.temperature {
            self.temperature = Some(t.clamp(0.0, 2.0));
        }
        if let Some(m) = self.max_tokens {
            self.max_tokens = Some(m.max(1));
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Exactly one of `text` (non-empty) or `error` (non-empty) carries meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendResponse {
    pub text: String,
    pub usage: Option<Usage>,
    pub model: Option<String>,
    pub error: Option<String>,
}

impl BackendResponse {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A uniform completion backend: `call(prompt, system_prompt, params) -> BackendResponse`.
#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    async fn call(
        &self,
        prompt: &str,
        system_prompt: &str,
        params: &BackendParams,
    ) -> Result<BackendResponse, OrchestratorError>;

    /// Lists models available from this backend's registry, for draft-model
    /// discovery (C11). Backends without a registry return an empty list.
    async fn list_models(&self) -> Result<Vec<RegistryModel>, OrchestratorError> {
        Ok(Vec::new())
    }
}

/// Describes a named model available from a local model registry, used by the
/// speculative pipeline's draft-model discovery (C11).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegistryModel {
    pub name: String,
    #[serde(default)]
    pub size_bytes: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegistryListing {
    #[serde(default)]
    pub models: Vec<RegistryModel>,
}

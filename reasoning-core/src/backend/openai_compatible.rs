//! A backend talking to any OpenAI-chat-completions-compatible HTTP endpoint
//! (local model servers and most hosted providers alike).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{Backend, BackendParams, BackendResponse, Capabilities, RegistryListing, Usage};
use crate::config::BackendEndpoint;
use crate::error::OrchestratorError;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

pub struct OpenAiCompatibleBackend {
    endpoint: BackendEndpoint,
    http: reqwest::Client,
}

impl OpenAiCompatibleBackend {
    pub fn new(endpoint: BackendEndpoint) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .expect("reqwest client builder with static config never fails");
        Self { endpoint, http }
    }

}

#[async_trait]
impl Backend for OpenAiCompatibleBackend {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            streaming: true,
            system_prompt: true,
            tools: false,
            json_mode: true,
        }
    }

    async fn call(
        &self,
        prompt: &str,
        system_prompt: &str,
        params: &BackendParams,
    ) -> Result<BackendResponse, OrchestratorError> {
        let model = params.model.as_deref().unwrap_or(&self.endpoint.model);
        let mut messages = Vec::with_capacity(2);
        if !system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: system_prompt,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let body = ChatRequest {
            model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            top_p: params.top_p,
        };

        let url = format!("{}/chat/completions", self.endpoint.base_url.trim_end_matches('/'));
        let mut req = self.http.post(&url).json(&body);
        if let Some(key) = &self.endpoint.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| OrchestratorError::Backend(format!("request failed: {e}")))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            let body = resp.text().await.unwrap_or_default();
            return Err(OrchestratorError::RateLimit(body));
        }
        if status.is_server_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OrchestratorError::Backend(format!("{status}: {body}")));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OrchestratorError::PermanentBackend(format!("{status}: {body}")));
        }

        let parsed: ChatResponse = resp.json().await.map_err(|e| OrchestratorError::Parse {
            expected: "chat completion JSON".to_string(),
            detail: e.to_string(),
        })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        Ok(BackendResponse {
            text,
            model: parsed.model,
            usage: parsed.usage.map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            error: None,
        })
    }

    /// `GET {base_url}/models`: used by the speculative pipeline's draft-model discovery (C11).
    async fn list_models(&self) -> Result<Vec<super::RegistryModel>, OrchestratorError> {
        let url = format!("{}/models", self.endpoint.base_url.trim_end_matches('/'));
        let mut req = self.http.get(&url);
        if let Some(key) = &self.endpoint.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| OrchestratorError::Backend(format!("registry listing failed: {e}")))?;
        if !resp.status().is_success() {
            warn!(status = %resp.status(), "model registry returned non-success status");
            return Ok(Vec::new());
        }
        let listing: RegistryListing = resp
            .json()
            .await
            .map_err(|e| OrchestratorError::Backend(format!("registry listing decode failed: {e}")))?;
        Ok(listing.models)
    }
}

//! Runtime configuration, read once from the environment and validated at construction.

use crate::complexity::ComplexityRegime;
use crate::error::OrchestratorError;

const ENV_BASE_URL: &str = "REASONING_BACKEND_URL";
const ENV_API_KEY: &str = "REASONING_BACKEND_API_KEY";
const ENV_MODEL: &str = "REASONING_BACKEND_MODEL";
const ENV_LEARNER_STORE: &str = "REASONING_LEARNER_STORE";
const ENV_STRATEGY_STORE: &str = "REASONING_STRATEGY_STORE";
const ENV_LOG_FILTER: &str = "REASONING_LOG";

const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";
const DEFAULT_MODEL: &str = "llama3";
const DEFAULT_LEARNER_STORE: &str = "complexity_learning.json";
const DEFAULT_STRATEGY_STORE: &str = "strategy_hub.json";

/// Exponential backoff parameters for the retry wrapper (C2).
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_wait_ms: u64,
    pub backoff_factor: f64,
    pub max_wait_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_wait_ms: 1_000,
            backoff_factor: 2.0,
            max_wait_ms: 60_000,
        }
    }
}

impl RetryConfig {
    /// `wait_k = min(initial * backoff^k, max_wait)`, zero-indexed attempt `k`.
    pub fn wait_for_attempt(&self, attempt: u32) -> std::time::Duration {
        let scaled = self.initial_wait_ms as f64 * self.backoff_factor.powi(attempt as i32);
        let capped = scaled.min(self.max_wait_ms as f64);
        std::time::Duration::from_millis(capped.max(0.0) as u64)
    }

    fn validate(&self) -> Result<(), OrchestratorError> {
        if self.max_attempts == 0 {
            return Err(OrchestratorError::Configuration(
                "retry.max_attempts must be >= 1".into(),
            ));
        }
        if self.initial_wait_ms == 0 || self.max_wait_ms == 0 {
            return Err(OrchestratorError::Configuration(
                "retry wait parameters must be positive".into(),
            ));
        }
        if self.backoff_factor < 1.0 {
            return Err(OrchestratorError::Configuration(
                "retry.backoff_factor must be >= 1.0".into(),
            ));
        }
        Ok(())
    }
}

/// The two thresholds that split a [0,100] complexity score into a regime.
/// Invariant: `low_max < medium_max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexityThresholds {
    pub low_max: f64,
    pub medium_max: f64,
}

impl Default for ComplexityThresholds {
    fn default() -> Self {
        Self {
            low_max: 30.0,
            medium_max: 65.0,
        }
    }
}

impl ComplexityThresholds {
    pub fn regime_for(&self, score: f64) -> ComplexityRegime {
        if score < self.low_max {
            ComplexityRegime::Low
        } else if score < self.medium_max {
            ComplexityRegime::Medium
        } else {
            ComplexityRegime::High
        }
    }

    fn validate(&self) -> Result<(), OrchestratorError> {
        if !(self.low_max < self.medium_max) {
            return Err(OrchestratorError::Configuration(format!(
                "complexity thresholds must be strictly increasing, got low_max={} medium_max={}",
                self.low_max, self.medium_max
            )));
        }
        Ok(())
    }
}

/// Concurrency caps named in the concurrency & resource model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcurrencyConfig {
    pub high_strategy_subproblems: usize,
    pub parallel_pipeline_fanout: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            high_strategy_subproblems: 2,
            parallel_pipeline_fanout: 2,
        }
    }
}

impl ConcurrencyConfig {
    fn validate(&self) -> Result<(), OrchestratorError> {
        if self.high_strategy_subproblems == 0 || self.parallel_pipeline_fanout == 0 {
            return Err(OrchestratorError::Configuration(
                "concurrency caps must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// Connection details for the single configured completion backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendEndpoint {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for BackendEndpoint {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Top-level, env-seeded configuration shared by every pipeline and backend in a process.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    pub backend: BackendEndpoint,
    pub retry: RetryConfig,
    pub thresholds: ComplexityThresholds,
    pub concurrency: ConcurrencyConfig,
    pub learner_store_path: String,
    pub strategy_store_path: String,
    pub log_filter: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            backend: BackendEndpoint::default(),
            retry: RetryConfig::default(),
            thresholds: ComplexityThresholds::default(),
            concurrency: ConcurrencyConfig::default(),
            learner_store_path: DEFAULT_LEARNER_STORE.to_string(),
            strategy_store_path: DEFAULT_STRATEGY_STORE.to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl OrchestratorConfig {
    /// Build from the environment, falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            config.backend.base_url = url;
        }
        if let Ok(key) = std::env::var(ENV_API_KEY) {
            config.backend.api_key = Some(key);
        }
        if let Ok(model) = std::env::var(ENV_MODEL) {
            config.backend.model = model;
        }
        if let Ok(path) = std::env::var(ENV_LEARNER_STORE) {
            config.learner_store_path = path;
        }
        if let Ok(path) = std::env::var(ENV_STRATEGY_STORE) {
            config.strategy_store_path = path;
        }
        if let Ok(filter) = std::env::var(ENV_LOG_FILTER) {
            config.log_filter = filter;
        }

        config
    }

    pub fn validate(&self) -> Result<(), OrchestratorError> {
        self.retry.validate()?;
        self.thresholds.validate()?;
        self.concurrency.validate()?;
        if self.backend.base_url.trim().is_empty() {
            return Err(OrchestratorError::Configuration(
                "backend.base_url must not be empty".into(),
            ));
        }
        Ok(())
    }
}

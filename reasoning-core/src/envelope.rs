//! The response envelope returned by every mode (§6 item 5).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The stable, versioned wire shape every pipeline converges on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    pub final_solution: String,
    pub thought_process: ThoughtProcess,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v2_improvements: Option<V2Improvements>,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    pub fn success(final_solution: impl Into<String>, thought_process: ThoughtProcess) -> Self {
        Self {
            success: true,
            final_solution: final_solution.into(),
            thought_process,
            v2_improvements: None,
            version: "v2".to_string(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            final_solution: String::new(),
            thought_process: ThoughtProcess::default(),
            v2_improvements: None,
            version: "v2".to_string(),
            error: Some(error.into()),
        }
    }

    pub fn with_v2_improvements(mut self, improvements: V2Improvements) -> Self {
        self.v2_improvements = Some(improvements);
        self
    }
}

/// Freeform trace of how the final solution was reached. Pipelines attach
/// whichever fields are meaningful to them via `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThoughtProcess {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_complexity_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_regime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_regime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_approach: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjustments: Option<Vec<AdjustmentRecord>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ThoughtProcess {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Serialize) {
        if let Ok(v) = serde_json::to_value(value) {
            self.extra.insert(key.into(), v);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentRecord {
    pub from_regime: String,
    pub to_regime: String,
    pub reason: String,
}

/// Records how the final answer was produced, independent of the freeform
/// pipeline trace in `thought_process.extra` (§6 item 5). Attached to every
/// successful envelope, regardless of mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct V2Improvements {
    pub regime: String,
    pub reasoning_approach: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overthinking_prevention: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse_prevention: Option<bool>,
    pub rag_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rag_source: Option<String>,
    pub real_time_adjustment_active: bool,
    pub learned_suggestion_used: bool,
    pub is_edge_optimized: bool,
}

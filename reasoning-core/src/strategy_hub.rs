//! Atomic reasoning modules and the strategy hub that composes them (C12, hub half).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// The closed set of atomic reasoning steps a discovered strategy may use.
pub const ATOMIC_REASONING_MODULES: &[(&str, &str)] = &[
    (
        "DECOMPOSE",
        "Break the following problem down into its constituent parts:\n\n{input}",
    ),
    (
        "CRITICAL_THINKING",
        "Critically examine the following for hidden assumptions or weaknesses:\n\n{input}",
    ),
    (
        "PLAN_STEP_BY_STEP",
        "Produce a concrete, ordered, step-by-step plan for:\n\n{input}",
    ),
    (
        "SYNTHESIZE",
        "Synthesize the following into one coherent conclusion:\n\n{input}",
    ),
    (
        "ANALOGICAL_REASONING",
        "Find an illuminating analogy for the following and use it to explain the answer:\n\n{input}",
    ),
    (
        "VALIDATE_AND_REFINE",
        "Validate the following for correctness and refine it where needed:\n\n{input}",
    ),
];

/// Renders the named atomic module's prompt template with `input` substituted.
/// Returns `None` for any name outside the closed set.
pub fn atomic_module_prompt(module_name: &str, input: &str) -> Option<String> {
    ATOMIC_REASONING_MODULES
        .iter()
        .find(|(name, _)| *name == module_name)
        .map(|(_, template)| template.replace("{input}", input))
}

pub fn is_known_module(module_name: &str) -> bool {
    ATOMIC_REASONING_MODULES.iter().any(|(name, _)| *name == module_name)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceMetrics {
    pub success_rate: f64,
    pub execution_count: f64,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            success_rate: 0.0,
            execution_count: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Strategy {
    pub id: String,
    pub name: String,
    pub problem_class: String,
    pub steps: Vec<String>,
    #[serde(default)]
    pub performance_metrics: PerformanceMetrics,
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    1
}

fn default_strategies() -> Vec<Strategy> {
    vec![
        Strategy {
            id: "general_planning".to_string(),
            name: "General planning".to_string(),
            problem_class: "planning".to_string(),
            steps: vec![
                "DECOMPOSE".to_string(),
                "PLAN_STEP_BY_STEP".to_string(),
                "VALIDATE_AND_REFINE".to_string(),
            ],
            performance_metrics: PerformanceMetrics::default(),
            version: 1,
        },
        Strategy {
            id: "general_analysis".to_string(),
            name: "General analysis".to_string(),
            problem_class: "analysis".to_string(),
            steps: vec![
                "CRITICAL_THINKING".to_string(),
                "SYNTHESIZE".to_string(),
                "VALIDATE_AND_REFINE".to_string(),
            ],
            performance_metrics: PerformanceMetrics::default(),
            version: 1,
        },
        Strategy {
            id: "general_default".to_string(),
            name: "General default".to_string(),
            problem_class: "general".to_string(),
            steps: vec!["DECOMPOSE".to_string(), "SYNTHESIZE".to_string()],
            performance_metrics: PerformanceMetrics::default(),
            version: 1,
        },
    ]
}

/// A JSON file-backed registry of discovered and default strategies, keyed by id.
pub struct ThinkingStrategyHub {
    path: PathBuf,
    strategies: RwLock<HashMap<String, Strategy>>,
}

impl ThinkingStrategyHub {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let strategies = Self::load_or_seed(&path);
        Self {
            path,
            strategies: RwLock::new(strategies),
        }
    }

    fn load_or_seed(path: &Path) -> HashMap<String, Strategy> {
        if !path.exists() {
            let seeded: HashMap<String, Strategy> = default_strategies()
                .into_iter()
                .map(|s| (s.id.clone(), s))
                .collect();
            Self::flush_to(path, &seeded);
            return seeded;
        }
        match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, path = %path.display(), "failed to parse strategy hub store, starting empty");
                HashMap::new()
            }),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "failed to read strategy hub store, starting empty");
                HashMap::new()
            }
        }
    }

    fn flush_to(path: &Path, strategies: &HashMap<String, Strategy>) {
        match serde_json::to_string_pretty(strategies) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    warn!(error = %e, path = %path.display(), "failed to persist strategy hub store");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialise strategy hub store"),
        }
    }

    fn flush(&self, strategies: &HashMap<String, Strategy>) {
        Self::flush_to(&self.path, strategies);
    }

    /// Inserts or overwrites a strategy by id.
    pub fn add_strategy(&self, strategy: Strategy) {
        let mut strategies = self.strategies.write().unwrap();
        if strategies.contains_key(&strategy.id) {
            warn!(id = %strategy.id, "overwriting existing strategy");
        }
        strategies.insert(strategy.id.clone(), strategy);
        self.flush(&strategies);
    }

    /// Best strategy for `problem_class` by (success_rate, execution_count) descending,
    /// falling back to `general_default` when no strategy matches the class.
    pub fn get_best_strategy(&self, problem_class: &str) -> Option<Strategy> {
        let strategies = self.strategies.read().unwrap();
        let mut candidates: Vec<&Strategy> = strategies
            .values()
            .filter(|s| s.problem_class == problem_class)
            .collect();

        if candidates.is_empty() {
            return strategies.get("general_default").cloned();
        }

        candidates.sort_by(|a, b| {
            b.performance_metrics
                .success_rate
                .partial_cmp(&a.performance_metrics.success_rate)
                .unwrap()
                .then(
                    b.performance_metrics
                        .execution_count
                        .partial_cmp(&a.performance_metrics.execution_count)
                        .unwrap(),
                )
        });

        let best = candidates[0].clone();
        info!(id = %best.id, problem_class, "selected strategy");
        Some(best)
    }

    /// Running-mean success rate update: `rate' = (rate*n + success) / (n+1)`.
    pub fn update_strategy_performance(&self, strategy_id: &str, success: bool) {
        let mut strategies = self.strategies.write().unwrap();
        if let Some(strategy) = strategies.get_mut(strategy_id) {
            let metrics = &mut strategy.performance_metrics;
            let n = metrics.execution_count;
            let outcome = if success { 1.0 } else { 0.0 };
            metrics.success_rate = (metrics.success_rate * n + outcome) / (n + 1.0);
            metrics.execution_count = n + 1.0;
            self.flush(&strategies);
        }
    }
}

//! Persistent prompt -> regime map (C4), backed by a single JSON file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{error, warn};

use super::ComplexityRegime;

const PROMPT_KEY_LEN: usize = 100;

fn prompt_key(prompt: &str) -> String {
    prompt.chars().take(PROMPT_KEY_LEN).collect()
}

/// A process-wide, file-backed map from prompt prefix to the regime that
/// ultimately proved sufficient for it. Reads never fail; writes are
/// best-effort and serialised behind an internal lock (§5 shared-resource discipline).
pub struct ComplexityLearner {
    path: PathBuf,
    suggestions: RwLock<HashMap<String, String>>,
}

impl ComplexityLearner {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let suggestions = Self::load(&path);
        Self {
            path,
            suggestions: RwLock::new(suggestions),
        }
    }

    fn load(path: &Path) -> HashMap<String, String> {
        if !path.exists() {
            return HashMap::new();
        }
        match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                error!(error = %e, path = %path.display(), "failed to parse learner store, starting empty");
                HashMap::new()
            }),
            Err(e) => {
                error!(error = %e, path = %path.display(), "failed to read learner store, starting empty");
                HashMap::new()
            }
        }
    }

    fn flush(&self, suggestions: &HashMap<String, String>) {
        match serde_json::to_string_pretty(suggestions) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    warn!(error = %e, path = %self.path.display(), "failed to persist learner store");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialise learner store"),
        }
    }

    /// Look up a prior decision for this prompt, discarding unknown regime values.
    pub fn suggest(&self, prompt: &str) -> Option<ComplexityRegime> {
        let key = prompt_key(prompt);
        let suggestions = self.suggestions.read().unwrap();
        suggestions.get(&key).and_then(|v| v.parse().ok())
    }

    /// Record a successful regime for this prompt and flush immediately.
    pub fn record(&self, prompt: &str, regime: ComplexityRegime) {
        let key = prompt_key(prompt);
        let mut suggestions = self.suggestions.write().unwrap();
        suggestions.insert(key, regime.as_str().to_string());
        self.flush(&suggestions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_suggestion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learner.json");
        let learner = ComplexityLearner::new(&path);
        assert_eq!(learner.suggest("what is love"), None);
        learner.record("what is love", ComplexityRegime::Medium);
        assert_eq!(learner.suggest("what is love"), Some(ComplexityRegime::Medium));
    }

    #[test]
    fn survives_reload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learner.json");
        {
            let learner = ComplexityLearner::new(&path);
            learner.record("persisted prompt", ComplexityRegime::High);
        }
        let reloaded = ComplexityLearner::new(&path);
        assert_eq!(reloaded.suggest("persisted prompt"), Some(ComplexityRegime::High));
    }

    #[test]
    fn uses_first_hundred_chars_as_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learner.json");
        let learner = ComplexityLearner::new(&path);
        let long_prompt = "x".repeat(500);
        learner.record(&long_prompt, ComplexityRegime::Low);
        let different_tail = format!("{}{}", "x".repeat(100), "y".repeat(50));
        assert_eq!(learner.suggest(&different_tail), Some(ComplexityRegime::Low));
    }

    #[test]
    fn missing_file_yields_no_suggestion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does_not_exist.json");
        let learner = ComplexityLearner::new(&path);
        assert_eq!(learner.suggest("anything"), None);
    }

    #[test]
    fn corrupt_file_is_tolerated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        std::fs::write(&path, "not json").unwrap();
        let learner = ComplexityLearner::new(&path);
        assert_eq!(learner.suggest("anything"), None);
    }
}

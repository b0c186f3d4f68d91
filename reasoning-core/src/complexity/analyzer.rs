//! Adaptive complexity analysis (C3): maps a prompt to a [0,100] score and regime
//! without ever calling a backend.

use std::collections::HashSet;

use super::{ComplexityLearner, ComplexityRegime};
use crate::config::ComplexityThresholds;

struct KeywordSet {
    conditional: &'static [&'static str],
    hierarchy: &'static [&'static str],
    constraint: &'static [&'static str],
    math: &'static [&'static str],
    planning: &'static [&'static str],
    analysis: &'static [&'static str],
}

const ENGLISH: KeywordSet = KeywordSet {
    conditional: &["if", "unless", "whether", "depending", "in case"],
    hierarchy: &["first", "then", "finally", "step", "phase", "stage"],
    constraint: &["must", "cannot", "except", "only if", "required", "constraint"],
    math: &["calculate", "equation", "derive", "prove", "sum", "integral", "matrix"],
    planning: &["plan", "schedule", "roadmap", "strategy", "timeline"],
    analysis: &["analyze", "compare", "evaluate", "assess", "critique"],
};

const JAPANESE: KeywordSet = KeywordSet {
    conditional: &["もし", "場合", "かどうか"],
    hierarchy: &["まず", "次に", "最後に", "段階"],
    constraint: &["must", "してはいけない", "必須", "制約"],
    math: &["計算", "方程式", "証明", "積分", "行列"],
    planning: &["計画", "スケジュール", "戦略"],
    analysis: &["分析", "比較", "評価"],
};

const RARE_KEYWORDS: &[&str] = &[
    "transcendental",
    "phenomenological",
    "epistemological",
    "ontological",
    "teleological",
    "hermeneutics",
    "qualia",
    "noetic",
    "超越論的",
    "現象学的",
    "認識論的",
];

/// Verbs whose presence signals the cognitive-demand sub-score of the NLP-enhanced branch.
const COGNITIVE_VERBS: &[&str] = &[
    "compare",
    "analyze",
    "analyse",
    "evaluate",
    "synthesize",
    "synthesise",
    "critique",
    "justify",
    "assess",
];

const DEEP_INTERROGATIVES: &[&str] = &["why", "how"];

/// Closed stop-word set used to approximate content-word diversity without a
/// trained tokenizer.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "of", "to", "in", "on", "and", "or", "is", "are", "was", "were", "be",
    "been", "it", "this", "that", "for", "with", "as", "by", "at", "from", "into", "their", "we",
    "should", "can", "must", "us",
];

/// Below this length, even the NLP-enhanced branch degrades to keyword analysis (§4.2 step 4).
const NLP_MIN_LENGTH: usize = 30;

fn is_japanese(prompt: &str) -> bool {
    prompt.chars().any(|c| {
        let code = c as u32;
        (0x3040..=0x30FF).contains(&code) || (0x4E00..=0x9FFF).contains(&code)
    })
}

fn count_hits(text: &str, words: &[&str]) -> usize {
    words.iter().filter(|w| text.contains(*w)).count()
}

fn split_sentences(prompt: &str) -> Vec<&str> {
    prompt
        .split(|c| c == '.' || c == '!' || c == '?')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn normalized_words(prompt: &str) -> Vec<String> {
    prompt
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// The complexity analyzer: deterministic, backend-free scoring with an
/// optional override from a persistent per-prompt learner (§4.2 step 2).
pub struct ComplexityAnalyzer<'a> {
    learner: Option<&'a ComplexityLearner>,
    thresholds: ComplexityThresholds,
}

impl<'a> ComplexityAnalyzer<'a> {
    pub fn new(thresholds: ComplexityThresholds) -> Self {
        Self {
            learner: None,
            thresholds,
        }
    }

    pub fn with_learner(mut self, learner: &'a ComplexityLearner) -> Self {
        self.learner = Some(learner);
        self
    }

    /// `edge` mode always forces LOW at a fixed score, bypassing analysis entirely.
    /// The trailing `bool` reports whether the regime came from a learned suggestion
    /// rather than fresh analysis (§6 item 5's `learned_suggestion_used`).
    pub fn analyze(&self, prompt: &str, edge: bool) -> (f64, ComplexityRegime, bool) {
        if edge {
            return (10.0, ComplexityRegime::Low, false);
        }

        if let Some(learner) = self.learner {
            if let Some(regime) = learner.suggest(prompt) {
                return (regime.canonical_score(), regime, true);
            }
        }

        if prompt.trim().is_empty() {
            return (0.0, ComplexityRegime::Low, false);
        }

        let base = if prompt.chars().count() > NLP_MIN_LENGTH {
            self.nlp_enhanced_score(prompt)
        } else {
            self.keyword_based_score(prompt)
        };
        let novelty = self.predictive_filtering_score(prompt);
        let score = (0.5 * base + 0.5 * novelty).clamp(0.0, 100.0);
        let regime = self.thresholds.regime_for(score);
        (score, regime, false)
    }

    /// Length + structure + domain-keyword scoring, weighted 0.2/0.4/0.4 (§4.2 step 4,
    /// short-prompt / no-deep-NLP-model branch).
    fn keyword_based_score(&self, prompt: &str) -> f64 {
        let keywords = if is_japanese(prompt) { &JAPANESE } else { &ENGLISH };

        let length_score = if is_japanese(prompt) {
            (prompt.chars().count() as f64 / 50.0).min(40.0)
        } else {
            (prompt.split_whitespace().count() as f64 / 5.0).min(40.0)
        };

        let structure_score = (count_hits(prompt, keywords.conditional) as f64 * 3.0
            + count_hits(prompt, keywords.hierarchy) as f64 * 2.0
            + count_hits(prompt, keywords.constraint) as f64 * 4.0)
            .min(30.0);

        let has_math = count_hits(prompt, keywords.math) > 0;
        let has_planning = count_hits(prompt, keywords.planning) > 0;
        let has_analysis = count_hits(prompt, keywords.analysis) > 0;
        let domain_score = (if has_math { 15.0 } else { 0.0 }
            + if has_planning { 20.0 } else { 0.0 }
            + if has_analysis { 15.0 } else { 0.0 })
        .min(30.0);

        0.2 * length_score + 0.4 * structure_score + 0.4 * domain_score
    }

    /// §4.2 step 4's "NLP-enhanced" branch. A full statistical pipeline is out of
    /// scope for this crate's dependency footprint (§9), so this is the lightweight,
    /// language-aware structural analyzer the design notes call for: punctuation-based
    /// sentence segmentation, a closed stop-word set, and a closed cognitive-verb
    /// lexicon stand in for a trained model's sentence/entity/verb features.
    fn nlp_enhanced_score(&self, prompt: &str) -> f64 {
        let syntactic = self.syntactic_score(prompt);
        let lexical = self.lexical_score(prompt);
        let cognitive = self.cognitive_score(prompt);
        (0.40 * syntactic + 0.35 * lexical + 0.25 * cognitive).clamp(0.0, 100.0)
    }

    /// Sentence count, average sentence length, and comma-delimited clause count
    /// stand in for sentence-count / avg-sentence-length / noun-chunk-count.
    fn syntactic_score(&self, prompt: &str) -> f64 {
        let sentences = split_sentences(prompt);
        let sentence_count = sentences.len().max(1);
        let total_words: usize = sentences.iter().map(|s| s.split_whitespace().count()).sum();
        let avg_sentence_len = total_words as f64 / sentence_count as f64;
        let clause_count = prompt.matches(',').count() + sentence_count;

        let sentence_component = (sentence_count as f64 * 5.0).min(30.0);
        let length_component = (avg_sentence_len * 0.5).min(40.0);
        let clause_component = (clause_count as f64 * 3.0).min(30.0);
        (sentence_component + length_component + clause_component).min(100.0)
    }

    /// Capitalised mid-sentence tokens stand in for named entities; content-word
    /// diversity is the unique/total ratio over non-stopword tokens.
    fn lexical_score(&self, prompt: &str) -> f64 {
        let mut entities = Vec::new();
        let mut sentence_start = true;
        for raw_word in prompt.split_whitespace() {
            let trimmed = raw_word.trim_matches(|c: char| !c.is_alphanumeric());
            if !trimmed.is_empty() {
                if trimmed.chars().next().unwrap().is_uppercase() && !sentence_start {
                    entities.push(trimmed.to_lowercase());
                }
                sentence_start = false;
            }
            if raw_word.ends_with('.') || raw_word.ends_with('!') || raw_word.ends_with('?') {
                sentence_start = true;
            }
        }
        let entity_count = entities.len();
        let unique_labels = entities.iter().collect::<HashSet<_>>().len();

        let content_words: Vec<String> = normalized_words(prompt)
            .into_iter()
            .filter(|w| !STOPWORDS.contains(&w.as_str()))
            .collect();
        let diversity = if content_words.is_empty() {
            0.0
        } else {
            let unique = content_words.iter().collect::<HashSet<_>>().len();
            unique as f64 / content_words.len() as f64
        };

        let entity_component = (entity_count as f64 * 6.0).min(40.0);
        let label_component = (unique_labels as f64 * 8.0).min(30.0);
        let diversity_component = diversity * 30.0;
        (entity_component + label_component + diversity_component).min(100.0)
    }

    /// Cognitive-demand verb hits plus a boost for deep interrogatives (why/how).
    fn cognitive_score(&self, prompt: &str) -> f64 {
        let lower = prompt.to_lowercase();
        let verb_hits = count_hits(&lower, COGNITIVE_VERBS) as f64;
        let has_deep_interrogative = lower
            .split_whitespace()
            .any(|token| DEEP_INTERROGATIVES.contains(&token.trim_matches(|c: char| !c.is_alphanumeric())));
        let interrogative_boost = if has_deep_interrogative { 20.0 } else { 0.0 };
        (verb_hits * 20.0 + interrogative_boost).min(100.0)
    }

    /// Novelty score: raw length contribution plus a closed list of rare,
    /// abstract-register keywords that tend to precede genuinely hard prompts.
    fn predictive_filtering_score(&self, prompt: &str) -> f64 {
        let length_component = (prompt.chars().count() as f64 / 500.0).min(1.0) * 50.0;
        let rare_hits = count_hits(prompt, RARE_KEYWORDS) as f64 * 25.0;
        (length_component + rare_hits).min(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> ComplexityAnalyzer<'static> {
        ComplexityAnalyzer::new(ComplexityThresholds::default())
    }

    #[test]
    fn edge_mode_always_forces_low() {
        let (score, regime, learned) = analyzer().analyze("prove the Riemann hypothesis", true);
        assert_eq!(score, 10.0);
        assert_eq!(regime, ComplexityRegime::Low);
        assert!(!learned);
    }

    #[test]
    fn empty_prompt_is_trivially_low() {
        let (score, regime, _) = analyzer().analyze("   ", false);
        assert_eq!(score, 0.0);
        assert_eq!(regime, ComplexityRegime::Low);
    }

    #[test]
    fn short_plain_prompt_is_low() {
        let (_, regime, _) = analyzer().analyze("hi there", false);
        assert_eq!(regime, ComplexityRegime::Low);
    }

    #[test]
    fn structured_multi_constraint_prompt_scores_higher_than_plain() {
        let (plain, _, _) = analyzer().analyze("tell me about cats", false);
        let (structured, _, _) = analyzer().analyze(
            "First, analyze the constraints, then evaluate if the plan must satisfy the schedule, \
             except when the timeline cannot be met, in which case derive an alternative strategy.",
            false,
        );
        assert!(structured > plain);
    }

    #[test]
    fn rare_keywords_push_score_up() {
        let (_, regime, _) = analyzer().analyze(
            "Give a phenomenological and ontological account of qualia in epistemological terms.",
            false,
        );
        assert_ne!(regime, ComplexityRegime::Low);
    }

    #[test]
    fn learner_suggestion_short_circuits_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let learner = ComplexityLearner::new(dir.path().join("learner.json"));
        learner.record("trivial looking but actually hard", ComplexityRegime::High);
        let analyzer = ComplexityAnalyzer::new(ComplexityThresholds::default()).with_learner(&learner);
        let (score, regime, learned) = analyzer.analyze("trivial looking but actually hard", false);
        assert_eq!(regime, ComplexityRegime::High);
        assert_eq!(score, ComplexityRegime::High.canonical_score());
        assert!(learned);
    }

    #[test]
    fn short_prompt_stays_on_keyword_path_below_the_length_floor() {
        let prompt = "must calculate now"; // well under NLP_MIN_LENGTH
        assert!(prompt.chars().count() <= NLP_MIN_LENGTH);
        let a = analyzer();
        let (score, regime, _) = a.analyze(prompt, false);
        let expected_base = a.keyword_based_score(prompt);
        let expected_novelty = a.predictive_filtering_score(prompt);
        let expected = (0.5 * expected_base + 0.5 * expected_novelty).clamp(0.0, 100.0);
        assert_eq!(score, expected);
        assert_eq!(regime, a.thresholds.regime_for(expected));
    }

    #[test]
    fn long_cognitive_prompt_uses_nlp_enhanced_path_and_escapes_low() {
        let prompt = "Why must we analyze, evaluate, and critique the competing architectural proposals, \
             and how should we synthesize their trade-offs into a single coherent recommendation \
             that the engineering team can act on immediately?";
        assert!(prompt.chars().count() > NLP_MIN_LENGTH);
        let (score, regime, _) = analyzer().analyze(prompt, false);
        assert!(score > ComplexityThresholds::default().low_max);
        assert_ne!(regime, ComplexityRegime::Low);
    }
}

//! Feature extraction
//!
//! One extractor per task domain turns a single attempt's raw telemetry into
//! its domain features, with no dependency on history beyond the prior memory
//! accuracies used for recall consistency. The assembler folds the domain
//! outputs into the fixed cross-domain `ExtractedFeatures` vector; domains not
//! attempted in a session contribute zeros.

pub mod language;
pub mod memory;
pub mod pattern;
pub mod reaction;

pub use language::{LanguageExtractor, LanguageFeatures};
pub use memory::{MemoryExtractor, MemoryFeatures};
pub use pattern::{PatternExtractor, PatternFeatures};
pub use reaction::{ReactionExtractor, ReactionFeatures};

use crate::config::MemoryConfig;
use crate::schema::{AssessmentSession, RawSessionMetrics};
use crate::types::ExtractedFeatures;
use serde::{Deserialize, Serialize};

/// Per-domain features for one assessment session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainFeatures {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reaction: Option<ReactionFeatures>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryFeatures>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<PatternFeatures>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<LanguageFeatures>,
}

impl DomainFeatures {
    /// Run every extractor for the tasks present in a session
    pub fn extract(
        session: &AssessmentSession,
        prior_memory_accuracies: &[f64],
        config: &MemoryConfig,
    ) -> Self {
        let mut features = DomainFeatures::default();
        for task in &session.tasks {
            match task {
                RawSessionMetrics::Reaction(m) => {
                    features.reaction = Some(ReactionExtractor::extract(m));
                }
                RawSessionMetrics::Memory(m) => {
                    features.memory = Some(MemoryExtractor::extract(
                        m,
                        prior_memory_accuracies,
                        config,
                    ));
                }
                RawSessionMetrics::Pattern(m) => {
                    features.pattern = Some(PatternExtractor::extract(m));
                }
                RawSessionMetrics::Language(m) => {
                    features.language = Some(LanguageExtractor::extract(m));
                }
            }
        }
        features
    }
}

/// Folds domain features into the cross-domain vector
pub struct FeatureAssembler;

impl FeatureAssembler {
    pub fn assemble(domains: &DomainFeatures) -> ExtractedFeatures {
        let mut features = ExtractedFeatures::default();

        if let Some(reaction) = &domains.reaction {
            features.reaction_time_avg = reaction.mean_latency_ms;
            features.reaction_time_variance = reaction.latency_variance;
        }
        if let Some(memory) = &domains.memory {
            features.memory_accuracy = memory.recall_accuracy;
        }
        if let Some(pattern) = &domains.pattern {
            features.pattern_score = pattern.pattern_score;
        }
        if let Some(language) = &domains.language {
            features.speech_wpm = language.words_per_minute;
            features.lexical_diversity = language.lexical_diversity;
            features.filler_word_ratio = language.filler_word_ratio;
            features.hesitation_markers = language.hesitation_markers as f64;
        }

        features.sanitized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        LanguageMetrics, MemoryMetrics, PatternMetrics, ReactionMetrics, ReactionTrial,
    };

    #[test]
    fn test_assemble_full_session() {
        let session = AssessmentSession::new(0)
            .with_task(RawSessionMetrics::Reaction(ReactionMetrics {
                trials: vec![ReactionTrial::new(300.0), ReactionTrial::new(340.0)],
            }))
            .with_task(RawSessionMetrics::Memory(MemoryMetrics {
                presented_words: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                recalled_words: vec!["a".into(), "b".into(), "c".into()],
                response_latency_ms: 5000.0,
                interference_score: None,
            }))
            .with_task(RawSessionMetrics::Language(LanguageMetrics {
                transcript: "um the the cat".to_string(),
                duration_sec: 2.0,
                ..Default::default()
            }));

        let domains = DomainFeatures::extract(&session, &[], &MemoryConfig::default());
        assert!(domains.pattern.is_none());

        let features = FeatureAssembler::assemble(&domains);
        assert!((features.reaction_time_avg - 320.0).abs() < 1e-9);
        assert!((features.reaction_time_variance - 800.0).abs() < 1e-9);
        assert!((features.memory_accuracy - 0.75).abs() < 1e-9);
        assert_eq!(features.pattern_score, 0.0);
        assert!((features.speech_wpm - 120.0).abs() < 1e-9);
        assert!((features.lexical_diversity - 0.75).abs() < 1e-9);
        assert!((features.filler_word_ratio - 0.25).abs() < 1e-9);
        // one filler + one repetition
        assert_eq!(features.hesitation_markers, 2.0);
    }

    #[test]
    fn test_empty_raw_metrics_yield_zero_ratios() {
        let session = AssessmentSession::new(0)
            .with_task(RawSessionMetrics::Reaction(ReactionMetrics::default()))
            .with_task(RawSessionMetrics::Memory(MemoryMetrics::default()))
            .with_task(RawSessionMetrics::Pattern(PatternMetrics::default()))
            .with_task(RawSessionMetrics::Language(LanguageMetrics::default()));

        let features = FeatureAssembler::assemble(&DomainFeatures::extract(
            &session,
            &[],
            &MemoryConfig::default(),
        ));

        assert_eq!(features, ExtractedFeatures::default());
        for value in features.to_array() {
            assert!(!value.is_nan());
        }
    }
}

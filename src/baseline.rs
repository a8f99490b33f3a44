//! Baseline construction
//!
//! The baseline is the per-metric mean of the first sessions in chronological
//! order. It captures what normal looked like at onboarding and is rebuilt only
//! when a caller asks for it.

use crate::config::DEFAULT_BASELINE_SESSIONS;
use crate::types::{BaselineVector, ExtractedFeatures, Metric, SessionDataPoint};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Builder for personal baselines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineBuilder {
    /// Number of leading sessions averaged
    sessions: usize,
}

impl Default for BaselineBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_BASELINE_SESSIONS)
    }
}

impl BaselineBuilder {
    /// Create a builder averaging the first `sessions` sessions (at least 1)
    pub fn new(sessions: usize) -> Self {
        Self {
            sessions: sessions.max(1),
        }
    }

    pub fn sessions(&self) -> usize {
        self.sessions
    }

    /// Mean of the first `k` feature vectors
    ///
    /// With no input the all-zero vector is returned with `session_count == 0`;
    /// check `is_established()` before trusting it.
    pub fn build(&self, features: &[ExtractedFeatures]) -> BaselineVector {
        let used = &features[..features.len().min(self.sessions)];
        if used.is_empty() {
            return BaselineVector::default();
        }

        let n = used.len() as f64;
        let column_mean = |metric: Metric| used.iter().map(|f| f.get(metric)).sum::<f64>() / n;

        let baseline = ExtractedFeatures {
            memory_accuracy: column_mean(Metric::MemoryAccuracy),
            reaction_time_avg: column_mean(Metric::ReactionTimeAvg),
            reaction_time_variance: column_mean(Metric::ReactionTimeVariance),
            pattern_score: column_mean(Metric::PatternScore),
            speech_wpm: column_mean(Metric::SpeechWpm),
            lexical_diversity: column_mean(Metric::LexicalDiversity),
            filler_word_ratio: column_mean(Metric::FillerWordRatio),
            hesitation_markers: column_mean(Metric::HesitationMarkers),
        };

        debug!(sessions = used.len(), "baseline built");

        BaselineVector {
            features: baseline,
            session_count: used.len() as u32,
        }
    }

    /// Build from data points, ordering them by timestamp first
    pub fn build_from_points(&self, points: &[SessionDataPoint]) -> BaselineVector {
        let mut ordered: Vec<&SessionDataPoint> = points.iter().collect();
        ordered.sort_by_key(|p| p.timestamp);
        let features: Vec<ExtractedFeatures> = ordered.iter().map(|p| p.features).collect();
        self.build(&features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(memory: f64, reaction: f64) -> ExtractedFeatures {
        ExtractedFeatures {
            memory_accuracy: memory,
            reaction_time_avg: reaction,
            pattern_score: 0.9,
            speech_wpm: 140.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_baseline_averages_first_k() {
        let builder = BaselineBuilder::new(2);
        let baseline = builder.build(&[
            features(0.8, 300.0),
            features(0.9, 320.0),
            features(0.1, 900.0),
        ]);

        assert_eq!(baseline.session_count, 2);
        assert!((baseline.features.memory_accuracy - 0.85).abs() < 1e-9);
        assert!((baseline.features.reaction_time_avg - 310.0).abs() < 1e-9);
        assert!((baseline.features.pattern_score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_baseline_with_fewer_sessions_than_k() {
        let baseline = BaselineBuilder::new(5).build(&[features(0.7, 350.0)]);
        assert_eq!(baseline.session_count, 1);
        assert!(baseline.is_established());
        assert_eq!(baseline.features.memory_accuracy, 0.7);
    }

    #[test]
    fn test_empty_baseline_is_zero() {
        let baseline = BaselineBuilder::default().build(&[]);
        assert_eq!(baseline, BaselineVector::default());
        assert!(!baseline.is_established());
    }

    #[test]
    fn test_build_from_points_orders_by_time() {
        let points = vec![
            SessionDataPoint::new(3_000, features(0.2, 500.0)),
            SessionDataPoint::new(1_000, features(0.8, 300.0)),
            SessionDataPoint::new(2_000, features(0.6, 340.0)),
        ];
        let baseline = BaselineBuilder::new(2).build_from_points(&points);
        assert!((baseline.features.memory_accuracy - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_zero_sessions_clamped_to_one() {
        assert_eq!(BaselineBuilder::new(0).sessions(), 1);
    }
}

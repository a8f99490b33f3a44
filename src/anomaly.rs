//! Anomaly detection against the personal distribution
//!
//! The latest session is compared to the user's own history: for each compared
//! metric the absolute z-score of the current value is taken against the mean
//! and sample standard deviation of the historical values.

use crate::config::AnomalyConfig;
use crate::stats::{mean, safe_div, sample_std_dev};
use crate::types::{AnomalyResult, ExtractedFeatures, Metric};
use std::collections::BTreeMap;
use tracing::debug;

/// Anomaly detector
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(AnomalyConfig::default())
    }
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    pub fn threshold(&self) -> f64 {
        self.config.z_threshold
    }

    /// Compare `current` against `history` (which must not include `current`)
    ///
    /// History shorter than the configured minimum gives the no-op result.
    /// When a window is configured only the most recent entries are used.
    pub fn detect(
        &self,
        current: &ExtractedFeatures,
        history: &[ExtractedFeatures],
    ) -> AnomalyResult {
        let history = match self.config.window {
            Some(window) if window < history.len() => &history[history.len() - window..],
            _ => history,
        };

        if history.len() < self.config.min_history {
            debug!(
                history = history.len(),
                required = self.config.min_history,
                "not enough history for anomaly detection"
            );
            return AnomalyResult::none();
        }

        let mut deviations = BTreeMap::new();
        for metric in Metric::ANOMALY {
            let values: Vec<f64> = history.iter().map(|f| f.get(metric)).collect();
            let std_dev = sample_std_dev(&values);
            let deviation = safe_div((current.get(metric) - mean(&values)).abs(), std_dev);
            deviations.insert(metric, deviation);
        }

        let threshold = self.config.z_threshold;
        let is_anomaly = deviations.values().any(|d| *d > threshold);
        let mean_deviation = deviations.values().sum::<f64>() / deviations.len() as f64;
        let anomaly_score = safe_div(mean_deviation, 2.0 * threshold).min(1.0);

        debug!(is_anomaly, anomaly_score, "anomaly detection complete");

        AnomalyResult {
            is_anomaly,
            anomaly_score,
            deviations,
        }
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
            lexical_diversity: 0.7,
            ..Default::default()
        }
    }

    fn steady_history() -> Vec<ExtractedFeatures> {
        vec![
            features(0.80, 300.0),
            features(0.82, 310.0),
            features(0.78, 290.0),
            features(0.80, 300.0),
        ]
    }

    #[test]
    fn test_short_history_is_noop() {
        let detector = AnomalyDetector::default();
        let history = vec![features(0.8, 300.0), features(0.8, 300.0)];
        let result = detector.detect(&features(0.1, 900.0), &history);
        assert!(!result.is_anomaly);
        assert_eq!(result.anomaly_score, 0.0);
        assert!(result.deviations.is_empty());
    }

    #[test]
    fn test_typical_session_not_flagged() {
        let result = AnomalyDetector::default().detect(&features(0.81, 305.0), &steady_history());
        assert!(!result.is_anomaly);
        assert!(result.anomaly_score < 0.5);
        assert_eq!(result.deviations.len(), 5);
    }

    #[test]
    fn test_slow_reaction_flagged() {
        let result = AnomalyDetector::default().detect(&features(0.80, 450.0), &steady_history());
        assert!(result.is_anomaly);
        assert!(result.deviations[&Metric::ReactionTimeAvg] > 2.0);

        let flagged = result.flagged(2.0);
        assert_eq!(flagged[0].0, Metric::ReactionTimeAvg);
    }

    #[test]
    fn test_zero_std_dev_gives_zero_deviation() {
        // pattern, speech and lexical values never vary in the fixture
        let result = AnomalyDetector::default().detect(&features(0.80, 300.0), &steady_history());
        assert_eq!(result.deviations[&Metric::PatternScore], 0.0);
        assert_eq!(result.deviations[&Metric::SpeechWpm], 0.0);
    }

    #[test]
    fn test_score_is_capped() {
        let result = AnomalyDetector::default().detect(&features(0.0, 5000.0), &steady_history());
        assert_eq!(result.anomaly_score, 1.0);
    }

    #[test]
    fn test_window_limits_history() {
        let detector = AnomalyDetector::new(AnomalyConfig {
            window: Some(2),
            ..Default::default()
        });
        // a window of 2 is below the minimum history, so nothing runs
        let result = detector.detect(&features(0.1, 900.0), &steady_history());
        assert_eq!(result, AnomalyResult::none());
    }
}

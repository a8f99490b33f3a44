//! Reaction-time feature extraction

use crate::schema::ReactionMetrics;
use crate::stats::{mean, sample_variance};
use serde::{Deserialize, Serialize};

/// Features derived from one reaction task attempt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactionFeatures {
    /// Mean valid-trial latency (ms)
    pub mean_latency_ms: f64,
    /// Sample variance of valid-trial latencies (ms^2)
    pub latency_variance: f64,
    /// Fastest valid latency (ms)
    pub fastest_latency_ms: f64,
    pub valid_trials: u32,
    pub false_starts: u32,
    pub timeouts: u32,
    pub calibration_trials: u32,
}

/// Extractor for reaction task telemetry
pub struct ReactionExtractor;

impl ReactionExtractor {
    /// Derive latency statistics from valid trials and count the rest
    pub fn extract(metrics: &ReactionMetrics) -> ReactionFeatures {
        let latencies: Vec<f64> = metrics
            .trials
            .iter()
            .filter(|t| t.is_valid())
            .map(|t| t.latency_ms)
            .collect();

        // a calibration round that also false-started counts only as calibration
        let scored = metrics.trials.iter().filter(|t| !t.calibration);
        let false_starts = scored.clone().filter(|t| t.false_start).count() as u32;
        let timeouts = scored
            .filter(|t| t.timed_out && !t.false_start)
            .count() as u32;

        ReactionFeatures {
            mean_latency_ms: mean(&latencies),
            latency_variance: sample_variance(&latencies),
            fastest_latency_ms: latencies.iter().copied().reduce(f64::min).unwrap_or(0.0),
            valid_trials: latencies.len() as u32,
            false_starts,
            timeouts,
            calibration_trials: metrics.trials.iter().filter(|t| t.calibration).count() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ReactionTrial;

    fn trial(latency_ms: f64) -> ReactionTrial {
        ReactionTrial::new(latency_ms)
    }

    #[test]
    fn test_valid_trial_statistics() {
        let metrics = ReactionMetrics {
            trials: vec![trial(300.0), trial(320.0), trial(340.0)],
        };
        let features = ReactionExtractor::extract(&metrics);

        assert!((features.mean_latency_ms - 320.0).abs() < 1e-9);
        // deviations -20, 0, 20 -> 800 / 2
        assert!((features.latency_variance - 400.0).abs() < 1e-9);
        assert_eq!(features.fastest_latency_ms, 300.0);
        assert_eq!(features.valid_trials, 3);
    }

    #[test]
    fn test_invalid_trials_excluded_but_counted() {
        let metrics = ReactionMetrics {
            trials: vec![
                ReactionTrial {
                    calibration: true,
                    ..trial(900.0)
                },
                ReactionTrial {
                    false_start: true,
                    ..trial(80.0)
                },
                ReactionTrial {
                    timed_out: true,
                    ..trial(2000.0)
                },
                trial(310.0),
                trial(330.0),
            ],
        };
        let features = ReactionExtractor::extract(&metrics);

        assert!((features.mean_latency_ms - 320.0).abs() < 1e-9);
        assert_eq!(features.valid_trials, 2);
        assert_eq!(features.false_starts, 1);
        assert_eq!(features.timeouts, 1);
        assert_eq!(features.calibration_trials, 1);
    }

    #[test]
    fn test_no_trials_yields_zero() {
        let features = ReactionExtractor::extract(&ReactionMetrics::default());
        assert_eq!(features, ReactionFeatures::default());
    }

    #[test]
    fn test_single_trial_has_zero_variance() {
        let metrics = ReactionMetrics {
            trials: vec![trial(275.0)],
        };
        let features = ReactionExtractor::extract(&metrics);
        assert_eq!(features.mean_latency_ms, 275.0);
        assert_eq!(features.latency_variance, 0.0);
    }
}

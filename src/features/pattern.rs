//! Sequence-memory (pattern) feature extraction
//!
//! Rounds are scored in the order the runner recorded them. An assessment ends
//! at the first failed round, so that round is the last one scored; anything
//! recorded after it is ignored.

use crate::schema::{PatternMetrics, PatternRound};
use crate::stats::{ols_slope, safe_div, sample_variance};
use serde::{Deserialize, Serialize};

/// Rounds within this many elements of the longest sequence count as "high load"
const HIGH_LOAD_MARGIN: usize = 1;

/// Features derived from one pattern task attempt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternFeatures {
    /// correct rounds / rounds (0-1)
    pub pattern_score: f64,
    /// Speed-up of per-element completion time across rounds (positive = faster)
    pub learning_rate: f64,
    /// Accuracy on rounds at or near the longest sequence (0-1)
    pub memory_load_tolerance: f64,
    /// `max(0, 100 − sd(latency)/10)` over all taps (0-100)
    pub stability_index: f64,
    /// (second-half errors − first-half errors) / half length
    pub error_growth_rate: f64,
    pub rounds_played: u32,
    pub correct_rounds: u32,
    pub max_sequence_length: u32,
    pub highest_level: u32,
}

/// Extractor for pattern task telemetry
pub struct PatternExtractor;

impl PatternExtractor {
    pub fn extract(metrics: &PatternMetrics) -> PatternFeatures {
        let rounds = scored_rounds(&metrics.rounds);
        if rounds.is_empty() {
            return PatternFeatures::default();
        }

        let correct_rounds = rounds.iter().filter(|r| r.correct).count();

        PatternFeatures {
            pattern_score: safe_div(correct_rounds as f64, rounds.len() as f64).clamp(0.0, 1.0),
            learning_rate: compute_learning_rate(rounds),
            memory_load_tolerance: compute_memory_load_tolerance(rounds),
            stability_index: compute_stability_index(rounds),
            error_growth_rate: compute_error_growth_rate(rounds),
            rounds_played: rounds.len() as u32,
            correct_rounds: correct_rounds as u32,
            max_sequence_length: rounds.iter().map(|r| r.sequence_length()).max().unwrap_or(0)
                as u32,
            highest_level: rounds.iter().map(|r| r.level).max().unwrap_or(0),
        }
    }
}

/// Rounds up to and including the first failure
fn scored_rounds(rounds: &[PatternRound]) -> &[PatternRound] {
    match rounds.iter().position(|r| !r.correct) {
        Some(failed) => &rounds[..=failed],
        None => rounds,
    }
}

/// Negative OLS slope of per-element completion time (seconds) over round
/// index, scaled by 100
fn compute_learning_rate(rounds: &[PatternRound]) -> f64 {
    let points: Vec<(f64, f64)> = rounds
        .iter()
        .enumerate()
        .filter(|(_, r)| r.sequence_length() > 0)
        .map(|(i, r)| {
            let per_element =
                safe_div(r.completion_time() / 1000.0, r.sequence_length() as f64);
            (i as f64, per_element)
        })
        .collect();
    let slope = ols_slope(&points);
    if slope == 0.0 {
        0.0
    } else {
        -slope * 100.0
    }
}

fn compute_memory_load_tolerance(rounds: &[PatternRound]) -> f64 {
    let max_len = rounds.iter().map(|r| r.sequence_length()).max().unwrap_or(0);
    if max_len == 0 {
        return 0.0;
    }
    let floor = max_len.saturating_sub(HIGH_LOAD_MARGIN).max(1);
    let high_load: Vec<&PatternRound> = rounds
        .iter()
        .filter(|r| r.sequence_length() >= floor)
        .collect();
    let correct = high_load.iter().filter(|r| r.correct).count();
    safe_div(correct as f64, high_load.len() as f64).clamp(0.0, 1.0)
}

fn compute_stability_index(rounds: &[PatternRound]) -> f64 {
    let latencies: Vec<f64> = rounds
        .iter()
        .flat_map(|r| r.response_latencies_ms.iter().copied())
        .collect();
    if latencies.is_empty() {
        return 0.0;
    }
    (100.0 - sample_variance(&latencies).sqrt() / 10.0).max(0.0)
}

fn compute_error_growth_rate(rounds: &[PatternRound]) -> f64 {
    let half = rounds.len() / 2;
    if half == 0 {
        return 0.0;
    }
    let errors = |slice: &[PatternRound]| slice.iter().filter(|r| !r.correct).count() as f64;
    let first = errors(&rounds[..half]);
    let second = errors(&rounds[rounds.len() - half..]);
    safe_div(second - first, half as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(len: usize, correct: bool, completion_ms: f64, latencies: &[f64]) -> PatternRound {
        PatternRound {
            level: len as u32,
            grid_size: 3,
            target_sequence: (0..len as u32).collect(),
            user_input: (0..len as u32).collect(),
            correct,
            response_latencies_ms: latencies.to_vec(),
            completion_time_ms: Some(completion_ms),
        }
    }

    #[test]
    fn test_pattern_score_and_counts() {
        let metrics = PatternMetrics {
            rounds: vec![
                round(3, true, 3000.0, &[]),
                round(4, true, 4000.0, &[]),
                round(5, false, 5000.0, &[]),
            ],
        };
        let features = PatternExtractor::extract(&metrics);
        assert!((features.pattern_score - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(features.rounds_played, 3);
        assert_eq!(features.correct_rounds, 2);
        assert_eq!(features.max_sequence_length, 5);
        assert_eq!(features.highest_level, 5);
    }

    #[test]
    fn test_learning_rate_positive_when_getting_faster() {
        // per-element time 1.0s, 0.8s, 0.6s
        let metrics = PatternMetrics {
            rounds: vec![
                round(3, true, 3000.0, &[]),
                round(4, true, 3200.0, &[]),
                round(5, true, 3000.0, &[]),
            ],
        };
        let features = PatternExtractor::extract(&metrics);
        assert!((features.learning_rate - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_learning_rate_negative_when_slowing() {
        let metrics = PatternMetrics {
            rounds: vec![round(3, true, 1500.0, &[]), round(3, true, 3000.0, &[])],
        };
        assert!(PatternExtractor::extract(&metrics).learning_rate < 0.0);
    }

    #[test]
    fn test_memory_load_tolerance_uses_longest_rounds() {
        // longest = 5, high-load floor = 4: rounds of length 4 and 5
        let metrics = PatternMetrics {
            rounds: vec![
                round(3, true, 0.0, &[]),
                round(4, true, 0.0, &[]),
                round(5, false, 0.0, &[]),
            ],
        };
        let features = PatternExtractor::extract(&metrics);
        assert!((features.memory_load_tolerance - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_stability_index() {
        // sd of [400, 600] = sqrt(20000) ~ 141.4 -> 100 - 14.14
        let metrics = PatternMetrics {
            rounds: vec![round(2, true, 1000.0, &[400.0, 600.0])],
        };
        let features = PatternExtractor::extract(&metrics);
        assert!((features.stability_index - (100.0 - 20000f64.sqrt() / 10.0)).abs() < 1e-9);

        let erratic = PatternMetrics {
            rounds: vec![round(2, true, 0.0, &[0.0, 3000.0])],
        };
        assert_eq!(PatternExtractor::extract(&erratic).stability_index, 0.0);
    }

    #[test]
    fn test_rounds_after_first_failure_ignored() {
        let metrics = PatternMetrics {
            rounds: vec![
                round(3, true, 0.0, &[]),
                round(4, false, 0.0, &[]),
                round(5, true, 0.0, &[]),
                round(6, true, 0.0, &[]),
            ],
        };
        let features = PatternExtractor::extract(&metrics);
        assert_eq!(features.rounds_played, 2);
        assert_eq!(features.correct_rounds, 1);
        assert!((features.pattern_score - 0.5).abs() < 1e-9);
        assert_eq!(features.max_sequence_length, 4);
    }

    #[test]
    fn test_error_growth_rate() {
        let metrics = PatternMetrics {
            rounds: vec![
                round(3, true, 0.0, &[]),
                round(4, true, 0.0, &[]),
                round(5, true, 0.0, &[]),
                round(6, false, 0.0, &[]),
            ],
        };
        // (1 - 0) / 2
        assert!((PatternExtractor::extract(&metrics).error_growth_rate - 0.5).abs() < 1e-9);

        let single = PatternMetrics {
            rounds: vec![round(3, false, 0.0, &[])],
        };
        assert_eq!(PatternExtractor::extract(&single).error_growth_rate, 0.0);
    }

    #[test]
    fn test_no_rounds_yields_zero() {
        let features = PatternExtractor::extract(&PatternMetrics::default());
        assert_eq!(features, PatternFeatures::default());
    }

    #[test]
    fn test_empty_sequences_do_not_divide_by_zero() {
        let metrics = PatternMetrics {
            rounds: vec![round(0, false, 1000.0, &[]), round(0, false, 500.0, &[])],
        };
        let features = PatternExtractor::extract(&metrics);
        assert_eq!(features.learning_rate, 0.0);
        assert_eq!(features.memory_load_tolerance, 0.0);
        assert!(features.pattern_score.is_finite());
    }
}

//! Risk fusion
//!
//! Combines the baseline delta, trend slopes and anomaly result into one
//! explainable verdict. Signal count drives the level; signal strength drives
//! the confidence, so the two are reported independently.

use crate::config::{RiskThresholds, MAX_TOP_FACTORS};
use crate::types::{
    AnomalyResult, BaselineVector, DeltaVector, ExtractedFeatures, RiskAnalysis, RiskLevel,
    TrendSlopes,
};
use tracing::debug;

pub const MEMORY_DECLINE: &str = "memory decline";
pub const SLOWER_REACTION: &str = "slower reaction time";
pub const PATTERN_DECLINE: &str = "pattern recognition decline";
pub const REDUCED_SPEECH_RATE: &str = "reduced speech rate";
pub const DECLINING_TREND: &str = "declining performance trend";

/// Every fixed factor tag the engine can emit (anomaly tags are built from
/// metric labels)
pub const FACTOR_TAGS: [&str; 5] = [
    MEMORY_DECLINE,
    SLOWER_REACTION,
    PATTERN_DECLINE,
    REDUCED_SPEECH_RATE,
    DECLINING_TREND,
];

pub const NO_CHANGES_EXPLANATION: &str = "No significant changes detected.";

/// Current minus baseline, with reaction inverted so positive is better
pub fn compute_delta(current: &ExtractedFeatures, baseline: &BaselineVector) -> DeltaVector {
    let base = &baseline.features;
    DeltaVector {
        memory_delta: current.memory_accuracy - base.memory_accuracy,
        reaction_delta: base.reaction_time_avg - current.reaction_time_avg,
        pattern_delta: current.pattern_score - base.pattern_score,
        speech_delta: current.speech_wpm - base.speech_wpm,
    }
}

/// Contributing factor with its severity
#[derive(Debug, Clone, PartialEq)]
struct Factor {
    tag: String,
    severity: f64,
}

/// Risk fusion engine
pub struct RiskFusionEngine {
    thresholds: RiskThresholds,
    z_threshold: f64,
}

impl Default for RiskFusionEngine {
    fn default() -> Self {
        Self::new(RiskThresholds::default(), 2.0)
    }
}

impl RiskFusionEngine {
    /// `z_threshold` must match the anomaly detector's so the flagged metrics
    /// line up with `is_anomaly`
    pub fn new(thresholds: RiskThresholds, z_threshold: f64) -> Self {
        Self {
            thresholds,
            z_threshold,
        }
    }

    /// Fuse stage outputs for the current session
    ///
    /// A baseline with no sessions contributes no delta signals.
    pub fn fuse(
        &self,
        current: &ExtractedFeatures,
        baseline: &BaselineVector,
        slopes: &TrendSlopes,
        anomaly: &AnomalyResult,
    ) -> RiskAnalysis {
        let t = &self.thresholds;
        let mut signals: u32 = 0;
        let mut strength = 0.0;
        let mut factors: Vec<Factor> = Vec::new();

        let mut fire = |tag: &str, severity: f64, factors: &mut Vec<Factor>| {
            signals += 1;
            strength += severity;
            factors.push(Factor {
                tag: tag.to_string(),
                severity,
            });
        };

        if baseline.is_established() {
            let delta = compute_delta(current, baseline);
            if delta.memory_delta < t.memory_delta {
                fire(MEMORY_DECLINE, delta.memory_delta.abs(), &mut factors);
            }
            if delta.reaction_delta < t.reaction_delta_ms {
                let severity = delta.reaction_delta.abs() / t.reaction_strength_scale_ms;
                fire(SLOWER_REACTION, severity, &mut factors);
            }
            if delta.pattern_delta < t.pattern_delta {
                fire(PATTERN_DECLINE, delta.pattern_delta.abs(), &mut factors);
            }
            if delta.speech_delta < t.speech_delta {
                let severity = delta.speech_delta.abs() / t.speech_strength_scale_wpm;
                fire(REDUCED_SPEECH_RATE, severity, &mut factors);
            }
        }

        let mean_slope = slopes.mean();
        if mean_slope < t.trend_slope {
            fire(DECLINING_TREND, mean_slope.abs() * 100.0, &mut factors);
        }

        if anomaly.is_anomaly {
            let flagged = anomaly.flagged(self.z_threshold);
            let max_deviation = flagged.first().map(|(_, d)| *d).unwrap_or(0.0);
            signals += 1;
            strength += max_deviation / 3.0;
            for (metric, deviation) in flagged {
                factors.push(Factor {
                    tag: format!("unusual {}", metric.label()),
                    severity: deviation / 3.0,
                });
            }
        }

        let risk_level = if signals >= t.possible_risk_signals {
            RiskLevel::PossibleRisk
        } else if signals >= t.change_detected_signals {
            RiskLevel::ChangeDetected
        } else {
            RiskLevel::Stable
        };
        let risk_confidence_score = (strength / 2.0).min(1.0);

        factors.sort_by(|a, b| b.severity.total_cmp(&a.severity));
        let top_factors: Vec<String> = factors
            .into_iter()
            .take(t.max_factors.min(MAX_TOP_FACTORS))
            .map(|f| f.tag)
            .collect();

        let explanation = if top_factors.is_empty() {
            NO_CHANGES_EXPLANATION.to_string()
        } else {
            format!("Top factors: {}.", top_factors.join(", "))
        };

        debug!(
            signals,
            strength,
            level = risk_level.as_str(),
            "risk fusion complete"
        );

        RiskAnalysis {
            risk_level,
            risk_confidence_score,
            anomaly_score: anomaly.anomaly_score,
            explanation,
            top_factors,
            message: risk_level.message().to_string(),
            signal_count: signals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metric;
    use pretty_assertions::assert_eq;

    fn features(memory: f64, reaction: f64, pattern: f64, wpm: f64) -> ExtractedFeatures {
        ExtractedFeatures {
            memory_accuracy: memory,
            reaction_time_avg: reaction,
            pattern_score: pattern,
            speech_wpm: wpm,
            lexical_diversity: 0.7,
            ..Default::default()
        }
    }

    fn baseline() -> BaselineVector {
        BaselineVector {
            features: features(0.8, 300.0, 0.9, 140.0),
            session_count: 2,
        }
    }

    fn declining_slopes() -> TrendSlopes {
        TrendSlopes {
            memory_trend_slope: -0.01,
            reaction_trend_slope: -3.0,
            pattern_trend_slope: -0.01,
            speech_trend_slope: -1.0,
        }
    }

    fn anomaly_on(metric: Metric, deviation: f64) -> AnomalyResult {
        let mut result = AnomalyResult {
            is_anomaly: true,
            anomaly_score: 0.7,
            ..Default::default()
        };
        result.deviations.insert(metric, deviation);
        result.deviations.insert(Metric::MemoryAccuracy, 0.5);
        result
    }

    #[test]
    fn test_identical_vectors_zero_delta() {
        let base = baseline();
        assert_eq!(compute_delta(&base.features, &base), DeltaVector::default());
    }

    #[test]
    fn test_memory_delta_exact() {
        let current = features(0.6, 300.0, 0.9, 140.0);
        let delta = compute_delta(&current, &baseline());
        assert_eq!(delta.memory_delta, 0.6 - 0.8);
        assert!((delta.memory_delta + 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_reaction_delta_inverted() {
        let current = features(0.8, 380.0, 0.9, 140.0);
        assert_eq!(compute_delta(&current, &baseline()).reaction_delta, -80.0);
    }

    #[test]
    fn test_no_signals_is_stable() {
        let base = baseline();
        let analysis = RiskFusionEngine::default().fuse(
            &base.features,
            &base,
            &TrendSlopes::default(),
            &AnomalyResult::none(),
        );
        assert_eq!(analysis.risk_level, RiskLevel::Stable);
        assert!(analysis.risk_confidence_score < 0.5);
        assert_eq!(analysis.signal_count, 0);
        assert!(analysis.top_factors.is_empty());
        assert_eq!(analysis.explanation, NO_CHANGES_EXPLANATION);
        assert_eq!(analysis.message, RiskLevel::Stable.message());
    }

    #[test]
    fn test_many_signals_possible_risk() {
        let current = features(0.5, 420.0, 0.6, 140.0);
        let analysis = RiskFusionEngine::default().fuse(
            &current,
            &baseline(),
            &declining_slopes(),
            &anomaly_on(Metric::ReactionTimeAvg, 4.2),
        );
        // memory, reaction, pattern, trend, anomaly
        assert_eq!(analysis.signal_count, 5);
        assert_eq!(analysis.risk_level, RiskLevel::PossibleRisk);
        assert!(!analysis.top_factors.is_empty());
        assert!(analysis.top_factors.len() <= 3);
        assert_eq!(analysis.message, RiskLevel::PossibleRisk.message());
    }

    #[test]
    fn test_oversized_max_factors_still_reports_three() {
        let thresholds = RiskThresholds {
            max_factors: 10,
            ..Default::default()
        };
        let analysis = RiskFusionEngine::new(thresholds, 2.0).fuse(
            &features(0.5, 420.0, 0.6, 80.0),
            &baseline(),
            &declining_slopes(),
            &anomaly_on(Metric::ReactionTimeAvg, 4.2),
        );
        assert_eq!(analysis.signal_count, 6);
        assert_eq!(analysis.top_factors.len(), 3);
    }

    #[test]
    fn test_two_or_three_signals_change_detected() {
        let engine = RiskFusionEngine::default();

        let two = engine.fuse(
            &features(0.65, 300.0, 0.75, 140.0),
            &baseline(),
            &TrendSlopes::default(),
            &AnomalyResult::none(),
        );
        assert_eq!(two.signal_count, 2);
        assert_eq!(two.risk_level, RiskLevel::ChangeDetected);

        let three = engine.fuse(
            &features(0.65, 300.0, 0.75, 140.0),
            &baseline(),
            &declining_slopes(),
            &AnomalyResult::none(),
        );
        assert_eq!(three.signal_count, 3);
        assert_eq!(three.risk_level, RiskLevel::ChangeDetected);
    }

    #[test]
    fn test_factors_ranked_by_severity() {
        // memory 0.15, pattern 0.3, trend mean -1.005 * 100
        let analysis = RiskFusionEngine::default().fuse(
            &features(0.65, 300.0, 0.6, 140.0),
            &baseline(),
            &declining_slopes(),
            &AnomalyResult::none(),
        );
        assert_eq!(
            analysis.top_factors,
            vec![DECLINING_TREND, PATTERN_DECLINE, MEMORY_DECLINE]
        );
        assert_eq!(
            analysis.explanation,
            "Top factors: declining performance trend, pattern recognition decline, memory decline."
        );
        assert_eq!(analysis.risk_confidence_score, 1.0);
    }

    #[test]
    fn test_anomaly_counts_once_and_tags_metric() {
        let analysis = RiskFusionEngine::default().fuse(
            &baseline().features,
            &baseline(),
            &TrendSlopes::default(),
            &anomaly_on(Metric::ReactionTimeAvg, 3.0),
        );
        assert_eq!(analysis.signal_count, 1);
        assert_eq!(analysis.top_factors, vec!["unusual reaction time avg"]);
        assert!((analysis.risk_confidence_score - 0.5).abs() < 1e-12);
        assert_eq!(analysis.anomaly_score, 0.7);
    }

    #[test]
    fn test_unestablished_baseline_skips_deltas() {
        let analysis = RiskFusionEngine::default().fuse(
            &features(0.5, 420.0, 0.6, 90.0),
            &BaselineVector::default(),
            &TrendSlopes::default(),
            &AnomalyResult::none(),
        );
        assert_eq!(analysis.signal_count, 0);
        assert_eq!(analysis.risk_level, RiskLevel::Stable);
    }
}

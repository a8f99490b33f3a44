//! Trend estimation
//!
//! Fits an OLS slope per tracked metric against elapsed time since the
//! earliest session. Reaction time is negated before fitting so a positive
//! slope means improvement for every metric.

use crate::config::TrendConfig;
use crate::stats::ols_slope;
use crate::types::{Metric, SessionDataPoint, TrendSlopes};
use tracing::debug;

/// Trend estimator over a session history
pub struct TrendEstimator {
    config: TrendConfig,
}

impl Default for TrendEstimator {
    fn default() -> Self {
        Self::new(TrendConfig::default())
    }
}

impl TrendEstimator {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    /// Slopes per tracked metric, in improvement-positive orientation
    ///
    /// Points are ordered by timestamp here; callers may pass storage order.
    /// Fewer than two points, or identical timestamps, give all-zero slopes.
    pub fn estimate(&self, points: &[SessionDataPoint]) -> TrendSlopes {
        if points.len() < 2 {
            return TrendSlopes::default();
        }

        let mut ordered: Vec<&SessionDataPoint> = points.iter().collect();
        ordered.sort_by_key(|p| p.timestamp);
        let origin = ordered[0].timestamp;

        let slope = |metric: Metric| {
            let sign = if metric.higher_is_better() { 1.0 } else { -1.0 };
            let pairs: Vec<(f64, f64)> = ordered
                .iter()
                .map(|p| {
                    let t = (p.timestamp as f64 - origin as f64) / self.config.time_unit_ms;
                    (t, sign * p.features.get(metric))
                })
                .collect();
            ols_slope(&pairs)
        };

        let slopes = TrendSlopes {
            memory_trend_slope: slope(Metric::MemoryAccuracy),
            reaction_trend_slope: slope(Metric::ReactionTimeAvg),
            pattern_trend_slope: slope(Metric::PatternScore),
            speech_trend_slope: slope(Metric::SpeechWpm),
        };

        debug!(
            sessions = points.len(),
            memory = slopes.memory_trend_slope,
            reaction = slopes.reaction_trend_slope,
            pattern = slopes.pattern_trend_slope,
            speech = slopes.speech_trend_slope,
            "trend slopes estimated"
        );

        slopes
    }

    /// Dashboard-level direction in [-1, 1]: `tanh(mean slope × scale)`
    pub fn overall_direction(&self, slopes: &TrendSlopes) -> f64 {
        (slopes.mean() * self.config.direction_scale).tanh()
    }
}

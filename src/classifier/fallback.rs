//! Statistical trend predictor
//!
//! Blends each session into one composite score, fits a slope against session
//! index and thresholds it. Always available, deterministic and synchronous.

use super::{
    DomainContributions, PredictionSource, Reliability, TrendClass, TrendPrediction,
    TrendPredictor,
};
use crate::config::{ClassifierConfig, CompositeWeights};
use crate::stats::{index_slope, safe_div};
use crate::types::ExtractedFeatures;

/// Composite components on a 0-100 scale, before weighting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeParts {
    pub memory: f64,
    pub reaction: f64,
    pub pattern: f64,
    pub speech: f64,
}

impl CompositeParts {
    pub fn from_features(features: &ExtractedFeatures) -> Self {
        Self {
            memory: features.memory_accuracy * 100.0,
            reaction: ((1000.0 - features.reaction_time_avg) / 10.0).clamp(0.0, 100.0),
            pattern: features.pattern_score * 100.0,
            speech: (features.speech_wpm / 150.0 * 100.0).clamp(0.0, 100.0),
        }
    }

    pub fn weighted(&self, weights: &CompositeWeights) -> f64 {
        self.memory * weights.memory
            + self.reaction * weights.reaction
            + self.pattern * weights.pattern
            + self.speech * weights.speech
    }
}

/// Weighted composite score (0-100) for one session
pub fn composite_score(features: &ExtractedFeatures, weights: &CompositeWeights) -> f64 {
    CompositeParts::from_features(features).weighted(weights)
}

/// Composite-slope trend predictor
#[derive(Debug, Clone, Default)]
pub struct StatisticalTrendPredictor {
    config: ClassifierConfig,
}

impl StatisticalTrendPredictor {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }
}

impl TrendPredictor for StatisticalTrendPredictor {
    fn name(&self) -> &'static str {
        "statistical"
    }

    fn predict(&self, history: &[ExtractedFeatures]) -> Option<TrendPrediction> {
        let config = &self.config;
        if history.len() < config.min_sessions {
            return None;
        }
        let recent = &history[history.len().saturating_sub(config.window_size)..];
        let weights = &config.fallback_weights;
        let parts: Vec<CompositeParts> = recent.iter().map(CompositeParts::from_features).collect();

        let scores: Vec<f64> = parts.iter().map(|p| p.weighted(weights)).collect();
        let slope = index_slope(&scores);

        let threshold = config.fallback_slope_threshold;
        let trend = if slope < -threshold {
            TrendClass::Declining
        } else if slope > threshold {
            TrendClass::Improving
        } else {
            TrendClass::Stable
        };

        let high_reliability = history.len() >= config.high_reliability_gate();
        let mut confidence = (0.5 + slope.abs() * 0.1).min(0.95);
        if high_reliability {
            confidence = (confidence + 0.05).min(0.99);
        }

        let component_slope = |select: fn(&CompositeParts) -> f64, weight: f64| {
            let series: Vec<f64> = parts.iter().map(|p| select(p) * weight).collect();
            index_slope(&series).abs()
        };
        let memory = component_slope(|p| p.memory, weights.memory);
        let reaction = component_slope(|p| p.reaction, weights.reaction);
        let pattern = component_slope(|p| p.pattern, weights.pattern);
        let language = component_slope(|p| p.speech, weights.speech);
        let total = memory + reaction + pattern + language;

        Some(TrendPrediction {
            trend,
            confidence,
            reliability: if high_reliability {
                Reliability::High
            } else {
                Reliability::Medium
            },
            contributions: DomainContributions {
                memory: safe_div(memory, total),
                reaction: safe_div(reaction, total),
                pattern: safe_div(pattern, total),
                language: safe_div(language, total),
            },
            source: PredictionSource::Fallback,
            session_count: history.len(),
            probabilities: None,
        })
    }
}

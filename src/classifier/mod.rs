//! Sequence trend classification
//!
//! Every predictor answers through the `TrendPredictor` trait, so callers
//! never need to know whether the pretrained model or the statistical
//! fallback produced a prediction. `ResilientPredictor` chains the two.

pub mod fallback;
pub mod model;
pub mod window;

pub use fallback::{composite_score, StatisticalTrendPredictor};
pub use model::{CnnTrendModel, ModelTrendPredictor, ModelWeights};
pub use window::FeatureWindow;

use crate::config::ClassifierConfig;
use crate::types::ExtractedFeatures;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Predicted direction of the recent sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendClass {
    Stable,
    Declining,
    Improving,
}

impl TrendClass {
    /// Model output index (stable, declining, improving)
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(TrendClass::Stable),
            1 => Some(TrendClass::Declining),
            2 => Some(TrendClass::Improving),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendClass::Stable => "stable",
            TrendClass::Declining => "declining",
            TrendClass::Improving => "improving",
        }
    }
}

/// Qualitative confidence tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    High,
    Medium,
    Low,
}

/// Which predictor answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    Model,
    Fallback,
}

/// Share of the prediction attributed to each domain (sums to 1, or all 0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainContributions {
    pub memory: f64,
    pub reaction: f64,
    pub pattern: f64,
    pub language: f64,
}

impl DomainContributions {
    pub fn total(&self) -> f64 {
        self.memory + self.reaction + self.pattern + self.language
    }
}

/// Trend prediction, identical in shape for every predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPrediction {
    pub trend: TrendClass,
    /// Probability of the predicted class (0-1)
    pub confidence: f64,
    pub reliability: Reliability,
    pub contributions: DomainContributions,
    pub source: PredictionSource,
    /// Sessions available to the predictor
    pub session_count: usize,
    /// Class probabilities (stable, declining, improving), model only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<[f64; 3]>,
}

/// A trend predictor over a chronological feature history
pub trait TrendPredictor: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` means no prediction: too few sessions, or the predictor is
    /// unavailable
    fn predict(&self, history: &[ExtractedFeatures]) -> Option<TrendPrediction>;
}

/// Primary predictor with the statistical fallback behind it
pub struct ResilientPredictor {
    primary: Option<Box<dyn TrendPredictor>>,
    fallback: StatisticalTrendPredictor,
}

impl ResilientPredictor {
    /// Fallback only
    pub fn statistical(config: ClassifierConfig) -> Self {
        Self {
            primary: None,
            fallback: StatisticalTrendPredictor::new(config),
        }
    }

    /// Lazily loaded model from a weight file, with fallback
    pub fn with_model_path(path: impl Into<PathBuf>, config: ClassifierConfig) -> Self {
        Self {
            primary: Some(Box::new(ModelTrendPredictor::lazy(path, config.clone()))),
            fallback: StatisticalTrendPredictor::new(config),
        }
    }

    pub fn with_primary(primary: Box<dyn TrendPredictor>, config: ClassifierConfig) -> Self {
        Self {
            primary: Some(primary),
            fallback: StatisticalTrendPredictor::new(config),
        }
    }
}

impl Default for ResilientPredictor {
    fn default() -> Self {
        Self::statistical(ClassifierConfig::default())
    }
}

impl TrendPredictor for ResilientPredictor {
    fn name(&self) -> &'static str {
        "resilient"
    }

    fn predict(&self, history: &[ExtractedFeatures]) -> Option<TrendPrediction> {
        if let Some(primary) = &self.primary {
            if let Some(prediction) = primary.predict(history) {
                return Some(prediction);
            }
            debug!(predictor = primary.name(), "primary predictor declined");
        }
        self.fallback.predict(history)
    }
}

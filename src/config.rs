//! Analysis configuration
//!
//! Every threshold used by the pipeline is a named field here. The defaults are
//! the reference calibration; they are hand-tuned and expected to move as
//! longitudinal data accumulates.
//!
//! Minimum-data gates are contracts, so `validated()` raises any gate that was
//! configured below its contract floor.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};

/// Default number of onboarding sessions averaged into the baseline
pub const DEFAULT_BASELINE_SESSIONS: usize = 2;

/// Minimum prior sessions before anomaly detection runs
pub const MIN_ANOMALY_HISTORY: usize = 3;

/// Minimum total sessions before a trend prediction is produced
pub const MIN_PREDICTION_SESSIONS: usize = 3;

/// Sessions required for a high-reliability prediction
pub const HIGH_RELIABILITY_SESSIONS: usize = 5;

/// Most factor tags a risk verdict may carry
pub const MAX_TOP_FACTORS: usize = 3;

/// One day in milliseconds
pub const MS_PER_DAY: f64 = 86_400_000.0;

/// Top-level analysis configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub baseline: BaselineConfig,
    pub memory: MemoryConfig,
    pub trend: TrendConfig,
    pub anomaly: AnomalyConfig,
    pub classifier: ClassifierConfig,
    pub risk: RiskThresholds,
}

impl AnalysisConfig {
    /// Load configuration from JSON; missing sections and fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: AnalysisConfig =
            serde_json::from_str(json).map_err(|e| ComputeError::ConfigError(e.to_string()))?;
        config.validated()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check value sanity and lift gates to their contract floors
    pub fn validated(mut self) -> Result<Self, ComputeError> {
        self.baseline.sessions = self.baseline.sessions.max(1);
        self.anomaly.min_history = self.anomaly.min_history.max(MIN_ANOMALY_HISTORY);
        self.classifier.min_sessions = self.classifier.min_sessions.max(MIN_PREDICTION_SESSIONS);
        self.classifier.window_size = self.classifier.window_size.max(1);
        self.classifier.high_reliability_sessions = self
            .classifier
            .high_reliability_sessions
            .max(HIGH_RELIABILITY_SESSIONS);
        self.risk.max_factors = self.risk.max_factors.min(MAX_TOP_FACTORS);

        if self.anomaly.z_threshold <= 0.0 {
            return Err(ComputeError::ConfigError(
                "anomaly.z_threshold must be positive".to_string(),
            ));
        }
        if self.trend.time_unit_ms <= 0.0 {
            return Err(ComputeError::ConfigError(
                "trend.time_unit_ms must be positive".to_string(),
            ));
        }
        if self.memory.max_latency_ms <= 0.0 {
            return Err(ComputeError::ConfigError(
                "memory.max_latency_ms must be positive".to_string(),
            ));
        }
        if self.classifier.medium_confidence > self.classifier.high_confidence {
            return Err(ComputeError::ConfigError(
                "classifier.medium_confidence exceeds classifier.high_confidence".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Baseline builder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Leading sessions averaged into the baseline
    pub sessions: usize,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            sessions: DEFAULT_BASELINE_SESSIONS,
        }
    }
}

/// Memory extractor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Response latency that maps to a latency index of 1
    pub max_latency_ms: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_latency_ms: 45_000.0,
        }
    }
}

/// Trend estimator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Length of one elapsed-time unit in milliseconds (slopes are per unit)
    pub time_unit_ms: f64,
    /// Sensitivity of the overall direction indicator
    pub direction_scale: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            time_unit_ms: MS_PER_DAY,
            direction_scale: 1000.0,
        }
    }
}

/// Anomaly detector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// z-score above which a metric is flagged
    pub z_threshold: f64,
    /// Prior sessions required before detection runs
    pub min_history: usize,
    /// Optional cap on how many of the most recent prior sessions are used
    pub window: Option<usize>,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            z_threshold: 2.0,
            min_history: MIN_ANOMALY_HISTORY,
            window: None,
        }
    }
}

/// Composite-score weights for the statistical fallback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeWeights {
    pub memory: f64,
    pub reaction: f64,
    pub pattern: f64,
    pub speech: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            memory: 0.3,
            reaction: 0.3,
            pattern: 0.2,
            speech: 0.2,
        }
    }
}

/// Sequence trend classifier settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Sessions per model window
    pub window_size: usize,
    /// Sessions required before any prediction is produced
    pub min_sessions: usize,
    /// Sessions required for high reliability
    pub high_reliability_sessions: usize,
    /// Model confidence required for high reliability
    pub high_confidence: f64,
    /// Model confidence required for medium reliability
    pub medium_confidence: f64,
    /// Composite slope (points per session) separating stable from moving
    pub fallback_slope_threshold: f64,
    pub fallback_weights: CompositeWeights,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            window_size: 6,
            min_sessions: MIN_PREDICTION_SESSIONS,
            high_reliability_sessions: HIGH_RELIABILITY_SESSIONS,
            high_confidence: 0.8,
            medium_confidence: 0.6,
            fallback_slope_threshold: 1.5,
            fallback_weights: CompositeWeights::default(),
        }
    }
}

impl ClassifierConfig {
    /// Sessions needed for high reliability, never below the contract floor
    pub fn high_reliability_gate(&self) -> usize {
        self.high_reliability_sessions.max(HIGH_RELIABILITY_SESSIONS)
    }
}

/// Risk fusion thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// Memory accuracy delta below which a signal fires
    pub memory_delta: f64,
    /// Pattern score delta below which a signal fires
    pub pattern_delta: f64,
    /// Speech rate delta (wpm) below which a signal fires
    pub speech_delta: f64,
    /// Reaction delta (baseline - current, ms) below which a signal fires
    pub reaction_delta_ms: f64,
    /// Mean trend slope below which a signal fires
    pub trend_slope: f64,
    /// Reaction delta magnitude equal to one unit of signal strength
    pub reaction_strength_scale_ms: f64,
    /// Speech delta magnitude equal to one unit of signal strength
    pub speech_strength_scale_wpm: f64,
    /// Signals required for `change_detected`
    pub change_detected_signals: u32,
    /// Signals required for `possible_risk`
    pub possible_risk_signals: u32,
    /// Factor tags reported
    pub max_factors: usize,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            memory_delta: -0.1,
            pattern_delta: -0.1,
            speech_delta: -0.1,
            reaction_delta_ms: -50.0,
            trend_slope: -0.0005,
            reaction_strength_scale_ms: 100.0,
            speech_strength_scale_wpm: 100.0,
            change_detected_signals: 2,
            possible_risk_signals: 4,
            max_factors: MAX_TOP_FACTORS,
        }
    }
}

//! Core types for the cogflux pipeline
//!
//! This module defines the records that flow between pipeline stages: the fixed
//! cross-domain feature vector, timestamped session points, baselines, trend
//! slopes, anomaly output and the fused risk verdict.
//!
//! Field names serialize in camelCase; together they form the exchange schema
//! with storage and display collaborators.

use crate::error::ComputeError;
use crate::features::DomainFeatures;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

/// Tracked cross-domain metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    MemoryAccuracy,
    ReactionTimeAvg,
    ReactionTimeVariance,
    PatternScore,
    SpeechWpm,
    LexicalDiversity,
    FillerWordRatio,
    HesitationMarkers,
}

impl Metric {
    /// All metrics in feature-vector column order
    pub const ALL: [Metric; 8] = [
        Metric::MemoryAccuracy,
        Metric::ReactionTimeAvg,
        Metric::ReactionTimeVariance,
        Metric::PatternScore,
        Metric::SpeechWpm,
        Metric::LexicalDiversity,
        Metric::FillerWordRatio,
        Metric::HesitationMarkers,
    ];

    /// Metrics compared against personal history by the anomaly detector
    pub const ANOMALY: [Metric; 5] = [
        Metric::MemoryAccuracy,
        Metric::ReactionTimeAvg,
        Metric::PatternScore,
        Metric::SpeechWpm,
        Metric::LexicalDiversity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::MemoryAccuracy => "memory_accuracy",
            Metric::ReactionTimeAvg => "reaction_time_avg",
            Metric::ReactionTimeVariance => "reaction_time_variance",
            Metric::PatternScore => "pattern_score",
            Metric::SpeechWpm => "speech_wpm",
            Metric::LexicalDiversity => "lexical_diversity",
            Metric::FillerWordRatio => "filler_word_ratio",
            Metric::HesitationMarkers => "hesitation_markers",
        }
    }

    /// Human-readable name used in factor tags
    pub fn label(&self) -> &'static str {
        match self {
            Metric::MemoryAccuracy => "memory accuracy",
            Metric::ReactionTimeAvg => "reaction time avg",
            Metric::ReactionTimeVariance => "reaction time variance",
            Metric::PatternScore => "pattern score",
            Metric::SpeechWpm => "speech rate",
            Metric::LexicalDiversity => "lexical diversity",
            Metric::FillerWordRatio => "filler word ratio",
            Metric::HesitationMarkers => "hesitation markers",
        }
    }

    /// Whether larger values mean better performance
    pub fn higher_is_better(&self) -> bool {
        !matches!(
            self,
            Metric::ReactionTimeAvg
                | Metric::ReactionTimeVariance
                | Metric::FillerWordRatio
                | Metric::HesitationMarkers
        )
    }

    /// Cognitive domain the metric is measured in
    pub fn domain(&self) -> Domain {
        match self {
            Metric::MemoryAccuracy => Domain::Memory,
            Metric::ReactionTimeAvg | Metric::ReactionTimeVariance => Domain::Reaction,
            Metric::PatternScore => Domain::Pattern,
            Metric::SpeechWpm
            | Metric::LexicalDiversity
            | Metric::FillerWordRatio
            | Metric::HesitationMarkers => Domain::Language,
        }
    }
}

/// Task domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Reaction,
    Memory,
    Pattern,
    Language,
}

impl Domain {
    pub const ALL: [Domain; 4] = [
        Domain::Reaction,
        Domain::Memory,
        Domain::Pattern,
        Domain::Language,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Reaction => "reaction",
            Domain::Memory => "memory",
            Domain::Pattern => "pattern",
            Domain::Language => "language",
        }
    }
}

/// Fixed-shape cross-domain feature vector for one session
///
/// Ratio fields live in [0, 1]; times and counts are non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFeatures {
    /// Recall accuracy (0-1)
    pub memory_accuracy: f64,
    /// Mean valid-trial reaction latency (ms)
    pub reaction_time_avg: f64,
    /// Sample variance of valid-trial latencies (ms^2)
    pub reaction_time_variance: f64,
    /// Pattern round accuracy (0-1)
    pub pattern_score: f64,
    /// Words per minute
    #[serde(rename = "speechWPM")]
    pub speech_wpm: f64,
    /// Unique / total tokens (0-1)
    pub lexical_diversity: f64,
    /// Filler words / total tokens (0-1)
    pub filler_word_ratio: f64,
    /// Filler words, immediate repetitions and pauses
    pub hesitation_markers: f64,
}

impl ExtractedFeatures {
    /// Value of a single metric
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::MemoryAccuracy => self.memory_accuracy,
            Metric::ReactionTimeAvg => self.reaction_time_avg,
            Metric::ReactionTimeVariance => self.reaction_time_variance,
            Metric::PatternScore => self.pattern_score,
            Metric::SpeechWpm => self.speech_wpm,
            Metric::LexicalDiversity => self.lexical_diversity,
            Metric::FillerWordRatio => self.filler_word_ratio,
            Metric::HesitationMarkers => self.hesitation_markers,
        }
    }

    /// Columns in `Metric::ALL` order
    pub fn to_array(&self) -> [f64; 8] {
        Metric::ALL.map(|m| self.get(m))
    }

    /// Enforce the value-range invariants (NaN and infinities become 0)
    pub fn sanitized(self) -> Self {
        fn finite(v: f64) -> f64 {
            if v.is_finite() {
                v
            } else {
                0.0
            }
        }
        let ratio = |v: f64| finite(v).clamp(0.0, 1.0);
        let non_negative = |v: f64| finite(v).max(0.0);

        Self {
            memory_accuracy: ratio(self.memory_accuracy),
            reaction_time_avg: non_negative(self.reaction_time_avg),
            reaction_time_variance: non_negative(self.reaction_time_variance),
            pattern_score: ratio(self.pattern_score),
            speech_wpm: non_negative(self.speech_wpm),
            lexical_diversity: ratio(self.lexical_diversity),
            filler_word_ratio: ratio(self.filler_word_ratio),
            hesitation_markers: non_negative(self.hesitation_markers),
        }
    }
}

/// One session's features at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDataPoint {
    /// Storage identifier of the session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Session completion time (epoch milliseconds)
    pub timestamp: i64,
    pub features: ExtractedFeatures,
    /// Per-domain derived features, present when extracted from raw telemetry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domains: Option<DomainFeatures>,
}

impl SessionDataPoint {
    pub fn new(timestamp: i64, features: ExtractedFeatures) -> Self {
        Self {
            session_id: None,
            timestamp,
            features,
            domains: None,
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_domains(mut self, domains: DomainFeatures) -> Self {
        self.domains = Some(domains);
        self
    }

    /// Recall accuracy if the session included a memory task
    ///
    /// Points without domain detail fall back to the cross-domain vector.
    pub fn memory_accuracy(&self) -> Option<f64> {
        match &self.domains {
            Some(domains) => domains.memory.as_ref().map(|m| m.recall_accuracy),
            None => Some(self.features.memory_accuracy),
        }
    }

    fn sanitized(mut self) -> Self {
        self.features = self.features.sanitized();
        self
    }
}

/// Append-only session history, kept in chronological order
///
/// Storage order is never trusted: points are ordered by timestamp on every
/// insertion, ties keep insertion order. Feature values are clamped to their
/// ranges on the way in.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct SessionHistory {
    points: Vec<SessionDataPoint>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history from points in arbitrary order
    ///
    /// Points repeating an already-seen session id are dropped.
    pub fn from_points(points: Vec<SessionDataPoint>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(points.len());
        for point in points {
            if let Some(id) = &point.session_id {
                if !seen.insert(id.clone()) {
                    warn!(session_id = %id, "dropping duplicate session from history");
                    continue;
                }
            }
            kept.push(point.sanitized());
        }
        kept.sort_by_key(|p| p.timestamp);
        Self { points: kept }
    }

    /// Append a session, rejecting a repeated session id
    pub fn push(&mut self, point: SessionDataPoint) -> Result<(), ComputeError> {
        if let Some(id) = &point.session_id {
            if self
                .points
                .iter()
                .any(|p| p.session_id.as_deref() == Some(id.as_str()))
            {
                return Err(ComputeError::DuplicateSession(id.clone()));
            }
        }
        let idx = self.points.partition_point(|p| p.timestamp <= point.timestamp);
        self.points.insert(idx, point.sanitized());
        Ok(())
    }

    pub fn points(&self) -> &[SessionDataPoint] {
        &self.points
    }

    pub fn features(&self) -> Vec<ExtractedFeatures> {
        self.points.iter().map(|p| p.features).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&SessionDataPoint> {
        self.points.last()
    }

    /// Latest session and everything before it
    pub fn split_latest(&self) -> Option<(&SessionDataPoint, &[SessionDataPoint])> {
        self.points.split_last()
    }
}

impl<'de> Deserialize<'de> for SessionHistory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<SessionDataPoint>::deserialize(deserializer).map(Self::from_points)
    }
}

/// Personal reference vector from the first sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineVector {
    pub features: ExtractedFeatures,
    /// Number of sessions averaged (0 means the all-zero placeholder)
    pub session_count: u32,
}

impl BaselineVector {
    /// Whether the vector was built from at least one session
    pub fn is_established(&self) -> bool {
        self.session_count >= 1
    }
}

/// Current-vs-baseline change, positive means improvement
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaVector {
    pub memory_delta: f64,
    /// baseline - current (ms), so slower reactions are negative
    pub reaction_delta: f64,
    pub pattern_delta: f64,
    pub speech_delta: f64,
}

/// OLS slopes per tracked metric, positive means improvement
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSlopes {
    pub memory_trend_slope: f64,
    /// Fitted on negated reaction time
    pub reaction_trend_slope: f64,
    pub pattern_trend_slope: f64,
    pub speech_trend_slope: f64,
}

impl TrendSlopes {
    pub fn as_array(&self) -> [f64; 4] {
        [
            self.memory_trend_slope,
            self.reaction_trend_slope,
            self.pattern_trend_slope,
            self.speech_trend_slope,
        ]
    }

    pub fn mean(&self) -> f64 {
        self.as_array().iter().sum::<f64>() / 4.0
    }
}

/// Latest session compared to the personal distribution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyResult {
    pub is_anomaly: bool,
    /// 0-1
    pub anomaly_score: f64,
    /// Absolute z-score per compared metric
    pub deviations: BTreeMap<Metric, f64>,
}

impl AnomalyResult {
    /// Result used when there is not enough history
    pub fn none() -> Self {
        Self::default()
    }

    /// Metrics whose deviation is beyond the threshold, largest first
    pub fn flagged(&self, threshold: f64) -> Vec<(Metric, f64)> {
        let mut flagged: Vec<(Metric, f64)> = self
            .deviations
            .iter()
            .filter(|(_, d)| **d > threshold)
            .map(|(m, d)| (*m, *d))
            .collect();
        flagged.sort_by(|a, b| b.1.total_cmp(&a.1));
        flagged
    }
}

/// Three-level awareness classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Stable,
    ChangeDetected,
    PossibleRisk,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [
        RiskLevel::Stable,
        RiskLevel::ChangeDetected,
        RiskLevel::PossibleRisk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Stable => "stable",
            RiskLevel::ChangeDetected => "change_detected",
            RiskLevel::PossibleRisk => "possible_risk",
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Stable => "Stable",
            RiskLevel::ChangeDetected => "Change Detected",
            RiskLevel::PossibleRisk => "Notable Change",
        }
    }

    /// Fixed non-diagnostic display message
    pub fn message(&self) -> &'static str {
        match self {
            RiskLevel::Stable => {
                "Your recent results look consistent with your usual performance."
            }
            RiskLevel::ChangeDetected => {
                "Some recent results differ from your usual pattern. Everyday factors such as sleep, stress or distraction can cause this."
            }
            RiskLevel::PossibleRisk => {
                "Several recent results have shifted from your usual pattern. If this continues, consider talking it over with a healthcare professional."
            }
        }
    }
}

/// Fused, explainable verdict for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnalysis {
    pub risk_level: RiskLevel,
    /// 0-1
    pub risk_confidence_score: f64,
    pub anomaly_score: f64,
    pub explanation: String,
    /// At most three factor tags, most severe first
    pub top_factors: Vec<String>,
    /// Fixed message bound to `risk_level`
    pub message: String,
    /// Negative signals counted (0-6)
    pub signal_count: u32,
}

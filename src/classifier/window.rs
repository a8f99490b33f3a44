//! Fixed-length normalized feature windows
//!
//! Columns follow `Metric::ALL` order. Unbounded metrics are divided by a fixed
//! scale so every column is roughly unit range; ratios pass through.

use crate::config::ClassifierConfig;
use crate::types::{ExtractedFeatures, Metric};

/// Number of feature columns per window row
pub const FEATURE_COUNT: usize = 8;

/// Divisor applied to each column before inference
pub fn column_scale(metric: Metric) -> f64 {
    match metric {
        Metric::ReactionTimeAvg => 1000.0,
        Metric::ReactionTimeVariance => 10_000.0,
        Metric::SpeechWpm => 200.0,
        Metric::HesitationMarkers => 20.0,
        Metric::MemoryAccuracy
        | Metric::PatternScore
        | Metric::LexicalDiversity
        | Metric::FillerWordRatio => 1.0,
    }
}

/// Normalize one feature vector into a window row
pub fn normalize(features: &ExtractedFeatures) -> [f64; FEATURE_COUNT] {
    Metric::ALL.map(|m| features.get(m) / column_scale(m))
}

/// The most recent sessions, normalized and front-padded to the window size
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureWindow {
    rows: Vec<[f64; FEATURE_COUNT]>,
    /// Sessions available before padding
    sessions: usize,
}

impl FeatureWindow {
    /// Build the window from a chronological history
    ///
    /// Returns `None` below the configured minimum session count. Short
    /// histories are padded at the front by repeating the earliest session.
    pub fn build(history: &[ExtractedFeatures], config: &ClassifierConfig) -> Option<Self> {
        if history.len() < config.min_sessions || history.is_empty() {
            return None;
        }
        let size = config.window_size;
        let recent = &history[history.len().saturating_sub(size)..];

        let mut rows = Vec::with_capacity(size);
        let first = normalize(&recent[0]);
        for _ in recent.len()..size {
            rows.push(first);
        }
        rows.extend(recent.iter().map(normalize));

        Some(Self {
            rows,
            sessions: history.len(),
        })
    }

    pub fn rows(&self) -> &[[f64; FEATURE_COUNT]] {
        &self.rows
    }

    pub fn sessions(&self) -> usize {
        self.sessions
    }

    /// Copy of the window with the given columns replaced by their window mean
    pub fn occluded(&self, columns: &[usize]) -> Vec<[f64; FEATURE_COUNT]> {
        let mut rows = self.rows.clone();
        let n = rows.len() as f64;
        for &col in columns {
            let column_mean = self.rows.iter().map(|r| r[col]).sum::<f64>() / n;
            for row in rows.iter_mut() {
                row[col] = column_mean;
            }
        }
        rows
    }
}

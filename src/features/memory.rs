//! Verbal memory feature extraction
//!
//! Words are compared after trimming and lowercasing; repeated words in either
//! list count once.

use crate::config::MemoryConfig;
use crate::schema::MemoryMetrics;
use crate::stats::{mean, safe_div};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Features derived from one memory task attempt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryFeatures {
    /// correct / presented (0-1)
    pub recall_accuracy: f64,
    /// false recalls / recalled (0-1)
    pub intrusion_rate: f64,
    /// omissions / presented (0-1)
    pub forgetting_rate: f64,
    /// response latency relative to the latency ceiling (0-1)
    pub latency_index: f64,
    /// agreement of this accuracy with earlier sessions (0-1)
    pub recall_consistency: f64,
    /// distractor task score carried through (0-1)
    pub interference_score: f64,
    pub correct_count: u32,
    pub false_recall_count: u32,
    pub omission_count: u32,
}

/// Extractor for memory task telemetry
pub struct MemoryExtractor;

impl MemoryExtractor {
    /// Derive recall features
    ///
    /// `prior_accuracies` holds recall accuracy of earlier sessions; with none,
    /// consistency defaults to 1.0. A session with no presented words yields
    /// all-zero features.
    pub fn extract(
        metrics: &MemoryMetrics,
        prior_accuracies: &[f64],
        config: &MemoryConfig,
    ) -> MemoryFeatures {
        let presented = normalize_words(&metrics.presented_words);
        if presented.is_empty() {
            return MemoryFeatures::default();
        }
        let recalled = normalize_words(&metrics.recalled_words);

        let correct_count = recalled.intersection(&presented).count();
        let false_recall_count = recalled.len() - correct_count;
        let omission_count = presented.len() - correct_count;

        let presented_count = presented.len() as f64;
        let recall_accuracy = safe_div(correct_count as f64, presented_count).clamp(0.0, 1.0);

        MemoryFeatures {
            recall_accuracy,
            intrusion_rate: safe_div(false_recall_count as f64, recalled.len() as f64)
                .clamp(0.0, 1.0),
            forgetting_rate: safe_div(omission_count as f64, presented_count).clamp(0.0, 1.0),
            latency_index: safe_div(metrics.response_latency_ms, config.max_latency_ms)
                .clamp(0.0, 1.0),
            recall_consistency: compute_recall_consistency(recall_accuracy, prior_accuracies),
            interference_score: metrics.interference_score.unwrap_or(0.0).clamp(0.0, 1.0),
            correct_count: correct_count as u32,
            false_recall_count: false_recall_count as u32,
            omission_count: omission_count as u32,
        }
    }
}

fn normalize_words(words: &[String]) -> BTreeSet<String> {
    words
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// `max(0, 1 − 2·|accuracy − mean(prior)|)`, 1.0 without prior sessions
fn compute_recall_consistency(accuracy: f64, prior_accuracies: &[f64]) -> f64 {
    if prior_accuracies.is_empty() {
        return 1.0;
    }
    let deviation = accuracy - mean(prior_accuracies);
    (1.0 - 2.0 * deviation.abs()).max(0.0)
}

//! Spontaneous speech feature extraction
//!
//! The transcript is lowercased, punctuation is stripped and the remainder is
//! split on whitespace. Multi-word fillers are matched against the lowercased
//! transcript before punctuation is stripped, at word boundaries, and counted in
//! addition to single-token fillers.

use crate::schema::LanguageMetrics;
use crate::stats::safe_div;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Single-token filler lexicon
pub const FILLER_WORDS: &[&str] = &["um", "umm", "uh", "uhm", "er", "erm", "ah", "hmm", "like"];

/// Multi-word filler lexicon
pub const FILLER_PHRASES: &[&str] = &["you know", "i mean", "sort of", "kind of", "you see"];

/// Features derived from one speech task attempt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageFeatures {
    pub words_per_minute: f64,
    /// unique / total tokens (0-1)
    pub lexical_diversity: f64,
    /// filler occurrences / total tokens (0-1)
    pub filler_word_ratio: f64,
    /// (fillers + immediate repetitions) / total tokens (0-1)
    pub hesitation_index: f64,
    /// Fillers, immediate repetitions and reported pauses
    pub hesitation_markers: u32,
    /// 0-100
    pub fluency_index: f64,
    /// silent time / speaking time (0-1)
    pub pause_ratio: f64,
    pub word_count: u32,
    pub unique_words: u32,
    pub filler_count: u32,
    pub repetition_count: u32,
}

/// Extractor for speech task telemetry
pub struct LanguageExtractor;

impl LanguageExtractor {
    pub fn extract(metrics: &LanguageMetrics) -> LanguageFeatures {
        let tokens = tokenize(&metrics.transcript);
        let pause_count = metrics.pause_count.unwrap_or(0);
        let pause_ratio = safe_div(
            metrics.total_pause_ms.unwrap_or(0.0),
            metrics.duration_sec * 1000.0,
        )
        .clamp(0.0, 1.0);

        if tokens.is_empty() {
            return LanguageFeatures {
                hesitation_markers: pause_count,
                pause_ratio,
                ..Default::default()
            };
        }

        let total = tokens.len() as f64;
        let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
        let filler_count =
            count_single_fillers(&tokens) + count_filler_phrases(&metrics.transcript);
        let repetition_count = tokens.windows(2).filter(|w| w[0] == w[1]).count();

        let words_per_minute = safe_div(total, metrics.duration_sec / 60.0);
        let hesitation_index =
            safe_div((filler_count + repetition_count) as f64, total).clamp(0.0, 1.0);

        LanguageFeatures {
            words_per_minute,
            lexical_diversity: safe_div(unique.len() as f64, total).clamp(0.0, 1.0),
            filler_word_ratio: safe_div(filler_count as f64, total).clamp(0.0, 1.0),
            hesitation_index,
            hesitation_markers: (filler_count + repetition_count) as u32 + pause_count,
            fluency_index: compute_fluency_index(hesitation_index, words_per_minute),
            pause_ratio,
            word_count: tokens.len() as u32,
            unique_words: unique.len() as u32,
            filler_count: filler_count as u32,
            repetition_count: repetition_count as u32,
        }
    }
}

/// Lowercase, strip punctuation, split on whitespace
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn count_single_fillers(tokens: &[String]) -> usize {
    tokens
        .iter()
        .filter(|t| FILLER_WORDS.contains(&t.as_str()))
        .count()
}

/// Non-overlapping occurrences of each filler phrase in the lowercased text
fn count_filler_phrases(transcript: &str) -> usize {
    let lowered = transcript.to_lowercase();
    FILLER_PHRASES
        .iter()
        .map(|phrase| {
            lowered
                .match_indices(phrase)
                .filter(|(start, _)| {
                    let before = lowered[..*start].chars().next_back();
                    let after = lowered[start + phrase.len()..].chars().next();
                    !before.is_some_and(char::is_alphanumeric)
                        && !after.is_some_and(char::is_alphanumeric)
                })
                .count()
        })
        .sum()
}

/// `clamp(0, 100, 100 − 200·hesitation − max(0, 100 − wpm)·0.5)`
fn compute_fluency_index(hesitation_index: f64, words_per_minute: f64) -> f64 {
    let slow_penalty = (100.0 - words_per_minute).max(0.0) * 0.5;
    (100.0 - 200.0 * hesitation_index - slow_penalty).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(transcript: &str, duration_sec: f64) -> LanguageMetrics {
        LanguageMetrics {
            transcript: transcript.to_string(),
            duration_sec,
            ..Default::default()
        }
    }

    #[test]
    fn test_tokenize_strips_punctuation() {
        assert_eq!(
            tokenize("Hello, World!  It's   fine."),
            vec!["hello", "world", "its", "fine"]
        );
        assert!(tokenize("  ...  ").is_empty());
    }

    #[test]
    fn test_words_per_minute_and_diversity() {
        // 6 tokens in 3 seconds = 120 wpm, 5 unique
        let features = LanguageExtractor::extract(&metrics("The dog saw the red ball", 3.0));
        assert_eq!(features.word_count, 6);
        assert!((features.words_per_minute - 120.0).abs() < 1e-9);
        assert!((features.lexical_diversity - 5.0 / 6.0).abs() < 1e-9);
        assert_eq!(features.filler_count, 0);
        // no hesitation, wpm above 100
        assert_eq!(features.fluency_index, 100.0);
    }

    #[test]
    fn test_filler_words_and_phrases() {
        // fillers: um, like, "you know", "kind of" -> 4
        let features = LanguageExtractor::extract(&metrics(
            "Um I went, you know, to the like kind of shop",
            6.0,
        ));
        assert_eq!(features.word_count, 11);
        assert_eq!(features.filler_count, 4);
        assert!((features.filler_word_ratio - 4.0 / 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_filler_phrases_need_contiguous_words() {
        // "you, know" is split by punctuation; "mankind of" is not a phrase start
        let features =
            LanguageExtractor::extract(&metrics("You, know, mankind of old. I mean it", 6.0));
        assert_eq!(features.filler_count, 1);
    }

    #[test]
    fn test_repetitions_count_toward_hesitation() {
        let features = LanguageExtractor::extract(&LanguageMetrics {
            transcript: "I I went to to the park".to_string(),
            duration_sec: 4.0,
            pause_count: Some(2),
            total_pause_ms: Some(1000.0),
        });
        assert_eq!(features.repetition_count, 2);
        assert!((features.hesitation_index - 2.0 / 7.0).abs() < 1e-9);
        assert_eq!(features.hesitation_markers, 4);
        assert!((features.pause_ratio - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_fluency_penalizes_slow_speech() {
        // 10 wpm, no hesitation: 100 - 45
        let features = LanguageExtractor::extract(&metrics("one two", 12.0));
        assert!((features.words_per_minute - 10.0).abs() < 1e-9);
        assert!((features.fluency_index - 55.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_transcript_yields_zero() {
        let features = LanguageExtractor::extract(&metrics("", 0.0));
        assert_eq!(features, LanguageFeatures::default());
    }

    #[test]
    fn test_zero_duration_does_not_divide_by_zero() {
        let features = LanguageExtractor::extract(&metrics("some words here", 0.0));
        assert_eq!(features.words_per_minute, 0.0);
        assert!(features.fluency_index.is_finite());
        assert_eq!(features.pause_ratio, 0.0);
    }
}

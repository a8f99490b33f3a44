//! Display safety
//!
//! Everything rendered from the pipeline is awareness information, never a
//! medical statement. Any user-facing string is checked against a list of
//! forbidden stems before it leaves the crate.

use crate::error::ComputeError;

/// Stems that must not appear at the start of any word in user-facing text
pub const FORBIDDEN_TERMS: &[&str] = &[
    "alzheimer",
    "dementia",
    "parkinson",
    "mci",
    "disease",
    "disorder",
    "illness",
    "impairment",
    "diagnos",
    "prognos",
    "symptom",
    "patholog",
    "treat",
    "therap",
    "cure",
    "medication",
    "medicine",
    "prescri",
    "drug",
    "dose",
];

/// Forbidden stems found in `text`, in list order
pub fn find_forbidden_terms(text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    FORBIDDEN_TERMS
        .iter()
        .copied()
        .filter(|term| words.iter().any(|w| w.starts_with(term)))
        .collect()
}

/// Whether `text` is free of forbidden terms
pub fn is_message_safe(text: &str) -> bool {
    find_forbidden_terms(text).is_empty()
}

/// Fail with `UnsafeMessage` when `text` carries a forbidden term
pub fn ensure_safe(text: &str) -> Result<(), ComputeError> {
    let found = find_forbidden_terms(text);
    if found.is_empty() {
        Ok(())
    } else {
        Err(ComputeError::UnsafeMessage(format!(
            "forbidden terms: {}",
            found.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::FACTOR_TAGS;
    use crate::types::{Metric, RiskLevel};

    #[test]
    fn test_canonical_risk_text_is_safe() {
        for level in RiskLevel::ALL {
            assert!(is_message_safe(level.message()), "{:?} message", level);
            assert!(is_message_safe(level.label()), "{:?} label", level);
        }
    }

    #[test]
    fn test_factor_tags_are_safe() {
        for tag in FACTOR_TAGS {
            assert!(is_message_safe(tag), "{tag}");
        }
        for metric in Metric::ALL {
            assert!(is_message_safe(&format!("unusual {}", metric.label())));
        }
    }

    #[test]
    fn test_forbidden_terms_detected() {
        assert!(!is_message_safe("Signs of Dementia"));
        assert!(!is_message_safe("This may require treatment."));
        assert!(!is_message_safe("we cannot DIAGNOSE anything"));
        assert!(!is_message_safe("Alzheimer's"));
        assert_eq!(
            find_forbidden_terms("a disease needing medication"),
            vec!["disease", "medication"]
        );
    }

    #[test]
    fn test_terms_match_word_starts_only() {
        // "secure" contains "cure" but does not start with it
        assert!(is_message_safe("Your data is secure"));
        assert!(is_message_safe("No significant changes detected."));
    }

    #[test]
    fn test_ensure_safe() {
        assert!(ensure_safe("steady results").is_ok());
        assert!(matches!(
            ensure_safe("possible disorder"),
            Err(ComputeError::UnsafeMessage(_))
        ));
    }
}

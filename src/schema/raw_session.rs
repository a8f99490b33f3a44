//! cog.raw_session.v1 schema definition
//!
//! Raw telemetry handed over by the task runners once an attempt completes.
//! One assessment session may carry one record per task domain:
//! - Reaction: per-trial latencies with false-start / timeout / calibration flags
//! - Memory: presented and recalled word lists, recall latency, interference score
//! - Pattern: ordered round records from the sequence-memory grid
//! - Language: transcript of spontaneous speech with duration and pause statistics

use crate::types::Domain;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Current schema version
pub const SCHEMA_VERSION: &str = "cog.raw_session.v1";

/// One reaction trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionTrial {
    /// Stimulus-to-response latency (ms)
    pub latency_ms: f64,
    /// Response before the stimulus
    #[serde(default)]
    pub false_start: bool,
    /// No response within the trial window
    #[serde(default)]
    pub timed_out: bool,
    /// Warm-up round excluded from scoring
    #[serde(default)]
    pub calibration: bool,
}

impl ReactionTrial {
    pub fn new(latency_ms: f64) -> Self {
        Self {
            latency_ms,
            false_start: false,
            timed_out: false,
            calibration: false,
        }
    }

    /// Whether the trial contributes to latency statistics
    pub fn is_valid(&self) -> bool {
        !self.calibration && !self.false_start && !self.timed_out
    }
}

/// Reaction task telemetry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactionMetrics {
    #[serde(default)]
    pub trials: Vec<ReactionTrial>,
}

/// Verbal memory task telemetry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetrics {
    #[serde(default)]
    pub presented_words: Vec<String>,
    #[serde(default)]
    pub recalled_words: Vec<String>,
    /// Time from recall prompt to submission (ms)
    #[serde(default)]
    pub response_latency_ms: f64,
    /// Score on the distractor task between study and recall (0-1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interference_score: Option<f64>,
}

/// One round of the sequence-memory grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRound {
    pub level: u32,
    pub grid_size: u32,
    pub target_sequence: Vec<u32>,
    #[serde(default)]
    pub user_input: Vec<u32>,
    pub correct: bool,
    /// Latency of each tap in the round (ms)
    #[serde(default)]
    pub response_latencies_ms: Vec<f64>,
    /// Wall time to finish the round (ms); defaults to the sum of tap latencies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time_ms: Option<f64>,
}

impl PatternRound {
    pub fn sequence_length(&self) -> usize {
        self.target_sequence.len()
    }

    pub fn completion_time(&self) -> f64 {
        self.completion_time_ms
            .unwrap_or_else(|| self.response_latencies_ms.iter().sum())
    }
}

/// Pattern task telemetry
///
/// An assessment ends at its first failed round; rounds recorded after it are
/// not scored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternMetrics {
    #[serde(default)]
    pub rounds: Vec<PatternRound>,
}

/// Spontaneous speech task telemetry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageMetrics {
    #[serde(default)]
    pub transcript: String,
    /// Speaking time (seconds)
    #[serde(default)]
    pub duration_sec: f64,
    /// Silent pauses above the detector threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_count: Option<u32>,
    /// Total silent time (ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pause_ms: Option<f64>,
}

/// Raw metrics for one task attempt, tagged by domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", rename_all = "lowercase")]
pub enum RawSessionMetrics {
    Reaction(ReactionMetrics),
    Memory(MemoryMetrics),
    Pattern(PatternMetrics),
    Language(LanguageMetrics),
}

impl RawSessionMetrics {
    pub fn domain(&self) -> Domain {
        match self {
            RawSessionMetrics::Reaction(_) => Domain::Reaction,
            RawSessionMetrics::Memory(_) => Domain::Memory,
            RawSessionMetrics::Pattern(_) => Domain::Pattern,
            RawSessionMetrics::Language(_) => Domain::Language,
        }
    }

    /// Validate numeric fields of the record
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            RawSessionMetrics::Reaction(m) => {
                for trial in &m.trials {
                    check_non_negative("trials.latency_ms", trial.latency_ms)?;
                }
            }
            RawSessionMetrics::Memory(m) => {
                check_non_negative("response_latency_ms", m.response_latency_ms)?;
                if let Some(score) = m.interference_score {
                    check_non_negative("interference_score", score)?;
                }
            }
            RawSessionMetrics::Pattern(m) => {
                for round in &m.rounds {
                    for latency in &round.response_latencies_ms {
                        check_non_negative("rounds.response_latencies_ms", *latency)?;
                    }
                    if let Some(t) = round.completion_time_ms {
                        check_non_negative("rounds.completion_time_ms", t)?;
                    }
                }
            }
            RawSessionMetrics::Language(m) => {
                check_non_negative("duration_sec", m.duration_sec)?;
                if let Some(t) = m.total_pause_ms {
                    check_non_negative("total_pause_ms", t)?;
                }
            }
        }
        Ok(())
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue {
            field: field.to_string(),
        });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

/// One completed assessment: every task attempted in a sitting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSession {
    /// Schema version identifier
    pub schema_version: String,
    /// Unique session identifier
    pub session_id: String,
    /// Completion time (epoch milliseconds)
    pub timestamp: i64,
    /// Optional user identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Task records, at most one per domain
    #[serde(default)]
    pub tasks: Vec<RawSessionMetrics>,
}

impl AssessmentSession {
    /// Create an empty session with a generated id
    pub fn new(timestamp: i64) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            session_id: uuid::Uuid::new_v4().to_string(),
            timestamp,
            user_id: None,
            tasks: Vec::new(),
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_task(mut self, task: RawSessionMetrics) -> Self {
        self.tasks.push(task);
        self
    }

    /// Raw record for a domain, if the task was attempted
    pub fn task(&self, domain: Domain) -> Option<&RawSessionMetrics> {
        self.tasks.iter().find(|t| t.domain() == domain)
    }

    /// Validate the session schema
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }

        if self.session_id.trim().is_empty() {
            return Err(ValidationError::EmptySessionId);
        }

        let mut seen = HashSet::new();
        for task in &self.tasks {
            if !seen.insert(task.domain()) {
                return Err(ValidationError::DuplicateDomain {
                    session_id: self.session_id.clone(),
                    domain: task.domain().as_str().to_string(),
                });
            }
            task.validate()?;
        }

        Ok(())
    }
}

/// Validation errors for raw sessions
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Session id is empty")]
    EmptySessionId,

    #[error("Session {session_id} has more than one {domain} task")]
    DuplicateDomain { session_id: String, domain: String },

    #[error("Field {field} is negative: {value}")]
    NegativeValue { field: String, value: f64 },

    #[error("Field {field} is not a finite number")]
    NonFiniteValue { field: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_tagged_tasks() {
        let json = r#"{
            "schema_version": "cog.raw_session.v1",
            "session_id": "s-1",
            "timestamp": 1705312800000,
            "tasks": [
                { "domain": "reaction", "trials": [ { "latency_ms": 310.0 }, { "latency_ms": 0.0, "false_start": true } ] },
                { "domain": "memory", "presented_words": ["apple", "river"], "recalled_words": ["apple"], "response_latency_ms": 9000 },
                { "domain": "language", "transcript": "the cat sat", "duration_sec": 3.0 }
            ]
        }"#;

        let session: AssessmentSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.tasks.len(), 3);
        assert!(session.task(Domain::Reaction).is_some());
        assert!(session.task(Domain::Pattern).is_none());
        assert!(session.validate().is_ok());

        match session.task(Domain::Reaction) {
            Some(RawSessionMetrics::Reaction(m)) => {
                assert!(m.trials[0].is_valid());
                assert!(!m.trials[1].is_valid());
            }
            other => panic!("unexpected task: {other:?}"),
        }
    }

    #[test]
    fn test_serialize_includes_domain_tag() {
        let session = AssessmentSession::new(0)
            .with_session_id("s-2")
            .with_task(RawSessionMetrics::Language(LanguageMetrics {
                transcript: "hello".to_string(),
                duration_sec: 1.0,
                ..Default::default()
            }));
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains(r#""domain":"language""#));
        assert!(json.contains(SCHEMA_VERSION));
    }

    #[test]
    fn test_validation_rejects_wrong_version() {
        let mut session = AssessmentSession::new(0);
        session.schema_version = "cog.raw_session.v0".to_string();
        assert!(matches!(
            session.validate(),
            Err(ValidationError::InvalidSchemaVersion { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_duplicate_domain() {
        let session = AssessmentSession::new(0)
            .with_task(RawSessionMetrics::Reaction(ReactionMetrics::default()))
            .with_task(RawSessionMetrics::Reaction(ReactionMetrics::default()));
        assert!(matches!(
            session.validate(),
            Err(ValidationError::DuplicateDomain { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_negative_latency() {
        let session = AssessmentSession::new(0).with_task(RawSessionMetrics::Reaction(
            ReactionMetrics {
                trials: vec![ReactionTrial::new(-20.0)],
            },
        ));
        assert!(matches!(
            session.validate(),
            Err(ValidationError::NegativeValue { .. })
        ));
    }

    #[test]
    fn test_completion_time_defaults_to_latency_sum() {
        let round = PatternRound {
            level: 1,
            grid_size: 3,
            target_sequence: vec![0, 4, 8],
            user_input: vec![0, 4, 8],
            correct: true,
            response_latencies_ms: vec![400.0, 350.0, 300.0],
            completion_time_ms: None,
        };
        assert_eq!(round.completion_time(), 1050.0);
        assert_eq!(round.sequence_length(), 3);
    }
}

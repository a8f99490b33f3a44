//! Adapter for converting cog.raw_session.v1 sessions to SessionDataPoints
//!
//! Sessions are ordered by timestamp before extraction so that recall
//! consistency only ever looks at earlier sessions.

use crate::config::MemoryConfig;
use crate::error::ComputeError;
use crate::features::{DomainFeatures, FeatureAssembler};
use crate::schema::raw_session::*;
use crate::types::SessionDataPoint;
use std::collections::HashSet;
use tracing::debug;

/// Adapter for converting raw sessions to feature vectors
pub struct SessionAdapter;

impl SessionAdapter {
    /// Parse a JSON string containing an array of AssessmentSessions
    pub fn parse_array(json: &str) -> Result<Vec<AssessmentSession>, ComputeError> {
        let sessions: Vec<AssessmentSession> = serde_json::from_str(json)?;
        Ok(sessions)
    }

    /// Parse NDJSON (newline-delimited JSON) containing AssessmentSessions
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<AssessmentSession>, ComputeError> {
        let mut sessions = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<AssessmentSession>(trimmed) {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    return Err(ComputeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(sessions)
    }

    /// Extract per-domain features for every session, in chronological order
    pub fn to_domain_features(
        sessions: &[AssessmentSession],
        config: &MemoryConfig,
    ) -> Result<Vec<(AssessmentSession, DomainFeatures)>, ComputeError> {
        Self::to_domain_features_with_history(sessions, &[], config)
    }

    /// Extract per-domain features for sessions that follow an existing history
    ///
    /// Recall consistency for each session draws on every earlier memory
    /// result, whether it sits in `history` or earlier in this batch, so
    /// ingesting sessions one at a time scores them the same as one batch.
    pub fn to_domain_features_with_history(
        sessions: &[AssessmentSession],
        history: &[SessionDataPoint],
        config: &MemoryConfig,
    ) -> Result<Vec<(AssessmentSession, DomainFeatures)>, ComputeError> {
        let mut seen = HashSet::new();
        for session in sessions {
            session.validate()?;
            if !seen.insert(session.session_id.as_str()) {
                return Err(ComputeError::DuplicateSession(session.session_id.clone()));
            }
        }

        let mut ordered: Vec<&AssessmentSession> = sessions.iter().collect();
        ordered.sort_by_key(|s| s.timestamp);

        let held: Vec<(i64, f64)> = history
            .iter()
            .filter_map(|p| p.memory_accuracy().map(|a| (p.timestamp, a)))
            .collect();
        let mut batch_accuracies: Vec<f64> = Vec::new();
        let mut extracted = Vec::with_capacity(ordered.len());

        for session in ordered {
            let mut prior_accuracies: Vec<f64> = held
                .iter()
                .filter(|(ts, _)| *ts < session.timestamp)
                .map(|(_, a)| *a)
                .collect();
            prior_accuracies.extend_from_slice(&batch_accuracies);

            let domains = DomainFeatures::extract(session, &prior_accuracies, config);
            if let Some(memory) = &domains.memory {
                batch_accuracies.push(memory.recall_accuracy);
            }
            debug!(
                session_id = %session.session_id,
                tasks = session.tasks.len(),
                prior_memory = prior_accuracies.len(),
                "extracted session features"
            );
            extracted.push((session.clone(), domains));
        }

        Ok(extracted)
    }

    /// Convert raw sessions into chronologically ordered data points
    pub fn to_data_points(
        sessions: &[AssessmentSession],
        config: &MemoryConfig,
    ) -> Result<Vec<SessionDataPoint>, ComputeError> {
        Self::to_data_points_with_history(sessions, &[], config)
    }

    /// Convert raw sessions that follow an existing history into data points
    pub fn to_data_points_with_history(
        sessions: &[AssessmentSession],
        history: &[SessionDataPoint],
        config: &MemoryConfig,
    ) -> Result<Vec<SessionDataPoint>, ComputeError> {
        Ok(Self::to_domain_features_with_history(sessions, history, config)?
            .into_iter()
            .map(|(session, domains)| {
                SessionDataPoint::new(session.timestamp, FeatureAssembler::assemble(&domains))
                    .with_session_id(session.session_id)
                    .with_domains(domains)
            })
            .collect())
    }

    /// Validate a batch of sessions
    pub fn validate_sessions(sessions: &[AssessmentSession]) -> Vec<ValidationResult> {
        sessions
            .iter()
            .enumerate()
            .map(|(idx, session)| ValidationResult {
                index: idx,
                session_id: Some(session.session_id.clone()),
                result: session.validate().err(),
            })
            .filter(|r| r.result.is_some())
            .collect()
    }
}

/// Result of session validation
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub session_id: Option<String>,
    pub result: Option<ValidationError>,
}

//! Report encoding
//!
//! Turns a `SessionAnalysis` into the `AnalysisReport` payload consumed by
//! display layers. Every user-facing string is checked against the safety list
//! before it is encoded.

use crate::classifier::TrendPrediction;
use crate::error::ComputeError;
use crate::features::DomainFeatures;
use crate::pipeline::SessionAnalysis;
use crate::safety::ensure_safe;
use crate::types::{AnomalyResult, DeltaVector, ExtractedFeatures, RiskLevel, TrendSlopes};
use crate::{COGFLUX_VERSION, PRODUCER_NAME};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Shown when the classifier produced nothing
pub const NO_PREDICTION_MESSAGE: &str = "No prediction available yet";

/// Top-level report payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub provenance: ReportProvenance,
    pub risk: ReportRisk,
    pub trend: ReportTrend,
    pub delta: DeltaVector,
    pub anomaly: AnomalyResult,
    pub prediction: ReportPrediction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_features: Option<ExtractedFeatures>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_domains: Option<DomainFeatures>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProvenance {
    pub computed_at_utc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_session_at_utc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_session_id: Option<String>,
    pub session_count: usize,
    pub baseline_sessions: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRisk {
    pub level: RiskLevel,
    pub label: String,
    pub confidence: f64,
    pub anomaly_score: f64,
    pub explanation: String,
    pub top_factors: Vec<String>,
    pub message: String,
    pub signal_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportTrend {
    pub slopes: TrendSlopes,
    /// -1 (declining) to 1 (improving)
    pub overall_direction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportPrediction {
    pub available: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TrendPrediction>,
}

/// Report encoder carrying a per-instance id
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Build the report, failing if any display string is unsafe
    pub fn encode(&self, analysis: &SessionAnalysis) -> Result<AnalysisReport, ComputeError> {
        let risk = &analysis.risk;
        let label = risk.risk_level.label().to_string();

        ensure_safe(&label)?;
        ensure_safe(&risk.message)?;
        ensure_safe(&risk.explanation)?;
        for factor in &risk.top_factors {
            ensure_safe(factor)?;
        }

        let prediction = match &analysis.prediction {
            Some(p) => ReportPrediction {
                available: true,
                message: format!("Recent trend: {}", p.trend.as_str()),
                result: Some(p.clone()),
            },
            None => ReportPrediction {
                available: false,
                message: NO_PREDICTION_MESSAGE.to_string(),
                result: None,
            },
        };
        ensure_safe(&prediction.message)?;

        let latest = analysis.latest.as_ref();
        let latest_session_at_utc = match latest {
            Some(point) => Some(
                DateTime::from_timestamp_millis(point.timestamp)
                    .ok_or_else(|| {
                        ComputeError::EncodingError(format!(
                            "timestamp out of range: {}",
                            point.timestamp
                        ))
                    })?
                    .to_rfc3339(),
            ),
            None => None,
        };

        Ok(AnalysisReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: COGFLUX_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            provenance: ReportProvenance {
                computed_at_utc: Utc::now().to_rfc3339(),
                latest_session_at_utc,
                latest_session_id: latest.and_then(|p| p.session_id.clone()),
                session_count: analysis.session_count,
                baseline_sessions: analysis.baseline.session_count,
            },
            risk: ReportRisk {
                level: risk.risk_level,
                label,
                confidence: risk.risk_confidence_score,
                anomaly_score: risk.anomaly_score,
                explanation: risk.explanation.clone(),
                top_factors: risk.top_factors.clone(),
                message: risk.message.clone(),
                signal_count: risk.signal_count,
            },
            trend: ReportTrend {
                slopes: analysis.slopes,
                overall_direction: analysis.overall_direction,
            },
            delta: analysis.delta,
            anomaly: analysis.anomaly.clone(),
            prediction,
            latest_features: latest.map(|p| p.features),
            latest_domains: latest.and_then(|p| p.domains.clone()),
        })
    }

    pub fn encode_to_json(&self, analysis: &SessionAnalysis) -> Result<String, ComputeError> {
        let report = self.encode(analysis)?;
        serde_json::to_string_pretty(&report).map_err(ComputeError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ResilientPredictor;
    use crate::config::AnalysisConfig;
    use crate::pipeline::analyze_history;
    use crate::types::{SessionDataPoint, SessionHistory};

    fn history(n: usize) -> SessionHistory {
        let points = (0..n)
            .map(|i| {
                SessionDataPoint::new(
                    1_700_000_000_000 + i as i64 * 86_400_000,
                    ExtractedFeatures {
                        memory_accuracy: 0.8,
                        reaction_time_avg: 300.0,
                        pattern_score: 0.9,
                        speech_wpm: 140.0,
                        ..Default::default()
                    },
                )
                .with_session_id(format!("s{i}"))
            })
            .collect();
        SessionHistory::from_points(points)
    }

    fn analysis(n: usize) -> SessionAnalysis {
        analyze_history(
            &history(n),
            &AnalysisConfig::default(),
            &ResilientPredictor::default(),
        )
    }

    #[test]
    fn test_report_metadata() {
        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let report = encoder.encode(&analysis(4)).unwrap();

        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.producer.name, "cogflux");
        assert_eq!(report.producer.instance_id, "test-instance");
        assert_eq!(report.provenance.session_count, 4);
        assert_eq!(report.provenance.baseline_sessions, 2);
        assert_eq!(report.provenance.latest_session_id.as_deref(), Some("s3"));
        assert!(report
            .provenance
            .latest_session_at_utc
            .as_deref()
            .unwrap()
            .starts_with("2023-11-17"));
        assert!(DateTime::parse_from_rfc3339(&report.provenance.computed_at_utc).is_ok());
    }

    #[test]
    fn test_prediction_unavailable_message() {
        let report = ReportEncoder::new().encode(&analysis(2)).unwrap();
        assert!(!report.prediction.available);
        assert_eq!(report.prediction.message, NO_PREDICTION_MESSAGE);
        assert!(report.prediction.result.is_none());
    }

    #[test]
    fn test_prediction_available() {
        let report = ReportEncoder::new().encode(&analysis(5)).unwrap();
        assert!(report.prediction.available);
        assert_eq!(report.prediction.message, "Recent trend: stable");
    }

    #[test]
    fn test_unsafe_explanation_rejected() {
        let mut analysis = analysis(3);
        analysis.risk.explanation = "Signs of a disorder".to_string();
        let result = ReportEncoder::new().encode(&analysis);
        assert!(matches!(result, Err(ComputeError::UnsafeMessage(_))));
    }

    #[test]
    fn test_json_shape() {
        let json = ReportEncoder::new().encode_to_json(&analysis(3)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["risk"]["level"], "stable");
        assert_eq!(value["risk"]["label"], "Stable");
        assert!(value["trend"]["slopes"]["memoryTrendSlope"].is_number());
        assert!(value["latest_features"]["speechWPM"].is_number());
    }

    #[test]
    fn test_empty_history_report() {
        let report = ReportEncoder::new().encode(&analysis(0)).unwrap();
        assert_eq!(report.provenance.session_count, 0);
        assert!(report.provenance.latest_session_at_utc.is_none());
        assert!(report.latest_features.is_none());
        assert!(report.latest_domains.is_none());
        assert_eq!(report.risk.level, RiskLevel::Stable);
    }
}

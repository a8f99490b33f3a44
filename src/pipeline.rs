//! Pipeline orchestration
//!
//! This module provides the public API for cogflux. It runs a session history
//! through every stage and encodes the result as an `AnalysisReport`.

use crate::anomaly::AnomalyDetector;
use crate::baseline::BaselineBuilder;
use crate::classifier::{ResilientPredictor, TrendPrediction, TrendPredictor};
use crate::config::AnalysisConfig;
use crate::encoder::ReportEncoder;
use crate::error::ComputeError;
use crate::risk::{compute_delta, RiskFusionEngine};
use crate::schema::SessionAdapter;
use crate::trend::TrendEstimator;
use crate::types::{
    AnomalyResult, BaselineVector, DeltaVector, RiskAnalysis, SessionDataPoint, SessionHistory,
    TrendSlopes,
};
use std::path::PathBuf;
use tracing::debug;

/// Output of every stage for the latest session of a history
#[derive(Debug, Clone)]
pub struct SessionAnalysis {
    pub session_count: usize,
    /// Latest session, `None` for an empty history
    pub latest: Option<SessionDataPoint>,
    pub baseline: BaselineVector,
    pub delta: DeltaVector,
    pub slopes: TrendSlopes,
    pub overall_direction: f64,
    pub anomaly: AnomalyResult,
    pub risk: RiskAnalysis,
    pub prediction: Option<TrendPrediction>,
}

/// Run the full pipeline over a history.
///
/// Pipeline stages:
/// 1. BaselineBuilder - Mean of the first sessions
/// 2. TrendEstimator - Slopes over every session
/// 3. AnomalyDetector - Latest session against all earlier ones
/// 4. RiskFusionEngine - Latest session against the baseline
/// 5. TrendPredictor - Sequence classification over the recent window
///
/// Too little history is never an error; each stage answers with its
/// neutral result.
pub fn analyze_history(
    history: &SessionHistory,
    config: &AnalysisConfig,
    predictor: &dyn TrendPredictor,
) -> SessionAnalysis {
    let features = history.features();

    let baseline = BaselineBuilder::new(config.baseline.sessions).build(&features);

    let trend = TrendEstimator::new(config.trend.clone());
    let slopes = trend.estimate(history.points());
    let overall_direction = trend.overall_direction(&slopes);

    let (current, prior) = match features.split_last() {
        Some((current, prior)) => (*current, prior),
        None => (Default::default(), &[][..]),
    };

    let anomaly = AnomalyDetector::new(config.anomaly.clone()).detect(&current, prior);

    let delta = if baseline.is_established() {
        compute_delta(&current, &baseline)
    } else {
        DeltaVector::default()
    };
    let risk = RiskFusionEngine::new(config.risk.clone(), config.anomaly.z_threshold)
        .fuse(&current, &baseline, &slopes, &anomaly);

    let prediction = predictor.predict(&features);

    debug!(
        sessions = history.len(),
        level = risk.risk_level.as_str(),
        predicted = prediction.is_some(),
        "history analyzed"
    );

    SessionAnalysis {
        session_count: history.len(),
        latest: history.latest().cloned(),
        baseline,
        delta,
        slopes,
        overall_direction,
        anomaly,
        risk,
        prediction,
    }
}

/// Convert a JSON array of raw sessions into a JSON array of data points.
///
/// # Example
/// ```ignore
/// let points_json = sessions_to_data_points(raw_sessions_json)?;
/// ```
pub fn sessions_to_data_points(raw_json: String) -> Result<String, ComputeError> {
    let sessions = SessionAdapter::parse_array(&raw_json)?;
    let points = SessionAdapter::to_data_points(&sessions, &AnalysisConfig::default().memory)?;
    serde_json::to_string_pretty(&points).map_err(ComputeError::JsonError)
}

/// Analyze a JSON array of data points with default settings and the
/// statistical predictor, returning the report JSON.
pub fn history_to_report(history_json: String) -> Result<String, ComputeError> {
    CognitiveProcessor::new().report_for_json(&history_json)
}

/// Extract and analyze a JSON array of raw sessions in one step.
pub fn sessions_to_report(raw_json: String) -> Result<String, ComputeError> {
    let mut processor = CognitiveProcessor::new();
    processor.ingest_sessions_json(&raw_json)?;
    processor.report()
}

/// Processor holding configuration, predictor and a growing history.
///
/// Use this when the history is kept across calls.
pub struct CognitiveProcessor {
    config: AnalysisConfig,
    predictor: ResilientPredictor,
    encoder: ReportEncoder,
    history: SessionHistory,
}

impl Default for CognitiveProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl CognitiveProcessor {
    /// Create a processor with default settings and the statistical predictor
    pub fn new() -> Self {
        Self::with_config(AnalysisConfig::default())
    }

    pub fn with_config(config: AnalysisConfig) -> Self {
        Self {
            predictor: ResilientPredictor::statistical(config.classifier.clone()),
            config,
            encoder: ReportEncoder::new(),
            history: SessionHistory::new(),
        }
    }

    /// Use the trend model at `path`, loaded on first prediction
    pub fn with_model(mut self, path: impl Into<PathBuf>) -> Self {
        self.predictor =
            ResilientPredictor::with_model_path(path, self.config.classifier.clone());
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    /// Replace the history with one loaded from a JSON array of data points
    pub fn load_history(&mut self, json: &str) -> Result<(), ComputeError> {
        let points: Vec<SessionDataPoint> =
            serde_json::from_str(json).map_err(|e| ComputeError::ParseError(e.to_string()))?;
        self.history = SessionHistory::from_points(points);
        Ok(())
    }

    /// Save the history as a JSON array of data points
    pub fn save_history(&self) -> Result<String, ComputeError> {
        serde_json::to_string(&self.history)
            .map_err(|e| ComputeError::EncodingError(e.to_string()))
    }

    /// Append one data point
    pub fn push(&mut self, point: SessionDataPoint) -> Result<(), ComputeError> {
        self.history.push(point)
    }

    /// Extract raw sessions and append them, returning how many were added
    ///
    /// The batch is rejected as a whole if any session repeats an id already
    /// in the history.
    pub fn ingest_sessions_json(&mut self, raw_json: &str) -> Result<usize, ComputeError> {
        let sessions = SessionAdapter::parse_array(raw_json)?;
        let points = SessionAdapter::to_data_points_with_history(
            &sessions,
            self.history.points(),
            &self.config.memory,
        )?;

        let mut updated = self.history.clone();
        for point in &points {
            updated.push(point.clone())?;
        }
        self.history = updated;
        Ok(points.len())
    }

    /// Run every stage over the current history
    pub fn analyze(&self) -> SessionAnalysis {
        analyze_history(&self.history, &self.config, &self.predictor)
    }

    /// Report JSON for the current history
    pub fn report(&self) -> Result<String, ComputeError> {
        self.encoder.encode_to_json(&self.analyze())
    }

    /// Report JSON for a history supplied as a JSON array of data points,
    /// leaving the held history untouched
    pub fn report_for_json(&self, history_json: &str) -> Result<String, ComputeError> {
        let points: Vec<SessionDataPoint> = serde_json::from_str(history_json)?;
        let history = SessionHistory::from_points(points);
        let analysis = analyze_history(&history, &self.config, &self.predictor);
        self.encoder.encode_to_json(&analysis)
    }
}

//! cogflux - On-device analysis engine for longitudinal cognitive-performance signals
//!
//! cogflux turns raw assessment-task telemetry into per-session feature
//! vectors and runs a session history through a deterministic pipeline:
//! feature extraction → baseline → trend → anomaly → risk fusion, with a
//! sequence trend classifier alongside.
//!
//! Everything it produces is awareness information. Risk levels are fixed,
//! non-diagnostic categories and every display string passes the safety check
//! in [`safety`].

pub mod anomaly;
pub mod baseline;
pub mod classifier;
pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod risk;
pub mod safety;
pub mod schema;
pub mod stats;
pub mod trend;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use anomaly::AnomalyDetector;
pub use baseline::BaselineBuilder;
pub use classifier::{
    ResilientPredictor, StatisticalTrendPredictor, TrendClass, TrendPrediction, TrendPredictor,
};
pub use config::AnalysisConfig;
pub use encoder::{AnalysisReport, ReportEncoder};
pub use error::ComputeError;
pub use pipeline::{
    analyze_history, history_to_report, sessions_to_data_points, sessions_to_report,
    CognitiveProcessor, SessionAnalysis,
};
pub use risk::{compute_delta, RiskFusionEngine};
pub use safety::is_message_safe;
pub use trend::TrendEstimator;
pub use types::{
    AnomalyResult, BaselineVector, DeltaVector, ExtractedFeatures, RiskAnalysis, RiskLevel,
    SessionDataPoint, SessionHistory, TrendSlopes,
};

// Schema exports
pub use schema::{AssessmentSession, RawSessionMetrics, SessionAdapter, SCHEMA_VERSION};

/// cogflux version embedded in every report
pub const COGFLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "cogflux";

//! Pretrained sequence classifier
//!
//! A small 1-D CNN evaluated in plain Rust from a JSON weight export:
//!
//! ```text
//! input [T, 8]
//!   -> Conv1D(k=3, same) + ReLU -> BatchNorm
//!   -> Conv1D(k=3, same) + ReLU -> GlobalAveragePool
//!   -> Dense + ReLU -> Dense(3) + softmax
//! ```
//!
//! Kernels use the Keras layouts (`[tap][in][out]` for convolutions and
//! `[in][out]` for dense layers). Output classes are stable, declining and
//! improving in that order. Dropout is inactive at inference and has no
//! weights.

use super::window::{FeatureWindow, FEATURE_COUNT};
use super::{
    DomainContributions, PredictionSource, Reliability, TrendClass, TrendPrediction,
    TrendPredictor,
};
use crate::config::ClassifierConfig;
use crate::error::ComputeError;
use crate::stats::safe_div;
use crate::types::{Domain, ExtractedFeatures, Metric};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Convolution taps
pub const KERNEL_SIZE: usize = 3;

/// Output classes
pub const CLASS_COUNT: usize = 3;

/// Conv1D weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvLayer {
    /// `[tap][in][out]`
    pub kernel: Vec<Vec<Vec<f64>>>,
    pub bias: Vec<f64>,
}

/// Batch normalization statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchNormLayer {
    pub gamma: Vec<f64>,
    pub beta: Vec<f64>,
    pub moving_mean: Vec<f64>,
    pub moving_variance: Vec<f64>,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

fn default_epsilon() -> f64 {
    0.001
}

/// Dense weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    /// `[in][out]`
    pub kernel: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

/// Full weight export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelWeights {
    pub conv1: ConvLayer,
    pub batch_norm: BatchNormLayer,
    pub conv2: ConvLayer,
    pub dense1: DenseLayer,
    pub dense2: DenseLayer,
}

/// Shape-checked CNN ready for inference
#[derive(Debug, Clone)]
pub struct CnnTrendModel {
    weights: ModelWeights,
}

impl CnnTrendModel {
    /// Wrap weights after checking that the layer shapes chain together
    pub fn from_weights(weights: ModelWeights) -> Result<Self, ComputeError> {
        let conv1_out = check_conv("conv1", &weights.conv1, FEATURE_COUNT)?;

        let bn = &weights.batch_norm;
        for (name, len) in [
            ("gamma", bn.gamma.len()),
            ("beta", bn.beta.len()),
            ("moving_mean", bn.moving_mean.len()),
            ("moving_variance", bn.moving_variance.len()),
        ] {
            if len != conv1_out {
                return Err(ComputeError::ModelShape(format!(
                    "batch_norm.{name}: expected {conv1_out} values, got {len}"
                )));
            }
        }

        let conv2_out = check_conv("conv2", &weights.conv2, conv1_out)?;
        let dense1_out = check_dense("dense1", &weights.dense1, conv2_out)?;
        let classes = check_dense("dense2", &weights.dense2, dense1_out)?;
        if classes != CLASS_COUNT {
            return Err(ComputeError::ModelShape(format!(
                "dense2: expected {CLASS_COUNT} outputs, got {classes}"
            )));
        }

        Ok(Self { weights })
    }

    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let weights: ModelWeights =
            serde_json::from_str(json).map_err(|e| ComputeError::ModelLoad(e.to_string()))?;
        Self::from_weights(weights)
    }

    pub fn from_file(path: &Path) -> Result<Self, ComputeError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ComputeError::ModelLoad(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn weights(&self) -> &ModelWeights {
        &self.weights
    }

    /// Class probabilities for a window of normalized rows
    pub fn forward(&self, rows: &[[f64; FEATURE_COUNT]]) -> [f64; CLASS_COUNT] {
        let w = &self.weights;
        let input: Vec<Vec<f64>> = rows.iter().map(|r| r.to_vec()).collect();

        let mut hidden = conv1d_same(&input, &w.conv1);
        relu_all(&mut hidden);
        batch_norm(&mut hidden, &w.batch_norm);

        let mut hidden = conv1d_same(&hidden, &w.conv2);
        relu_all(&mut hidden);
        let pooled = global_average_pool(&hidden, w.conv2.bias.len());

        let mut features = dense(&pooled, &w.dense1);
        for v in features.iter_mut() {
            *v = v.max(0.0);
        }
        let logits = dense_layer_logits(&features, &w.dense2);
        softmax(&logits)
    }
}

fn check_conv(name: &str, layer: &ConvLayer, inputs: usize) -> Result<usize, ComputeError> {
    if layer.kernel.len() != KERNEL_SIZE {
        return Err(ComputeError::ModelShape(format!(
            "{name}: expected {KERNEL_SIZE} taps, got {}",
            layer.kernel.len()
        )));
    }
    let outputs = layer.bias.len();
    for tap in &layer.kernel {
        if tap.len() != inputs || tap.iter().any(|row| row.len() != outputs) {
            return Err(ComputeError::ModelShape(format!(
                "{name}: kernel must be [{KERNEL_SIZE}][{inputs}][{outputs}]"
            )));
        }
    }
    Ok(outputs)
}

fn check_dense(name: &str, layer: &DenseLayer, inputs: usize) -> Result<usize, ComputeError> {
    let outputs = layer.bias.len();
    if layer.kernel.len() != inputs || layer.kernel.iter().any(|row| row.len() != outputs) {
        return Err(ComputeError::ModelShape(format!(
            "{name}: kernel must be [{inputs}][{outputs}]"
        )));
    }
    Ok(outputs)
}

/// Zero-padded convolution keeping the sequence length
fn conv1d_same(input: &[Vec<f64>], layer: &ConvLayer) -> Vec<Vec<f64>> {
    let len = input.len() as isize;
    let half = (KERNEL_SIZE / 2) as isize;
    (0..len)
        .map(|t| {
            let mut out = layer.bias.clone();
            for (tap, weights) in layer.kernel.iter().enumerate() {
                let src = t + tap as isize - half;
                if src < 0 || src >= len {
                    continue;
                }
                for (x, row) in input[src as usize].iter().zip(weights) {
                    for (o, w) in out.iter_mut().zip(row) {
                        *o += x * w;
                    }
                }
            }
            out
        })
        .collect()
}

fn relu_all(values: &mut [Vec<f64>]) {
    for row in values.iter_mut() {
        for v in row.iter_mut() {
            *v = v.max(0.0);
        }
    }
}

fn batch_norm(values: &mut [Vec<f64>], bn: &BatchNormLayer) {
    for row in values.iter_mut() {
        for (c, v) in row.iter_mut().enumerate() {
            let scale = bn.gamma[c] / (bn.moving_variance[c] + bn.epsilon).sqrt();
            *v = (*v - bn.moving_mean[c]) * scale + bn.beta[c];
        }
    }
}

fn global_average_pool(values: &[Vec<f64>], channels: usize) -> Vec<f64> {
    let mut pooled = vec![0.0; channels];
    for row in values {
        for (p, v) in pooled.iter_mut().zip(row) {
            *p += v;
        }
    }
    let n = values.len().max(1) as f64;
    pooled.iter_mut().for_each(|p| *p /= n);
    pooled
}

fn dense(input: &[f64], layer: &DenseLayer) -> Vec<f64> {
    let mut out = layer.bias.clone();
    for (x, row) in input.iter().zip(&layer.kernel) {
        for (o, w) in out.iter_mut().zip(row) {
            *o += x * w;
        }
    }
    out
}

fn dense_layer_logits(input: &[f64], layer: &DenseLayer) -> [f64; CLASS_COUNT] {
    let out = dense(input, layer);
    let mut logits = [0.0; CLASS_COUNT];
    for (l, v) in logits.iter_mut().zip(out) {
        *l = v;
    }
    logits
}

fn softmax(logits: &[f64; CLASS_COUNT]) -> [f64; CLASS_COUNT] {
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps = logits.map(|l| (l - max).exp());
    let sum: f64 = exps.iter().sum();
    exps.map(|e| safe_div(e, sum))
}

/// Columns belonging to a domain
fn domain_columns(domain: Domain) -> Vec<usize> {
    Metric::ALL
        .iter()
        .enumerate()
        .filter(|(_, m)| m.domain() == domain)
        .map(|(i, _)| i)
        .collect()
}

/// Predictor backed by the CNN, loaded on first use and cached for the
/// lifetime of the predictor
///
/// A load failure is logged once and every later call returns `None`.
pub struct ModelTrendPredictor {
    path: Option<PathBuf>,
    model: OnceLock<Result<CnnTrendModel, String>>,
    config: ClassifierConfig,
}

impl ModelTrendPredictor {
    /// Predictor that loads weights from `path` on first prediction
    pub fn lazy(path: impl Into<PathBuf>, config: ClassifierConfig) -> Self {
        Self {
            path: Some(path.into()),
            model: OnceLock::new(),
            config,
        }
    }

    /// Predictor around an already loaded model
    pub fn with_model(model: CnnTrendModel, config: ClassifierConfig) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Ok(model));
        Self {
            path: None,
            model: cell,
            config,
        }
    }

    /// The cached model, loading it if this is the first call
    pub fn model(&self) -> Result<&CnnTrendModel, ComputeError> {
        let loaded = self.model.get_or_init(|| {
            let result = match &self.path {
                Some(path) => CnnTrendModel::from_file(path).map_err(|e| e.to_string()),
                None => Err("no model path configured".to_string()),
            };
            match &result {
                Ok(_) => debug!(path = ?self.path, "trend model loaded"),
                Err(e) => warn!(error = %e, "trend model unavailable, using fallback"),
            }
            result
        });
        loaded
            .as_ref()
            .map_err(|e| ComputeError::ModelLoad(e.clone()))
    }

    fn reliability(&self, confidence: f64, sessions: usize) -> Reliability {
        if confidence >= self.config.high_confidence
            && sessions >= self.config.high_reliability_gate()
        {
            Reliability::High
        } else if confidence >= self.config.medium_confidence {
            Reliability::Medium
        } else {
            Reliability::Low
        }
    }
}

impl TrendPredictor for ModelTrendPredictor {
    fn name(&self) -> &'static str {
        "cnn"
    }

    fn predict(&self, history: &[ExtractedFeatures]) -> Option<TrendPrediction> {
        let window = FeatureWindow::build(history, &self.config)?;
        let model = self.model().ok()?;

        let probabilities = model.forward(window.rows());
        if probabilities.iter().any(|p| !p.is_finite()) {
            warn!("trend model produced non-finite output");
            return None;
        }

        let (class_index, confidence) = probabilities
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, p)| {
                if *p > best.1 {
                    (i, *p)
                } else {
                    best
                }
            });
        let trend = TrendClass::from_index(class_index)?;

        let drop = |domain: Domain| {
            let occluded = model.forward(&window.occluded(&domain_columns(domain)));
            (confidence - occluded[class_index]).max(0.0)
        };
        let memory = drop(Domain::Memory);
        let reaction = drop(Domain::Reaction);
        let pattern = drop(Domain::Pattern);
        let language = drop(Domain::Language);
        let total = memory + reaction + pattern + language;

        Some(TrendPrediction {
            trend,
            confidence,
            reliability: self.reliability(confidence, window.sessions()),
            contributions: DomainContributions {
                memory: safe_div(memory, total),
                reaction: safe_div(reaction, total),
                pattern: safe_div(pattern, total),
                language: safe_div(language, total),
            },
            source: PredictionSource::Model,
            session_count: window.sessions(),
            probabilities: Some(probabilities),
        })
    }
}

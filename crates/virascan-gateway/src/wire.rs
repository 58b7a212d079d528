//! Service payloads as they arrive on the wire, and their validation into
//! the domain model. Every wire field is optional so that a missing field is
//! reported by name instead of as a generic decode failure.

use serde::Deserialize;
use virascan_core::prediction::*;

use crate::GatewayError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub model_trained: Option<bool>,
    #[serde(default)]
    pub training_accuracy: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub results: Option<WireResults>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireResults {
    #[serde(default)]
    pub summary: Option<WireSummary>,
    #[serde(default)]
    pub model_results: Option<Vec<WireModelResult>>,
    #[serde(default)]
    pub detailed_results: Option<Vec<WireDetailedResult>>,
    #[serde(default)]
    pub confusion_matrix: Option<WireConfusionMatrix>,
    #[serde(default)]
    pub feature_importance: Option<FeatureImportance>,
    #[serde(default)]
    pub metadata: Option<WireMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireSummary {
    pub total_sequences: Option<usize>,
    pub viral_sequences: Option<usize>,
    pub non_viral_sequences: Option<usize>,
    pub average_confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireModelResult {
    pub model: Option<String>,
    pub prediction: Option<String>,
    pub probability: Option<f64>,
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireDetailedResult {
    pub sequence_id: Option<String>,
    pub prediction: Option<String>,
    pub probability: Option<f64>,
    pub sequence_length: Option<usize>,
    #[serde(default)]
    pub raw_probabilities: Option<RawProbabilities>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireConfusionMatrix {
    pub true_viral: Option<u64>,
    pub false_viral: Option<u64>,
    pub true_non_viral: Option<u64>,
    pub false_non_viral: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireMetadata {
    pub model_accuracy: Option<f64>,
    pub timestamp: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub processing_time: Option<String>,
}

/// Map an HTTP status and body from `POST /predict` to a result or error.
pub fn decode_predict_response(status: u16, body: &str) -> Result<PredictionResult, GatewayError> {
    let parsed = serde_json::from_str::<PredictResponse>(body);

    if !(200..300).contains(&status) {
        let message = parsed
            .ok()
            .and_then(|r| r.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                let text = body.trim();
                if text.is_empty() {
                    format!("HTTP {status}")
                } else {
                    text.chars().take(200).collect()
                }
            });
        return Err(GatewayError::ServerRejected { status, message });
    }

    let response = parsed.map_err(|e| GatewayError::MalformedResponse(format!("invalid JSON: {e}")))?;

    if response.success != Some(true) {
        return Err(GatewayError::ServerRejected {
            status,
            message: response
                .error
                .unwrap_or_else(|| "service reported failure without a message".to_string()),
        });
    }

    let results = response
        .results
        .ok_or_else(|| GatewayError::MalformedResponse("success response has no results".to_string()))?;
    into_result(results).map_err(GatewayError::MalformedResponse)
}

/// Check a decoded payload against the result schema.
pub fn into_result(wire: WireResults) -> Result<PredictionResult, String> {
    let summary = require(wire.summary, "summary")?;
    let summary = Summary {
        total: require(summary.total_sequences, "summary.total_sequences")?,
        viral: require(summary.viral_sequences, "summary.viral_sequences")?,
        non_viral: require(summary.non_viral_sequences, "summary.non_viral_sequences")?,
        avg_confidence: unit_interval(summary.average_confidence, "summary.average_confidence")?,
    };
    if summary.viral + summary.non_viral != summary.total {
        return Err(format!(
            "summary counts disagree: {} viral + {} non-viral != {} total",
            summary.viral, summary.non_viral, summary.total
        ));
    }

    let model_results = require(wire.model_results, "model_results")?
        .into_iter()
        .enumerate()
        .map(|(i, m)| -> Result<ModelResult, String> {
            let field = |name: &str| format!("model_results[{i}].{name}");
            Ok(ModelResult {
                model: require(m.model, &field("model"))?,
                prediction: label(m.prediction, &field("prediction"))?,
                confidence_percent: percentage(m.probability, &field("probability"))?,
                accuracy_percent: percentage(m.accuracy, &field("accuracy"))?,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    let detailed_results = require(wire.detailed_results, "detailed_results")?
        .into_iter()
        .enumerate()
        .map(|(i, d)| -> Result<DetailedResult, String> {
            let field = |name: &str| format!("detailed_results[{i}].{name}");
            if let Some(raw) = &d.raw_probabilities {
                unit_interval_opt(raw.viral, &field("raw_probabilities.viral"))?;
                unit_interval_opt(raw.non_viral, &field("raw_probabilities.non_viral"))?;
            }
            Ok(DetailedResult {
                sequence_id: require(d.sequence_id, &field("sequence_id"))?,
                prediction: label(d.prediction, &field("prediction"))?,
                probability: unit_interval(d.probability, &field("probability"))?,
                sequence_length: require(d.sequence_length, &field("sequence_length"))?,
                raw_probabilities: d.raw_probabilities,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    let confusion_matrix = wire
        .confusion_matrix
        .map(|c| {
            Ok::<_, String>(ConfusionMatrix {
                true_viral: require(c.true_viral, "confusion_matrix.true_viral")?,
                false_viral: require(c.false_viral, "confusion_matrix.false_viral")?,
                true_non_viral: require(c.true_non_viral, "confusion_matrix.true_non_viral")?,
                false_non_viral: require(c.false_non_viral, "confusion_matrix.false_non_viral")?,
            })
        })
        .transpose()?;

    let metadata = require(wire.metadata, "metadata")?;
    let metadata = ResultMetadata {
        model_accuracy: unit_interval(metadata.model_accuracy, "metadata.model_accuracy")?,
        timestamp: require(metadata.timestamp, "metadata.timestamp")?,
        file_name: metadata.file_name,
        processing_time: metadata.processing_time,
    };

    Ok(PredictionResult {
        summary,
        model_results,
        detailed_results,
        confusion_matrix,
        feature_importance: wire.feature_importance,
        metadata,
    })
}

fn require<T>(value: Option<T>, field: &str) -> Result<T, String> {
    value.ok_or_else(|| format!("missing field {field}"))
}

fn label(value: Option<String>, field: &str) -> Result<Prediction, String> {
    let raw = require(value, field)?;
    Prediction::from_label(&raw).ok_or_else(|| format!("{field}: unknown prediction label '{raw}'"))
}

fn unit_interval(value: Option<f64>, field: &str) -> Result<f64, String> {
    let v = require(value, field)?;
    in_range(v, 0.0, 1.0, field)
}

fn unit_interval_opt(value: Option<f64>, field: &str) -> Result<(), String> {
    match value {
        Some(v) => in_range(v, 0.0, 1.0, field).map(|_| ()),
        None => Ok(()),
    }
}

fn percentage(value: Option<f64>, field: &str) -> Result<f64, String> {
    let v = require(value, field)?;
    in_range(v, 0.0, 100.0, field)
}

fn in_range(v: f64, min: f64, max: f64, field: &str) -> Result<f64, String> {
    if v.is_finite() && (min..=max).contains(&v) {
        Ok(v)
    } else {
        Err(format!("{field}: {v} is outside [{min}, {max}]"))
    }
}

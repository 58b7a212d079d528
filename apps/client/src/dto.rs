//! Flat, JSON-friendly DTOs returned by the command layer.

use serde::Serialize;
use virascan_core::prediction::{DetailedResult, ModelResult, PredictionResult};
use virascan_core::upload::UploadedFileMeta;
use virascan_formats::detect::format_size;
use virascan_gateway::HealthStatus;

use crate::controller::Stage;
use crate::notification::Notification;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDto {
    pub name: String,
    pub size: u64,
    pub size_label: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDto {
    pub server: String,
    pub reachable: bool,
    pub model_trained: Option<bool>,
    pub training_accuracy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDto {
    pub stage: Stage,
    pub upload: Option<UploadDto>,
    pub has_results: bool,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDto {
    pub path: String,
    pub format: String,
    pub bytes: usize,
}

/// Display-ready rows, percentages already scaled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsDto {
    pub total: usize,
    pub viral: usize,
    pub non_viral: usize,
    pub average_confidence: f64,
    pub models: Vec<ModelRowDto>,
    pub sequences: Vec<SequenceRowDto>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRowDto {
    pub model: String,
    pub prediction: String,
    pub confidence: f64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceRowDto {
    pub sequence_id: String,
    pub prediction: String,
    pub confidence: f64,
    pub length: usize,
}

// Conversion from domain types to DTOs
impl From<&UploadedFileMeta> for UploadDto {
    fn from(meta: &UploadedFileMeta) -> Self {
        UploadDto {
            name: meta.name.clone(),
            size: meta.size,
            size_label: format_size(meta.size),
            mime_type: meta.mime_type.clone(),
        }
    }
}

impl HealthDto {
    pub fn new(server: &str, status: &HealthStatus) -> Self {
        HealthDto {
            server: server.to_string(),
            reachable: status.reachable,
            model_trained: status.model_trained,
            training_accuracy: status.training_accuracy,
        }
    }
}

impl From<&ModelResult> for ModelRowDto {
    fn from(m: &ModelResult) -> Self {
        ModelRowDto {
            model: m.model.clone(),
            prediction: m.prediction.to_string(),
            confidence: m.confidence_percent,
            accuracy: m.accuracy_percent,
        }
    }
}

impl From<&DetailedResult> for SequenceRowDto {
    fn from(d: &DetailedResult) -> Self {
        SequenceRowDto {
            sequence_id: d.sequence_id.clone(),
            prediction: d.prediction.to_string(),
            confidence: d.probability * 100.0,
            length: d.sequence_length,
        }
    }
}

impl From<&PredictionResult> for ResultsDto {
    fn from(r: &PredictionResult) -> Self {
        ResultsDto {
            total: r.summary.total,
            viral: r.summary.viral,
            non_viral: r.summary.non_viral,
            average_confidence: r.summary.avg_confidence * 100.0,
            models: r.model_results.iter().map(ModelRowDto::from).collect(),
            sequences: r.detailed_results.iter().map(SequenceRowDto::from).collect(),
            timestamp: r.metadata.timestamp.clone(),
        }
    }
}

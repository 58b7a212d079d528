//! Request/response contract with the remote prediction service.

pub mod http;
pub mod wire;

pub use http::HttpGateway;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use virascan_core::prediction::PredictionResult;
use virascan_core::request::PredictionRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    NetworkUnavailable,
    ServerRejected,
    MalformedResponse,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    #[error("Prediction service unreachable: {0}")]
    NetworkUnavailable(String),
    #[error("Prediction service rejected the request (HTTP {status}): {message}")]
    ServerRejected { status: u16, message: String },
    #[error("Malformed prediction response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    pub fn kind(&self) -> GatewayErrorKind {
        match self {
            GatewayError::NetworkUnavailable(_) => GatewayErrorKind::NetworkUnavailable,
            GatewayError::ServerRejected { .. } => GatewayErrorKind::ServerRejected,
            GatewayError::MalformedResponse(_) => GatewayErrorKind::MalformedResponse,
        }
    }
}

/// Outcome of a single health probe.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HealthStatus {
    pub reachable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_trained: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_accuracy: Option<f64>,
}

impl HealthStatus {
    pub fn unreachable() -> Self {
        Self::default()
    }
}

/// One attempt per call, no retries.
pub trait PredictionGateway: Send + Sync {
    /// Never fails; any problem reads as `reachable == false`.
    fn check_health(&self) -> HealthStatus;

    fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, GatewayError>;
}

impl<G: PredictionGateway + ?Sized> PredictionGateway for Arc<G> {
    fn check_health(&self) -> HealthStatus {
        (**self).check_health()
    }

    fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, GatewayError> {
        (**self).predict(request)
    }
}

impl<G: PredictionGateway + ?Sized> PredictionGateway for Box<G> {
    fn check_health(&self) -> HealthStatus {
        (**self).check_health()
    }

    fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, GatewayError> {
        (**self).predict(request)
    }
}

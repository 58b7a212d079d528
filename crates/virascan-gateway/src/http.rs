use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use virascan_core::prediction::PredictionResult;
use virascan_core::request::PredictionRequest;

use crate::wire::{decode_predict_response, HealthResponse};
use crate::{GatewayError, HealthStatus, PredictionGateway};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Blocking HTTP client for the prediction service. Requests use the
/// transport's default timeout.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .build()
            .map_err(|e| GatewayError::NetworkUnavailable(format!("could not build HTTP client: {e}")))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

impl PredictionGateway for HttpGateway {
    fn check_health(&self) -> HealthStatus {
        let url = self.url("health");
        let response = match self.client.get(&url).send() {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Health check failed for {}: {}", url, e);
                return HealthStatus::unreachable();
            }
        };

        let status = response.status();
        if !status.is_success() {
            log::warn!("Health check for {} returned {}", url, status);
            return HealthStatus::unreachable();
        }

        match response.json::<HealthResponse>() {
            Ok(body) => {
                log::debug!(
                    "Service status {:?}, model trained: {:?}",
                    body.status,
                    body.model_trained
                );
                HealthStatus {
                    reachable: true,
                    model_trained: body.model_trained,
                    training_accuracy: body.training_accuracy,
                }
            }
            Err(e) => {
                log::warn!("Unreadable health response from {}: {}", url, e);
                HealthStatus::unreachable()
            }
        }
    }

    fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, GatewayError> {
        let url = self.url("predict");
        let models = serde_json::Value::from(
            request.model_ids().iter().cloned().collect::<Vec<String>>(),
        )
        .to_string();

        let file = Part::text(request.fasta().to_string()).file_name(request.file_name().to_string());
        let form = Form::new().part("file", file).text("models", models);

        log::info!(
            "Submitting '{}' ({} bytes) to {} with models {:?}",
            request.file_name(),
            request.fasta().len(),
            url,
            request.model_ids()
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(|e| GatewayError::NetworkUnavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| GatewayError::NetworkUnavailable(format!("could not read response body: {e}")))?;

        let result = decode_predict_response(status.as_u16(), &body);
        match &result {
            Ok(r) => log::info!("Received predictions for {} sequences", r.sequence_count()),
            Err(e) => log::warn!("Prediction failed: {}", e),
        }
        result
    }
}

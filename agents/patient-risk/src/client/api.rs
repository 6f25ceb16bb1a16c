//! Patient API client
//!
//! Two endpoints, both authenticated with a static `x-api-key` header and both
//! driven through the same [`RetryExecutor`]:
//!
//! - `GET {base_url}/patients?page={n}&limit={size}`
//! - `POST {base_url}/submit-assessment`

use reqwest::{Client, Response};
use risk_scoring::AssessmentResult;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use super::fetcher::PageSource;
use super::retry::{RetryExecutor, RetryPolicy};
use super::{AttemptError, ClientError};
use crate::config::{AgentConfig, ApiClientConfig};
use crate::contracts::PatientPage;
use crate::telemetry::AssessmentMetrics;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const PATIENTS_PATH: &str = "/patients";
pub const SUBMIT_PATH: &str = "/submit-assessment";

/// Longest response excerpt kept in an error message
const ERROR_BODY_LIMIT: usize = 200;

/// HTTP client for the patient API
pub struct PatientApiClient {
    http: Client,
    config: ApiClientConfig,
    executor: RetryExecutor,
}

impl PatientApiClient {
    /// Validate `config` and build the underlying HTTP client
    pub fn new(config: &AgentConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.api.timeout())
            .build()
            .map_err(|e| ClientError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config: config.api.clone(),
            executor: RetryExecutor::new(RetryPolicy::new(config.retry.clone())),
        })
    }

    /// Record requests and retries on `metrics`
    pub fn with_metrics(mut self, metrics: Arc<AssessmentMetrics>) -> Self {
        self.executor = self.executor.with_metrics(metrics);
        self
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Fetch one page, retrying per policy
    pub async fn fetch_page(&self, page: u32, limit: u32) -> Result<PatientPage, ClientError> {
        let url = self.config.endpoint(PATIENTS_PATH);
        let body = self
            .executor
            .execute("patients", || self.get_page(&url, page, limit))
            .await?;
        Ok(PatientPage::from_body(&body))
    }

    /// Submit the alert lists. The response body is returned as JSON, or as a
    /// JSON string when the server did not answer with JSON.
    pub async fn submit(&self, result: &AssessmentResult) -> Result<Value, ClientError> {
        let url = self.config.endpoint(SUBMIT_PATH);
        tracing::info!(
            high_risk = result.high_risk_patients.len(),
            fever = result.fever_patients.len(),
            data_issues = result.data_quality_issues.len(),
            "Submitting assessment"
        );

        let body = self
            .executor
            .execute("submit-assessment", || self.post_assessment(&url, result))
            .await?;

        let response = match serde_json::from_str::<Value>(&body) {
            Ok(value) => value,
            Err(_) => Value::String(body),
        };
        tracing::info!(response = %response, "Assessment submitted");
        Ok(response)
    }

    async fn get_page(&self, url: &str, page: u32, limit: u32) -> Result<String, AttemptError> {
        let response = self
            .http
            .get(url)
            .query(&[("page", page), ("limit", limit)])
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(network_error)?;
        read_body(response).await
    }

    async fn post_assessment(
        &self,
        url: &str,
        result: &AssessmentResult,
    ) -> Result<String, AttemptError> {
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(result)
            .send()
            .await
            .map_err(network_error)?;
        read_body(response).await
    }
}

impl PageSource for PatientApiClient {
    fn fetch_page(
        &self,
        page: u32,
        limit: u32,
    ) -> impl Future<Output = Result<PatientPage, ClientError>> + Send {
        PatientApiClient::fetch_page(self, page, limit)
    }
}

fn network_error(err: reqwest::Error) -> AttemptError {
    AttemptError::Network(err.to_string())
}

/// Read the body; non-2xx statuses become [`AttemptError::Status`]
async fn read_body(response: Response) -> Result<String, AttemptError> {
    let status = response.status();
    if status.is_success() {
        return response.text().await.map_err(network_error);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.is_empty() {
        status.canonical_reason().unwrap_or("no reason").to_string()
    } else {
        body.chars().take(ERROR_BODY_LIMIT).collect()
    };
    Err(AttemptError::Status {
        status: status.as_u16(),
        message,
    })
}

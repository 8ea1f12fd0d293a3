//! Reqwest-based gateway to the remote VTL evaluation service.
//!
//! This is the only module that performs I/O. Every operation is a single
//! request/response with no retries; timeout policy lives in the client
//! configuration here, not in the callers.

use std::{pin::Pin, time::Duration};

use anyhow::Result;
use async_stream::try_stream;
use futures_core::Stream;
use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::model::Variable;

/// Failure payload of one remote operation, kept for display.
///
/// `status` is present when the service answered with an HTTP error; it is
/// absent for transport-level failures (connection refused, timeout, bad
/// response body).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ServiceError {
    pub status: Option<u16>,
    pub detail: Value,
}

impl ServiceError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self { status: None, detail: Value::String(err.to_string()) }
    }

    /// Short single-line rendering for status lines and CLI messages.
    pub fn summary(&self) -> String {
        let detail = match &self.detail {
            Value::String(text) => text.clone(),
            other => other
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string()),
        };
        match self.status {
            Some(status) => format!("{}: {}", status, detail),
            None => detail,
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.summary())
    }
}

impl std::error::Error for ServiceError {}

/// The four remote operations the workbench needs.
///
/// A trait so the orchestration layer can run against an in-memory backend in
/// tests; `EvaluationGateway` is the HTTP implementation.
#[allow(async_fn_in_trait)]
pub trait EvaluationBackend {
    /// Submit an expression for evaluation; returns the names of the datasets
    /// the evaluation produced.
    async fn execute(&self, expression: &str) -> Result<Vec<String>, ServiceError>;

    /// Fetch the structural metadata (variable list) of one dataset.
    async fn fetch_structure(&self, name: &str) -> Result<Vec<Variable>, ServiceError>;

    /// Fetch one dataset's row data as an opaque payload.
    async fn fetch_data(&self, name: &str) -> Result<Value, ServiceError>;

    /// Delete one dataset on the service.
    async fn delete_dataset(&self, name: &str) -> Result<(), ServiceError>;
}

#[derive(Debug, Deserialize)]
struct StructureResponse {
    #[serde(rename = "dataStructure")]
    data_structure: Vec<Variable>,
}

#[derive(Debug, Clone)]
pub struct EvaluationGateway {
    http: Client,
    base_url: String,
}

impl EvaluationGateway {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let base_url = cfg
            .get("SERVICE_URL")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Missing SERVICE_URL. Set it in env, {}, or pass --url",
                    cfg.config_path.display()
                )
            })?;

        let timeout_secs = cfg
            .get("REQUEST_TIMEOUT")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Stream one dataset's raw row payload without buffering it whole.
    /// Used for dumping large datasets to a file or stdout.
    pub fn stream_data(&self, name: &str) -> Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>> {
        let http = self.http.clone();
        let url = self.url(&format!("/dataset/{}/data", name));
        let name = name.to_string();

        Box::pin(try_stream! {
            let resp = http.get(&url).send().await?;
            if resp.status().is_success() {
                let mut body = resp.bytes_stream();
                use futures_util::StreamExt as _;
                while let Some(chunk) = body.next().await {
                    yield chunk?.to_vec();
                }
            } else {
                let err = service_error(resp).await;
                Err(anyhow::anyhow!("fetching data for '{}' failed: {}", name, err))?;
            }
        })
    }
}

impl EvaluationBackend for EvaluationGateway {
    async fn execute(&self, expression: &str) -> Result<Vec<String>, ServiceError> {
        let resp = self
            .http
            .post(self.url("/execute"))
            .header(CONTENT_TYPE, "text/plain")
            .body(expression.to_string())
            .send()
            .await
            .map_err(ServiceError::transport)?;

        match resp.status() {
            StatusCode::OK => resp.json::<Vec<String>>().await.map_err(ServiceError::transport),
            _ => Err(service_error(resp).await),
        }
    }

    async fn fetch_structure(&self, name: &str) -> Result<Vec<Variable>, ServiceError> {
        let resp = self
            .http
            .get(self.url(&format!("/dataset/{}/structure", name)))
            .send()
            .await
            .map_err(ServiceError::transport)?;

        match resp.status() {
            StatusCode::OK => resp
                .json::<StructureResponse>()
                .await
                .map(|s| s.data_structure)
                .map_err(ServiceError::transport),
            _ => Err(service_error(resp).await),
        }
    }

    async fn fetch_data(&self, name: &str) -> Result<Value, ServiceError> {
        let resp = self
            .http
            .get(self.url(&format!("/dataset/{}/data", name)))
            .send()
            .await
            .map_err(ServiceError::transport)?;

        match resp.status() {
            StatusCode::OK => resp.json::<Value>().await.map_err(ServiceError::transport),
            _ => Err(service_error(resp).await),
        }
    }

    async fn delete_dataset(&self, name: &str) -> Result<(), ServiceError> {
        let resp = self
            .http
            .delete(self.url(&format!("/dataset/{}", name)))
            .send()
            .await
            .map_err(ServiceError::transport)?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(service_error(resp).await)
        }
    }
}

/// Turn an HTTP error response into a stored payload. The body is kept as
/// JSON when it parses, verbatim text otherwise.
async fn service_error(resp: Response) -> ServiceError {
    let status = resp.status().as_u16();
    let detail = match resp.text().await {
        Ok(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        Err(err) => Value::String(err.to_string()),
    };
    ServiceError { status: Some(status), detail }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_response_parses_service_shape() {
        let resp: StructureResponse = serde_json::from_str(
            r#"{"dataStructure": [
                {"name": "kommune", "type": "String", "role": "IDENTIFIER"},
                {"name": "folketall", "type": "Long", "role": "MEASURE"}
            ]}"#,
        )
        .expect("valid structure json");
        assert_eq!(resp.data_structure.len(), 2);
        assert_eq!(resp.data_structure[0].name, "kommune");
    }

    #[test]
    fn summary_prefers_message_field() {
        let err = ServiceError {
            status: Some(400),
            detail: serde_json::json!({"message": "syntax error", "line": 1}),
        };
        assert_eq!(err.summary(), "400: syntax error");

        let plain = ServiceError { status: None, detail: Value::String("timed out".into()) };
        assert_eq!(plain.summary(), "timed out");
    }
}

use serde::Deserialize;

use super::{SubmitClient, SubmitError, FALLBACK_ERROR};
use crate::config;
use crate::queue::intake::PDF_MIME;

/// Multipart field name the extraction endpoint expects.
const UPLOAD_FIELD: &str = "file";

/// Path of the extraction operation on the service.
const PROCESS_PATH: &str = "/process";

/// Blocking HTTP client for the extraction service.
pub struct HttpSubmitClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpSubmitClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }

    /// Client for the locally configured endpoint.
    pub fn from_env() -> Self {
        Self::new(&config::default_endpoint(), config::default_timeout_secs())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Failure body shape of the extraction service: `{"detail": "..."}`.
#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Pull the server's message out of a failure body, or fall back.
fn resolve_detail(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .unwrap_or_else(|| FALLBACK_ERROR.to_string())
}

impl SubmitClient for HttpSubmitClient {
    fn submit(&self, file_name: &str, bytes: &[u8]) -> Result<serde_json::Value, SubmitError> {
        let url = format!("{}{PROCESS_PATH}", self.base_url);

        let part = reqwest::blocking::multipart::Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str(PDF_MIME)
            .map_err(|e| SubmitError::Http(e.to_string()))?;
        let form = reqwest::blocking::multipart::Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    SubmitError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    SubmitError::Timeout(self.timeout_secs)
                } else {
                    SubmitError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                detail: resolve_detail(&body),
            });
        }

        response
            .json::<serde_json::Value>()
            .map_err(|e| SubmitError::ResponseParsing(e.to_string()))
    }
}

/// Mock client for tests — scripted outcomes, consumed in order.
/// Once the script runs out it answers with an empty JSON object.
pub struct MockSubmitClient {
    outcomes: std::sync::Mutex<std::collections::VecDeque<Result<serde_json::Value, SubmitError>>>,
    calls: std::sync::Mutex<Vec<String>>,
}

impl MockSubmitClient {
    pub fn new() -> Self {
        Self {
            outcomes: std::sync::Mutex::new(std::collections::VecDeque::new()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn push_ok(self, value: serde_json::Value) -> Self {
        self.outcomes.lock().unwrap().push_back(Ok(value));
        self
    }

    pub fn push_rejected(self, status: u16, detail: &str) -> Self {
        self.outcomes.lock().unwrap().push_back(Err(SubmitError::Rejected {
            status,
            detail: detail.to_string(),
        }));
        self
    }

    pub fn push_failure(self, error: SubmitError) -> Self {
        self.outcomes.lock().unwrap().push_back(Err(error));
        self
    }

    /// File names this client was asked to submit, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockSubmitClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmitClient for MockSubmitClient {
    fn submit(&self, file_name: &str, _bytes: &[u8]) -> Result<serde_json::Value, SubmitError> {
        self.calls.lock().unwrap().push(file_name.to_string());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(serde_json::json!({})))
    }
}

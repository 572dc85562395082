use crate::error::{Result, SubmissionError};
use crate::submission::SubmissionResponse;
use reqwest::Url;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://eu-api.jotform.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest slice of a non-JSON error body carried into an error message
const MAX_ERROR_BODY_CHARS: usize = 200;

/// API key and form identifier, both validated non-empty at construction
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    form_id: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, form_id: impl Into<String>) -> Result<Self> {
        Self::from_options(Some(api_key.into()), Some(form_id.into()))
    }

    /// Build from values that may not have been supplied at all
    pub fn from_options(api_key: Option<String>, form_id: Option<String>) -> Result<Self> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let form_id = form_id
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());

        match (api_key, form_id) {
            (Some(api_key), Some(form_id)) => Ok(Self { api_key, form_id }),
            (None, None) => Err(SubmissionError::InvalidConfiguration(
                "API key and form ID are required".to_string(),
            )),
            (None, Some(_)) => Err(SubmissionError::InvalidConfiguration(
                "API key is required".to_string(),
            )),
            (Some(_), None) => Err(SubmissionError::InvalidConfiguration(
                "form ID is required".to_string(),
            )),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn form_id(&self) -> &str {
        &self.form_id
    }
}

// Keep the key out of logs and panic messages
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("form_id", &self.form_id)
            .finish()
    }
}

/// Anything that can hand back the submissions payload for one form
pub trait SubmissionSource {
    fn fetch_submissions(&self) -> Result<SubmissionResponse>;
}

/// Blocking client for the `/form/{id}/submissions` endpoint
#[derive(Clone)]
pub struct ApiClient {
    credentials: Credentials,
    endpoint: Url,
    client: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_options(credentials, DEFAULT_BASE_URL, Some(DEFAULT_TIMEOUT))
    }

    /// `timeout` of `None` leaves the request unbounded
    pub fn with_options(
        credentials: Credentials,
        base_url: &str,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let endpoint = Self::submissions_url(base_url, credentials.form_id())?;
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        debug!(target: "api", "Submissions endpoint: {}", endpoint);

        Ok(Self {
            credentials,
            endpoint,
            client,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn submissions_url(base_url: &str, form_id: &str) -> Result<Url> {
        let mut url = Url::parse(base_url).map_err(|e| {
            SubmissionError::InvalidConfiguration(format!("invalid base URL '{}': {}", base_url, e))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                SubmissionError::InvalidConfiguration(format!(
                    "base URL '{}' cannot carry a path",
                    base_url
                ))
            })?
            .pop_if_empty()
            .extend(["form", form_id, "submissions"]);

        Ok(url)
    }

    fn fetch(&self) -> Result<SubmissionResponse> {
        info!(target: "api", "Fetching submissions for form {}", self.credentials.form_id());

        // Errors are stripped of the URL because it carries the API key
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("apiKey", self.credentials.api_key())])
            .send()
            .map_err(|e| SubmissionError::Request(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| SubmissionError::Request(e.without_url()))?;

        if !status.is_success() {
            return Err(SubmissionError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let payload: Value = serde_json::from_str(&body).map_err(SubmissionError::Decode)?;
        let response = SubmissionResponse::new(payload);

        if let Some(code) = response.response_code() {
            if !(200..300).contains(&code) {
                return Err(SubmissionError::Api {
                    code,
                    message: response.message().unwrap_or("no message").to_string(),
                });
            }
        }

        debug!(
            target: "api",
            "Received {} submissions",
            response.content().map(|c| c.len()).unwrap_or(0)
        );
        Ok(response)
    }
}

impl SubmissionSource for ApiClient {
    fn fetch_submissions(&self) -> Result<SubmissionResponse> {
        self.fetch().inspect_err(|e| {
            warn!(target: "api", "Fetching submissions failed: {}", e);
        })
    }
}

/// Pull a readable message out of an error body. The shape of error bodies is not
/// documented, so a JSON `message` is preferred and raw text is the fallback.
fn error_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        if let Some(message) = map.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    if trimmed.chars().count() > MAX_ERROR_BODY_CHARS {
        let cut: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{}...", cut)
    } else {
        trimmed.to_string()
    }
}

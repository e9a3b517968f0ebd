// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the automation backend.
//!
//! Provides [`WebhookClient::execute`], which retries with exponential backoff
//! and always answers with a [`WebhookResponse`] envelope instead of an error.

use std::time::{Duration, Instant};

use reqwest::{Method, Url};
use serde_json::{Map, Value};
use taskbridge_config::model::WebhookConfig;
use taskbridge_core::TaskbridgeError;
use tracing::{debug, warn};

/// Optional parts of a webhook request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// JSON body.
    pub body: Option<Value>,
    /// Query string pairs, appended in order.
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn json(body: Value) -> Self {
        Self {
            body: Some(body),
            query: Vec::new(),
        }
    }

    pub fn query<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            body: None,
            query: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Normalized result of a webhook call.
///
/// `data` holds every backend field other than `success` and `error`.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookResponse {
    pub success: bool,
    pub error: Option<String>,
    pub data: Map<String, Value>,
}

impl WebhookResponse {
    /// A failed envelope carrying `error`.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data: Map::new(),
        }
    }

    /// Converts a 2xx JSON body into an envelope.
    ///
    /// Anything but an explicit `"success": false` counts as success.
    pub fn from_body(body: Value) -> Self {
        let mut data = match body {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("body".to_string(), other);
                map
            }
        };

        let success = match data.remove("success") {
            Some(Value::Bool(false)) => false,
            Some(_) => true,
            None => {
                warn!("webhook response has no `success` field, treating it as success");
                true
            }
        };
        let error = data.remove("error").map(|e| match e {
            Value::String(s) => s,
            other => other.to_string(),
        });

        Self {
            success,
            error,
            data,
        }
    }

    /// Deserializes the payload of a successful envelope.
    ///
    /// A failed envelope becomes [`TaskbridgeError::Webhook`] carrying the
    /// backend's message. A successful envelope always stays a success: a
    /// payload that does not fit `T` is logged and replaced by `T::default()`.
    pub fn into_result<T>(self) -> Result<T, TaskbridgeError>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        if !self.success {
            return Err(TaskbridgeError::webhook(
                self.error
                    .unwrap_or_else(|| "the automation backend reported a failure".to_string()),
            ));
        }
        match serde_json::from_value(Value::Object(self.data)) {
            Ok(payload) => Ok(payload),
            Err(e) => {
                warn!(error = %e, "successful backend reply has an unexpected shape, using defaults");
                Ok(T::default())
            }
        }
    }
}

/// HTTP client for the n8n webhooks.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    base_url: String,
    max_attempts: u32,
    retry_base_delay: Duration,
}

impl WebhookClient {
    /// Creates a client from the `[webhook]` configuration section.
    pub fn new(config: &WebhookConfig) -> Result<Self, TaskbridgeError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TaskbridgeError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_attempts: config.max_attempts.max(1),
            retry_base_delay: config.retry_base_delay(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the retry backoff base.
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Performs a call, retrying transport errors, non-2xx statuses, and
    /// unparseable bodies. Never fails: exhausted retries produce a failed
    /// envelope whose error reads `"<METHOD> <path> failed after N attempts: <last error>"`.
    pub async fn execute(&self, method: Method, path: &str, options: RequestOptions) -> WebhookResponse {
        let url = match self.url_for(path, &options.query) {
            Ok(url) => url,
            Err(e) => return WebhookResponse::failure(e),
        };

        let mut last_error = String::new();
        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                let delay = backoff_delay(self.retry_base_delay, attempt - 1);
                debug!(%method, path, attempt, delay_ms = delay.as_millis() as u64, "retrying webhook call");
                tokio::time::sleep(delay).await;
            }

            let started = Instant::now();
            match self.send_once(&method, url.clone(), options.body.as_ref()).await {
                Ok((status, body)) => {
                    debug!(
                        %method,
                        path,
                        status = status.as_u16(),
                        duration_ms = started.elapsed().as_millis() as u64,
                        "webhook call completed"
                    );
                    return WebhookResponse::from_body(body);
                }
                Err(e) => {
                    warn!(
                        %method,
                        path,
                        attempt,
                        duration_ms = started.elapsed().as_millis() as u64,
                        error = %e,
                        "webhook attempt failed"
                    );
                    last_error = e;
                }
            }
        }

        WebhookResponse::failure(format!(
            "{method} {path} failed after {} attempts: {last_error}",
            self.max_attempts
        ))
    }

    fn url_for(&self, path: &str, query: &[(String, String)]) -> Result<Url, String> {
        let mut url = Url::parse(&format!("{}{path}", self.base_url))
            .map_err(|e| format!("invalid webhook URL for {path}: {e}"))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// One attempt. Errors are rendered to the string that ends up in the
    /// final envelope.
    async fn send_once(
        &self,
        method: &Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<(reqwest::StatusCode, Value), String> {
        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| format!("failed to read response body: {e}"))?;

        if !status.is_success() {
            return Err(error_from_body(&text).unwrap_or_else(|| format!("HTTP {status}: {text}")));
        }

        let value = serde_json::from_str(&text)
            .map_err(|e| format!("invalid JSON response (HTTP {status}): {e}"))?;
        Ok((status, value))
    }
}

/// Delay after the `failed_attempt`-th failure: `base * 2^(failed_attempt-1)`.
pub fn backoff_delay(base: Duration, failed_attempt: u32) -> Duration {
    base.saturating_mul(1u32 << failed_attempt.saturating_sub(1).min(16))
}

/// The `error` field of a JSON error body, if there is one.
fn error_from_body(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text).ok()?;
    match value.get("error")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

// Messages API client over reqwest

use crate::config::ApiConfig;
use crate::error::{BenchError, Result};
use crate::models::{MessagesRequest, MessagesResponse, StreamEvent};
use futures::Stream;
use reqwest::Client;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Client for an Anthropic-style Messages API.
///
/// Supports the two call shapes the benchmark measures:
/// - buffered generation (single blocking call, full response)
/// - streaming generation (SSE event sequence)
pub struct AnthropicClient {
    http_client: Client,
    config: ApiConfig,
    api_key: String,
}

impl AnthropicClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .ok_or_else(|| {
                BenchError::Config(format!(
                    "no API key configured: set api.api_key or the {} environment variable",
                    API_KEY_ENV
                ))
            })?;

        // Configure HTTP client for long generations and streaming
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .build()
            .map_err(|e| BenchError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config: config.clone(),
            api_key,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    /// Call the Messages API (blocking). Returns the complete response with
    /// structured usage metrics.
    pub async fn create_message(&self, request: &MessagesRequest) -> Result<MessagesResponse> {
        let url = self.messages_url();
        debug!("Calling Messages API for model: {}", request.model);

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message =
                Self::extract_error_message(&error_text).unwrap_or(error_text);
            return Err(BenchError::from_status(status.as_u16(), message));
        }

        let response_text = response.text().await?;
        let messages_response: MessagesResponse =
            serde_json::from_str(&response_text).map_err(|e| BenchError::Api {
                status: status.as_u16(),
                message: format!("response parsing error: {}", e),
            })?;

        debug!(
            "Received response: {} output tokens",
            messages_response.usage.output_tokens
        );
        Ok(messages_response)
    }

    /// Call the Messages API with `stream: true`. Returns the ordered SSE
    /// event sequence.
    pub async fn stream_message(
        &self,
        request: &MessagesRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>> {
        let url = self.messages_url();
        debug!("Starting Messages API stream for model: {}", request.model);

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message =
                Self::extract_error_message(&error_text).unwrap_or(error_text);
            return Err(BenchError::from_status(status.as_u16(), message));
        }

        let byte_stream = response.bytes_stream();
        Ok(Box::pin(super::streaming::parse_sse_stream(byte_stream)))
    }

    /// Extract the error message from an API error body.
    fn extract_error_message(response_text: &str) -> Option<String> {
        #[derive(serde::Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(serde::Deserialize)]
        struct ErrorDetail {
            #[serde(rename = "type")]
            error_type: Option<String>,
            message: Option<String>,
        }

        let error_resp: ErrorResponse = serde_json::from_str(response_text).ok()?;
        let error = error_resp.error?;
        error.message.or(error.error_type)
    }
}

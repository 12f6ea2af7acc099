// Error types for cachebench

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limited: {0}")]
    TooManyRequests(String),

    #[error("API overloaded: {0}")]
    Overloaded(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Retries exhausted after {attempts} attempts: {source}")]
    ExhaustedRetries {
        attempts: u32,
        #[source]
        source: Box<BenchError>,
    },

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BenchError {
    /// Classify a non-success HTTP status into the matching error variant.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => BenchError::TooManyRequests(body),
            529 => BenchError::Overloaded(body),
            503 | 504 => BenchError::ServiceUnavailable(body),
            _ => BenchError::Api {
                status,
                message: body,
            },
        }
    }

    /// Whether a failed attempt is worth retrying. Transport errors and
    /// throttling/server statuses retry; authentication and malformed-request
    /// failures propagate immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            BenchError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
            }
            BenchError::TooManyRequests(_)
            | BenchError::Overloaded(_)
            | BenchError::ServiceUnavailable(_) => true,
            BenchError::Api { status, .. } => matches!(status, 500 | 502),
            BenchError::Stream(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;

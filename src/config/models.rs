//! Configuration data structures for the benchmark harness.
//!
//! This module defines the schema for the application settings: the upstream
//! Messages API connection, the experiment shape (turns, questions, caching
//! strategy), the retry schedule, and logging.

use serde::{Deserialize, Serialize};

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Upstream Messages API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Experiment shape and caching strategy.
    #[serde(default)]
    pub benchmark: BenchmarkConfig,

    /// Retry schedule for failed invocations.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the upstream Messages API connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for the Messages API.
    /// Default: `https://api.anthropic.com`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key. Falls back to the `ANTHROPIC_API_KEY` environment variable
    /// when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    /// The model to benchmark.
    /// Default: `claude-3-7-sonnet-20250219`
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens to generate per turn.
    /// Default: `256`
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature.
    /// Default: `0.7`
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Connection and request timeout in seconds.
    /// Default: `300` (5 minutes)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

/// Settings for the experiment loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Number of full conversations to run.
    /// Default: `10`
    #[serde(default = "default_experiments")]
    pub experiments: u32,

    /// Number of turns per conversation.
    /// Default: `10`
    #[serde(default = "default_turns")]
    pub turns: u32,

    /// One question per turn; wraps around if there are more turns than
    /// questions.
    #[serde(default = "default_questions")]
    pub questions: Vec<String>,

    /// Path to the document injected verbatim into turn 0.
    /// Default: `RomeoAndJuliet.txt`
    #[serde(default = "default_document_path")]
    pub document_path: String,

    /// System prompt sent with every request.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Caching strategy: `window`, `latest`, or `none`.
    /// Default: `window`
    #[serde(default = "default_cache_strategy")]
    pub cache_strategy: String,

    /// Capacity of the sliding cache window (only for `window`).
    /// Default: `4`
    #[serde(default = "default_cache_window")]
    pub cache_window: usize,

    /// Whether to stream responses (enables time-to-first-token measurement).
    /// Default: `true`
    #[serde(default = "default_true")]
    pub streaming: bool,

    /// Fixed delay between turns, to respect provider rate limits.
    /// Default: `1`
    #[serde(default = "default_pacing")]
    pub pacing_seconds: u64,

    /// Directory for per-experiment result CSVs. When unset, a date-stamped
    /// directory under `results/` is derived from the run.
    #[serde(default)]
    pub result_dir: Option<String>,
}

/// Settings for the retry schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt.
    /// Default: `5`
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay before the exponential schedule is applied, in milliseconds.
    /// Default: `2000`
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Multiplier applied per retry.
    /// Default: `2.0`
    #[serde(default = "default_exponential_base")]
    pub exponential_base: f64,

    /// Whether to jitter each delay by a uniform factor in `[0.5, 1.5)`.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub jitter: bool,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`, `compact`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default trait implementations linking to custom logic

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            experiments: default_experiments(),
            turns: default_turns(),
            questions: default_questions(),
            document_path: default_document_path(),
            system_prompt: default_system_prompt(),
            cache_strategy: default_cache_strategy(),
            cache_window: default_cache_window(),
            streaming: true,
            pacing_seconds: default_pacing(),
            result_dir: None,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            exponential_base: default_exponential_base(),
            jitter: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Helper functions for serde defaults and shared constants

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_model() -> String {
    "claude-3-7-sonnet-20250219".to_string()
}

fn default_max_tokens() -> u32 {
    256
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout() -> u64 {
    300
}

fn default_experiments() -> u32 {
    10
}

fn default_turns() -> u32 {
    10
}

fn default_questions() -> Vec<String> {
    [
        "Please summarize the storyline of the play.",
        "Who are the main characters in the tragedy?",
        "Why are the Montagues and Capulets in conflict with each other?",
        "What role does the Nurse play in Juliet's life?",
        "How does Romeo respond after killing Tybalt?",
        "What advice does Friar Lawrence give to Romeo after his banishment?",
        "Why does Paris visit the Capulet tomb in the final scene?",
        "What message fails to reach Romeo and what are the consequences?",
        "How do the parents react to finding their children dead?",
        "What reconciliation occurs between the families at the end of the play?",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_document_path() -> String {
    "RomeoAndJuliet.txt".to_string()
}

fn default_system_prompt() -> String {
    "You are a helpful assistant that answers questions concisely.".to_string()
}

fn default_cache_strategy() -> String {
    "window".to_string()
}

fn default_cache_window() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_pacing() -> u64 {
    1
}

fn default_max_retries() -> u32 {
    5
}

fn default_initial_delay_ms() -> u64 {
    2000
}

fn default_exponential_base() -> f64 {
    2.0
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

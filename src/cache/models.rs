// Caching strategy selection

use crate::config::BenchmarkConfig;
use crate::error::{BenchError, Result};

/// Capacity of the sliding marker window unless configured otherwise.
pub const DEFAULT_CACHE_WINDOW: usize = 4;

/// How cache markers are placed across the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// No cache markers anywhere; the provider caches nothing.
    Disabled,

    /// The outgoing turn is marked, but the copy committed to history is
    /// stripped, so exactly one marker travels with every request.
    LatestTurn,

    /// Markers persist in committed history, bounded by a FIFO window: once
    /// `capacity` turns are marked, the oldest marker is cleared before a new
    /// one is added.
    SlidingWindow { capacity: usize },
}

impl CachePolicy {
    pub fn from_config(config: &BenchmarkConfig) -> Result<Self> {
        match config.cache_strategy.as_str() {
            "none" => Ok(CachePolicy::Disabled),
            "latest" => Ok(CachePolicy::LatestTurn),
            "window" => {
                if config.cache_window == 0 {
                    return Err(BenchError::Config(
                        "cache_window must be at least 1 for the 'window' strategy".to_string(),
                    ));
                }
                Ok(CachePolicy::SlidingWindow {
                    capacity: config.cache_window,
                })
            }
            other => Err(BenchError::Config(format!(
                "unknown cache strategy '{}' (expected 'window', 'latest' or 'none')",
                other
            ))),
        }
    }

    /// Short name used in default result-directory labels.
    pub fn label(&self) -> &'static str {
        match self {
            CachePolicy::Disabled => "nocache",
            CachePolicy::LatestTurn => "latest",
            CachePolicy::SlidingWindow { .. } => "window",
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::SlidingWindow {
            capacity: DEFAULT_CACHE_WINDOW,
        }
    }
}

//! Normalized token-usage accounting.
//!
//! Provider bindings disagree on the shape of usage metrics: the Messages API
//! reports snake_case fields (`input_tokens`, `cache_creation_input_tokens`),
//! while the Bedrock Converse binding reports camelCase fields
//! (`inputTokens`, `cacheWriteInputTokens`). Both deserialize into this one
//! value type; everything downstream of the wire layer sees a single shape.

use serde::{Deserialize, Serialize};

/// Token counts for one completed invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens processed outside the cache.
    #[serde(default, alias = "inputTokens")]
    pub input_tokens: u32,

    /// Output tokens generated.
    #[serde(default, alias = "outputTokens")]
    pub output_tokens: u32,

    /// Input tokens written to the provider-side cache.
    #[serde(default, alias = "cacheWriteInputTokens")]
    pub cache_creation_input_tokens: u32,

    /// Input tokens served from the provider-side cache.
    #[serde(default, alias = "cacheReadInputTokens")]
    pub cache_read_input_tokens: u32,
}

impl TokenUsage {
    /// Fold a later, possibly partial usage report over this one. Streaming
    /// responses seed counts at `message_start` and refine them in trailing
    /// events; a field is only taken when the update actually carries it.
    pub fn absorb(&mut self, update: TokenUsage) {
        if update.input_tokens != 0 {
            self.input_tokens = update.input_tokens;
        }
        if update.output_tokens != 0 {
            self.output_tokens = update.output_tokens;
        }
        if update.cache_creation_input_tokens != 0 {
            self.cache_creation_input_tokens = update.cache_creation_input_tokens;
        }
        if update.cache_read_input_tokens != 0 {
            self.cache_read_input_tokens = update.cache_read_input_tokens;
        }
    }
}

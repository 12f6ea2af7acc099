//! Anthropic Messages API type definitions.
//!
//! Request and response structures for the [Messages API](https://docs.anthropic.com/en/api/messages),
//! reduced to the text-only surface the benchmark exercises. Cache markers
//! (`cache_control`) ride on individual text segments.

use crate::models::usage::TokenUsage;
use serde::{Deserialize, Serialize};

/// Anthropic Messages API request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesRequest {
    /// The model that will complete the prompt.
    pub model: String,

    /// Conversation history plus the current user turn.
    pub messages: Vec<Message>,

    /// System prompt blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemPrompt>,

    /// The maximum number of tokens to generate before stopping.
    pub max_tokens: u32,

    /// Amount of randomness injected into the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Whether to stream the response as server-sent events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// System prompt: a plain string or structured blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SystemPrompt {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// Conversational role of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single message in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content,
        }
    }

    /// An assistant reply holding a single unmarked text segment.
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// Strip every cache marker from this message in place.
    pub fn clear_cache_markers(&mut self) {
        for block in &mut self.content {
            let ContentBlock::Text { cache_control, .. } = block;
            *cache_control = None;
        }
    }

    pub fn has_cache_marker(&self) -> bool {
        self.content.iter().any(|block| {
            let ContentBlock::Text { cache_control, .. } = block;
            cache_control.is_some()
        })
    }
}

/// Content block types. The benchmark only ever sends and receives text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        cache_control: Option<CacheControl>,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text {
            text: text.into(),
            cache_control: None,
        }
    }

    /// A text segment flagged for provider-side caching.
    pub fn cached_text(text: impl Into<String>) -> Self {
        ContentBlock::Text {
            text: text.into(),
            cache_control: Some(CacheControl::ephemeral()),
        }
    }

    pub fn as_text(&self) -> &str {
        let ContentBlock::Text { text, .. } = self;
        text
    }
}

/// Cache control annotation for prompt caching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheControl {
    /// Cache type (currently only "ephemeral").
    #[serde(rename = "type")]
    pub cache_type: String,
}

impl CacheControl {
    pub fn ephemeral() -> Self {
        Self {
            cache_type: "ephemeral".to_string(),
        }
    }
}

/// Anthropic Messages API response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    /// Unique object identifier.
    pub id: String,

    /// Object type (always "message").
    #[serde(rename = "type")]
    pub response_type: String,

    /// Conversational role of the generated message.
    pub role: Role,

    /// Content generated by the model.
    pub content: Vec<ContentBlock>,

    /// The model that handled the request.
    pub model: String,

    /// The reason why the model stopped generating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,

    /// The sequence that caused the model to stop (if applicable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequence: Option<String>,

    /// Billing and rate-limit usage.
    pub usage: TokenUsage,
}

impl MessagesResponse {
    /// Concatenated text of every content block.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|block| block.as_text())
            .collect::<Vec<_>>()
            .join("")
    }
}

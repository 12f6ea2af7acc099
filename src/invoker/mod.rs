//! Invocation of the Messages API under a bounded retry policy.
//!
//! Each turn is one invocation: Idle → Attempting → {Success | Backoff →
//! Attempting | Exhausted}. Buffered mode issues a single blocking call and
//! reads usage off the complete response; streaming mode consumes the event
//! sequence in a single pass, recording the arrival of the first content
//! block as time-to-first-token and concatenating text deltas into the reply.

use crate::anthropic::AnthropicClient;
use crate::error::{BenchError, Result};
use crate::models::{Delta, MessagesRequest, StreamEvent, TokenUsage};
use crate::utils::retry::{with_retry, RetryPolicy};
use futures::Stream;
use std::time::{Duration, Instant};

/// Whether to use the blocking or the streaming call shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMode {
    Buffered,
    Streaming,
}

/// Measurements from one completed call. Produced exactly once per success,
/// never mutated afterwards.
#[derive(Debug, Clone, Copy)]
pub struct InvocationMetrics {
    pub usage: TokenUsage,
    /// Wall-clock time from request start to the last byte.
    pub latency: Duration,
    /// Time from request start to the first content block; only observable
    /// when streaming.
    pub ttft: Option<Duration>,
}

/// Reply text plus measurements for one completed call.
#[derive(Debug, Clone)]
pub struct InvocationOutcome {
    pub text: String,
    pub metrics: InvocationMetrics,
}

/// Wraps the API client with the retry schedule and the chosen call shape.
pub struct ResilientInvoker {
    client: AnthropicClient,
    policy: RetryPolicy,
    mode: InvocationMode,
}

impl ResilientInvoker {
    pub fn new(client: AnthropicClient, policy: RetryPolicy, mode: InvocationMode) -> Self {
        Self {
            client,
            policy,
            mode,
        }
    }

    /// Execute one turn's call, retrying retryable failures per the policy.
    /// Fails with [`BenchError::ExhaustedRetries`] once `max_retries`
    /// consecutive retries have failed.
    pub async fn invoke(&self, request: &MessagesRequest) -> Result<InvocationOutcome> {
        with_retry(&self.policy, "Messages call", || self.attempt(request)).await
    }

    async fn attempt(&self, request: &MessagesRequest) -> Result<InvocationOutcome> {
        let started = Instant::now();

        match self.mode {
            InvocationMode::Buffered => {
                let mut request = request.clone();
                request.stream = None;

                let response = self.client.create_message(&request).await?;
                Ok(InvocationOutcome {
                    text: response.text(),
                    metrics: InvocationMetrics {
                        usage: response.usage,
                        latency: started.elapsed(),
                        ttft: None,
                    },
                })
            }
            InvocationMode::Streaming => {
                let mut request = request.clone();
                request.stream = Some(true);

                let events = self.client.stream_message(&request).await?;
                let reduced = reduce_stream(events, started).await?;
                Ok(InvocationOutcome {
                    text: reduced.text,
                    metrics: InvocationMetrics {
                        usage: reduced.usage,
                        latency: started.elapsed(),
                        ttft: reduced.ttft,
                    },
                })
            }
        }
    }
}

/// Accumulated result of a fully drained event stream.
#[derive(Debug, Default)]
pub struct StreamReduction {
    pub text: String,
    pub usage: TokenUsage,
    pub ttft: Option<Duration>,
}

/// Single-pass reducer over a finite, non-restartable event sequence.
/// `message_start` seeds the token counts; trailing `message_delta` /
/// `message_stop` usage (either provider shape) is folded over them.
pub async fn reduce_stream<S>(events: S, started: Instant) -> Result<StreamReduction>
where
    S: Stream<Item = Result<StreamEvent>>,
{
    use futures::StreamExt;

    futures::pin_mut!(events);
    let mut reduction = StreamReduction::default();

    while let Some(event) = events.next().await {
        match event? {
            StreamEvent::MessageStart { message } => {
                reduction.usage = message.usage;
            }
            StreamEvent::ContentBlockStart { .. } => {
                if reduction.ttft.is_none() {
                    reduction.ttft = Some(started.elapsed());
                }
            }
            StreamEvent::ContentBlockDelta {
                delta: Delta::TextDelta { text },
                ..
            } => {
                reduction.text.push_str(&text);
            }
            StreamEvent::MessageDelta {
                usage: Some(update),
                ..
            } => {
                reduction.usage.absorb(update);
            }
            StreamEvent::MessageStop {
                usage: Some(update),
            } => {
                reduction.usage.absorb(update);
            }
            StreamEvent::Error { error } => {
                return Err(match error.error_type.as_str() {
                    "overloaded_error" => BenchError::Overloaded(error.message),
                    "rate_limit_error" => BenchError::TooManyRequests(error.message),
                    _ => BenchError::Stream(format!("{}: {}", error.error_type, error.message)),
                });
            }
            _ => {}
        }
    }

    Ok(reduction)
}

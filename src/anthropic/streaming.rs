// SSE parsing for Messages API streams

use crate::error::{BenchError, Result};
use crate::models::StreamEvent;
use bytes::Bytes;
use futures::stream::Stream;
use tracing::{debug, warn};

/// Parse an SSE byte stream into Messages API events.
pub fn parse_sse_stream<S>(byte_stream: S) -> impl Stream<Item = Result<StreamEvent>> + Send
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    use futures::StreamExt;

    async_stream::stream! {
        let mut buffer = String::new();

        futures::pin_mut!(byte_stream);

        while let Some(chunk_result) = byte_stream.next().await {
            match chunk_result {
                Ok(chunk) => {
                    buffer.push_str(&String::from_utf8_lossy(&chunk));

                    // Process complete events (terminated by \n\n)
                    while let Some(event_end) = buffer.find("\n\n") {
                        let event_data = buffer[..event_end].to_string();
                        buffer = buffer[event_end + 2..].to_string();

                        if let Some(event) = parse_sse_event(&event_data) {
                            yield Ok(event);
                        }
                    }
                }
                Err(e) => {
                    warn!("Stream error: {}", e);
                    yield Err(BenchError::Http(e));
                    break;
                }
            }
        }

        // Handle a final event without a trailing \n\n
        if !buffer.trim().is_empty() {
            if let Some(event) = parse_sse_event(&buffer) {
                yield Ok(event);
            }
        }

        debug!("Messages API stream ended");
    }
}

/// Parse a single SSE event into a StreamEvent. The event name line is
/// redundant with the `type` field in the data payload, so only the data
/// line is consulted.
fn parse_sse_event(event_data: &str) -> Option<StreamEvent> {
    let mut data_line = None;
    for line in event_data.lines() {
        if let Some(data) = line.strip_prefix("data:") {
            data_line = Some(data.trim());
            break;
        }
    }

    let data = data_line?;
    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    match serde_json::from_str::<StreamEvent>(data) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Failed to parse SSE event: {}", e);
            debug!("Raw data: {}", data.chars().take(200).collect::<String>());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sse_event() {
        let event = "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\" Verona\"}}";
        let result = parse_sse_event(event);
        assert!(matches!(
            result,
            Some(StreamEvent::ContentBlockDelta { .. })
        ));
    }

    #[test]
    fn test_parse_sse_event_no_data() {
        assert!(parse_sse_event("event: ping").is_none());
        assert!(parse_sse_event("data: [DONE]").is_none());
    }

    #[tokio::test]
    async fn test_event_split_across_chunks() {
        use futures::StreamExt;

        let chunks: Vec<reqwest::Result<Bytes>> = vec![
            Ok(Bytes::from_static(
                b"event: message_stop\ndata: {\"type\":\"mess",
            )),
            Ok(Bytes::from_static(b"age_stop\"}\n\n")),
        ];
        let events: Vec<_> = parse_sse_stream(futures::stream::iter(chunks))
            .collect()
            .await;

        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Ok(StreamEvent::MessageStop { usage: None })
        ));
    }
}

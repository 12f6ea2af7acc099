// Messages API client behavior against a mock server

use cachebench::anthropic::AnthropicClient;
use cachebench::config::ApiConfig;
use cachebench::error::BenchError;
use cachebench::invoker::{InvocationMode, ResilientInvoker};
use cachebench::models::{ContentBlock, Message, MessagesRequest};
use cachebench::utils::retry::RetryPolicy;
use std::time::Duration;

fn api_config(base_url: String) -> ApiConfig {
    ApiConfig {
        base_url,
        api_key: Some("test-key".to_string()),
        timeout_seconds: 5,
        ..ApiConfig::default()
    }
}

fn request() -> MessagesRequest {
    MessagesRequest {
        model: "claude-3-7-sonnet-20250219".to_string(),
        messages: vec![Message::user(vec![ContentBlock::cached_text(
            "Please summarize the storyline. ",
        )])],
        system: None,
        max_tokens: 256,
        temperature: Some(0.7),
        stream: None,
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        initial_delay: Duration::from_millis(1),
        exponential_base: 2.0,
        jitter: false,
    }
}

const RESPONSE_BODY: &str = r#"{
    "id": "msg_01",
    "type": "message",
    "role": "assistant",
    "content": [{"type": "text", "text": "Two households, both alike in dignity."}],
    "model": "claude-3-7-sonnet-20250219",
    "stop_reason": "end_turn",
    "usage": {
        "input_tokens": 61,
        "output_tokens": 12,
        "cache_creation_input_tokens": 19000,
        "cache_read_input_tokens": 0
    }
}"#;

#[tokio::test]
async fn test_buffered_call_parses_response_and_usage() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "test-key")
        .match_header("anthropic-version", "2023-06-01")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(RESPONSE_BODY)
        .create_async()
        .await;

    let client = AnthropicClient::new(&api_config(server.url())).unwrap();
    let response = client.create_message(&request()).await.unwrap();

    assert_eq!(response.text(), "Two households, both alike in dignity.");
    assert_eq!(response.usage.input_tokens, 61);
    assert_eq!(response.usage.cache_creation_input_tokens, 19000);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_invoker_records_latency_without_ttft_when_buffered() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_body(RESPONSE_BODY)
        .create_async()
        .await;

    let client = AnthropicClient::new(&api_config(server.url())).unwrap();
    let invoker = ResilientInvoker::new(client, fast_policy(), InvocationMode::Buffered);
    let outcome = invoker.invoke(&request()).await.unwrap();

    assert_eq!(outcome.text, "Two households, both alike in dignity.");
    assert_eq!(outcome.metrics.usage.output_tokens, 12);
    assert_eq!(outcome.metrics.ttft, None);
    assert!(outcome.metrics.latency > Duration::ZERO);
}

#[tokio::test]
async fn test_streaming_invocation_measures_ttft() {
    let sse_body = concat!(
        "event: message_start\n",
        "data: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_01\",\"type\":\"message\",\"role\":\"assistant\",\"content\":[],\"model\":\"claude-3-7-sonnet-20250219\",\"stop_reason\":null,\"stop_sequence\":null,\"usage\":{\"input_tokens\":61,\"output_tokens\":1,\"cache_read_input_tokens\":19000}}}\n",
        "\n",
        "event: content_block_start\n",
        "data: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}\n",
        "\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"In fair Verona\"}}\n",
        "\n",
        "event: message_delta\n",
        "data: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\",\"stop_sequence\":null},\"usage\":{\"output_tokens\":4}}\n",
        "\n",
        "event: message_stop\n",
        "data: {\"type\":\"message_stop\"}\n",
        "\n",
    );

    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body)
        .create_async()
        .await;

    let client = AnthropicClient::new(&api_config(server.url())).unwrap();
    let invoker = ResilientInvoker::new(client, fast_policy(), InvocationMode::Streaming);
    let outcome = invoker.invoke(&request()).await.unwrap();

    assert_eq!(outcome.text, "In fair Verona");
    assert_eq!(outcome.metrics.usage.input_tokens, 61);
    assert_eq!(outcome.metrics.usage.output_tokens, 4);
    assert_eq!(outcome.metrics.usage.cache_read_input_tokens, 19000);
    let ttft = outcome.metrics.ttft.expect("streaming must observe TTFT");
    assert!(ttft <= outcome.metrics.latency);
}

#[tokio::test]
async fn test_server_errors_retry_until_exhausted() {
    let policy = fast_policy();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .with_status(503)
        .with_body(r#"{"type":"error","error":{"type":"overloaded_error","message":"busy"}}"#)
        .expect(policy.max_retries as usize + 1)
        .create_async()
        .await;

    let client = AnthropicClient::new(&api_config(server.url())).unwrap();
    let invoker = ResilientInvoker::new(client, policy, InvocationMode::Buffered);
    let result = invoker.invoke(&request()).await;

    match result {
        Err(BenchError::ExhaustedRetries { attempts, .. }) => {
            assert_eq!(attempts, policy.max_retries + 1);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_client_errors_fail_fast() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .with_status(400)
        .with_body(
            r#"{"type":"error","error":{"type":"invalid_request_error","message":"max_tokens required"}}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let client = AnthropicClient::new(&api_config(server.url())).unwrap();
    let invoker = ResilientInvoker::new(client, fast_policy(), InvocationMode::Buffered);
    let result = invoker.invoke(&request()).await;

    match result {
        Err(BenchError::Api { status, message }) => {
            assert_eq!(status, 400);
            assert!(message.contains("max_tokens required"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
    mock.assert_async().await;
}

// Messages API client

mod client;
mod streaming;

pub use client::AnthropicClient;
pub use streaming::parse_sse_stream;

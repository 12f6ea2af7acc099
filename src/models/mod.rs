// Wire models for the Messages API

pub mod anthropic;
pub mod streaming;
pub mod usage;

pub use anthropic::*;
pub use streaming::*;
pub use usage::TokenUsage;

// cachebench - prompt-cache benchmark harness for Anthropic-style Messages APIs

pub mod analysis;
pub mod anthropic;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod invoker;
pub mod models;
pub mod runner;
pub mod sink;
pub mod utils;

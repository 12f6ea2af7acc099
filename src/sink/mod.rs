//! Append-only CSV result sink.
//!
//! One file per experiment, one row per turn. Rows are flushed as they are
//! written so completed turns survive an aborted run.

use crate::error::Result;
use crate::invoker::InvocationMetrics;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// One turn's metrics as persisted to CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub experiment: u32,
    pub turn: u32,
    pub question: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cache_creation_input_tokens: u32,
    pub cache_read_input_tokens: u32,
    /// Wall-clock invocation latency in seconds.
    pub invocation_latency: f64,
    /// Time-to-first-token in seconds; empty for buffered runs.
    pub ttft: Option<f64>,
}

impl TurnRecord {
    pub fn new(
        experiment: u32,
        turn: u32,
        question: impl Into<String>,
        metrics: &InvocationMetrics,
    ) -> Self {
        Self {
            experiment,
            turn,
            question: question.into(),
            input_tokens: metrics.usage.input_tokens,
            output_tokens: metrics.usage.output_tokens,
            cache_creation_input_tokens: metrics.usage.cache_creation_input_tokens,
            cache_read_input_tokens: metrics.usage.cache_read_input_tokens,
            invocation_latency: metrics.latency.as_secs_f64(),
            ttft: metrics.ttft.map(|d| d.as_secs_f64()),
        }
    }

    /// Latency spent generating after the first token arrived.
    pub fn generation_time(&self) -> Option<f64> {
        self.ttft.map(|ttft| self.invocation_latency - ttft)
    }
}

/// CSV writer for one experiment's turn records.
pub struct CsvSink {
    writer: csv::Writer<File>,
}

impl CsvSink {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self {
            writer: csv::Writer::from_path(path)?,
        })
    }

    /// Serialize one record and flush it to disk.
    pub fn append(&mut self, record: &TurnRecord) -> Result<()> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        Ok(())
    }
}

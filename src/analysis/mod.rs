//! Post-processing of benchmark result directories.
//!
//! Each result directory holds the per-experiment CSVs of one strategy run.
//! Analysis reloads them, aggregates per turn (mean and standard deviation)
//! and reports percentage differences of every directory against the first,
//! the baseline. Chart rendering is left to external tooling; the aggregate
//! table can be exported as a summary CSV for it.

use crate::error::{BenchError, Result};
use crate::sink::TurnRecord;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// A metric derivable from a turn record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    InvocationLatency,
    Ttft,
    GenerationTime,
    MsPerToken,
    CacheCreationTokens,
    CacheReadTokens,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::InvocationLatency,
        Metric::Ttft,
        Metric::GenerationTime,
        Metric::MsPerToken,
        Metric::CacheCreationTokens,
        Metric::CacheReadTokens,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::InvocationLatency => "Invocation Latency",
            Metric::Ttft => "TTFT",
            Metric::GenerationTime => "Generation Time",
            Metric::MsPerToken => "Milliseconds per token",
            Metric::CacheCreationTokens => "Cache Creation Tokens",
            Metric::CacheReadTokens => "Cache Read Tokens",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::InvocationLatency | Metric::Ttft | Metric::GenerationTime => "s",
            Metric::MsPerToken => "ms/tok",
            Metric::CacheCreationTokens | Metric::CacheReadTokens => "tokens",
        }
    }

    /// Extract this metric from a record, where observable. TTFT-derived
    /// metrics are absent in buffered runs; the per-token rate is undefined
    /// for non-positive generation time.
    pub fn of(&self, record: &TurnRecord) -> Option<f64> {
        match self {
            Metric::InvocationLatency => Some(record.invocation_latency),
            Metric::Ttft => record.ttft,
            Metric::GenerationTime => record.generation_time(),
            Metric::MsPerToken => {
                let generation_time = record.generation_time()?;
                if generation_time <= 0.0 || record.output_tokens == 0 {
                    return None;
                }
                Some(generation_time / record.output_tokens as f64 * 1000.0)
            }
            Metric::CacheCreationTokens => Some(record.cache_creation_input_tokens as f64),
            Metric::CacheReadTokens => Some(record.cache_read_input_tokens as f64),
        }
    }
}

/// Mean and spread of one metric at one turn position across experiments.
#[derive(Debug, Clone)]
pub struct TurnStats {
    pub turn: u32,
    pub samples: usize,
    pub mean: f64,
    pub std_dev: f64,
}

/// All records of one strategy run, labeled by its directory name.
#[derive(Debug, Clone)]
pub struct StrategyRuns {
    pub label: String,
    pub records: Vec<TurnRecord>,
}

impl StrategyRuns {
    pub fn load(dir: &Path) -> Result<Self> {
        let label = dir
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| dir.display().to_string());
        Ok(Self {
            label,
            records: load_dir(dir)?,
        })
    }
}

/// Read every `*.csv` in a result directory.
pub fn load_dir(dir: &Path) -> Result<Vec<TurnRecord>> {
    let mut records = Vec::new();
    let mut csv_files = 0usize;

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(false, |ext| ext == "csv") {
            csv_files += 1;
            let mut reader = csv::Reader::from_path(&path)?;
            for row in reader.deserialize::<TurnRecord>() {
                records.push(row?);
            }
        }
    }

    if csv_files == 0 {
        return Err(BenchError::Analysis(format!(
            "no CSV files found in {}",
            dir.display()
        )));
    }
    Ok(records)
}

/// Group a metric by turn and aggregate.
pub fn per_turn_stats(records: &[TurnRecord], metric: Metric) -> Vec<TurnStats> {
    let mut by_turn: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for record in records {
        if let Some(value) = metric.of(record) {
            by_turn.entry(record.turn).or_default().push(value);
        }
    }

    by_turn
        .into_iter()
        .map(|(turn, values)| TurnStats {
            turn,
            samples: values.len(),
            mean: mean(&values),
            std_dev: std_dev(&values),
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Relative difference in percent, undefined for a zero baseline.
pub fn percent_diff(base: f64, value: f64) -> Option<f64> {
    if base == 0.0 {
        return None;
    }
    Some((value - base) / base * 100.0)
}

/// Render per-turn comparison tables for every metric, baseline first.
pub fn render_comparison(
    baseline: &StrategyRuns,
    others: &[StrategyRuns],
    out: &mut dyn Write,
) -> Result<()> {
    writeln!(out, "Baseline: {}", baseline.label)?;

    for metric in Metric::ALL {
        let base_stats = per_turn_stats(&baseline.records, metric);
        if base_stats.is_empty() {
            continue;
        }

        writeln!(out)?;
        writeln!(out, "--- {} ({}) ---", metric.name(), metric.unit())?;
        write!(out, "Turn | {:>24}", baseline.label)?;
        for other in others {
            write!(out, " | {:>34}", other.label)?;
        }
        writeln!(out)?;

        let other_stats: Vec<Vec<TurnStats>> = others
            .iter()
            .map(|runs| per_turn_stats(&runs.records, metric))
            .collect();

        let mut overall_diffs: Vec<Vec<f64>> = vec![Vec::new(); others.len()];

        for base in &base_stats {
            write!(out, "{:4} | {:>24.3}", base.turn, base.mean)?;
            for (column, stats) in other_stats.iter().enumerate() {
                match stats.iter().find(|s| s.turn == base.turn) {
                    Some(stat) => {
                        match percent_diff(base.mean, stat.mean) {
                            Some(diff) => {
                                overall_diffs[column].push(diff);
                                write!(out, " | {:>22.3} ({:+7.1}%)", stat.mean, diff)?;
                            }
                            None => write!(out, " | {:>22.3} ({:>8})", stat.mean, "n/a")?,
                        };
                    }
                    None => write!(out, " | {:>34}", "n/a")?,
                }
            }
            writeln!(out)?;
        }

        for (other, diffs) in others.iter().zip(&overall_diffs) {
            if !diffs.is_empty() {
                writeln!(
                    out,
                    "  {} vs {}: {:+.2}% average",
                    other.label,
                    baseline.label,
                    mean(diffs)
                )?;
            }
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    strategy: &'a str,
    metric: &'static str,
    turn: u32,
    samples: usize,
    mean: f64,
    std_dev: f64,
}

/// Write the per-turn aggregates of every run as one flat CSV, for external
/// plotting tools.
pub fn write_summary_csv(runs: &[&StrategyRuns], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for run in runs {
        for metric in Metric::ALL {
            for stat in per_turn_stats(&run.records, metric) {
                writer.serialize(SummaryRow {
                    strategy: &run.label,
                    metric: metric.name(),
                    turn: stat.turn,
                    samples: stat.samples,
                    mean: stat.mean,
                    std_dev: stat.std_dev,
                })?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// Entry point for the `analyze` subcommand.
pub fn run(
    baseline_dir: &Path,
    other_dirs: &[std::path::PathBuf],
    summary: Option<&Path>,
) -> Result<()> {
    let baseline = StrategyRuns::load(baseline_dir)?;
    let others = other_dirs
        .iter()
        .map(|dir| StrategyRuns::load(dir))
        .collect::<Result<Vec<_>>>()?;

    let stdout = std::io::stdout();
    render_comparison(&baseline, &others, &mut stdout.lock())?;

    if let Some(path) = summary {
        let mut all: Vec<&StrategyRuns> = vec![&baseline];
        all.extend(others.iter());
        write_summary_csv(&all, path)?;
    }
    Ok(())
}

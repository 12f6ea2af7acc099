// CLI surface for cachebench

use crate::config::AppConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cachebench - prompt-cache benchmark harness for Anthropic-style Messages APIs
#[derive(Parser, Debug)]
#[command(name = "cachebench", version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the benchmark experiments
    Run {
        /// Number of conversations to run
        #[arg(long)]
        experiments: Option<u32>,

        /// Turns per conversation
        #[arg(long)]
        turns: Option<u32>,

        /// Caching strategy: window, latest or none
        #[arg(long)]
        strategy: Option<String>,

        /// Use the blocking call shape (no time-to-first-token measurement)
        #[arg(long)]
        buffered: bool,

        /// Path to the document injected into the first turn
        #[arg(long)]
        document: Option<PathBuf>,

        /// Directory for the result CSVs
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Compare result directories against a baseline
    Analyze {
        /// Baseline result directory
        baseline: PathBuf,

        /// Result directories to compare against the baseline
        dirs: Vec<PathBuf>,

        /// Also write per-turn aggregates to this CSV
        #[arg(long)]
        summary: Option<PathBuf>,
    },
}

impl Command {
    /// Apply `run` flag overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Command::Run {
            experiments,
            turns,
            strategy,
            buffered,
            document,
            out,
        } = self
        {
            if let Some(experiments) = experiments {
                config.benchmark.experiments = *experiments;
            }
            if let Some(turns) = turns {
                config.benchmark.turns = *turns;
            }
            if let Some(strategy) = strategy {
                config.benchmark.cache_strategy = strategy.clone();
            }
            if *buffered {
                config.benchmark.streaming = false;
            }
            if let Some(document) = document {
                config.benchmark.document_path = document.to_string_lossy().to_string();
            }
            if let Some(out) = out {
                config.benchmark.result_dir = Some(out.to_string_lossy().to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_overrides() {
        let args = Args::parse_from([
            "cachebench",
            "run",
            "--experiments",
            "3",
            "--turns",
            "6",
            "--strategy",
            "latest",
            "--buffered",
        ]);

        let mut config = AppConfig::default();
        args.command.apply_overrides(&mut config);

        assert_eq!(config.benchmark.experiments, 3);
        assert_eq!(config.benchmark.turns, 6);
        assert_eq!(config.benchmark.cache_strategy, "latest");
        assert!(!config.benchmark.streaming);
    }

    #[test]
    fn test_analyze_parses_dirs() {
        let args = Args::parse_from(["cachebench", "analyze", "base_dir", "other_a", "other_b"]);
        match args.command {
            Command::Analyze { baseline, dirs, .. } => {
                assert_eq!(baseline, PathBuf::from("base_dir"));
                assert_eq!(dirs.len(), 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}

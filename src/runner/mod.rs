//! The experiment loop.
//!
//! Experiments run strictly sequentially; each turn depends on the previous
//! turn's reply, so there is exactly one call outstanding at any time. A
//! failed turn (after retries) aborts the run; experiments already flushed
//! to CSV are preserved.

use crate::anthropic::AnthropicClient;
use crate::cache::{CachePolicy, ConversationCache};
use crate::config::AppConfig;
use crate::error::{BenchError, Result};
use crate::invoker::{InvocationMode, ResilientInvoker};
use crate::models::{ContentBlock, MessagesRequest, SystemPrompt};
use crate::sink::{CsvSink, TurnRecord};
use crate::utils::retry::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Run the configured experiments. Returns the directory the result CSVs
/// were written to.
pub async fn run(config: &AppConfig) -> Result<PathBuf> {
    let policy = CachePolicy::from_config(&config.benchmark)?;
    if config.benchmark.questions.is_empty() {
        return Err(BenchError::Config("questions list is empty".to_string()));
    }

    let document = std::fs::read_to_string(&config.benchmark.document_path)?;
    let result_dir = resolve_result_dir(config, policy);
    std::fs::create_dir_all(&result_dir)?;

    let client = AnthropicClient::new(&config.api)?;
    let mode = if config.benchmark.streaming {
        InvocationMode::Streaming
    } else {
        InvocationMode::Buffered
    };
    let invoker = ResilientInvoker::new(client, RetryPolicy::from_config(&config.retry), mode);

    info!(
        "Benchmarking {} with strategy '{}', writing to {}",
        config.api.model,
        policy.label(),
        result_dir.display()
    );

    for experiment in 0..config.benchmark.experiments {
        info!(
            "Running experiment {}/{}",
            experiment + 1,
            config.benchmark.experiments
        );

        let mut conversation = ConversationCache::new(policy);
        let csv_path = result_dir.join(format!("cache_experiment_results_{}.csv", experiment));
        let mut sink = CsvSink::create(&csv_path)?;

        for turn in 0..config.benchmark.turns {
            let questions = &config.benchmark.questions;
            let question = &questions[turn as usize % questions.len()];
            info!("  Turn {}/{}: {}", turn + 1, config.benchmark.turns, question);

            let turn_request = conversation.build_request(
                turn as usize,
                question,
                (turn == 0).then_some(document.as_str()),
            );
            let request = MessagesRequest {
                model: config.api.model.clone(),
                messages: turn_request.messages,
                system: Some(SystemPrompt::Blocks(vec![ContentBlock::text(
                    config.benchmark.system_prompt.as_str(),
                )])),
                max_tokens: config.api.max_tokens,
                temperature: Some(config.api.temperature),
                stream: None,
            };

            let outcome = invoker.invoke(&request).await?;
            conversation.commit(turn_request.user_turn, &outcome.text);

            sink.append(&TurnRecord::new(
                experiment + 1,
                turn + 1,
                question.clone(),
                &outcome.metrics,
            ))?;

            if config.benchmark.pacing_seconds > 0 && turn + 1 < config.benchmark.turns {
                tokio::time::sleep(Duration::from_secs(config.benchmark.pacing_seconds)).await;
            }
        }
    }

    Ok(result_dir)
}

fn resolve_result_dir(config: &AppConfig, policy: CachePolicy) -> PathBuf {
    match &config.benchmark.result_dir {
        Some(dir) => PathBuf::from(dir),
        None => {
            let date = chrono::Local::now().format("%y%m%d");
            PathBuf::from("results").join(format!("{}_{}", date, policy.label()))
        }
    }
}

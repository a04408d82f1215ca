// SPDX-License-Identifier: MIT OR Apache-2.0

//! FireHose command line client.
//!
//! Connects to every configured instance and prints matching posts as they
//! arrive. Each line typed on stdin replaces the active filter; an empty line
//! disables filtering.
//!
//! ```bash
//! # Default instance list
//! firehose
//!
//! # Custom instances and a starting query
//! firehose --instance fosstodon.org --instance hachyderm.io --query rust
//!
//! # Settings from a file, with reconnection forced on
//! firehose --config firehose.toml --reconnect
//! ```

use clap::Parser;
use firehose::core::config::FireHoseConfig;
use firehose::core::error::FireHoseResult;
use firehose::core::stream::ConsoleSink;
use firehose::FireHoseAggregator;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "firehose")]
#[command(about = "Filtered live feed of public posts from many instances")]
#[command(version)]
struct Cli {
    /// TOML or YAML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Instance hostname to monitor (repeatable, replaces the configured list)
    #[arg(long = "instance", short)]
    instances: Vec<String>,

    /// Initial filter pattern
    #[arg(long, short)]
    query: Option<String>,

    /// Log filter, e.g. "info" or "firehose=debug"
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Reconnect dropped connections with exponential backoff
    #[arg(long)]
    reconnect: bool,
}

fn build_config(cli: &Cli) -> FireHoseResult<FireHoseConfig> {
    let mut config = match &cli.config {
        Some(path) => FireHoseConfig::from_file(path)?,
        None => FireHoseConfig::default(),
    };

    if !cli.instances.is_empty() {
        config.instances = cli.instances.clone();
    }
    if let Some(query) = &cli.query {
        config.initial_query = Some(query.clone());
    }
    if cli.reconnect {
        config.reconnect.enabled = true;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .target(env_logger::Target::Stderr)
        .init();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("firehose: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let stats_interval = config.stats_interval();

    let mut aggregator = match FireHoseAggregator::new(config, Arc::new(ConsoleSink::stdout())) {
        Ok(aggregator) => aggregator,
        Err(e) => {
            eprintln!("firehose: {}", e);
            return ExitCode::FAILURE;
        }
    };
    aggregator.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut ticker = tokio::time::interval(stats_interval);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = aggregator.next_event() => match event {
                Some(event) => aggregator.handle_event(event),
                None => break,
            },
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if let Err(e) = aggregator.set_query(line.trim()) {
                        eprintln!("firehose: {}", e);
                    }
                }
                Ok(None) => stdin_open = false,
                Err(e) => {
                    log::warn!("[firehose] Failed to read stdin: {}", e);
                    stdin_open = false;
                }
            },
            _ = ticker.tick() => {
                eprintln!("{}", aggregator.stats());
                log::debug!("[firehose] {}", aggregator.health().message);
            }
            _ = &mut ctrl_c => {
                log::info!("[firehose] Interrupted");
                break;
            }
        }
    }

    aggregator.shutdown().await;
    eprintln!("{}", aggregator.stats());
    ExitCode::SUCCESS
}

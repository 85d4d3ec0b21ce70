//! CLI entrypoint for Mochi
//!
//! Wires configuration, the provider registry and the fact checker together.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use mochi_core::{fact_index, pick_fact};
use mochi_runtime::{fact_check_prompt, FactChecker, ProviderRegistry, RuntimeConfig, RuntimeError};
use std::path::Path;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

/// Exit code when at least one claim reached no consensus.
const NO_CONSENSUS_EXIT: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    run(cli).await
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Check { claims, show_last } => {
            let config = load_config(cli.config.as_deref())?;
            check(&config, &claims, show_last).await
        }
        Command::Prompt { claim } => {
            println!("{}", fact_check_prompt(&claim));
            Ok(ExitCode::SUCCESS)
        }
        Command::Fallback { claim } => {
            println!("{}: {}", fact_index(&claim), pick_fact(&claim));
            Ok(ExitCode::SUCCESS)
        }
        Command::Providers => {
            for (provider_type, description) in ProviderRegistry::with_defaults().describe() {
                println!("{:<12} {}", provider_type, description);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Logs go to stderr; stdout carries verdicts only.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    match path {
        Some(path) => RuntimeConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(RuntimeConfig::default()),
    }
}

async fn check(config: &RuntimeConfig, claims: &[String], show_last: bool) -> Result<ExitCode> {
    let checker = FactChecker::from_config(config, &ProviderRegistry::with_defaults())
        .context("Failed to set up fact checker")?;

    info!(claims = claims.len(), provider = %config.provider.provider_type, "Checking claims");

    let mut rejected = 0usize;
    for (i, claim) in claims.iter().enumerate() {
        match checker.verify_fact(claim).await {
            Ok(json) => println!("{}", json),
            Err(RuntimeError::NoConsensus(reason)) => {
                rejected += 1;
                eprintln!("claim {}: no consensus ({})", i + 1, reason);
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to check claim {}", i + 1)),
        }
    }

    if show_last {
        println!("{}", checker.get_last_verdict());
    }

    if let Some(usage) = checker.usage() {
        info!(
            llm_calls = usage.llm_calls,
            total_tokens = usage.total_tokens,
            estimated_cost = usage.estimated_cost,
            "Oracle usage"
        );
    }

    if rejected > 0 {
        Ok(ExitCode::from(NO_CONSENSUS_EXIT))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

//! `http-breaker` command line.
//!
//! Drives a single breaker from a TOML configuration: validate the configuration, or
//! push a batch of requests through the breaker and report what the circuit did.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use futures_util::future::join_all;
use reqwest::Method;
use serde::Serialize;

use http_breaker::config::{load_config, validation::validate_config, AppConfig, ConfigError};
use http_breaker::observability::{logging, metrics};
use http_breaker::{Breaker, BreakerError, CircuitSnapshot, RequestOptions};

#[derive(Parser)]
#[command(name = "http-breaker")]
#[command(about = "Send requests through an HTTP circuit breaker", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Base URL, overriding `breaker.url` from the configuration.
    #[arg(short, long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print the effective values
    Check,
    /// Issue requests through one breaker and print a summary
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Request path, joined to the base URL.
    #[arg(short, long, default_value = "/")]
    path: String,

    /// HTTP method.
    #[arg(short, long, default_value = "GET", value_parser = parse_method)]
    method: Method,

    /// Total number of requests.
    #[arg(short = 'n', long, default_value_t = 10)]
    count: usize,

    /// Requests dispatched together before waiting for the batch.
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Pause between batches in milliseconds.
    #[arg(long, default_value_t = 0)]
    interval_ms: u64,
}

#[derive(Debug, Default, Serialize)]
struct RunSummary {
    requests: usize,
    succeeded: usize,
    transport_failures: usize,
    short_circuited: usize,
    circuit: Option<CircuitSnapshot>,
}

fn parse_method(raw: &str) -> Result<Method, String> {
    Method::from_bytes(raw.to_ascii_uppercase().as_bytes()).map_err(|e| e.to_string())
}

fn resolve_config(cli: &Cli) -> Result<AppConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(url) = &cli.url {
        config.breaker.url = Some(url.clone());
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);

    let result = match cli.command {
        Commands::Check => check(&config),
        Commands::Run(args) => run(config, args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "http-breaker failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn check(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn run(config: AppConfig, args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(addr) = &config.observability.metrics_address {
        metrics::init_metrics(addr.parse()?)?;
    }

    let breaker = Breaker::new(config.breaker)?;
    tracing::info!(
        target_url = breaker.base_url(),
        path = %args.path,
        method = %args.method,
        count = args.count,
        "Starting run"
    );

    let mut summary = RunSummary::default();
    let batch_size = args.concurrency.max(1);

    let work = async {
        let mut remaining = args.count;
        while remaining > 0 {
            let batch = remaining.min(batch_size);
            remaining -= batch;

            let handles: Vec<_> = (0..batch)
                .map(|_| breaker.execute(&args.path, args.method.clone(), RequestOptions::new()))
                .collect();

            for result in join_all(handles).await {
                summary.requests += 1;
                match result {
                    Ok(_) => summary.succeeded += 1,
                    Err(BreakerError::OpenCircuit) => summary.short_circuited += 1,
                    Err(_) => summary.transport_failures += 1,
                }
            }

            if remaining > 0 && args.interval_ms > 0 {
                tokio::time::sleep(Duration::from_millis(args.interval_ms)).await;
            }
        }
    };

    tokio::select! {
        _ = work => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, reporting partial results");
        }
    }

    summary.circuit = Some(breaker.snapshot());
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

//! Video migration binary.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use smig_stream::{StreamClient, VideoHost};
use smig_worker::{Cli, Command, Migration, MigrationConfig, RunSummary, WorkerError};

const EXIT_FATAL: u8 = 1;
const EXIT_TASK_FAILURES: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // Install rustls crypto provider (required for TLS/HTTPS)
    let _ = rustls::crypto::ring::default_provider().install_default();

    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_FATAL)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    let command = cli.selected();

    info!(command = %command, "Starting smig");

    let config = match MigrationConfig::from_env(command.needs_remote()) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::from(EXIT_FATAL);
        }
    };
    if let Some(stream) = &config.stream {
        info!("Stream config: {:?}", stream);
    }
    info!("Worker config: {:?}", config.worker);

    let migration = Migration::new(config);

    let result = if command.needs_remote() {
        let client = migration
            .config()
            .stream()
            .and_then(|stream| StreamClient::new(stream.clone()).map_err(WorkerError::from));
        let host: Arc<dyn VideoHost> = match client {
            Ok(c) => Arc::new(c),
            Err(e) => {
                error!("Failed to create stream client: {}", e);
                return ExitCode::from(EXIT_FATAL);
            }
        };

        match command {
            Command::Run => migration.execute(host).await,
            _ => migration.migrate(host).await,
        }
    } else {
        migration.scan().await.map(|rows| RunSummary {
            total: rows,
            ..Default::default()
        })
    };

    match result {
        Ok(summary) => report(&summary),
        Err(e) => fatal(&e),
    }
}

fn init_tracing() {
    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("smig=info,smig_worker=info,smig_catalog=info,smig_queue=info,smig_stream=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

fn report(summary: &RunSummary) -> ExitCode {
    for failed in &summary.failed {
        warn!(row = %failed.row, kind = failed.kind, "Not migrated: {}", failed.error);
    }

    info!(
        total = summary.total,
        completed = summary.completed,
        skipped = summary.skipped,
        failed = summary.failed.len(),
        "smig finished"
    );

    if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_TASK_FAILURES)
    }
}

fn fatal(e: &WorkerError) -> ExitCode {
    error!(kind = e.kind(), "Migration aborted: {}", e);
    if let WorkerError::QueueExists(path) = e {
        error!(
            "Remove {} only if the tree has not been renamed yet; otherwise use `smig run`",
            path.display()
        );
    }
    ExitCode::from(EXIT_FATAL)
}

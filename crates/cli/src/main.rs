mod cli;
mod report;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelpress_core::{
    load_settings, validate_settings, BatchProcessor, ConfigError, ConverterConfig,
    ConverterError, Converter, FfmpegConverter, PostProcessor, ResourcePlan, RunConfiguration,
    RunSummary, SystemRunner, Toolchain,
};

use cli::Cli;

/// Buffer size for the progress channel
const PROGRESS_BUFFER_SIZE: usize = 64;

const EXIT_FAILURE: u8 = 1;
const EXIT_CONFIG: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// Configuration problems exit with 2, everything else with 1.
fn exit_code_for(error: &anyhow::Error) -> u8 {
    let is_config = error.chain().any(|cause| {
        cause.downcast_ref::<ConfigError>().is_some()
            || cause.downcast_ref::<ConverterError>().is_some()
    });
    if is_config {
        EXIT_CONFIG
    } else {
        EXIT_FAILURE
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut settings = load_settings(cli.config.as_deref()).context("Failed to load settings")?;
    if let Some(timeout) = cli.timeout {
        settings.batch.timeout_secs = Some(timeout);
    }
    validate_settings(&settings).context("Invalid settings")?;

    let run_config =
        RunConfiguration::new(&cli.input, &cli.output, cli.cpu_percent, cli.hwaccel.into())?;

    let tools = Toolchain::discover(&settings.tools)?;
    if tools.exiftool.is_none() {
        warn!("exiftool not found; metadata will not be copied for this run");
    }

    let plan = ResourcePlan::for_host(run_config.fraction());
    info!(
        units = plan.total_units,
        workers = plan.workers,
        pools = plan.pools,
        "Resource plan"
    );

    let runner = Arc::new(SystemRunner::new());
    let converter = FfmpegConverter::new(
        ConverterConfig::from_settings(tools.ffmpeg.clone(), &settings),
        Arc::clone(&runner),
    );
    converter
        .validate(run_config.mode())
        .await
        .context("ffmpeg cannot encode in the selected mode")?;
    let finalizer = PostProcessor::new(tools.exiftool.clone(), Arc::clone(&runner));

    let (tx, mut rx) = mpsc::channel(PROGRESS_BUFFER_SIZE);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            report::print_event(&event);
        }
    });

    let processor = BatchProcessor::new(run_config, plan, settings.batch, converter, finalizer)
        .with_progress(tx);

    let outcome = tokio::select! {
        result = processor.run() => Some(result),
        _ = shutdown_signal() => None,
    };

    // Closes the progress channel so the printer drains and exits.
    drop(processor);
    let _ = printer.await;

    let Some(result) = outcome else {
        warn!("Interrupted; partial output and logs were left in place");
        eprintln!("Interrupted");
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    };
    let summary = result.context("Batch failed")?;

    if let Some(path) = &cli.summary_json {
        write_summary(path, &summary).await?;
    }

    if cli.fail_on_error && summary.has_failures() {
        Ok(ExitCode::from(EXIT_FAILURE))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

async fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize summary")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write summary to {}", path.display()))?;
    info!(path = %path.display(), "Wrote run summary");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

//! do-ddns - DigitalOcean dynamic DNS updater.

use anyhow::Context;
use clap::{Parser, Subcommand};
use do_ddns::app;
use do_ddns::config::{self, Config};
use do_ddns::scheduler::{IntervalTimer, Phase, Scheduler};
use do_ddns::DdnsError;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "do-ddns")]
#[command(about = "Keep DigitalOcean A/AAAA records pointed at the current public IP")]
#[command(version)]
struct Cli {
    /// Path to config JSON file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Update records every period until killed (default)
    Run,

    /// Run a single update pass and exit
    Once,

    /// Show managed records and the current public IPs
    Status,
}

/// Process exit codes.
///
/// - 0: clean exit
/// - 1: configuration or startup error
/// - 2: runtime error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl DdnsExitCode {
    /// Fatal errors mean the process could never have worked as configured.
    fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<DdnsError>() {
            Some(e) if e.is_fatal() => DdnsExitCode::ConfigError,
            _ => DdnsExitCode::RuntimeError,
        }
    }
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn get_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }

    let candidates = config::default_paths();
    candidates
        .iter()
        .find(|candidate| candidate.exists())
        .or_else(|| candidates.first())
        .cloned()
        .unwrap_or_else(|| PathBuf::from("config.json"))
}

fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "do_ddns={level},\
             hyper=warn,\
             reqwest=warn,\
             rustls=warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config_path = get_config_path(cli.config);
    let command = cli.command.unwrap_or(Commands::Run);

    let result = match start(&config_path).await {
        Ok((config, scheduler)) => run(command, &config, scheduler).await,
        Err(e) => Err(e),
    };

    let code = match result {
        Ok(()) => DdnsExitCode::CleanShutdown,
        Err(e) => {
            tracing::error!("{:#}", e);
            DdnsExitCode::for_error(&e)
        }
    };
    code.into()
}

async fn start(config_path: &Path) -> anyhow::Result<(Config, Scheduler)> {
    let config = Config::load_from(config_path)
        .with_context(|| format!("load config {}", config_path.display()))?;
    let scheduler = app::startup(&config).await?;
    Ok((config, scheduler))
}

async fn run(command: Commands, config: &Config, scheduler: Scheduler) -> anyhow::Result<()> {
    match command {
        Commands::Run => cmd_run(config, scheduler).await,
        Commands::Once => cmd_once(scheduler).await,
        Commands::Status => cmd_status(scheduler).await,
    }
}

async fn cmd_run(config: &Config, scheduler: Scheduler) -> anyhow::Result<()> {
    let period = config.period();
    tracing::info!("period set to {:?}", period);
    let phase = scheduler.watch_phase();

    tokio::select! {
        _ = scheduler.run(IntervalTimer::new(period)) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("wait for Ctrl-C")?;
            if *phase.borrow() == Phase::Running {
                tracing::warn!("Received interrupt during an update; records may be partially edited");
            }
            tracing::info!("Received interrupt, shutting down");
        }
    }

    Ok(())
}

async fn cmd_once(mut scheduler: Scheduler) -> anyhow::Result<()> {
    let report = scheduler.tick().await;
    if report.failures() > 0 {
        anyhow::bail!("{} of {} update job(s) failed", report.failures(), report.jobs.len());
    }
    Ok(())
}

async fn cmd_status(scheduler: Scheduler) -> anyhow::Result<()> {
    println!("do-ddns Status");
    println!("==============\n");

    for target in scheduler.targets() {
        let family = target.family();
        print!("{} via {}: ", family, target.resolver.endpoint());
        match target.resolver.resolve().await {
            Ok(ip) => println!("{}", ip),
            Err(e) => println!("error: {}", e),
        }

        if target.records.is_empty() {
            println!("  (no {} records)", family.record_type());
        }
        for record in &target.records {
            println!(
                "  {} record {} ({}.{}): {}",
                family.record_type(),
                record.id,
                record.hostname,
                record.domain,
                record.data
            );
        }
    }

    Ok(())
}

mod config;

use clap::{Args, Parser, Subcommand};
use config::{Config, ConfigError, LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use public_graph::PublicGraphError;
use public_graph::config::ValidationError;
use shared::metrics_defs::describe_all;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "edge", about = "Telemetry ingestion edge")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Serve the public graph
    PublicGraph(ConfigArgs),
    /// Load and validate a config file, then exit
    ValidateConfig(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long)]
    config_file_path: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum EdgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),
    #[error("missing `{0}` section in config")]
    MissingSection(&'static str),
    #[error("could not set up metrics: {0}")]
    Metrics(String),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    PublicGraph(#[from] PublicGraphError),
}

fn init_logging(logging: Option<&LoggingConfig>) -> Option<sentry::ClientInitGuard> {
    let level = logging.map_or("info", |l| l.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let guard = logging
        .and_then(|l| l.sentry_dsn.as_deref())
        .map(|dsn| {
            sentry::init((
                dsn,
                sentry::ClientOptions {
                    release: sentry::release_name!(),
                    ..Default::default()
                },
            ))
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(guard.as_ref().map(|_| sentry::integrations::tracing::layer()))
        .init();

    guard
}

fn init_metrics(metrics: Option<&MetricsConfig>) -> Result<(), EdgeError> {
    let Some(metrics) = metrics else {
        return Ok(());
    };

    let recorder = StatsdBuilder::from(metrics.statsd_host.as_str(), metrics.statsd_port)
        .build(Some("edge"))
        .map_err(|e| EdgeError::Metrics(e.to_string()))?;
    metrics::set_global_recorder(recorder)
        .map_err(|_| EdgeError::Metrics("a metrics recorder is already installed".into()))?;

    describe_all(public_graph::metrics_defs::ALL_METRICS);
    describe_all(queue::metrics_defs::ALL_METRICS);
    describe_all(session_cleanup::metrics_defs::ALL_METRICS);

    tracing::info!(
        host = %metrics.statsd_host,
        port = metrics.statsd_port,
        "Reporting metrics to statsd"
    );
    Ok(())
}

fn run(cli: Cli) -> Result<(), EdgeError> {
    match cli.command {
        CliCommand::ValidateConfig(args) => {
            let config = Config::from_file(&args.config_file_path)?;
            config.validate()?;
            println!("{} is valid", args.config_file_path.display());
            Ok(())
        }
        CliCommand::PublicGraph(args) => {
            let config = Config::from_file(&args.config_file_path)?;
            let public_graph_config = config
                .public_graph
                .ok_or(EdgeError::MissingSection("public_graph"))?;

            let _sentry = init_logging(config.common.logging.as_ref());
            init_metrics(config.common.metrics.as_ref())?;

            tracing::info!("Starting public graph");
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(public_graph::run(public_graph_config))?;
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Exiting");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

//! Binary entry point for `react-bot`.
//!
//! This module provides the command-line interface for react-bot with options
//! for the configuration file path and logging verbosity. It loads configuration,
//! sets up logging, and runs the bot until interrupted.

use clap::Parser;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, WithExportConfig};
use react_bot::base::{
    config::Config,
    types::{Res, Void},
};
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// React-bot – adds emoji reactions to messages in watched Slack channels.
///
/// Configuration can come from `config.toml` or `REACT_BOT_*` environment variables.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Override the config file path (optional).
    ///
    /// By default, the bot will look for a config file at `./config.toml`
    /// in the current directory.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
    /// Increase log verbosity (-v, -vv, etc.).
    ///
    /// Use multiple times to increase verbosity:
    /// - No flag: INFO level
    /// - -v: DEBUG level
    /// - -vv or more: TRACE level
    ///
    /// Ignored when the config sets `log_filter`.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Main entry point for the react-bot binary.
///
/// Loads configuration, sets up logging, and runs the bot. An interrupt exits cleanly.
#[tokio::main]
async fn main() -> Void {
    let args = Args::parse();

    let config = load_config(&args)?;

    init_tracing(args.verbose, config.log_filter.as_deref(), config.otlp_enabled)?;

    debug!("Config: {:?}", config);

    // Run until the loop fails or the operator interrupts.

    let result = tokio::select! {
        result = react_bot::start(config) => result,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Interrupted; shutting down.");
            Ok(())
        }
    };

    if let Err(err) = &result {
        error!("Fatal exception: {:?}", err);
    }

    result
}

/// Load the configuration, logging a failure as fatal.
///
/// Logging settings live in the configuration, so a failure is reported with the
/// verbosity-only defaults.
fn load_config(args: &Args) -> Res<Config> {
    Config::load(args.config.as_deref()).inspect_err(|err| {
        // A subscriber may already be installed.
        let _ = init_tracing(args.verbose, None, false);
        error!("Fatal exception: {:?}", err);
    })
}

/// Build the level filter: `directive` when set, otherwise the `-v` count.
fn log_filter(verbose: u8, directive: Option<&str>) -> Res<EnvFilter> {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .parse(directive.unwrap_or_default())?;

    Ok(filter)
}

/// Install the global subscriber.
fn init_tracing(verbose: u8, directive: Option<&str>, otlp_enabled: bool) -> Void {
    let filter = log_filter(verbose, directive)?;

    // Prepare the log layer.

    let stdout = tracing_subscriber::fmt::layer()
        .with_ansi(true)
        .with_level(true)
        .with_file(false)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    // Prepare the otlp layer.

    let otel = if otlp_enabled {
        let exporter = opentelemetry_otlp::SpanExporter::builder().with_http().with_protocol(Protocol::HttpBinary).build()?;
        let tracer = opentelemetry_sdk::trace::SdkTracerProvider::builder().with_simple_exporter(exporter).build().tracer("react-bot");
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    tracing_subscriber::registry().with(otel).with(filter).with(stdout).try_init()?;

    Ok(())
}

// Tests.

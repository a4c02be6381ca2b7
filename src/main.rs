//! CLI entry point for the UDL uploader.
//!
//! Reads a JSON array of records from a file and POSTs each one to the
//! configured endpoint, reporting whether every record was accepted.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use udl_uploader::{
    DeliveryClient, Endpoint, ExplicitSettings, ProcessEnv, Resolver, TransportOptions,
    load_records, upload_records,
};

#[derive(Parser, Debug)]
#[command(name = "udl_uploader")]
#[command(about = "Upload a JSON array of records to a UDL endpoint", long_about = None)]
#[command(disable_help_flag = true)]
struct Cli {
    /// Set UDL username
    #[arg(short, long)]
    user: Option<String>,

    /// Set UDL password
    #[arg(short, long)]
    password: Option<String>,

    /// Set UDL scheme
    #[arg(short, long)]
    scheme: Option<String>,

    /// Set UDL endpoint path for POST
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Set complete UDL URI (used unless scheme, host and endpoint are all given)
    #[arg(short = 't', long)]
    uri: Option<String>,

    /// Set UDL host
    #[arg(short = 'h', long)]
    host: Option<String>,

    /// Input file to upload
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Accept any TLS certificate and host name
    #[arg(long, default_value_t = false)]
    insecure: bool,

    /// Connect and request timeout in seconds (0 = wait forever)
    #[arg(long, value_name = "SECS", default_value_t = 0)]
    timeout: u64,

    /// Displays usage and help
    #[arg(short = '?', long, action = ArgAction::Help)]
    help: Option<bool>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok(); // Load .env file

    let _log_guard = init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::MissingRequiredArgument => {
            Cli::command().print_help()?;
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => e.exit(),
    };

    let endpoint = Endpoint::from_options(
        cli.scheme.as_deref(),
        cli.host.as_deref(),
        cli.endpoint.as_deref(),
        cli.uri.as_deref(),
    )?;

    let config = Resolver::new(ProcessEnv).resolve(&ExplicitSettings {
        scheme: Some(endpoint.scheme),
        host: Some(endpoint.host),
        user: cli.user,
        password: cli.password,
    });

    let options = TransportOptions {
        accept_invalid_certs: cli.insecure,
        timeout_secs: cli.timeout,
    };
    let client = DeliveryClient::new(&config, &options).context("Failed to set up HTTP client")?;

    let records = load_records(&cli.file)?;
    info!(
        file = %cli.file.display(),
        records = records.len(),
        scheme = %config.scheme,
        host = %config.host,
        path = %endpoint.path,
        "Starting upload"
    );

    let outcome = upload_records(&client, &records, &endpoint.path).await?;
    drop(client);

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_tracing() -> WorkerGuard {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/udl_uploader.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("udl_uploader.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(LevelFilter::INFO.into()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive(LevelFilter::DEBUG.into()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}

//! Tracing setup: a console layer in the chosen format plus a plain-text log file.

use std::{fs::OpenOptions, path::Path};

use clap::ValueEnum;
use eyre::WrapErr as _;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt::time::ChronoLocal, layer::SubscriberExt as _,
    util::SubscriberInitExt as _,
};

/// Filter used when `RUST_LOG` is not set.
///
/// The HTTP stack is limited to warnings so long polling does not flood the log.
pub const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper=warn,hyper_util=warn,rustls=warn";

/// Output format of the console layer. The log file always uses the plain format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held until exit.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened for appending or a global
/// subscriber is already installed.
pub fn init(log_file: &Path, format: LogFormat) -> eyre::Result<WorkerGuard> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .wrap_err(format!("Failed to open log file at: {}", log_file.display()))?;
    let (file_writer, guard) = tracing_appender::non_blocking(file);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_timer(ChronoLocal::rfc_3339());

    let console = tracing_subscriber::fmt::layer().with_timer(ChronoLocal::rfc_3339());
    let console_layer = match format {
        LogFormat::Compact => console.compact().boxed(),
        LogFormat::Pretty => console.pretty().boxed(),
        LogFormat::Json => console.json().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .wrap_err("Failed to install the tracing subscriber")?;

    Ok(guard)
}

//! Masjid Directory Main Entry Point
//!
//! Connects to PostgreSQL, ensures the schema exists, runs one report and
//! prints it to stdout as JSON.

use std::env;
use std::io;

use clap::Parser;
use dotenv::dotenv;
use masjid_directory::cli::Cli;
use masjid_directory::{report, AppError, Dependencies};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
///
/// Logs go to stderr so stdout only carries the report.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("masjid_directory=info,masjid_directory_repository=info")
    });

    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(io::stderr)
                    .pretty(),
            )
            .init();
    }

    info!(
        service_name = "masjid-directory",
        service_version = env!("CARGO_PKG_VERSION"),
        json,
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    init_tracing();

    let deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match report::run(&deps.service, cli.command, cli.compact, &mut out).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!(error = %e, "Report failed");
            Err(e)
        }
    }
}

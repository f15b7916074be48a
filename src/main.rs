//! csvserve - serve a delimited text file as a read-only JSON query API

use clap::Parser;
use csvserve::{CsvServeError, Result, Server, ServiceArgs, ServiceConfig};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    if let Err(e) = run() {
        eprintln!("csvserve failed: {e}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<()> {
    let args = ServiceArgs::parse();

    let log_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(log_filter)
        .init();

    info!("*** Parsing configuration ***");
    let config = match ServiceConfig::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e);
        }
    };
    config.log_summary();

    // Resolve and import before any async machinery exists: nothing is
    // served unless the whole file loaded.
    let server = match Server::new(&config) {
        Ok(server) => server,
        Err(e) => {
            if e.is_startup() {
                error!(error = %e, "Failed to load the CSV file");
            } else {
                error!(error = %e, "Failed to create server");
            }
            return Err(e);
        }
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CsvServeError::server("create Tokio runtime", e))?;

    runtime.block_on(async {
        if let Err(e) = server.run(config.http_addr).await {
            error!(error = %e, "Server error");
            return Err(e);
        }
        Ok(())
    })
}

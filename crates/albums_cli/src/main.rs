//! Album service entry point.
//!
//! # Responsibility
//! - Resolve configuration from file, environment and flags.
//! - Start logging, open storage and serve HTTP until Ctrl-C.
//! - Print fatal errors to stderr and exit non-zero.

mod args;

use albums_core::init_logging;
use albums_http::HttpServer;
use clap::Parser;
use log::{error, info};

fn main() {
    if let Err(message) = run() {
        eprintln!("{message}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let cli = args::Cli::parse();
    let config = cli.resolve_config().map_err(|err| err.to_string())?;

    init_logging(&config.log_level, config.log_dir.as_deref())?;
    info!(
        "event=config_resolved module=cli status=ok version={} db_path={}",
        albums_core::core_version(),
        config.db_path
    );

    let server = HttpServer::open(config).map_err(|err| {
        error!("event=db_open module=cli status=error error={}", err);
        format!("failed to open database: {err}")
    })?;

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|err| format!("failed to start async runtime: {err}"))?;
    runtime.block_on(server.start()).map_err(|err| {
        error!("event=server_exit module=cli status=error error={}", err);
        format!("server error: {err}")
    })
}

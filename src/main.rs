use cagr::app::App;
use cagr::cli::Args;
use cagr::config::Config;
use cagr::logging::setup_logging;
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Load config before logging so the log level can come from it
    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    setup_logging(&config.log_level, args.tracing);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT_SHORT"),
        "starting cagr"
    );

    match App::new(args, config).run().await {
        Ok(code) => code,
        Err(e) => {
            error!(error = ?e, "Crawl failed");
            ExitCode::FAILURE
        }
    }
}

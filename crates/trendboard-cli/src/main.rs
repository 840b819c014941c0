#![doc = include_str!("../README.md")]

mod commands;
mod config;
mod telemetry;

use clap::Parser;
use config::{CliArgs, Config};
use telemetry::init_telemetry;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = Config::try_from(args)?;

    let providers = init_telemetry()?;
    log_startup_info(&config);

    let result = commands::run(&config, &mut std::io::stdout().lock());
    if let Err(err) = &result {
        tracing::error!("{err:#}");
    }

    providers.shutdown();
    result
}

fn log_startup_info(config: &Config) {
    if cfg!(debug_assertions) {
        tracing::debug!("Starting trendboard with full config: {:#?}", config);
    } else {
        tracing::debug!(
            database = %config.database.display(),
            machine_tag = config.machine_tag,
            offset_strategy = %config.offset_strategy,
            "Starting trendboard"
        );
    }
}

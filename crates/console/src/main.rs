mod cli;
mod commands;
mod render;

use std::{process::ExitCode, sync::Arc};

use anyhow::Context;
use clap::Parser;
use services::services::{config::Config, pages::AppContext};
use tracing::debug;

use crate::{cli::Cli, render::TerminalNotifier};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(base_url) = cli.base_url {
        config.api_base_url = base_url;
    }
    utils::logging::init(&config.log_level);
    debug!(base_url = %config.api_base_url, retries = config.fetch_retries, "console starting");

    let ctx = AppContext::from_config(&config, Arc::new(TerminalNotifier))
        .context("invalid API settings")?;
    commands::dispatch(&ctx, cli.command, cli.json).await
}

mod auth;
mod cli;
mod cluster;
mod config;
mod error;
mod output;
mod report;
mod template;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting pipeline-template");
    cli.execute().await?;

    Ok(())
}

mod cli;
mod person;
mod store;
mod web;

use anyhow::Result;
use clap::Parser;
use cli::{Args, Command, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging, RUST_LOG wins over --verbose
    let default_filter = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match args.command {
        Command::Serve(serve_args) => {
            serve(serve_args).await?;
        }
        Command::Init(init_args) => {
            generate_sample_config(init_args)?;
        }
    }

    Ok(())
}

async fn serve(args: cli::ServeArgs) -> Result<()> {
    let config = ServerConfig::from_args(&args)?;

    info!("Starting phonebook on port {}", config.port);
    if !config.api_prefix.is_empty() {
        info!("API mounted under {}", config.api_prefix);
    }

    web::start_server(config).await
}

fn generate_sample_config(args: cli::InitArgs) -> Result<()> {
    let config = ServerConfig::sample();

    config.save(&args.output)?;
    println!("Generated sample config at: {:?}", args.output);

    Ok(())
}

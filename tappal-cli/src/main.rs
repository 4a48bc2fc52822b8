//! tappal - run routing operations against a fixture file

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tappal_cli::{run, Args};
use tappal_routing::RoutingConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RoutingConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RoutingConfig::default(),
    };

    // Initialize tracing/logging; stdout carries the JSON result
    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.general.log_level.clone());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("tappal={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let output = run(&args, config).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

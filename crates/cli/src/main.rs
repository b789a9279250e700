//! `tracery-convert`: convert one raster image from the command line.

mod args;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tracery_core::{
    load_config, load_config_from_env, validate_config, ArtifactStore, ConversionOutcome,
    ConversionService, MemoryArtifactStore,
};

use args::Cli;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| cli.log_filter().into()),
        )
        .init();

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => load_config_from_env().context("Failed to load config from environment")?,
    };
    validate_config(&config).context("Configuration validation failed")?;

    // outputs only need to live until they are written out
    let store: Arc<dyn ArtifactStore> =
        Arc::new(MemoryArtifactStore::new(config.storage.retention()));
    let service = ConversionService::from_config(&config, store)
        .context("Failed to create conversion service")?;

    let bytes = tokio::fs::read(&cli.input)
        .await
        .with_context(|| format!("Failed to read {:?}", cli.input))?;
    info!(input = ?cli.input, size = bytes.len(), "Converting");

    let batch = service.convert_upload(vec![cli.to_request(bytes)]).await?;
    let result = batch
        .into_items()
        .into_iter()
        .next()
        .context("conversion produced no result")?;

    let output = match result.outcome {
        ConversionOutcome::Succeeded(output) => output,
        ConversionOutcome::Failed { error } => bail!("conversion failed: {}", error),
    };
    for warning in &output.warnings {
        warn!("{}", warning);
    }

    let artifact = service.download(output.handle.as_str()).await?;
    let output_path = cli.output_path();
    tokio::fs::write(&output_path, &artifact.bytes)
        .await
        .with_context(|| format!("Failed to write {:?}", output_path))?;

    println!(
        "{} -> {} ({} bytes{})",
        cli.input.display(),
        output_path.display(),
        output.size_bytes,
        if output.optimized { ", optimized" } else { "" }
    );
    Ok(())
}

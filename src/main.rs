use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bids_brain_extract::{BrainExtractionProcessor, Config, SingularityRunner};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::parse();

    let runner = SingularityRunner::locate()?;
    tracing::debug!("Using {}", runner.executable().display());

    let processor = BrainExtractionProcessor::new(runner, config);
    processor.run().context("Brain extraction batch did not complete")?;

    Ok(())
}

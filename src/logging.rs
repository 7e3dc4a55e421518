use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Console logging on stderr; stdout is reserved for the rendered bundle
pub fn init_logging(log_level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_new(log_level)
        .with_context(|| format!("Invalid log filter '{}'", log_level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("Logging already initialised")?;

    Ok(())
}

//! Loads a daily quantity series, fits the forecast model once and prints the
//! requested render bundle as JSON for the charting layer.

mod config;
mod logging;

use anyhow::{Context, Result};
use config::{DashboardConfig, View};
use series_forecast::{Dashboard, DataLoader, ForecastEngine, TrendRequest};
use std::io::Write;
use tracing::info;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = DashboardConfig::from_env()?;
    logging::init_logging(&config.log_level)?;

    info!(path = %config.data_path.display(), view = ?config.view, "Starting dashboard");

    let store = DataLoader::from_csv(&config.data_path, &config.load)
        .with_context(|| format!("Failed to load {}", config.data_path.display()))?;
    let dashboard = Dashboard::new(store, ForecastEngine::default(), config.labels());

    let last = dashboard.store().series().len().saturating_sub(1);
    let window = dashboard.window_from_positions(
        config.window_start.unwrap_or(0),
        config.window_end.unwrap_or(last),
    )?;

    let bundle = match config.view {
        View::Trend => dashboard.trend_view(&TrendRequest {
            window,
            specs: config.rolling.clone(),
        })?,
        View::Forecast => dashboard
            .forecast_view(&window)
            .context("Forecast view unavailable")?,
    };

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &bundle)?;
    writeln!(stdout)?;
    Ok(())
}

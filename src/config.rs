use anyhow::{bail, Context, Result};
use series_forecast::rolling::parse_specs;
use series_forecast::{LoadOptions, RollingSpec, ViewLabels};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;

/// Which bundle to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Trend,
    Forecast,
}

impl FromStr for View {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "trend" => Ok(View::Trend),
            "forecast" => Ok(View::Forecast),
            other => bail!("Unknown view '{}', expected 'trend' or 'forecast'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub load: LoadOptions,
    pub view: View,
    pub window_start: Option<usize>,
    pub window_end: Option<usize>,
    pub rolling: BTreeSet<RollingSpec>,
    pub chart_title: String,
    pub log_level: String,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let position = |key: &str| -> Result<Option<usize>> {
            lookup(key)
                .map(|raw| {
                    raw.trim()
                        .parse::<usize>()
                        .with_context(|| format!("{} must be a non-negative integer, got '{}'", key, raw))
                })
                .transpose()
        };

        let view = or("VIEW", "trend").parse().context("Invalid VIEW")?;
        let rolling = parse_specs(&or("ROLLING_WINDOWS", "")).context("Invalid ROLLING_WINDOWS")?;

        Ok(Self {
            data_path: PathBuf::from(or("DATA_PATH", "df_filtrado.csv")),
            load: LoadOptions::new(or("DATE_COLUMN", "data"), or("VALUE_COLUMN", "quantidade")),
            view,
            window_start: position("WINDOW_START")?,
            window_end: position("WINDOW_END")?,
            rolling,
            chart_title: or("CHART_TITLE", "Quantity"),
            log_level: or("RUST_LOG", "info"),
        })
    }

    pub fn labels(&self) -> ViewLabels {
        ViewLabels {
            trend_title: self.chart_title.clone(),
            ..ViewLabels::default()
        }
    }
}

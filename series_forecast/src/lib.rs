//! # Series Forecast
//!
//! Trend lines and short-horizon forecasts for a daily quantity series.
//!
//! ## Features
//!
//! - CSV loading with date parsing and first-occurrence deduplication
//! - Inclusive date windows chosen by position in the sorted date list
//! - 7, 15 and 30 period simple moving averages with explicit gaps
//! - A trend + seasonality regression model, fitted once and shared read-only
//! - Render bundles (titled, named x/y lines) for an external charting layer
//!
//! ## Quick Start
//!
//! ```no_run
//! use series_forecast::{
//!     DataLoader, Dashboard, ForecastEngine, LoadOptions, RollingSpec, TrendRequest, ViewLabels,
//! };
//!
//! # fn main() -> series_forecast::Result<()> {
//! let store = DataLoader::from_csv("df_filtrado.csv", &LoadOptions::default())?;
//! let dashboard = Dashboard::new(store, ForecastEngine::default(), ViewLabels::default());
//!
//! let last = dashboard.store().series().len() - 1;
//! let window = dashboard.window_from_positions(0, last)?;
//!
//! let trend = dashboard.trend_view(&TrendRequest {
//!     window,
//!     specs: [RollingSpec::Days7].into_iter().collect(),
//! })?;
//! let forecast = dashboard.forecast_view(&window)?;
//! # let _ = (trend, forecast);
//! # Ok(())
//! # }
//! ```

pub mod dashboard;
pub mod data;
pub mod error;
pub mod forecast;
pub mod rolling;
pub mod view;
pub mod window;

// Re-export commonly used types
pub use crate::dashboard::{Dashboard, TrendRequest};
pub use crate::data::{DataLoader, LoadOptions, Observation, Record, Series, SeriesStore};
pub use crate::error::{ForecastError, Result};
pub use crate::forecast::{
    ForecastEngine, ForecastModel, ForecastRequest, ForecastResult, ModelConfig, DEFAULT_HORIZON,
};
pub use crate::rolling::{RollingSeries, RollingSpec};
pub use crate::view::{RenderBundle, ViewLabels};
pub use crate::window::DateWindow;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

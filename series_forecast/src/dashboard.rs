//! Request/response session over one loaded series
//!
//! The model is fitted once when the session is built. A failed fit only
//! disables the forecast view.

use crate::data::SeriesStore;
use crate::error::{ForecastError, Result};
use crate::forecast::{ForecastEngine, ForecastModel, ForecastRequest, DEFAULT_HORIZON};
use crate::rolling::{aggregate_specs, RollingSpec};
use crate::view::{assemble_forecast_view, assemble_trend_view, RenderBundle, ViewLabels};
use crate::window::{filter, DateWindow};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// What the trend view should show
#[derive(Debug, Clone, PartialEq)]
pub struct TrendRequest {
    pub window: DateWindow,
    pub specs: BTreeSet<RollingSpec>,
}

#[derive(Debug)]
pub struct Dashboard {
    store: SeriesStore,
    engine: ForecastEngine,
    model: std::result::Result<ForecastModel, String>,
    labels: ViewLabels,
}

impl Dashboard {
    /// Build a session, fitting the forecast model on the training series
    pub fn new(store: SeriesStore, engine: ForecastEngine, labels: ViewLabels) -> Self {
        let model = engine.fit(store.training_series()).map_err(|e| {
            warn!(error = %e, "Forecast view disabled");
            e.to_string()
        });

        Self {
            store,
            engine,
            model,
            labels,
        }
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    /// The fitted model, if fitting succeeded
    pub fn model(&self) -> Option<&ForecastModel> {
        self.model.as_ref().ok()
    }

    pub fn forecast_available(&self) -> bool {
        self.model.is_ok()
    }

    /// Window from two slider positions, clamping positions that fall
    /// outside the series or arrive reversed
    pub fn window_from_positions(&self, start: usize, end: usize) -> Result<DateWindow> {
        let series = self.store.series();
        match DateWindow::from_positions(series, start, end) {
            Err(ForecastError::OutOfRangeError(reason)) => {
                let window = DateWindow::clamped(series, start, end)?;
                warn!(%reason, start = %window.start(), end = %window.end(), "Clamped window");
                Ok(window)
            }
            other => other,
        }
    }

    /// Filtered history plus the requested moving averages
    pub fn trend_view(&self, request: &TrendRequest) -> Result<RenderBundle> {
        let filtered = filter(self.store.series(), &request.window)?;
        let aggregates = aggregate_specs(&filtered, &request.specs)?;
        debug!(
            observations = filtered.len(),
            aggregates = aggregates.len(),
            "Assembled trend view"
        );
        Ok(assemble_trend_view(
            &self.labels,
            &filtered,
            &aggregates,
            &request.specs,
        ))
    }

    /// Full history plus a forecast starting the day after `window.end()`
    pub fn forecast_view(&self, window: &DateWindow) -> Result<RenderBundle> {
        let model = self
            .model
            .as_ref()
            .map_err(|reason| ForecastError::FitError(reason.clone()))?;

        let request = ForecastRequest::new(window.end(), DEFAULT_HORIZON)?;
        let forecast = self.engine.predict(model, &request)?;
        Ok(assemble_forecast_view(
            &self.labels,
            self.store.series(),
            &forecast,
        ))
    }
}

//! Rolling averages aligned to a series' own date axis

use crate::data::Series;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::Serialize;
use series_math::rolling_mean;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Supported moving-average windows, in observations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RollingSpec {
    Days7,
    Days15,
    Days30,
}

impl RollingSpec {
    pub const ALL: [RollingSpec; 3] = [RollingSpec::Days7, RollingSpec::Days15, RollingSpec::Days30];

    /// Window size in observations
    pub fn window(self) -> usize {
        match self {
            RollingSpec::Days7 => 7,
            RollingSpec::Days15 => 15,
            RollingSpec::Days30 => 30,
        }
    }

    /// Line name used when rendering this average
    pub fn label(self) -> String {
        format!("{}-day moving average", self.window())
    }
}

impl fmt::Display for RollingSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.window())
    }
}

impl FromStr for RollingSpec {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        RollingSpec::ALL
            .into_iter()
            .find(|spec| spec.window().to_string() == s)
            .ok_or_else(|| {
                ForecastError::InvalidParameter(format!(
                    "Unsupported rolling window '{}', expected one of 7, 15, 30",
                    s
                ))
            })
    }
}

/// Parse a comma separated list such as `"7, 30"` into a set of specs
pub fn parse_specs(list: &str) -> Result<BTreeSet<RollingSpec>> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(RollingSpec::from_str)
        .collect()
}

/// One aggregate position: the series date and the mean, if the window is full
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RollingPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// A named aggregate sequence for one spec
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingSeries {
    pub spec: RollingSpec,
    pub name: String,
    pub points: Vec<RollingPoint>,
}

/// Simple moving average over `window_size` observations.
///
/// The result has one point per observation. Positions before the window
/// fills carry `None`.
pub fn aggregate(series: &Series, window_size: usize) -> Result<Vec<RollingPoint>> {
    if window_size == 0 {
        return Err(ForecastError::InvalidParameter(
            "Rolling window size must be positive".to_string(),
        ));
    }

    let means = rolling_mean(&series.values(), window_size)?;
    Ok(series
        .observations()
        .iter()
        .zip(means)
        .map(|(obs, value)| RollingPoint {
            date: obs.date,
            value,
        })
        .collect())
}

/// Compute every requested spec independently, ordered 7, 15, 30
pub fn aggregate_specs(series: &Series, specs: &BTreeSet<RollingSpec>) -> Result<Vec<RollingSeries>> {
    specs
        .iter()
        .map(|&spec| {
            let points = aggregate(series, spec.window())?;
            debug!(
                window = spec.window(),
                defined = points.iter().filter(|p| p.value.is_some()).count(),
                "Computed rolling average"
            );
            Ok(RollingSeries {
                spec,
                name: spec.label(),
                points,
            })
        })
        .collect()
}

//! Date windows and windowed filtering

use crate::data::Series;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

/// Inclusive date range whose bounds are dates observed in a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// Create a window, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ForecastError::OutOfRangeError(format!(
                "Window start {} is after window end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Window spanning the whole series
    pub fn full(series: &Series) -> Result<Self> {
        match (series.first(), series.last()) {
            (Some(first), Some(last)) => Self::new(first.date, last.date),
            _ => Err(ForecastError::OutOfRangeError(
                "Cannot build a window over an empty series".to_string(),
            )),
        }
    }

    /// Window from two positions in the sorted date list
    pub fn from_positions(series: &Series, start: usize, end: usize) -> Result<Self> {
        let date_at = |position: usize| {
            series.date_at(position).ok_or_else(|| {
                ForecastError::OutOfRangeError(format!(
                    "Position {} is outside 0..{}",
                    position,
                    series.len()
                ))
            })
        };
        Self::new(date_at(start)?, date_at(end)?)
    }

    /// Window from two positions, clamped into range and put in order.
    ///
    /// Only an empty series has no valid window.
    pub fn clamped(series: &Series, start: usize, end: usize) -> Result<Self> {
        let last = series.len().checked_sub(1).ok_or_else(|| {
            ForecastError::OutOfRangeError(
                "Cannot build a window over an empty series".to_string(),
            )
        })?;
        let (start, end) = (start.min(last), end.min(last));
        Self::from_positions(series, start.min(end), start.max(end))
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Contiguous sub-series whose dates fall within `window`, bounds included.
///
/// Both bounds must be dates of `series`; anything else is an
/// `OutOfRangeError`, never an empty result.
pub fn filter(series: &Series, window: &DateWindow) -> Result<Series> {
    let locate = |date: NaiveDate| {
        series.position(date).ok_or_else(|| {
            ForecastError::OutOfRangeError(format!("{} is not a date of the series", date))
        })
    };
    let start = locate(window.start)?;
    let end = locate(window.end)?;

    let filtered = series.slice(start, end)?;
    debug!(
        start = %window.start,
        end = %window.end,
        observations = filtered.len(),
        "Filtered series"
    );
    Ok(filtered)
}

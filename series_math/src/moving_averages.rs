//! Moving average calculations
//!
//! - `SimpleMovingAverage`: a streaming fixed-period arithmetic mean
//! - `rolling_mean`: the same mean over a whole slice, aligned to the input,
//!   with `None` wherever the window is not yet full

use crate::{MathError, Result};
use std::collections::VecDeque;

/// Simple Moving Average (SMA) over a fixed number of observations
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    period: usize,
    values: VecDeque<f64>,
}

impl SimpleMovingAverage {
    /// Create a new Simple Moving Average with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period),
        })
    }

    /// Push a new observation, evicting the oldest once the window is full
    pub fn update(&mut self, value: f64) {
        self.values.push_back(value);
        if self.values.len() > self.period {
            self.values.pop_front();
        }
    }

    /// Whether `period` observations have been seen
    pub fn is_full(&self) -> bool {
        self.values.len() == self.period
    }

    /// Get the current SMA value
    pub fn value(&self) -> Result<f64> {
        if !self.is_full() {
            return Err(MathError::InsufficientData(format!(
                "Not enough data for SMA calculation. Need {} values, have {}.",
                self.period,
                self.values.len()
            )));
        }

        // Summed from the window each time so long series do not accumulate drift.
        Ok(self.values.iter().sum::<f64>() / self.period as f64)
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Reset the SMA, clearing all values
    pub fn reset(&mut self) {
        self.values.clear();
    }
}

/// Rolling mean over `values` with a trailing window of `period` observations.
///
/// The output has the same length as the input. Position `i` holds
/// `Some(mean(values[i + 1 - period..=i]))` when `i + 1 >= period` and `None`
/// otherwise.
pub fn rolling_mean(values: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    let mut sma = SimpleMovingAverage::new(period)?;

    Ok(values
        .iter()
        .map(|&value| {
            sma.update(value);
            sma.value().ok()
        })
        .collect())
}

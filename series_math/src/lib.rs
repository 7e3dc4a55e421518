//! # Series Math
//!
//! Numeric building blocks for daily series analysis.
//! This crate provides the rolling averages used for trend lines and the
//! regression primitives (Fourier seasonal features, regularised least
//! squares) used to fit forecasting models.

use thiserror::Error;

pub mod moving_averages;
pub mod regression;
pub mod seasonality;

pub use moving_averages::{rolling_mean, SimpleMovingAverage};
pub use regression::{ridge_least_squares, solve_linear_system};
pub use seasonality::fourier_series;

/// Errors that can occur in series calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for series math operations
pub type Result<T> = std::result::Result<T, MathError>;

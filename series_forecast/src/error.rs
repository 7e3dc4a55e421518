//! Error types for the series_forecast crate

use series_math::MathError;
use thiserror::Error;

/// Custom error types for the series_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Malformed or missing input; no view can be produced
    #[error("Load error: {0}")]
    LoadError(String),

    /// Window bounds that are not positions or dates of the series
    #[error("Out of range: {0}")]
    OutOfRangeError(String),

    /// Not enough (or unusable) data to fit a forecasting model
    #[error("Fit error: {0}")]
    FitError(String),

    /// Degenerate prediction request
    #[error("Prediction error: {0}")]
    PredictionError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the CSV reader
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl ForecastError {
    /// Whether a session can carry on after this error.
    ///
    /// Load failures (including IO and CSV errors) are fatal; everything else
    /// only disables or corrects the request that raised it.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            ForecastError::LoadError(_) | ForecastError::IoError(_) | ForecastError::CsvError(_)
        )
    }
}

impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::InvalidInput(msg) => ForecastError::InvalidParameter(msg),
            other => ForecastError::FitError(other.to_string()),
        }
    }
}

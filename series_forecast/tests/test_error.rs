use series_forecast::error::ForecastError;
use series_math::MathError;
use std::io;

#[test]
fn test_error_conversion() {
    // IO errors convert and are fatal
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let forecast_error = ForecastError::from(io_error);

    assert!(matches!(forecast_error, ForecastError::IoError(_)));
    assert!(!forecast_error.is_recoverable());

    // Math errors become parameter or fit errors
    let invalid = ForecastError::from(MathError::InvalidInput("period is zero".to_string()));
    assert!(matches!(invalid, ForecastError::InvalidParameter(_)));

    let singular = ForecastError::from(MathError::CalculationError("singular".to_string()));
    assert!(matches!(singular, ForecastError::FitError(_)));
}

#[test]
fn test_error_display() {
    let error = ForecastError::OutOfRangeError("2031-01-01 is not a date of the series".to_string());
    let error_string = format!("{}", error);

    assert!(error_string.starts_with("Out of range"));
    assert!(error_string.contains("2031-01-01"));

    let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
    let error_string = format!("{}", ForecastError::from(io_error));

    assert!(error_string.contains("IO error"));
    assert!(error_string.contains("permission denied"));
}

#[test]
fn test_recoverability() {
    let recoverable = [
        ForecastError::OutOfRangeError("window".to_string()),
        ForecastError::FitError("one date".to_string()),
        ForecastError::PredictionError("zero horizon".to_string()),
        ForecastError::InvalidParameter("window 0".to_string()),
    ];
    assert!(recoverable.iter().all(ForecastError::is_recoverable));

    assert!(!ForecastError::LoadError("bad date".to_string()).is_recoverable());
}

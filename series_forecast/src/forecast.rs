//! Trend + seasonality forecasting
//!
//! The model is an additive decomposition fitted by regularised least squares:
//!
//! ```text
//! y(t) = k + m·t + Σ δⱼ·(t - sⱼ)₊ + Σ seasonal Fourier terms
//! ```
//!
//! Time is scaled to `[0, 1]` over the history and values by their absolute
//! maximum. Changepoint deltas and Fourier coefficients carry Gaussian priors,
//! which become ridge penalties `1 / scale²`; the base level and slope are
//! unpenalised. Auto seasonalities follow the usual rules: weekly needs at
//! least two weeks of sub-weekly data, yearly at least two years.
//!
//! A fitted [`ForecastModel`] is plain immutable data and can be shared across
//! threads; every prediction is a pure function of the model and the dates.

use crate::data::Series;
use crate::error::{ForecastError, Result};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use series_math::{fourier_series, ridge_least_squares};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::{debug, info};

/// Number of periods the forecast view extends past the window end
pub const DEFAULT_HORIZON: usize = 15;

const WEEKLY_PERIOD: f64 = 7.0;
const YEARLY_PERIOD: f64 = 365.25;
const MIN_WEEKLY_SPAN_DAYS: i64 = 14;
const MIN_YEARLY_SPAN_DAYS: i64 = 730;

/// Whether a seasonal component is fitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonalityMode {
    /// Decide from the history's span and spacing
    Auto,
    Enabled,
    Disabled,
}

/// Model hyper-parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Upper bound on potential trend changepoints
    pub n_changepoints: usize,
    /// Fraction of the history in which changepoints may be placed
    pub changepoint_range: f64,
    /// Prior scale of changepoint deltas
    pub changepoint_prior_scale: f64,
    pub weekly_seasonality: SeasonalityMode,
    pub yearly_seasonality: SeasonalityMode,
    pub weekly_fourier_order: usize,
    pub yearly_fourier_order: usize,
    /// Prior scale of Fourier coefficients
    pub seasonality_prior_scale: f64,
    /// Coverage of the `yhat_lower..yhat_upper` interval
    pub interval_width: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            weekly_seasonality: SeasonalityMode::Auto,
            yearly_seasonality: SeasonalityMode::Auto,
            weekly_fourier_order: 3,
            yearly_fourier_order: 10,
            seasonality_prior_scale: 10.0,
            interval_width: 0.8,
        }
    }
}

impl ModelConfig {
    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.changepoint_range) {
            return Err(ForecastError::InvalidParameter(
                "Changepoint range must be between 0 and 1".to_string(),
            ));
        }
        if !(self.changepoint_prior_scale > 0.0 && self.seasonality_prior_scale > 0.0) {
            return Err(ForecastError::InvalidParameter(
                "Prior scales must be positive".to_string(),
            ));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::InvalidParameter(
                "Interval width must be between 0 and 1 (exclusive)".to_string(),
            ));
        }
        Ok(())
    }
}

/// A fitted Fourier component
#[derive(Debug, Clone, PartialEq)]
struct Seasonality {
    name: &'static str,
    period: f64,
    order: usize,
}

/// Future periods to predict, starting the day after `anchor_date`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForecastRequest {
    anchor_date: NaiveDate,
    horizon: usize,
}

impl ForecastRequest {
    pub fn new(anchor_date: NaiveDate, horizon: usize) -> Result<Self> {
        if horizon == 0 {
            return Err(ForecastError::PredictionError(
                "Forecast horizon must be at least one period".to_string(),
            ));
        }
        Ok(Self {
            anchor_date,
            horizon,
        })
    }

    pub fn anchor_date(&self) -> NaiveDate {
        self.anchor_date
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// `anchor + 1 ..= anchor + horizon`, one per day
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        (1..=self.horizon as u64)
            .map(|offset| {
                self.anchor_date
                    .checked_add_days(Days::new(offset))
                    .ok_or_else(|| {
                        ForecastError::PredictionError(format!(
                            "{} + {} days is outside the calendar range",
                            self.anchor_date, offset
                        ))
                    })
            })
            .collect()
    }
}

/// One predicted date
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    /// Trend component of `yhat`
    pub trend: f64,
}

/// Ordered predictions for a request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub anchor_date: NaiveDate,
    pub points: Vec<ForecastPoint>,
}

impl ForecastResult {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.yhat).collect()
    }
}

/// Fitted trend + seasonality state
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastModel {
    history_start: NaiveDate,
    history_end: NaiveDate,
    t_scale: f64,
    y_scale: f64,
    changepoints: Vec<f64>,
    seasonalities: Vec<Seasonality>,
    coefficients: Vec<f64>,
    sigma: f64,
    interval_z: f64,
}

impl ForecastModel {
    pub fn history_start(&self) -> NaiveDate {
        self.history_start
    }

    pub fn history_end(&self) -> NaiveDate {
        self.history_end
    }

    pub fn changepoint_count(&self) -> usize {
        self.changepoints.len()
    }

    /// Names of the fitted seasonal components
    pub fn seasonalities(&self) -> Vec<&'static str> {
        self.seasonalities.iter().map(|s| s.name).collect()
    }

    /// In-sample residual standard deviation, in the series' units
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Predictions for an arbitrary list of dates
    pub fn predict_dates(&self, dates: &[NaiveDate]) -> Vec<ForecastPoint> {
        let trend_columns = 2 + self.changepoints.len();
        let margin = self.interval_z * self.sigma;

        design_matrix(
            dates,
            self.history_start,
            self.t_scale,
            &self.changepoints,
            &self.seasonalities,
        )
        .into_iter()
        .zip(dates)
        .map(|(row, &date)| {
            let dot = |range: std::ops::Range<usize>| -> f64 {
                row[range.clone()]
                    .iter()
                    .zip(&self.coefficients[range])
                    .map(|(x, b)| x * b)
                    .sum()
            };
            let trend = dot(0..trend_columns) * self.y_scale;
            let yhat = trend + dot(trend_columns..row.len()) * self.y_scale;
            ForecastPoint {
                date,
                yhat,
                yhat_lower: yhat - margin,
                yhat_upper: yhat + margin,
                trend,
            }
        })
        .collect()
    }

    /// Predictions for every date of a request
    pub fn predict(&self, request: &ForecastRequest) -> Result<ForecastResult> {
        let dates = request.dates()?;
        Ok(ForecastResult {
            anchor_date: request.anchor_date(),
            points: self.predict_dates(&dates),
        })
    }
}

/// Fits models and serves predictions
#[derive(Debug, Clone, Default)]
pub struct ForecastEngine {
    config: ModelConfig,
}

impl ForecastEngine {
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Fit a model on the full deduplicated series
    pub fn fit(&self, series: &Series) -> Result<ForecastModel> {
        let (first, last) = match (series.first(), series.last()) {
            (Some(first), Some(last)) if series.len() >= 2 => (first.date, last.date),
            _ => {
                return Err(ForecastError::FitError(format!(
                    "Need at least two distinct dates to estimate a trend, got {}",
                    series.len()
                )))
            }
        };

        let values = series.values();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::FitError(
                "Series contains non-finite values".to_string(),
            ));
        }

        let dates = series.dates();
        let t_scale = (last - first).num_days() as f64;
        let y_scale = match values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())) {
            m if m > 0.0 => m,
            _ => 1.0,
        };
        let y: Vec<f64> = values.iter().map(|v| v / y_scale).collect();

        let changepoints = self.changepoints(&dates, first, t_scale);
        let seasonalities = self.seasonalities(series);

        let x = design_matrix(&dates, first, t_scale, &changepoints, &seasonalities);
        let penalties = self.penalties(changepoints.len(), &seasonalities);
        let coefficients =
            ridge_least_squares(&x, &y, &penalties).map_err(|e| ForecastError::FitError(e.to_string()))?;

        let ssr: f64 = x
            .iter()
            .zip(&y)
            .map(|(row, target)| {
                let fitted: f64 = row.iter().zip(&coefficients).map(|(a, b)| a * b).sum();
                (target - fitted).powi(2)
            })
            .sum();
        let sigma = (ssr / y.len() as f64).sqrt() * y_scale;

        let normal = Normal::new(0.0, 1.0).map_err(|e| ForecastError::FitError(e.to_string()))?;
        let interval_z = normal.inverse_cdf(0.5 + self.config.interval_width / 2.0);

        let model = ForecastModel {
            history_start: first,
            history_end: last,
            t_scale,
            y_scale,
            changepoints,
            seasonalities,
            coefficients,
            sigma,
            interval_z,
        };
        info!(
            observations = series.len(),
            changepoints = model.changepoint_count(),
            seasonalities = ?model.seasonalities(),
            sigma = model.sigma,
            "Fitted forecast model"
        );
        Ok(model)
    }

    /// Predict a request against a fitted model
    pub fn predict(&self, model: &ForecastModel, request: &ForecastRequest) -> Result<ForecastResult> {
        let result = model.predict(request)?;
        debug!(
            anchor = %request.anchor_date(),
            horizon = request.horizon(),
            "Predicted forecast"
        );
        Ok(result)
    }

    /// Evenly spaced changepoints over the first `changepoint_range` of the
    /// history, in scaled time
    fn changepoints(&self, dates: &[NaiveDate], origin: NaiveDate, t_scale: f64) -> Vec<f64> {
        let hist_size = (dates.len() as f64 * self.config.changepoint_range).floor() as usize;
        let count = self.config.n_changepoints.min(hist_size.saturating_sub(1));
        if count == 0 {
            return Vec::new();
        }

        let last_idx = (hist_size - 1) as f64;
        (1..=count)
            .map(|k| {
                let idx = (k as f64 * last_idx / count as f64).round() as usize;
                scaled_time(dates[idx], origin, t_scale)
            })
            .collect()
    }

    fn seasonalities(&self, series: &Series) -> Vec<Seasonality> {
        let span = series.span_days();
        let min_gap = series
            .observations()
            .windows(2)
            .map(|w| (w[1].date - w[0].date).num_days())
            .min()
            .unwrap_or(0);

        let enabled = |mode: SeasonalityMode, auto: bool| match mode {
            SeasonalityMode::Auto => auto,
            SeasonalityMode::Enabled => true,
            SeasonalityMode::Disabled => false,
        };

        let mut seasonalities = Vec::new();
        if enabled(
            self.config.yearly_seasonality,
            span >= MIN_YEARLY_SPAN_DAYS,
        ) && self.config.yearly_fourier_order > 0
        {
            seasonalities.push(Seasonality {
                name: "yearly",
                period: YEARLY_PERIOD,
                order: self.config.yearly_fourier_order,
            });
        }
        if enabled(
            self.config.weekly_seasonality,
            span >= MIN_WEEKLY_SPAN_DAYS && min_gap < 7,
        ) && self.config.weekly_fourier_order > 0
        {
            seasonalities.push(Seasonality {
                name: "weekly",
                period: WEEKLY_PERIOD,
                order: self.config.weekly_fourier_order,
            });
        }
        seasonalities
    }

    fn penalties(&self, changepoints: usize, seasonalities: &[Seasonality]) -> Vec<f64> {
        let changepoint_penalty = self.config.changepoint_prior_scale.powi(-2);
        let seasonality_penalty = self.config.seasonality_prior_scale.powi(-2);
        let fourier_columns: usize = seasonalities.iter().map(|s| 2 * s.order).sum();

        let mut penalties = vec![0.0, 0.0];
        penalties.extend(std::iter::repeat(changepoint_penalty).take(changepoints));
        penalties.extend(std::iter::repeat(seasonality_penalty).take(fourier_columns));
        penalties
    }
}

fn scaled_time(date: NaiveDate, origin: NaiveDate, t_scale: f64) -> f64 {
    (date - origin).num_days() as f64 / t_scale
}

/// Rows of `[1, t, (t - s₁)₊, …, Fourier terms…]`; seasonal phases are taken
/// from days since the Unix epoch so they do not depend on the history start
fn design_matrix(
    dates: &[NaiveDate],
    origin: NaiveDate,
    t_scale: f64,
    changepoints: &[f64],
    seasonalities: &[Seasonality],
) -> Vec<Vec<f64>> {
    let epoch = NaiveDate::default();
    let t_days: Vec<f64> = dates
        .iter()
        .map(|&d| (d - epoch).num_days() as f64)
        .collect();
    let fourier: Vec<Vec<Vec<f64>>> = seasonalities
        .iter()
        .map(|s| fourier_series(&t_days, s.period, s.order))
        .collect();

    dates
        .iter()
        .enumerate()
        .map(|(i, &date)| {
            let t = scaled_time(date, origin, t_scale);
            let mut row = vec![1.0, t];
            row.extend(changepoints.iter().map(|&s| (t - s).max(0.0)));
            for block in &fourier {
                row.extend_from_slice(&block[i]);
            }
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::{Datelike, Weekday};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn daily_series(values: Vec<f64>) -> Series {
        let dates = (0..values.len() as u64)
            .map(|i| start() + Days::new(i))
            .collect();
        Series::new(dates, values).unwrap()
    }

    #[test]
    fn test_fit_requires_two_dates() {
        let engine = ForecastEngine::default();

        let empty = engine.fit(&Series::default());
        assert!(matches!(empty, Err(ForecastError::FitError(_))));

        let single = engine.fit(&daily_series(vec![5.0]));
        assert!(matches!(single, Err(ForecastError::FitError(_))));
    }

    #[test]
    fn test_two_points_extend_the_line() {
        let engine = ForecastEngine::default();
        let model = engine.fit(&daily_series(vec![1.0, 3.0])).unwrap();

        assert_eq!(model.changepoint_count(), 0);
        assert!(model.seasonalities().is_empty());

        let request = ForecastRequest::new(start() + Days::new(1), 2).unwrap();
        let result = engine.predict(&model, &request).unwrap();
        assert_abs_diff_eq!(result.points[0].yhat, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.points[1].yhat, 7.0, epsilon = 1e-9);
    }

    #[test]
    fn test_flat_series_forecasts_flat() {
        let engine = ForecastEngine::default();
        let model = engine.fit(&daily_series(vec![10.0; 39])).unwrap();

        assert_eq!(model.seasonalities(), vec!["weekly"]);
        assert!(model.changepoint_count() > 0);

        let request = ForecastRequest::new(model.history_end(), DEFAULT_HORIZON).unwrap();
        let result = model.predict(&request).unwrap();
        assert_eq!(result.len(), DEFAULT_HORIZON);
        for point in &result.points {
            assert_abs_diff_eq!(point.yhat, 10.0, epsilon = 1e-6);
            assert_abs_diff_eq!(point.trend, 10.0, epsilon = 1e-6);
            assert!(point.yhat_lower <= point.yhat && point.yhat <= point.yhat_upper);
        }
        assert_abs_diff_eq!(model.sigma(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_linear_series_continues_trend() {
        let values: Vec<f64> = (0..60).map(|i| 2.0 + 0.5 * i as f64).collect();
        let model = ForecastEngine::default().fit(&daily_series(values)).unwrap();

        let request = ForecastRequest::new(model.history_end(), 5).unwrap();
        let result = model.predict(&request).unwrap();
        for (k, point) in result.points.iter().enumerate() {
            let expected = 2.0 + 0.5 * (60 + k) as f64;
            assert_abs_diff_eq!(point.yhat, expected, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_weekly_pattern_is_learned() {
        let values: Vec<f64> = (0..56u64)
            .map(|i| {
                let date = start() + Days::new(i);
                if date.weekday() == Weekday::Sat {
                    15.0
                } else {
                    10.0
                }
            })
            .collect();
        let model = ForecastEngine::default().fit(&daily_series(values)).unwrap();

        let request = ForecastRequest::new(model.history_end(), 7).unwrap();
        let result = model.predict(&request).unwrap();
        let saturday = result
            .points
            .iter()
            .find(|p| p.date.weekday() == Weekday::Sat)
            .unwrap();
        let wednesday = result
            .points
            .iter()
            .find(|p| p.date.weekday() == Weekday::Wed)
            .unwrap();

        assert_abs_diff_eq!(saturday.yhat, 15.0, epsilon = 0.1);
        assert_abs_diff_eq!(wednesday.yhat, 10.0, epsilon = 0.1);
    }

    #[test]
    fn test_seasonality_modes() {
        let series = daily_series(vec![3.0; 30]);

        let config = ModelConfig {
            weekly_seasonality: SeasonalityMode::Disabled,
            ..ModelConfig::default()
        };
        let model = ForecastEngine::new(config).unwrap().fit(&series).unwrap();
        assert!(model.seasonalities().is_empty());

        let config = ModelConfig {
            yearly_seasonality: SeasonalityMode::Enabled,
            ..ModelConfig::default()
        };
        let model = ForecastEngine::new(config).unwrap().fit(&series).unwrap();
        assert_eq!(model.seasonalities(), vec!["yearly", "weekly"]);
    }

    #[test]
    fn test_weekly_auto_off_for_weekly_spacing() {
        let dates: Vec<NaiveDate> = (0..20u64).map(|w| start() + Days::new(7 * w)).collect();
        let series = Series::new(dates, vec![1.0; 20]).unwrap();

        let model = ForecastEngine::default().fit(&series).unwrap();
        assert!(model.seasonalities().is_empty());
    }

    #[test]
    fn test_request_dates_follow_anchor() {
        let anchor = NaiveDate::from_ymd_opt(2024, 2, 20).unwrap();
        let request = ForecastRequest::new(anchor, DEFAULT_HORIZON).unwrap();
        let dates = request.dates().unwrap();

        assert_eq!(dates.len(), 15);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 2, 21).unwrap());
        assert_eq!(dates[14], NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
        assert!(dates.windows(2).all(|w| (w[1] - w[0]).num_days() == 1));
    }

    #[test]
    fn test_degenerate_requests() {
        assert!(matches!(
            ForecastRequest::new(start(), 0),
            Err(ForecastError::PredictionError(_))
        ));

        let request = ForecastRequest::new(NaiveDate::MAX, 1).unwrap();
        assert!(matches!(
            request.dates(),
            Err(ForecastError::PredictionError(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ModelConfig {
            interval_width: 1.5,
            ..ModelConfig::default()
        };
        assert!(matches!(
            ForecastEngine::new(config),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_interval_widens_with_noise() {
        let values: Vec<f64> = (0..40)
            .map(|i| if i % 2 == 0 { 9.0 } else { 11.0 })
            .collect();
        let model = ForecastEngine::default().fit(&daily_series(values)).unwrap();
        assert!(model.sigma() > 0.0);

        let point = model.predict_dates(&[model.history_end() + Days::new(1)])[0];
        assert!(point.yhat_upper - point.yhat_lower > 0.0);
    }

    #[test]
    fn test_concurrent_predictions_agree() {
        let model = ForecastEngine::default()
            .fit(&daily_series((0..50).map(|i| (i % 9) as f64).collect()))
            .unwrap();
        let request = ForecastRequest::new(model.history_end(), DEFAULT_HORIZON).unwrap();
        let expected = model.predict(&request).unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| model.predict(&request).unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}

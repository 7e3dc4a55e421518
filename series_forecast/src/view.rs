//! Render bundles for the charting layer
//!
//! Nothing here changes a value: the assembler only arranges series into
//! named lines sharing one pair of axes.

use crate::data::Series;
use crate::forecast::ForecastResult;
use crate::rolling::{RollingSeries, RollingSpec};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

/// How a line is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineMode {
    Lines,
    LinesMarkers,
}

/// One labelled trace; `None` marks a gap
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub name: String,
    pub mode: LineMode,
    pub x: Vec<NaiveDate>,
    pub y: Vec<Option<f64>>,
}

/// Title, axis labels and lines of one chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderBundle {
    pub title: String,
    pub x_axis_label: String,
    pub y_axis_label: String,
    pub lines: Vec<LineSeries>,
}

/// Text used when assembling bundles
#[derive(Debug, Clone, PartialEq)]
pub struct ViewLabels {
    pub trend_title: String,
    pub forecast_title: String,
    pub x_axis_label: String,
    pub y_axis_label: String,
    pub historical_name: String,
    pub forecast_name: String,
}

impl Default for ViewLabels {
    fn default() -> Self {
        Self {
            trend_title: "Quantity".to_string(),
            forecast_title: "Historical series vs. forecast for the next 15 days".to_string(),
            x_axis_label: "Date".to_string(),
            y_axis_label: "Quantity".to_string(),
            historical_name: "Historical series".to_string(),
            forecast_name: "Forecast".to_string(),
        }
    }
}

fn historical_line(labels: &ViewLabels, series: &Series) -> LineSeries {
    LineSeries {
        name: labels.historical_name.clone(),
        mode: LineMode::LinesMarkers,
        x: series.dates(),
        y: series.values().into_iter().map(Some).collect(),
    }
}

/// Filtered history plus one line per requested aggregate
pub fn assemble_trend_view(
    labels: &ViewLabels,
    filtered: &Series,
    aggregates: &[RollingSeries],
    requested: &BTreeSet<RollingSpec>,
) -> RenderBundle {
    let mut lines = vec![historical_line(labels, filtered)];
    lines.extend(
        aggregates
            .iter()
            .filter(|aggregate| requested.contains(&aggregate.spec))
            .map(|aggregate| LineSeries {
                name: aggregate.name.clone(),
                mode: LineMode::Lines,
                x: aggregate.points.iter().map(|p| p.date).collect(),
                y: aggregate.points.iter().map(|p| p.value).collect(),
            }),
    );

    RenderBundle {
        title: labels.trend_title.clone(),
        x_axis_label: labels.x_axis_label.clone(),
        y_axis_label: labels.y_axis_label.clone(),
        lines,
    }
}

/// Full history followed by the forecast continuation
pub fn assemble_forecast_view(
    labels: &ViewLabels,
    full: &Series,
    forecast: &ForecastResult,
) -> RenderBundle {
    let forecast_line = LineSeries {
        name: labels.forecast_name.clone(),
        mode: LineMode::Lines,
        x: forecast.dates(),
        y: forecast.values().into_iter().map(Some).collect(),
    };

    RenderBundle {
        title: labels.forecast_title.clone(),
        x_axis_label: labels.x_axis_label.clone(),
        y_axis_label: labels.y_axis_label.clone(),
        lines: vec![historical_line(labels, full), forecast_line],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::ForecastPoint;
    use crate::rolling::aggregate_specs;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn series() -> Series {
        Series::new((1..=8).map(day).collect(), (1..=8).map(|v| v as f64).collect()).unwrap()
    }

    #[test]
    fn test_trend_view_without_aggregates() {
        let bundle = assemble_trend_view(&ViewLabels::default(), &series(), &[], &BTreeSet::new());

        assert_eq!(bundle.title, "Quantity");
        assert_eq!(bundle.lines.len(), 1);
        assert_eq!(bundle.lines[0].mode, LineMode::LinesMarkers);
        assert_eq!(bundle.lines[0].y[7], Some(8.0));
    }

    #[test]
    fn test_trend_view_skips_unrequested_aggregates() {
        let all: BTreeSet<_> = RollingSpec::ALL.into_iter().collect();
        let aggregates = aggregate_specs(&series(), &all).unwrap();
        let requested: BTreeSet<_> = [RollingSpec::Days7].into_iter().collect();

        let bundle = assemble_trend_view(&ViewLabels::default(), &series(), &aggregates, &requested);

        let names: Vec<&str> = bundle.lines.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Historical series", "7-day moving average"]);

        let seven = &bundle.lines[1];
        assert_eq!(seven.x, series().dates());
        assert!(seven.y[..6].iter().all(Option::is_none));
        assert_eq!(seven.y[6], Some(4.0));
        assert_eq!(seven.y[7], Some(5.0));
    }

    #[test]
    fn test_forecast_view_has_two_lines() {
        let forecast = ForecastResult {
            anchor_date: day(8),
            points: vec![ForecastPoint {
                date: day(9),
                yhat: 9.5,
                yhat_lower: 9.0,
                yhat_upper: 10.0,
                trend: 9.5,
            }],
        };

        let bundle = assemble_forecast_view(&ViewLabels::default(), &series(), &forecast);

        assert_eq!(bundle.lines.len(), 2);
        assert_eq!(bundle.lines[0].x.len(), 8);
        assert_eq!(bundle.lines[1].name, "Forecast");
        assert_eq!(bundle.lines[1].x, vec![day(9)]);
        assert_eq!(bundle.lines[1].y, vec![Some(9.5)]);
    }

    #[test]
    fn test_bundle_serializes_gaps_as_null() {
        let line = LineSeries {
            name: "7-day moving average".to_string(),
            mode: LineMode::Lines,
            x: vec![day(1), day(2)],
            y: vec![None, Some(1.5)],
        };

        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["mode"], "lines");
        assert_eq!(json["x"][0], "2024-06-01");
        assert!(json["y"][0].is_null());
        assert_eq!(json["y"][1], 1.5);
    }
}

//! Daily series loading, cleaning and deduplication

use crate::error::{ForecastError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Date formats tried, in order, when no explicit list is configured.
/// Date-time forms are truncated to the calendar day.
pub const DEFAULT_DATE_FORMATS: [&str; 5] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// One dated quantity
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

/// One display row: the parsed date and value plus every original column as text
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    pub value: f64,
    pub fields: Vec<String>,
}

impl Record {
    /// The `(date, value)` projection of this row
    pub fn observation(&self) -> Observation {
        Observation {
            date: self.date,
            value: self.value,
        }
    }
}

/// Observations sorted ascending by date, at most one per date
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    observations: Vec<Observation>,
}

/// Options controlling how a CSV source is read
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Name of the date column
    pub date_column: String,
    /// Name of the numeric quantity column
    pub value_column: String,
    /// Field delimiter
    pub delimiter: u8,
    /// `chrono` format strings tried in order
    pub date_formats: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            date_column: "data".to_string(),
            value_column: "quantidade".to_string(),
            delimiter: b',',
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl LoadOptions {
    /// Options for the given date and value column names
    pub fn new(date_column: impl Into<String>, value_column: impl Into<String>) -> Self {
        Self {
            date_column: date_column.into(),
            value_column: value_column.into(),
            ..Self::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_date_formats(mut self, formats: Vec<String>) -> Self {
        self.date_formats = formats;
        self
    }
}

/// Keep the first item per date in input order, returning the kept items and
/// how many were dropped.
pub fn dedupe_first<T, F>(items: Vec<T>, date_of: F) -> (Vec<T>, usize)
where
    F: Fn(&T) -> NaiveDate,
{
    let total = items.len();
    let mut seen = HashSet::with_capacity(total);
    let kept: Vec<T> = items
        .into_iter()
        .filter(|item| seen.insert(date_of(item)))
        .collect();
    let dropped = total - kept.len();
    (kept, dropped)
}

impl Series {
    /// Create a series from parallel date and value vectors.
    ///
    /// Duplicated dates keep their first value; the result is sorted by date.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "Dates length ({}) doesn't match values length ({})",
                dates.len(),
                values.len()
            )));
        }

        Ok(Self::from_observations(
            dates
                .into_iter()
                .zip(values)
                .map(|(date, value)| Observation { date, value })
                .collect(),
        ))
    }

    /// Deduplicate (first occurrence wins) and sort arbitrary observations
    pub fn from_observations(observations: Vec<Observation>) -> Self {
        let (mut kept, _) = dedupe_first(observations, |o| o.date);
        kept.sort_by_key(|o| o.date);
        Self { observations: kept }
    }

    /// Wrap observations that are already unique and sorted
    pub(crate) fn from_sorted(observations: Vec<Observation>) -> Self {
        debug_assert!(observations.windows(2).all(|w| w[0].date < w[1].date));
        Self { observations }
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|o| o.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.observations.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Date at a position in the sorted date list
    pub fn date_at(&self, position: usize) -> Option<NaiveDate> {
        self.observations.get(position).map(|o| o.date)
    }

    /// Position of an observed date, if present
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.observations
            .binary_search_by_key(&date, |o| o.date)
            .ok()
    }

    /// Observations between two positions, both inclusive
    pub fn slice(&self, start: usize, end: usize) -> Result<Self> {
        if start > end || end >= self.len() {
            return Err(ForecastError::OutOfRangeError(format!(
                "Positions {}..={} are outside a series of {} observations",
                start,
                end,
                self.len()
            )));
        }

        Ok(Self::from_sorted(self.observations[start..=end].to_vec()))
    }

    /// Calendar days between the first and last observation
    pub fn span_days(&self) -> i64 {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => (last.date - first.date).num_days(),
            _ => 0,
        }
    }
}

/// The loaded, cleaned series, immutable after construction
#[derive(Debug, Clone)]
pub struct SeriesStore {
    headers: Vec<String>,
    records: Vec<Record>,
    series: Series,
    training: Series,
    dropped_duplicates: usize,
}

impl SeriesStore {
    /// Build the store from parsed rows in input order.
    ///
    /// Display rows and the forecast projection are deduplicated separately,
    /// each keeping the first row per date, then sorted by date.
    pub fn from_records(headers: Vec<String>, records: Vec<Record>) -> Result<Self> {
        if records.is_empty() {
            return Err(ForecastError::LoadError("No data rows found".to_string()));
        }

        let projected: Vec<Observation> = records.iter().map(Record::observation).collect();

        let (mut display, dropped_duplicates) = dedupe_first(records, |r| r.date);
        display.sort_by_key(|r| r.date);
        let series = Series::from_sorted(display.iter().map(Record::observation).collect());

        let training = Series::from_observations(projected);

        if dropped_duplicates > 0 {
            warn!(
                dropped = dropped_duplicates,
                "Dropped rows repeating an earlier date"
            );
        }
        info!(
            observations = series.len(),
            first = ?series.first().map(|o| o.date),
            last = ?series.last().map(|o| o.date),
            "Series loaded"
        );

        Ok(Self {
            headers,
            records: display,
            series,
            training,
            dropped_duplicates,
        })
    }

    /// Original column names
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Deduplicated display rows with all original columns, sorted by date
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Display series
    pub fn series(&self) -> &Series {
        &self.series
    }

    /// Series handed to the forecast engine
    pub fn training_series(&self) -> &Series {
        &self.training
    }

    /// Number of input rows discarded as later duplicates of a date
    pub fn dropped_duplicates(&self) -> usize {
        self.dropped_duplicates
    }
}

/// Data loader for CSV sources
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a series from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<SeriesStore> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Opening series source");
        let file = File::open(path)?;
        Self::from_reader(file, options)
    }

    /// Load a series from any CSV reader with a header row
    pub fn from_reader<R: Read>(reader: R, options: &LoadOptions) -> Result<SeriesStore> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let date_idx = Self::column_index(&headers, &options.date_column)?;
        let value_idx = Self::column_index(&headers, &options.value_column)?;

        let mut records = Vec::new();
        for (i, row) in reader.records().enumerate() {
            let row = row?;
            let line = i + 1;

            let date_text = Self::field(&row, date_idx, line, &options.date_column)?;
            let date = parse_date(date_text, &options.date_formats).ok_or_else(|| {
                ForecastError::LoadError(format!(
                    "Row {}: cannot parse date '{}'",
                    line, date_text
                ))
            })?;

            let value_text = Self::field(&row, value_idx, line, &options.value_column)?;
            let value = parse_value(value_text).ok_or_else(|| {
                ForecastError::LoadError(format!(
                    "Row {}: '{}' is not a finite number",
                    line, value_text
                ))
            })?;

            records.push(Record {
                date,
                value,
                fields: row.iter().map(str::to_string).collect(),
            });
        }

        debug!(rows = records.len(), "Parsed input rows");
        SeriesStore::from_records(headers, records)
    }

    /// Locate a column by exact name, falling back to a case-insensitive match
    fn column_index(headers: &[String], name: &str) -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .or_else(|| headers.iter().position(|h| h.eq_ignore_ascii_case(name)))
            .ok_or_else(|| {
                ForecastError::LoadError(format!(
                    "Column '{}' not found (available: {})",
                    name,
                    headers.join(", ")
                ))
            })
    }

    fn field<'r>(
        row: &'r csv::StringRecord,
        idx: usize,
        line: usize,
        column: &str,
    ) -> Result<&'r str> {
        match row.get(idx) {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(ForecastError::LoadError(format!(
                "Row {}: missing value for column '{}'",
                line, column
            ))),
        }
    }
}

/// Parse a calendar date with the first matching format
pub fn parse_date<S: AsRef<str>>(text: &str, formats: &[S]) -> Option<NaiveDate> {
    let text = text.trim();
    formats.iter().find_map(|format| {
        let format = format.as_ref();
        NaiveDate::parse_from_str(text, format)
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(text, format)
                    .ok()
                    .map(|dt| dt.date())
            })
    })
}

fn parse_value(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

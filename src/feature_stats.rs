//! Per-feature descriptive statistics.
//!
//! [`compute`] turns one column plus its declared [`FeatureType`] into a
//! [`FeatureStatistics`] record. Missing values are expected input, not
//! errors: they are counted, and they may even be the most common value.
//!
//! Two kinds of "nothing" are kept apart. A column with zero rows yields
//! `None` for every statistic (nothing was computed), while a column whose
//! rows are all missing yields computed-but-undefined values (`NaN` for
//! numeric aggregates, `"nan"` for datetime bounds).
//!
//! # Example
//!
//! ```
//! use u_quality::dataframe::Column;
//! use u_quality::feature_stats::{compute, FeatureType, FeatureValue};
//!
//! let col = Column::numeric_from(vec![None, Some(2.0), Some(2.0), Some(432.0)]);
//! let stats = compute("x", &col, FeatureType::Numeric).unwrap();
//!
//! assert_eq!(stats.count, 3);
//! assert_eq!(stats.missing_count, Some(1));
//! assert_eq!(stats.percentile_75, Some(217.0));
//! assert_eq!(stats.mean, Some(145.33));
//! assert_eq!(stats.most_common_value, Some(FeatureValue::Number(2.0)));
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::dataframe::Column;
use crate::error::{QualityError, Result};
use crate::report::{serialize_float, serialize_opt_float};

/// Rendering of timestamps in statistics records.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Placeholder for datetime bounds and modes that are undefined.
pub const MISSING_TIMESTAMP: &str = "nan";

const TIMESTAMP_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

// ── Types ─────────────────────────────────────────────────────────────

/// Declared statistical type of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureType {
    #[serde(rename = "num")]
    Numeric,
    #[serde(rename = "cat")]
    Categorical,
    #[serde(rename = "datetime")]
    Datetime,
}

/// A single value reported inside a statistics record.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    Bool(bool),
    Text(String),
    /// A missing value; reported when missing is the mode.
    Missing,
}

impl Serialize for FeatureValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Number(v) => serialize_float(v, serializer),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Missing => serializer.serialize_none(),
        }
    }
}

/// Descriptive statistics of one feature in one dataset.
///
/// Field applicability depends on [`feature_type`](Self::feature_type):
/// numeric-only fields are `None` for categorical and datetime features, and
/// datetime features report `min`/`max` as formatted timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureStatistics {
    pub feature_type: FeatureType,
    /// Non-missing, finite values.
    pub count: usize,
    pub infinite_count: Option<usize>,
    #[serde(serialize_with = "serialize_opt_float")]
    pub infinite_percentage: Option<f64>,
    pub missing_count: Option<usize>,
    #[serde(serialize_with = "serialize_opt_float")]
    pub missing_percentage: Option<f64>,
    pub unique_count: Option<usize>,
    #[serde(serialize_with = "serialize_opt_float")]
    pub unique_percentage: Option<f64>,
    #[serde(serialize_with = "serialize_opt_float")]
    pub percentile_25: Option<f64>,
    #[serde(serialize_with = "serialize_opt_float")]
    pub percentile_50: Option<f64>,
    #[serde(serialize_with = "serialize_opt_float")]
    pub percentile_75: Option<f64>,
    pub max: Option<FeatureValue>,
    pub min: Option<FeatureValue>,
    #[serde(serialize_with = "serialize_opt_float")]
    pub mean: Option<f64>,
    #[serde(serialize_with = "serialize_opt_float")]
    pub std: Option<f64>,
    pub most_common_value: Option<FeatureValue>,
    #[serde(serialize_with = "serialize_opt_float")]
    pub most_common_value_percentage: Option<f64>,
    /// Reserved; no feature type populates it.
    pub most_common_not_null_value: Option<FeatureValue>,
    /// Reserved; no feature type populates it.
    #[serde(serialize_with = "serialize_opt_float")]
    pub most_common_not_null_value_percentage: Option<f64>,
    /// Categories seen in current data but not in reference data.
    pub new_in_current_values_count: Option<usize>,
    /// Categories seen in reference data but not in current data.
    pub unused_in_current_values_count: Option<usize>,
}

impl FeatureStatistics {
    /// Record for a column with zero rows: `count = 0`, everything else `None`.
    pub fn empty(feature_type: FeatureType) -> Self {
        Self {
            feature_type,
            count: 0,
            infinite_count: None,
            infinite_percentage: None,
            missing_count: None,
            missing_percentage: None,
            unique_count: None,
            unique_percentage: None,
            percentile_25: None,
            percentile_50: None,
            percentile_75: None,
            max: None,
            min: None,
            mean: None,
            std: None,
            most_common_value: None,
            most_common_value_percentage: None,
            most_common_not_null_value: None,
            most_common_not_null_value_percentage: None,
            new_in_current_values_count: None,
            unused_in_current_values_count: None,
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────

/// Computes statistics for `column` read as `declared`.
///
/// `name` is only used in error messages. Numeric and datetime reads of
/// text values that do not parse fail with [`QualityError::Coercion`].
pub fn compute(name: &str, column: &Column, declared: FeatureType) -> Result<FeatureStatistics> {
    match declared {
        FeatureType::Numeric => Ok(numeric_statistics(&numeric_values(name, column)?)),
        FeatureType::Categorical => Ok(categorical_statistics(&category_keys(column))),
        FeatureType::Datetime => Ok(datetime_statistics(&datetime_values(name, column)?)),
    }
}

// ── Numeric ───────────────────────────────────────────────────────────

/// Statistics of numeric values; `None` and `NaN` both count as missing.
pub fn numeric_statistics(values: &[Option<f64>]) -> FeatureStatistics {
    let total = values.len();
    if total == 0 {
        return FeatureStatistics::empty(FeatureType::Numeric);
    }

    let present: Vec<f64> = values.iter().flatten().copied().filter(|v| !v.is_nan()).collect();
    let missing_count = total - present.len();
    let infinite_count = present.iter().filter(|v| v.is_infinite()).count();
    let finite: Vec<f64> = present.iter().copied().filter(|v| v.is_finite()).collect();

    let unique_count = finite.iter().map(|&v| float_key(v)).collect::<HashSet<_>>().len();
    let (mode, mode_count) = most_common(
        values
            .iter()
            .map(|v| v.filter(|x| !x.is_nan()).map(float_key)),
    );

    let aggregates = NumericAggregates::of(&finite);

    FeatureStatistics {
        count: finite.len(),
        infinite_count: Some(infinite_count),
        infinite_percentage: Some(percentage(infinite_count, total)),
        missing_count: Some(missing_count),
        missing_percentage: Some(percentage(missing_count, total)),
        unique_count: Some(unique_count),
        unique_percentage: Some(share_of_present(unique_count, present.len())),
        percentile_25: Some(aggregates.p25),
        percentile_50: Some(aggregates.p50),
        percentile_75: Some(aggregates.p75),
        max: Some(FeatureValue::Number(aggregates.max)),
        min: Some(FeatureValue::Number(aggregates.min)),
        mean: Some(aggregates.mean),
        std: Some(aggregates.std),
        most_common_value: Some(match mode {
            Some(bits) => FeatureValue::Number(f64::from_bits(bits)),
            None => FeatureValue::Missing,
        }),
        most_common_value_percentage: Some(percentage(mode_count, total)),
        ..FeatureStatistics::empty(FeatureType::Numeric)
    }
}

/// Rounded aggregates over finite values; all `NaN` when there are none.
struct NumericAggregates {
    min: f64,
    max: f64,
    mean: f64,
    std: f64,
    p25: f64,
    p50: f64,
    p75: f64,
}

impl NumericAggregates {
    fn of(finite: &[f64]) -> Self {
        use u_numflow::stats;

        let quantile = |p: f64| stats::quantile(finite, p).unwrap_or(f64::NAN);
        Self {
            min: round2(stats::min(finite).unwrap_or(f64::NAN)),
            max: round2(stats::max(finite).unwrap_or(f64::NAN)),
            mean: round2(stats::mean(finite).unwrap_or(f64::NAN)),
            // Sample std (n - 1); undefined for a single value.
            std: round2(stats::std_dev(finite).unwrap_or(f64::NAN)),
            p25: round2(quantile(0.25)),
            p50: round2(quantile(0.5)),
            p75: round2(quantile(0.75)),
        }
    }
}

// ── Categorical ───────────────────────────────────────────────────────

/// Statistics of category labels; `None` is missing.
pub fn categorical_statistics(keys: &[Option<CategoryKey<'_>>]) -> FeatureStatistics {
    let total = keys.len();
    if total == 0 {
        return FeatureStatistics::empty(FeatureType::Categorical);
    }

    let missing_count = keys.iter().filter(|k| k.is_none()).count();
    let count = total - missing_count;
    let unique_count = keys.iter().flatten().collect::<HashSet<_>>().len();
    let (mode, mode_count) = most_common(keys.iter().copied());

    FeatureStatistics {
        count,
        missing_count: Some(missing_count),
        missing_percentage: Some(percentage(missing_count, total)),
        unique_count: Some(unique_count),
        unique_percentage: Some(share_of_present(unique_count, count)),
        most_common_value: Some(mode.map_or(FeatureValue::Missing, CategoryKey::to_value)),
        most_common_value_percentage: Some(percentage(mode_count, total)),
        ..FeatureStatistics::empty(FeatureType::Categorical)
    }
}

/// Hashable identity of a category label.
///
/// Labels from different storage kinds never compare equal: the number `2`
/// and the string `"2"` are distinct categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryKey<'a> {
    /// Bit pattern of a non-NaN `f64` (`-0.0` folded into `0.0`).
    Number(u64),
    Bool(bool),
    Text(&'a str),
    Timestamp(NaiveDateTime),
}

impl CategoryKey<'_> {
    /// Converts the key back into a reportable value.
    pub fn to_value(self) -> FeatureValue {
        match self {
            Self::Number(bits) => FeatureValue::Number(f64::from_bits(bits)),
            Self::Bool(b) => FeatureValue::Bool(b),
            Self::Text(s) => FeatureValue::Text(s.to_string()),
            Self::Timestamp(ts) => FeatureValue::Text(format_timestamp(ts)),
        }
    }
}

/// Reads every row of `column` as a category label (`None` = missing).
pub fn category_keys(column: &Column) -> Vec<Option<CategoryKey<'_>>> {
    match column {
        Column::Numeric { values, validity } => values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                (validity.is_valid(i) && !v.is_nan()).then(|| CategoryKey::Number(float_key(v)))
            })
            .collect(),
        Column::Boolean { values, validity } => values
            .iter()
            .enumerate()
            .map(|(i, &v)| validity.is_valid(i).then_some(CategoryKey::Bool(v)))
            .collect(),
        Column::Categorical { .. } => (0..column.len())
            .map(|i| column.category_at(i).map(CategoryKey::Text))
            .collect(),
        Column::Text { values, validity } => values
            .iter()
            .enumerate()
            .map(|(i, v)| validity.is_valid(i).then_some(CategoryKey::Text(v.as_str())))
            .collect(),
        Column::Datetime { values, validity } => values
            .iter()
            .enumerate()
            .map(|(i, &v)| validity.is_valid(i).then_some(CategoryKey::Timestamp(v)))
            .collect(),
    }
}

/// Distinct non-missing category labels of `column`.
pub fn distinct_categories(column: &Column) -> HashSet<CategoryKey<'_>> {
    category_keys(column).into_iter().flatten().collect()
}

// ── Datetime ──────────────────────────────────────────────────────────

/// Statistics of timestamps; `None` is missing.
pub fn datetime_statistics(values: &[Option<NaiveDateTime>]) -> FeatureStatistics {
    let total = values.len();
    if total == 0 {
        return FeatureStatistics::empty(FeatureType::Datetime);
    }

    let present: Vec<NaiveDateTime> = values.iter().flatten().copied().collect();
    let missing_count = total - present.len();
    let base = FeatureStatistics {
        count: present.len(),
        missing_count: Some(missing_count),
        missing_percentage: Some(percentage(missing_count, total)),
        ..FeatureStatistics::empty(FeatureType::Datetime)
    };

    let (Some(min), Some(max)) = (present.iter().min(), present.iter().max()) else {
        let nan = || Some(FeatureValue::Text(MISSING_TIMESTAMP.to_string()));
        return FeatureStatistics {
            unique_count: Some(0),
            unique_percentage: Some(0.0),
            min: nan(),
            max: nan(),
            most_common_value: nan(),
            most_common_value_percentage: Some(100.0),
            ..base
        };
    };

    let unique_count = present.iter().collect::<HashSet<_>>().len();
    let (mode, mode_count) = most_common(values.iter().copied());
    let mode = mode.map_or_else(|| MISSING_TIMESTAMP.to_string(), format_timestamp);

    FeatureStatistics {
        unique_count: Some(unique_count),
        unique_percentage: Some(share_of_present(unique_count, present.len())),
        min: Some(FeatureValue::Text(format_timestamp(*min))),
        max: Some(FeatureValue::Text(format_timestamp(*max))),
        most_common_value: Some(FeatureValue::Text(mode)),
        most_common_value_percentage: Some(percentage(mode_count, total)),
        ..base
    }
}

/// Formats a timestamp the way statistics records report it.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    TIMESTAMP_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// ── Coercion ──────────────────────────────────────────────────────────

pub(crate) fn numeric_values(name: &str, column: &Column) -> Result<Vec<Option<f64>>> {
    let coerce = |row: usize, raw: &str| {
        raw.trim()
            .parse::<f64>()
            .map_err(|_| coercion_error(name, row, raw, "numeric"))
    };

    match column {
        Column::Numeric { values, validity } => Ok(values
            .iter()
            .enumerate()
            .map(|(i, &v)| validity.is_valid(i).then_some(v))
            .collect()),
        Column::Boolean { values, validity } => Ok(values
            .iter()
            .enumerate()
            .map(|(i, &v)| validity.is_valid(i).then_some(if v { 1.0 } else { 0.0 }))
            .collect()),
        Column::Categorical { .. } => (0..column.len())
            .map(|i| column.category_at(i).map(|s| coerce(i, s)).transpose())
            .collect(),
        Column::Text { .. } => (0..column.len())
            .map(|i| column.text_at(i).map(|s| coerce(i, s)).transpose())
            .collect(),
        Column::Datetime { values, validity } => match validity.valid_indices().next() {
            Some(row) => Err(coercion_error(name, row, &format_timestamp(values[row]), "numeric")),
            None => Ok(vec![None; column.len()]),
        },
    }
}

fn datetime_values(name: &str, column: &Column) -> Result<Vec<Option<NaiveDateTime>>> {
    let coerce = |row: usize, raw: &str| {
        parse_timestamp(raw).ok_or_else(|| coercion_error(name, row, raw, "datetime"))
    };

    match column {
        Column::Datetime { .. } => Ok((0..column.len()).map(|i| column.datetime_at(i)).collect()),
        Column::Categorical { .. } => (0..column.len())
            .map(|i| column.category_at(i).map(|s| coerce(i, s)).transpose())
            .collect(),
        Column::Text { .. } => (0..column.len())
            .map(|i| column.text_at(i).map(|s| coerce(i, s)).transpose())
            .collect(),
        Column::Numeric { .. } | Column::Boolean { .. } => {
            let first_present = category_keys(column)
                .into_iter()
                .enumerate()
                .find_map(|(row, key)| key.map(|k| (row, k)));
            match first_present {
                Some((row, key)) => {
                    let raw = match key.to_value() {
                        FeatureValue::Number(v) => v.to_string(),
                        FeatureValue::Bool(b) => b.to_string(),
                        _ => String::new(),
                    };
                    Err(coercion_error(name, row, &raw, "datetime"))
                }
                None => Ok(vec![None; column.len()]),
            }
        }
    }
}

fn coercion_error(column: &str, row: usize, value: &str, target: &'static str) -> QualityError {
    tracing::warn!(column, row, value, expected = target, "value cannot be coerced");
    QualityError::Coercion {
        column: column.to_string(),
        row,
        value: value.to_string(),
        target,
    }
}

// ── Helpers ───────────────────────────────────────────────────────────

/// Most frequent value (missing included) and its count.
///
/// Ties go to the value whose first occurrence is latest.
fn most_common<K: Hash + Eq + Copy>(
    values: impl IntoIterator<Item = Option<K>>,
) -> (Option<K>, usize) {
    let mut counts: HashMap<Option<K>, usize> = HashMap::new();
    let mut order: Vec<Option<K>> = Vec::new();
    for value in values {
        let count = counts.entry(value).or_insert(0);
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }

    let mut best = (None, 0);
    for key in order {
        let count = counts[&key];
        if count >= best.1 {
            best = (key, count);
        }
    }
    best
}

fn float_key(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    100.0 * part as f64 / total as f64
}

fn share_of_present(unique: usize, present: usize) -> f64 {
    if present == 0 {
        0.0
    } else {
        percentage(unique, present)
    }
}

/// Rounds to two decimals, half to even on the scaled value.
fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

// ── Tests ─────────────────────────────────────────────────────────────

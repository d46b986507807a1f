//! Column-major DataFrame for tabular data.
//!
//! The [`DataFrame`] stores data in column-major order with typed columns
//! and a compact validity bitmap for tracking missing values. It is the
//! in-memory input of every statistic in this crate.
//!
//! # Column Types
//!
//! | Type | Storage | Use case |
//! |------|---------|----------|
//! | [`Numeric`](Column::Numeric) | `Vec<f64>` + bitmap | Continuous/integer values |
//! | [`Boolean`](Column::Boolean) | `Vec<bool>` + bitmap | True/false values |
//! | [`Categorical`](Column::Categorical) | Dictionary + `Vec<u32>` | Low-cardinality strings |
//! | [`Text`](Column::Text) | `Vec<String>` + bitmap | Free-form strings |
//! | [`Datetime`](Column::Datetime) | `Vec<NaiveDateTime>` + bitmap | Timestamps |
//!
//! # Example
//!
//! ```
//! use u_quality::dataframe::{Column, DataFrame};
//!
//! let df = DataFrame::new()
//!     .with_column("temperature", Column::numeric_from(vec![Some(20.5), None, Some(19.8)]))
//!     .unwrap();
//! assert_eq!(df.row_count(), 3);
//! assert_eq!(df.column_by_name("temperature").unwrap().null_count(), 1);
//! ```

use chrono::NaiveDateTime;
use std::collections::HashMap;

use crate::error::{QualityError, Result};

// ── ValidityBitmap ────────────────────────────────────────────────────

/// Bit-packed validity bitmap using `Vec<u64>`.
///
/// Each bit indicates whether the corresponding row is valid (1) or
/// missing/null (0).
#[derive(Debug, Clone, PartialEq)]
pub struct ValidityBitmap {
    bits: Vec<u64>,
    len: usize,
}

impl ValidityBitmap {
    /// Creates an empty bitmap with no rows.
    pub fn empty() -> Self {
        Self {
            bits: Vec::new(),
            len: 0,
        }
    }

    /// Builds a bitmap from a per-row validity flag.
    pub fn from_flags(flags: impl IntoIterator<Item = bool>) -> Self {
        let mut bitmap = Self::empty();
        for valid in flags {
            bitmap.push(valid);
        }
        bitmap
    }

    /// Returns `true` if the value at `idx` is valid (not null).
    #[inline]
    pub fn is_valid(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len, "index {idx} out of bounds (len={})", self.len);
        let (word, bit) = (idx / 64, idx % 64);
        (self.bits[word] >> bit) & 1 == 1
    }

    /// Appends a new position (valid or invalid).
    pub fn push(&mut self, valid: bool) {
        let idx = self.len;
        self.len += 1;
        if idx / 64 >= self.bits.len() {
            self.bits.push(0);
        }
        if valid {
            self.bits[idx / 64] |= 1u64 << (idx % 64);
        }
    }

    /// Returns the total number of tracked positions.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the bitmap tracks zero positions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Counts the number of null (invalid) positions.
    pub fn null_count(&self) -> usize {
        let valid_count: usize = self.bits.iter().map(|w| w.count_ones() as usize).sum();
        self.len - valid_count
    }

    /// Returns an iterator over indices of valid positions.
    pub fn valid_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&i| self.is_valid(i))
    }
}

// ── Column ────────────────────────────────────────────────────────────

/// A typed column with validity bitmap for missing values.
///
/// Invalid positions hold a placeholder (0.0, false, empty string, index 0
/// or the Unix epoch) that must be ignored. A numeric `NaN` stored at a valid
/// position is also treated as missing by the statistics.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Dense `f64` values. Null positions hold `0.0`.
    Numeric {
        values: Vec<f64>,
        validity: ValidityBitmap,
    },
    /// Boolean values. Null positions hold `false`.
    Boolean {
        values: Vec<bool>,
        validity: ValidityBitmap,
    },
    /// Dictionary-encoded categorical column.
    ///
    /// `dictionary` contains unique string values and `indices` maps each row
    /// to a dictionary index.
    Categorical {
        dictionary: Vec<String>,
        indices: Vec<u32>,
        validity: ValidityBitmap,
    },
    /// Free-form text column. Null positions hold an empty string.
    Text {
        values: Vec<String>,
        validity: ValidityBitmap,
    },
    /// Timestamp column. Null positions hold the Unix epoch.
    Datetime {
        values: Vec<NaiveDateTime>,
        validity: ValidityBitmap,
    },
}

impl Column {
    /// Creates a numeric column from optional values (`None` is missing).
    ///
    /// ```
    /// use u_quality::dataframe::Column;
    ///
    /// let col = Column::numeric_from(vec![Some(1.0), None, Some(f64::NAN)]);
    /// assert_eq!(col.len(), 3);
    /// assert_eq!(col.null_count(), 1);
    /// ```
    pub fn numeric_from(values: Vec<Option<f64>>) -> Self {
        let validity = ValidityBitmap::from_flags(values.iter().map(Option::is_some));
        let values = values.into_iter().map(|v| v.unwrap_or(0.0)).collect();
        Self::Numeric { values, validity }
    }

    /// Creates a boolean column from optional values.
    pub fn boolean_from(values: Vec<Option<bool>>) -> Self {
        let validity = ValidityBitmap::from_flags(values.iter().map(Option::is_some));
        let values = values.into_iter().map(|v| v.unwrap_or(false)).collect();
        Self::Boolean { values, validity }
    }

    /// Dictionary-encodes optional labels into a categorical column.
    ///
    /// ```
    /// use u_quality::dataframe::Column;
    ///
    /// let col = Column::categorical_from(vec![Some("y"), Some("n"), None, Some("y")]);
    /// assert_eq!(col.category_at(3), Some("y"));
    /// assert_eq!(col.category_at(2), None);
    /// ```
    pub fn categorical_from<S: AsRef<str>>(values: Vec<Option<S>>) -> Self {
        let mut dictionary: Vec<String> = Vec::new();
        let mut lookup: HashMap<String, u32> = HashMap::new();
        let mut indices = Vec::with_capacity(values.len());
        let mut validity = ValidityBitmap::empty();

        for value in &values {
            match value {
                Some(label) => {
                    let label = label.as_ref();
                    let idx = match lookup.get(label) {
                        Some(&idx) => idx,
                        None => {
                            let idx = dictionary.len() as u32;
                            dictionary.push(label.to_string());
                            lookup.insert(label.to_string(), idx);
                            idx
                        }
                    };
                    indices.push(idx);
                    validity.push(true);
                }
                None => {
                    indices.push(0);
                    validity.push(false);
                }
            }
        }

        Self::Categorical {
            dictionary,
            indices,
            validity,
        }
    }

    /// Creates a text column from optional strings.
    pub fn text_from<S: Into<String>>(values: Vec<Option<S>>) -> Self {
        let mut validity = ValidityBitmap::empty();
        let values = values
            .into_iter()
            .map(|v| {
                validity.push(v.is_some());
                v.map(Into::into).unwrap_or_default()
            })
            .collect();
        Self::Text { values, validity }
    }

    /// Creates a timestamp column from optional values.
    pub fn datetime_from(values: Vec<Option<NaiveDateTime>>) -> Self {
        let validity = ValidityBitmap::from_flags(values.iter().map(Option::is_some));
        let values = values.into_iter().map(Option::unwrap_or_default).collect();
        Self::Datetime { values, validity }
    }

    /// Returns the number of rows in this column.
    pub fn len(&self) -> usize {
        self.validity().len()
    }

    /// Returns `true` if the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a reference to the validity bitmap.
    pub fn validity(&self) -> &ValidityBitmap {
        match self {
            Self::Numeric { validity, .. }
            | Self::Boolean { validity, .. }
            | Self::Categorical { validity, .. }
            | Self::Text { validity, .. }
            | Self::Datetime { validity, .. } => validity,
        }
    }

    /// Returns the number of null values according to the bitmap.
    pub fn null_count(&self) -> usize {
        self.validity().null_count()
    }

    /// Returns the category string for a given row index in a categorical column.
    pub fn category_at(&self, idx: usize) -> Option<&str> {
        match self {
            Self::Categorical {
                dictionary,
                indices,
                validity,
            } if validity.is_valid(idx) => {
                dictionary.get(indices[idx] as usize).map(String::as_str)
            }
            _ => None,
        }
    }

    /// Returns the text value for a given row index in a text column.
    pub fn text_at(&self, idx: usize) -> Option<&str> {
        match self {
            Self::Text { values, validity } if validity.is_valid(idx) => Some(&values[idx]),
            _ => None,
        }
    }

    /// Returns the timestamp at `idx` in a datetime column.
    pub fn datetime_at(&self, idx: usize) -> Option<NaiveDateTime> {
        match self {
            Self::Datetime { values, validity } if validity.is_valid(idx) => Some(values[idx]),
            _ => None,
        }
    }
}

// ── DataFrame ─────────────────────────────────────────────────────────

/// Column-major tabular data structure.
///
/// Stores named columns of typed data. All columns must have the same
/// number of rows.
#[derive(Debug, Clone, Default)]
pub struct DataFrame {
    names: Vec<String>,
    columns: Vec<Column>,
    row_count: usize,
}

impl DataFrame {
    /// Creates an empty DataFrame with no columns or rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named column to the DataFrame.
    ///
    /// Returns an error if the column length doesn't match the existing
    /// row count (unless this is the first column).
    pub fn add_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let col_len = column.len();
        if self.columns.is_empty() {
            self.row_count = col_len;
        } else if col_len != self.row_count {
            return Err(QualityError::DimensionMismatch {
                expected: self.row_count,
                actual: col_len,
            });
        }
        self.names.push(name.into());
        self.columns.push(column);
        Ok(())
    }

    /// Chaining form of [`add_column`](Self::add_column).
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self> {
        self.add_column(name, column)?;
        Ok(self)
    }

    /// Returns the number of rows.
    #[inline]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Returns `true` if the DataFrame has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns a reference to the column with the given `name`.
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }

    /// Like [`column_by_name`](Self::column_by_name) but fails with
    /// [`QualityError::ColumnNotFound`].
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column_by_name(name)
            .ok_or_else(|| QualityError::ColumnNotFound {
                name: name.to_string(),
            })
    }

}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // ── ValidityBitmap tests ──────────────────────────────────────

    #[test]
    fn bitmap_boundary_64() {
        let bm = ValidityBitmap::from_flags(std::iter::repeat(true).take(64));
        assert_eq!(bm.bits.len(), 1);
        assert_eq!(bm.null_count(), 0);

        let bm65 = ValidityBitmap::from_flags(std::iter::repeat(true).take(65));
        assert_eq!(bm65.bits.len(), 2);
        assert!(bm65.is_valid(64));
    }

    #[test]
    fn bitmap_push_across_word_boundary() {
        let bm = ValidityBitmap::from_flags((0..130).map(|i| i % 3 != 0));
        assert_eq!(bm.len(), 130);
        let expected_nulls = (0..130).filter(|i| i % 3 == 0).count();
        assert_eq!(bm.null_count(), expected_nulls);
        assert_eq!(bm.valid_indices().count(), 130 - expected_nulls);
    }

    #[test]
    fn bitmap_valid_indices() {
        let bm = ValidityBitmap::from_flags([true, false, true, false, true]);
        let indices: Vec<usize> = bm.valid_indices().collect();
        assert_eq!(indices, vec![0, 2, 4]);
    }

    // ── Column tests ─────────────────────────────────────────────

    #[test]
    fn numeric_from_options() {
        let col = Column::numeric_from(vec![Some(1.0), None, Some(3.0)]);
        assert_eq!(col.len(), 3);
        assert_eq!(col.null_count(), 1);
        match &col {
            Column::Numeric { values, validity } => {
                assert_eq!(values, &vec![1.0, 0.0, 3.0]);
                assert!(!validity.is_valid(1));
            }
            other => panic!("unexpected column {other:?}"),
        }
    }

    #[test]
    fn categorical_from_dictionary_encodes() {
        let col = Column::categorical_from(vec![Some("a"), Some("b"), None, Some("a")]);
        match &col {
            Column::Categorical {
                dictionary,
                indices,
                ..
            } => {
                assert_eq!(dictionary, &vec!["a".to_string(), "b".to_string()]);
                assert_eq!(indices, &vec![0, 1, 0, 0]);
            }
            other => panic!("unexpected column {other:?}"),
        }
        assert_eq!(col.category_at(1), Some("b"));
        assert_eq!(col.category_at(2), None);
    }

    #[test]
    fn text_and_datetime_accessors() {
        let text = Column::text_from(vec![None, Some("world")]);
        assert_eq!(text.text_at(0), None);
        assert_eq!(text.text_at(1), Some("world"));

        let ts = NaiveDate::from_ymd_opt(2012, 1, 5)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid timestamp");
        let dates = Column::datetime_from(vec![Some(ts), None]);
        assert_eq!(dates.datetime_at(0), Some(ts));
        assert_eq!(dates.datetime_at(1), None);
    }

    // ── DataFrame tests ──────────────────────────────────────────

    #[test]
    fn add_columns_and_lookup() {
        let df = DataFrame::new()
            .with_column("x", Column::numeric_from(vec![Some(1.0), Some(2.0)]))
            .and_then(|df| df.with_column("y", Column::boolean_from(vec![Some(true), None])))
            .expect("columns of equal length");

        assert_eq!(df.row_count(), 2);
        assert!(!df.is_empty());
        assert_eq!(df.column_by_name("y").map(Column::null_count), Some(1));
        assert!(df.column_by_name("z").is_none());
    }

    #[test]
    fn column_length_mismatch() {
        let mut df = DataFrame::new();
        df.add_column("x", Column::numeric_from(vec![Some(1.0), Some(2.0)]))
            .unwrap();
        let err = df
            .add_column("y", Column::numeric_from(vec![Some(1.0)]))
            .unwrap_err();
        assert!(matches!(
            err,
            QualityError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn require_missing_column_is_schema_error() {
        let df = DataFrame::new();
        let err = df.require_column("nope").unwrap_err();
        assert!(matches!(err, QualityError::ColumnNotFound { ref name } if name == "nope"));
    }
}

//! Error types for u-quality.

use thiserror::Error;

/// All errors produced by u-quality operations.
///
/// Undefined statistics (standard deviation of one value, Cramér's V over a
/// degenerate contingency table, percentiles of an empty set) are not errors:
/// they resolve to `NaN`, `0` or `None` in the returned records.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QualityError {
    /// A column named by the column typing is absent from the DataFrame.
    #[error("column '{name}' not found")]
    ColumnNotFound { name: String },

    /// A value could not be read as the declared feature type.
    #[error("column '{column}' row {row}: cannot read {value:?} as {target}")]
    Coercion {
        column: String,
        row: usize,
        value: String,
        target: &'static str,
    },

    /// Column lengths disagree.
    #[error("expected {expected} elements, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Result encoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for QualityError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, QualityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = QualityError::ColumnNotFound {
            name: "age".into(),
        };
        assert_eq!(err.to_string(), "column 'age' not found");

        let err = QualityError::Coercion {
            column: "price".into(),
            row: 3,
            value: "abc".into(),
            target: "numeric",
        };
        assert_eq!(
            err.to_string(),
            "column 'price' row 3: cannot read \"abc\" as numeric"
        );
    }
}

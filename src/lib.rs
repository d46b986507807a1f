//! # u-quality
//!
//! Data-quality statistics for tabular datasets.
//!
//! u-quality summarizes each column of a reference dataset (and optionally
//! a current dataset) according to a caller-supplied column typing, counts
//! categories that appeared or disappeared between the two, and measures
//! association between features.
//!
//! ## Modules
//!
//! - [`dataframe`]: Column-major tabular data model (DataFrame, Column, ValidityBitmap)
//! - [`columns`]: Resolved column typing (DatasetColumns, TaskType, ColumnTypingProvider)
//! - [`feature_stats`]: Per-feature statistics for numeric, categorical and datetime features
//! - [`quality`]: Per-dataset statistics bundles, new/unused category counts, AnalysisResult
//! - [`correlation`]: Pearson/Spearman/Kendall matrices, Cramér's V, feature selection
//! - [`report`]: JSON encoding with non-finite floats as `null`
//! - [`error`]: Error types
//!
//! ## Quick Start
//!
//! ```
//! use u_quality::columns::{DatasetColumns, TaskType};
//! use u_quality::dataframe::{Column, DataFrame};
//! use u_quality::quality::DataQualityAnalyzer;
//!
//! let reference = DataFrame::new()
//!     .with_column("age", Column::numeric_from(vec![Some(31.0), None, Some(45.0)]))
//!     .and_then(|df| df.with_column("city", Column::categorical_from(vec![Some("Oslo"), Some("Rome"), Some("Oslo")])))
//!     .unwrap();
//! let current = DataFrame::new()
//!     .with_column("age", Column::numeric_from(vec![Some(28.0), Some(52.0)]))
//!     .and_then(|df| df.with_column("city", Column::categorical_from(vec![Some("Oslo"), Some("Lima")])))
//!     .unwrap();
//!
//! let columns = DatasetColumns::new()
//!     .with_numerical(["age"])
//!     .with_categorical(["city"])
//!     .with_task(TaskType::Regression);
//!
//! let result = DataQualityAnalyzer::new()
//!     .calculate(&reference, Some(&current), &columns)
//!     .unwrap();
//!
//! assert_eq!(result.reference().num_features_stats["age"].missing_count, Some(1));
//! let city = &result.current().unwrap().cat_features_stats["city"];
//! assert_eq!(city.new_in_current_values_count, Some(1)); // Lima
//! assert_eq!(city.unused_in_current_values_count, Some(1)); // Rome
//! ```

pub mod columns;
pub mod correlation;
pub mod dataframe;
pub mod error;
pub mod feature_stats;
pub mod quality;
pub mod report;

pub use error::{QualityError, Result};

//! Dataset-level statistics bundles and reference/current comparison.
//!
//! [`aggregate`] runs the feature statistics calculator over every typed
//! column of a reference DataFrame and, optionally, a current one. When both
//! are present, categorical features of the current bundle also receive the
//! number of categories that appeared or disappeared relative to reference.
//!
//! # Example
//!
//! ```
//! use u_quality::columns::DatasetColumns;
//! use u_quality::dataframe::{Column, DataFrame};
//! use u_quality::quality::DataQualityAnalyzer;
//!
//! let reference = DataFrame::new()
//!     .with_column("city", Column::categorical_from(vec![Some("a"), Some("b"), Some("b")]))
//!     .unwrap();
//! let current = DataFrame::new()
//!     .with_column("city", Column::categorical_from(vec![Some("b"), Some("c")]))
//!     .unwrap();
//! let columns = DatasetColumns::new().with_categorical(["city"]);
//!
//! let result = DataQualityAnalyzer::new()
//!     .calculate(&reference, Some(&current), &columns)
//!     .unwrap();
//!
//! let city = &result.current().unwrap().cat_features_stats["city"];
//! assert_eq!(city.new_in_current_values_count, Some(1));
//! assert_eq!(city.unused_in_current_values_count, Some(1));
//! ```

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::columns::{ColumnTypingProvider, DatasetColumns, TaskType};
use crate::dataframe::{Column, DataFrame};
use crate::error::Result;
use crate::feature_stats::{compute, distinct_categories, FeatureStatistics, FeatureType};

/// Column name → statistics, in column-typing order.
pub type FeatureStatsMap = IndexMap<String, FeatureStatistics>;

/// Statistics of every typed column of one dataset, grouped by role.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetFeatureStatistics {
    pub num_features_stats: FeatureStatsMap,
    pub cat_features_stats: FeatureStatsMap,
    pub datetime_features_stats: FeatureStatsMap,
    pub target_stats: FeatureStatsMap,
    pub prediction_stats: FeatureStatsMap,
}

impl DatasetFeatureStatistics {
    /// Looks a column up across all role groups.
    pub fn get(&self, name: &str) -> Option<&FeatureStatistics> {
        self.iter().find(|(n, _)| *n == name).map(|(_, s)| s)
    }

    /// Iterates over every (name, statistics) pair, features first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureStatistics)> {
        self.num_features_stats
            .iter()
            .chain(&self.cat_features_stats)
            .chain(&self.datetime_features_stats)
            .chain(&self.target_stats)
            .chain(&self.prediction_stats)
            .map(|(n, s)| (n.as_str(), s))
    }

    /// Total number of statistics records.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut FeatureStatistics)> {
        self.num_features_stats
            .iter_mut()
            .chain(self.cat_features_stats.iter_mut())
            .chain(self.datetime_features_stats.iter_mut())
            .chain(self.target_stats.iter_mut())
            .chain(self.prediction_stats.iter_mut())
    }
}

/// Outcome of one [`DataQualityAnalyzer::calculate`] call.
///
/// Built once, then only read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    columns: DatasetColumns,
    reference_features_stats: DatasetFeatureStatistics,
    current_features_stats: Option<DatasetFeatureStatistics>,
}

impl AnalysisResult {
    /// The column typing the statistics were computed with.
    pub fn columns(&self) -> &DatasetColumns {
        &self.columns
    }

    /// Statistics of the reference dataset.
    pub fn reference(&self) -> &DatasetFeatureStatistics {
        &self.reference_features_stats
    }

    /// Statistics of the current dataset, if one was supplied.
    pub fn current(&self) -> Option<&DatasetFeatureStatistics> {
        self.current_features_stats.as_ref()
    }
}

/// Computes dataset statistics for reference and optional current data.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataQualityAnalyzer;

impl DataQualityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Computes statistics with an already resolved column typing.
    ///
    /// The task stored in `columns` decides how target and prediction
    /// columns are read.
    pub fn calculate(
        &self,
        reference: &DataFrame,
        current: Option<&DataFrame>,
        columns: &DatasetColumns,
    ) -> Result<AnalysisResult> {
        let (reference_features_stats, current_features_stats) =
            aggregate(reference, current, columns, columns.task)?;

        Ok(AnalysisResult {
            columns: columns.clone(),
            reference_features_stats,
            current_features_stats,
        })
    }

    /// Resolves the column typing of `reference` through `provider`, then
    /// calls [`calculate`](Self::calculate).
    pub fn calculate_with<P: ColumnTypingProvider + ?Sized>(
        &self,
        provider: &P,
        reference: &DataFrame,
        current: Option<&DataFrame>,
    ) -> Result<AnalysisResult> {
        let columns = provider.resolve(reference)?;
        self.calculate(reference, current, &columns)
    }
}

/// Builds the reference bundle and, when `current` is given, the current
/// bundle with categorical new/unused counts.
///
/// Any column error aborts the whole call.
pub fn aggregate(
    reference: &DataFrame,
    current: Option<&DataFrame>,
    columns: &DatasetColumns,
    task: Option<TaskType>,
) -> Result<(DatasetFeatureStatistics, Option<DatasetFeatureStatistics>)> {
    let target_type = TaskType::target_feature_type(task);

    let reference_stats = dataset_statistics(reference, columns, target_type)?;
    debug!(dataset = "reference", features = reference_stats.len(), "statistics computed");

    let current_stats = match current {
        Some(current) => {
            let mut stats = dataset_statistics(current, columns, target_type)?;
            apply_category_deltas(reference, current, &mut stats);
            debug!(dataset = "current", features = stats.len(), "statistics computed");
            Some(stats)
        }
        None => None,
    };

    Ok((reference_stats, current_stats))
}

/// Statistics for every typed column of a single DataFrame.
///
/// `target_type` applies to the target and every prediction column. Names
/// the DataFrame lacks are skipped.
pub fn dataset_statistics(
    df: &DataFrame,
    columns: &DatasetColumns,
    target_type: FeatureType,
) -> Result<DatasetFeatureStatistics> {
    Ok(DatasetFeatureStatistics {
        num_features_stats: group_statistics(
            df,
            &columns.numerical_feature_names,
            FeatureType::Numeric,
        )?,
        cat_features_stats: group_statistics(
            df,
            &columns.categorical_feature_names,
            FeatureType::Categorical,
        )?,
        datetime_features_stats: group_statistics(
            df,
            &columns.datetime_feature_names,
            FeatureType::Datetime,
        )?,
        target_stats: group_statistics(df, columns.target_name.as_slice(), target_type)?,
        prediction_stats: group_statistics(df, columns.prediction_names(), target_type)?,
    })
}

fn group_statistics(
    df: &DataFrame,
    names: &[String],
    declared: FeatureType,
) -> Result<FeatureStatsMap> {
    let mut stats = FeatureStatsMap::with_capacity(names.len());
    for name in names {
        match df.column_by_name(name) {
            Some(column) => {
                stats.insert(name.clone(), compute(name, column, declared)?);
            }
            None => debug!(column = name.as_str(), "column absent from dataset, skipped"),
        }
    }
    Ok(stats)
}

fn apply_category_deltas(
    reference: &DataFrame,
    current: &DataFrame,
    stats: &mut DatasetFeatureStatistics,
) {
    for (name, feature) in stats.iter_mut() {
        if feature.feature_type != FeatureType::Categorical {
            continue;
        }
        let (Some(reference_col), Some(current_col)) =
            (reference.column_by_name(name), current.column_by_name(name))
        else {
            continue;
        };
        let (new, unused) = category_deltas(reference_col, current_col);
        feature.new_in_current_values_count = Some(new);
        feature.unused_in_current_values_count = Some(unused);
    }
}

/// Counts distinct non-missing categories only in `current` (new) and only
/// in `reference` (unused).
///
/// ```
/// use u_quality::dataframe::Column;
/// use u_quality::quality::category_deltas;
///
/// let reference = Column::text_from(vec![Some(""), Some("a"), Some("b")]);
/// let current = Column::text_from(vec![Some("a"), Some("b")]);
/// assert_eq!(category_deltas(&reference, &current), (0, 1));
/// ```
pub fn category_deltas(reference: &Column, current: &Column) -> (usize, usize) {
    let reference = distinct_categories(reference);
    let current = distinct_categories(current);
    (
        current.difference(&reference).count(),
        reference.difference(&current).count(),
    )
}

// ── Tests ─────────────────────────────────────────────────────────────

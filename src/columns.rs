//! Resolved column typing consumed by the statistics engine.
//!
//! Mapping raw columns to semantic roles (numerical, categorical, datetime,
//! target, prediction) is done outside this crate. The engine only sees the
//! outcome as a [`DatasetColumns`] value, obtained either directly or through
//! a [`ColumnTypingProvider`].
//!
//! ```
//! use u_quality::columns::{DatasetColumns, TaskType};
//! use u_quality::feature_stats::FeatureType;
//!
//! let columns = DatasetColumns::new()
//!     .with_numerical(["age", "income"])
//!     .with_categorical(["city"])
//!     .with_target("churn")
//!     .with_task(TaskType::Classification);
//!
//! assert_eq!(columns.target_feature_type(), FeatureType::Categorical);
//! ```

use serde::{Deserialize, Serialize};

use crate::dataframe::DataFrame;
use crate::error::Result;
use crate::feature_stats::FeatureType;

/// Kind of model the target/prediction columns belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Classification,
    Regression,
}

impl TaskType {
    /// Declared type of target/prediction columns for an optional task.
    pub fn target_feature_type(task: Option<Self>) -> FeatureType {
        match task {
            Some(Self::Regression) => FeatureType::Numeric,
            Some(Self::Classification) | None => FeatureType::Categorical,
        }
    }
}

/// Column names grouped by semantic role.
///
/// Every name is expected to exist in the dataset header; the aggregator
/// skips names a particular DataFrame lacks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetColumns {
    pub numerical_feature_names: Vec<String>,
    pub categorical_feature_names: Vec<String>,
    pub datetime_feature_names: Vec<String>,
    pub target_name: Option<String>,
    pub prediction_names: Option<Vec<String>>,
    pub task: Option<TaskType>,
}

impl DatasetColumns {
    /// Creates an empty typing.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_numerical<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numerical_feature_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_categorical<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical_feature_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_datetime<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.datetime_feature_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_target(mut self, name: impl Into<String>) -> Self {
        self.target_name = Some(name.into());
        self
    }

    pub fn with_predictions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prediction_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_task(mut self, task: TaskType) -> Self {
        self.task = Some(task);
        self
    }

    /// Declared type of the target and prediction columns.
    ///
    /// Regression targets are numeric; classification and an unset task
    /// are categorical.
    pub fn target_feature_type(&self) -> FeatureType {
        TaskType::target_feature_type(self.task)
    }

    /// Prediction column names, empty when none are configured.
    pub fn prediction_names(&self) -> &[String] {
        self.prediction_names.as_deref().unwrap_or(&[])
    }
}

/// Source of the resolved column typing for a dataset.
///
/// Type inference lives behind this seam; the analyzer only calls it.
pub trait ColumnTypingProvider {
    /// Resolves the typing for `df`.
    fn resolve(&self, df: &DataFrame) -> Result<DatasetColumns>;
}

/// Provider returning a typing the caller already resolved.
#[derive(Debug, Clone, Default)]
pub struct ExplicitColumns(pub DatasetColumns);

impl ColumnTypingProvider for ExplicitColumns {
    fn resolve(&self, _df: &DataFrame) -> Result<DatasetColumns> {
        Ok(self.0.clone())
    }
}

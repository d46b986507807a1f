//! Feature association matrices.
//!
//! Numeric features are compared with Pearson (optionally Spearman or
//! Kendall τ-b) correlation, categorical features with Cramér's V. Columns
//! that are empty or constant carry no association signal and are left out
//! by [`select_correlated_features`].
//!
//! # Cramér's V
//!
//! ```
//! use u_quality::correlation::{cramers_v_from_table, CramersVCorrection};
//!
//! // 2x2 contingency table, row-major.
//! let table = [7.0, 8.0, 11.0, 2.0];
//! let v = cramers_v_from_table(&table, 2, 2, CramersVCorrection::None);
//! assert!((v - 0.394_982_779_385_881_6).abs() < 1e-12);
//! ```

use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use tracing::debug;

use crate::dataframe::DataFrame;
use crate::error::Result;
use crate::feature_stats::{category_keys, numeric_values, CategoryKey, FeatureType};
use crate::quality::{AnalysisResult, DatasetFeatureStatistics, FeatureStatsMap};
use crate::report::FiniteSlice;

// ── Configuration ─────────────────────────────────────────────────────

/// Method for numeric correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    /// Pearson product-moment correlation.
    Pearson,
    /// Spearman rank correlation.
    Spearman,
    /// Kendall τ-b rank correlation.
    Kendall,
}

/// Small-sample correction applied to Cramér's V.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CramersVCorrection {
    /// `V = sqrt((χ²/n) / min(k-1, r-1))`.
    #[default]
    None,
    /// Bergsma (2013) bias correction of φ², k and r.
    Bergsma,
}

/// Configuration for [`calculate_correlations`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Numeric matrices to compute. Default: Pearson, Spearman, Kendall.
    pub numeric_methods: Vec<CorrelationMethod>,
    /// Cramér's V variant. Default: uncorrected.
    pub cramers_v_correction: CramersVCorrection,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            numeric_methods: vec![
                CorrelationMethod::Pearson,
                CorrelationMethod::Spearman,
                CorrelationMethod::Kendall,
            ],
            cramers_v_correction: CramersVCorrection::None,
        }
    }
}

impl CorrelationConfig {
    /// Sets the numeric methods to compute.
    pub fn numeric_methods(mut self, methods: impl Into<Vec<CorrelationMethod>>) -> Self {
        self.numeric_methods = methods.into();
        self
    }

    /// Sets the Cramér's V variant.
    pub fn cramers_v_correction(mut self, correction: CramersVCorrection) -> Self {
        self.cramers_v_correction = correction;
        self
    }
}

// ── Matrix ────────────────────────────────────────────────────────────

/// Square, symmetric association matrix labelled by column name.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    names: Vec<String>,
    values: Vec<f64>,
}

impl CorrelationMatrix {
    /// Identity matrix over `names`; off-diagonal cells are filled in later.
    fn identity(names: &[String]) -> Self {
        let n = names.len();
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
        }
        Self {
            names: names.to_vec(),
            values,
        }
    }

    fn set_pair(&mut self, i: usize, j: usize, value: f64) {
        let n = self.size();
        self.values[i * n + j] = value;
        self.values[j * n + i] = value;
    }

    /// Number of rows (and columns).
    pub fn size(&self) -> usize {
        self.names.len()
    }

    /// Column names labelling both axes.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Value at row `i`, column `j`.
    ///
    /// # Panics
    ///
    /// Panics if `i` or `j` is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let n = self.size();
        assert!(i < n && j < n, "index ({i}, {j}) out of bounds for {n}x{n} matrix");
        self.values[i * n + j]
    }

    /// Value for a pair of column names.
    pub fn value(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        Some(self.get(i, j))
    }

    /// Matrix rows as nested vectors.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.values
            .chunks(self.size().max(1))
            .map(<[f64]>::to_vec)
            .collect()
    }
}

impl Serialize for CorrelationMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let rows: Vec<FiniteSlice<'_>> = self
            .values
            .chunks(self.size().max(1))
            .map(FiniteSlice)
            .collect();
        let mut state = serializer.serialize_struct("CorrelationMatrix", 2)?;
        state.serialize_field("columns", &self.names)?;
        state.serialize_field("values", &rows)?;
        state.end()
    }
}

// ── Feature selection ─────────────────────────────────────────────────

/// Picks the columns worth correlating from a statistics bundle.
///
/// Returns `(numeric, categorical)`. Numeric and categorical features need
/// more than one distinct value. A numeric target passing the same test is
/// appended last to the numeric list; the target never joins the
/// categorical list.
pub fn select_correlated_features(
    stats: &DatasetFeatureStatistics,
    target_name: Option<&str>,
) -> (Vec<String>, Vec<String>) {
    let varying = |map: &FeatureStatsMap| -> Vec<String> {
        map.iter()
            .filter(|(_, s)| s.unique_count.is_some_and(|u| u > 1))
            .map(|(name, _)| name.clone())
            .collect()
    };

    let mut numeric = varying(&stats.num_features_stats);
    let categorical = varying(&stats.cat_features_stats);

    let target = target_name.and_then(|name| stats.target_stats.get_key_value(name));
    if let Some((name, target_stats)) = target {
        if target_stats.feature_type == FeatureType::Numeric
            && target_stats.unique_count.is_some_and(|u| u > 1)
        {
            numeric.push(name.clone());
        }
    }

    debug!(
        numeric = numeric.len(),
        categorical = categorical.len(),
        "features selected for correlation"
    );
    (numeric, categorical)
}

// ── Numeric correlation ───────────────────────────────────────────────

/// Pearson correlation matrix over `columns` of `df`.
///
/// Each pair uses the rows where both values are finite. Pairs with fewer
/// than two such rows or without variance get `NaN`.
///
/// ```
/// use u_quality::correlation::compute_numeric_correlation;
/// use u_quality::dataframe::{Column, DataFrame};
///
/// let df = DataFrame::new()
///     .with_column("x", Column::numeric_from(vec![Some(1.0), Some(2.0), Some(3.0)]))
///     .and_then(|df| df.with_column("y", Column::numeric_from(vec![Some(6.0), Some(4.0), Some(2.0)])))
///     .unwrap();
/// let names = vec!["x".to_string(), "y".to_string()];
/// let matrix = compute_numeric_correlation(&df, &names).unwrap();
/// assert!((matrix.get(0, 1) + 1.0).abs() < 1e-12);
/// ```
pub fn compute_numeric_correlation(
    df: &DataFrame,
    columns: &[String],
) -> Result<CorrelationMatrix> {
    numeric_correlation(df, columns, CorrelationMethod::Pearson)
}

/// Numeric correlation matrix with an explicit method.
pub fn numeric_correlation(
    df: &DataFrame,
    columns: &[String],
    method: CorrelationMethod,
) -> Result<CorrelationMatrix> {
    let series = columns
        .iter()
        .map(|name| numeric_values(name, df.require_column(name)?))
        .collect::<Result<Vec<_>>>()?;

    let mut matrix = CorrelationMatrix::identity(columns);
    for i in 0..series.len() {
        for j in (i + 1)..series.len() {
            let (x, y) = complete_pairs(&series[i], &series[j]);
            let r = match method {
                CorrelationMethod::Pearson => pearson(&x, &y),
                CorrelationMethod::Spearman => {
                    u_analytics::correlation::spearman(&x, &y).map_or(f64::NAN, |c| c.r)
                }
                CorrelationMethod::Kendall => {
                    u_analytics::correlation::kendall_tau_b(&x, &y).map_or(f64::NAN, |c| c.r)
                }
            };
            matrix.set_pair(i, j, r);
        }
    }
    Ok(matrix)
}

fn complete_pairs(x: &[Option<f64>], y: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y)
        .filter_map(|pair| match pair {
            (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((*a, *b)),
            _ => None,
        })
        .unzip()
}

/// Pearson's r with sample covariance and standard deviations.
fn pearson(x: &[f64], y: &[f64]) -> f64 {
    use u_numflow::stats;

    if x.len() < 2 {
        return f64::NAN;
    }
    match (stats::covariance(x, y), stats::std_dev(x), stats::std_dev(y)) {
        (Some(cov), Some(sx), Some(sy)) if sx > 0.0 && sy > 0.0 => {
            (cov / (sx * sy)).clamp(-1.0, 1.0)
        }
        _ => f64::NAN,
    }
}

// ── Categorical association ───────────────────────────────────────────

/// Cramér's V matrix (uncorrected) over `columns` of `df`.
pub fn compute_categorical_association(
    df: &DataFrame,
    columns: &[String],
) -> Result<CorrelationMatrix> {
    categorical_association(df, columns, CramersVCorrection::None)
}

/// Cramér's V matrix with an explicit correction.
pub fn categorical_association(
    df: &DataFrame,
    columns: &[String],
    correction: CramersVCorrection,
) -> Result<CorrelationMatrix> {
    let series = columns
        .iter()
        .map(|name| df.require_column(name).map(category_keys))
        .collect::<Result<Vec<_>>>()?;

    let mut matrix = CorrelationMatrix::identity(columns);
    for i in 0..series.len() {
        for j in (i + 1)..series.len() {
            matrix.set_pair(i, j, cramers_v(&series[i], &series[j], correction));
        }
    }
    Ok(matrix)
}

/// Cramér's V between two equally long label sequences.
///
/// Rows where either label is missing are dropped. Returns `0.0` when the
/// contingency table has a single row or column.
pub fn cramers_v(
    x: &[Option<CategoryKey<'_>>],
    y: &[Option<CategoryKey<'_>>],
    correction: CramersVCorrection,
) -> f64 {
    let mut row_ids: HashMap<CategoryKey<'_>, usize> = HashMap::new();
    let mut col_ids: HashMap<CategoryKey<'_>, usize> = HashMap::new();
    let mut cells = Vec::new();

    for (a, b) in x.iter().zip(y) {
        if let (Some(a), Some(b)) = (a, b) {
            let next = row_ids.len();
            let r = *row_ids.entry(*a).or_insert(next);
            let next = col_ids.len();
            let c = *col_ids.entry(*b).or_insert(next);
            cells.push((r, c));
        }
    }

    let (n_rows, n_cols) = (row_ids.len(), col_ids.len());
    if n_rows < 2 || n_cols < 2 {
        return 0.0;
    }
    let mut table = vec![0.0; n_rows * n_cols];
    for (r, c) in cells {
        table[r * n_cols + c] += 1.0;
    }
    cramers_v_from_table(&table, n_rows, n_cols, correction)
}

/// Cramér's V of a row-major contingency table of observed counts.
///
/// The value does not depend on which variable spans the rows. Degenerate
/// tables (fewer than two rows or columns, a wrong size, fewer than two
/// observations, a non-positive corrected denominator) give `0.0`.
pub fn cramers_v_from_table(
    table: &[f64],
    n_rows: usize,
    n_cols: usize,
    correction: CramersVCorrection,
) -> f64 {
    if n_rows < 2 || n_cols < 2 || table.len() != n_rows * n_cols {
        return 0.0;
    }
    let n: f64 = table.iter().sum();
    if n <= 1.0 {
        return 0.0;
    }

    let (table, n_rows, n_cols) = canonical_orientation(table, n_rows, n_cols);
    let chi2 = u_analytics::testing::chi_squared_independence(&table, n_rows, n_cols)
        .map_or(0.0, |test| test.statistic);
    let (r, k) = (n_rows as f64, n_cols as f64);

    let ratio = match correction {
        CramersVCorrection::None => (chi2 / n) / (r.min(k) - 1.0),
        CramersVCorrection::Bergsma => {
            let phi2 = chi2 / n - (k - 1.0) * (r - 1.0) / (n - 1.0);
            let k_corr = k - (k - 1.0).powi(2) / (n - 1.0);
            let r_corr = r - (r - 1.0).powi(2) / (n - 1.0);
            let denom = (k_corr - 1.0).min(r_corr - 1.0);
            if denom <= 0.0 {
                return 0.0;
            }
            phi2 / denom
        }
    };

    // Rounding residue of an analytically zero ratio.
    if !ratio.is_finite() || ratio <= RATIO_EPSILON {
        return 0.0;
    }
    ratio.sqrt().min(1.0)
}

const RATIO_EPSILON: f64 = 1e-12;

/// Orients a table so that rows never outnumber columns; square tables take
/// the lexicographically smaller of the table and its transpose.
fn canonical_orientation(table: &[f64], n_rows: usize, n_cols: usize) -> (Vec<f64>, usize, usize) {
    let transposed: Vec<f64> = (0..n_cols)
        .flat_map(|c| (0..n_rows).map(move |r| table[r * n_cols + c]))
        .collect();

    let use_transpose = n_rows > n_cols
        || (n_rows == n_cols
            && transposed.as_slice().partial_cmp(table) == Some(std::cmp::Ordering::Less));
    if use_transpose {
        (transposed, n_cols, n_rows)
    } else {
        (table.to_vec(), n_rows, n_cols)
    }
}

// ── Dataset correlations ──────────────────────────────────────────────

/// All association matrices of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetCorrelations {
    /// One matrix per configured numeric method.
    pub numeric: IndexMap<CorrelationMethod, CorrelationMatrix>,
    /// Cramér's V over categorical features.
    pub cramer_v: CorrelationMatrix,
}

impl DatasetCorrelations {
    /// The Pearson matrix, if configured.
    pub fn pearson(&self) -> Option<&CorrelationMatrix> {
        self.numeric.get(&CorrelationMethod::Pearson)
    }
}

/// Computes every configured matrix over already selected columns.
pub fn calculate_correlations(
    df: &DataFrame,
    numeric_columns: &[String],
    categorical_columns: &[String],
    config: &CorrelationConfig,
) -> Result<DatasetCorrelations> {
    let numeric = config
        .numeric_methods
        .iter()
        .map(|&method| Ok((method, numeric_correlation(df, numeric_columns, method)?)))
        .collect::<Result<IndexMap<_, _>>>()?;

    Ok(DatasetCorrelations {
        numeric,
        cramer_v: categorical_association(df, categorical_columns, config.cramers_v_correction)?,
    })
}

/// Correlations for the datasets behind an [`AnalysisResult`].
///
/// Columns are selected once from the reference statistics and the same
/// selection is applied to current data.
pub fn correlations_for(
    result: &AnalysisResult,
    reference: &DataFrame,
    current: Option<&DataFrame>,
    config: &CorrelationConfig,
) -> Result<(DatasetCorrelations, Option<DatasetCorrelations>)> {
    let (numeric, categorical) =
        select_correlated_features(result.reference(), result.columns().target_name.as_deref());

    let reference_corr = calculate_correlations(reference, &numeric, &categorical, config)?;
    let current_corr = current
        .map(|df| calculate_correlations(df, &numeric, &categorical, config))
        .transpose()?;
    Ok((reference_corr, current_corr))
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{DatasetColumns, TaskType};
    use crate::dataframe::Column;
    use crate::error::QualityError;
    use crate::quality::{dataset_statistics, DataQualityAnalyzer};
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn labels(groups: &[(&str, usize)]) -> Column {
        Column::categorical_from(
            groups
                .iter()
                .flat_map(|&(label, n)| std::iter::repeat(Some(label)).take(n))
                .collect(),
        )
    }

    fn num(values: &[f64]) -> Column {
        Column::numeric_from(
            values
                .iter()
                .map(|&v| if v.is_nan() { None } else { Some(v) })
                .collect(),
        )
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn xyz_frame() -> DataFrame {
        DataFrame::new()
            .with_column("x", labels(&[("a", 15), ("b", 13)]))
            .and_then(|df| df.with_column("y", labels(&[("c", 7), ("d", 8), ("c", 11), ("d", 2)])))
            .and_then(|df| df.with_column("z", labels(&[("f", 14), ("e", 14)])))
            .expect("equal lengths")
    }

    // ── Cramér's V ───────────────────────────────────────────────

    #[test]
    fn cramers_v_reference_value() {
        let df = xyz_frame();
        let x = category_keys(df.column_by_name("x").unwrap());
        let y = category_keys(df.column_by_name("y").unwrap());
        let v = cramers_v(&x, &y, CramersVCorrection::None);
        assert_abs_diff_eq!(v, 0.394_982_779_385_881_6, epsilon = 1e-12);
        assert_abs_diff_eq!(v, cramers_v(&y, &x, CramersVCorrection::None), epsilon = 1e-15);
    }

    #[test]
    fn cramers_v_matrix() {
        let matrix = compute_categorical_association(&xyz_frame(), &names(&["x", "y", "z"])).unwrap();
        let expected = [
            [1.0, 0.394_982_78, 0.930_949_34],
            [0.394_982_78, 1.0, 0.298_142_4],
            [0.930_949_34, 0.298_142_4, 1.0],
        ];
        for (i, row) in expected.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                assert_abs_diff_eq!(matrix.get(i, j), value, epsilon = 1e-7);
            }
        }
        assert_eq!(matrix.value("z", "x"), Some(matrix.get(0, 2)));
    }

    #[test]
    fn cramers_v_bias_corrected() {
        let table = [7.0, 8.0, 11.0, 2.0];
        let n = 28.0;
        let chi2 = n * (7.0 * 2.0 - 8.0 * 11.0_f64).powi(2) / (15.0 * 13.0 * 18.0 * 10.0);
        let phi2 = chi2 / n - 1.0 / (n - 1.0);
        let corrected = 2.0 - 1.0 / (n - 1.0);
        let expected = (phi2 / (corrected - 1.0)).sqrt();

        let v = cramers_v_from_table(&table, 2, 2, CramersVCorrection::Bergsma);
        assert_abs_diff_eq!(v, expected, epsilon = 1e-12);
        assert!(v < cramers_v_from_table(&table, 2, 2, CramersVCorrection::None));
    }

    #[test]
    fn cramers_v_degenerate_tables_are_zero() {
        let constant = labels(&[("a", 5)]);
        let varying = labels(&[("a", 2), ("b", 3)]);
        let x = category_keys(&constant);
        let y = category_keys(&varying);
        assert_eq!(cramers_v(&x, &y, CramersVCorrection::None), 0.0);
        assert_eq!(cramers_v(&x, &y, CramersVCorrection::Bergsma), 0.0);

        assert_eq!(cramers_v_from_table(&[10.0, 20.0], 1, 2, CramersVCorrection::None), 0.0);
        assert_eq!(cramers_v_from_table(&[10.0], 2, 2, CramersVCorrection::None), 0.0);
        assert_eq!(cramers_v_from_table(&[1.0, 0.0, 0.0, 0.0], 2, 2, CramersVCorrection::Bergsma), 0.0);
    }

    #[test]
    fn cramers_v_is_orientation_free() {
        let pairs = [(0, 0), (2, 1), (2, 0), (0, 2), (1, 2), (2, 2), (1, 2), (1, 2), (2, 0)];
        let x = Column::text_from(pairs.iter().map(|(a, _): &(u8, u8)| Some(a.to_string())).collect());
        let y = Column::text_from(pairs.iter().map(|(_, b): &(u8, u8)| Some(b.to_string())).collect());
        let (kx, ky) = (category_keys(&x), category_keys(&y));

        // chi2 / n equals (k-1)(r-1)/(n-1) here, so the corrected phi2 is zero.
        assert_eq!(cramers_v(&kx, &ky, CramersVCorrection::Bergsma), 0.0);
        assert_eq!(cramers_v(&ky, &kx, CramersVCorrection::Bergsma), 0.0);
        assert_eq!(
            cramers_v(&kx, &ky, CramersVCorrection::None).to_bits(),
            cramers_v(&ky, &kx, CramersVCorrection::None).to_bits()
        );
        assert_abs_diff_eq!(cramers_v(&kx, &ky, CramersVCorrection::None), 0.5, epsilon = 1e-12);

        let table = [3.0, 0.0, 5.0, 1.0, 4.0, 2.0];
        let transposed = [3.0, 1.0, 0.0, 4.0, 5.0, 2.0];
        for correction in [CramersVCorrection::None, CramersVCorrection::Bergsma] {
            assert_eq!(
                cramers_v_from_table(&table, 2, 3, correction).to_bits(),
                cramers_v_from_table(&transposed, 3, 2, correction).to_bits()
            );
        }
    }

    #[test]
    fn cramers_v_ignores_missing_rows() {
        let x = Column::text_from(vec![Some("a"), Some("b"), None, Some("a"), Some("b")]);
        let y = Column::text_from(vec![Some("c"), Some("d"), Some("c"), None, Some("d")]);
        let v = cramers_v(&category_keys(&x), &category_keys(&y), CramersVCorrection::None);
        assert_abs_diff_eq!(v, 1.0, epsilon = 1e-12);
    }

    // ── Numeric correlation ──────────────────────────────────────

    #[test]
    fn pearson_matrix() {
        let df = DataFrame::new()
            .with_column("x", num(&[1.0, 2.0, 3.0, 4.0, 5.0]))
            .and_then(|df| df.with_column("y", num(&[2.0, 4.0, 6.0, 8.0, 10.0])))
            .and_then(|df| df.with_column("z", num(&[5.0, 4.0, 3.0, 2.0, 1.0])))
            .unwrap();
        let matrix = compute_numeric_correlation(&df, &names(&["x", "y", "z"])).unwrap();
        assert_eq!(matrix.size(), 3);
        assert_abs_diff_eq!(matrix.get(0, 0), 1.0);
        assert_abs_diff_eq!(matrix.get(0, 1), 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(matrix.get(0, 2), -1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(matrix.get(2, 1), -1.0, epsilon = 1e-10);
    }

    #[test]
    fn pearson_uses_pairwise_complete_rows() {
        let df = DataFrame::new()
            .with_column("x", num(&[1.0, 2.0, f64::NAN, 4.0, 5.0]))
            .and_then(|df| df.with_column("y", num(&[1.0, 2.0, 100.0, f64::INFINITY, 5.0])))
            .unwrap();
        let matrix = compute_numeric_correlation(&df, &names(&["x", "y"])).unwrap();
        assert_abs_diff_eq!(matrix.get(0, 1), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn pearson_without_variance_is_nan() {
        let df = DataFrame::new()
            .with_column("x", num(&[1.0, 2.0, 3.0]))
            .and_then(|df| df.with_column("c", num(&[7.0, 7.0, 7.0])))
            .unwrap();
        let matrix = compute_numeric_correlation(&df, &names(&["x", "c"])).unwrap();
        assert!(matrix.get(0, 1).is_nan());
        assert_eq!(matrix.get(1, 1), 1.0);
    }

    #[test]
    fn rank_methods() {
        let df = DataFrame::new()
            .with_column("x", num(&[1.0, 2.0, 3.0, 4.0, 5.0]))
            .and_then(|df| df.with_column("y", num(&[1.0, 4.0, 9.0, 16.0, 25.0])))
            .unwrap();
        let cols = names(&["x", "y"]);
        let spearman = numeric_correlation(&df, &cols, CorrelationMethod::Spearman).unwrap();
        let kendall = numeric_correlation(&df, &cols, CorrelationMethod::Kendall).unwrap();
        assert_abs_diff_eq!(spearman.get(0, 1), 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(kendall.get(0, 1), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn unknown_column_is_schema_error() {
        let err = compute_numeric_correlation(&DataFrame::new(), &names(&["ghost"])).unwrap_err();
        assert!(matches!(err, QualityError::ColumnNotFound { .. }));
        let err = compute_categorical_association(&DataFrame::new(), &names(&["ghost"])).unwrap_err();
        assert!(matches!(err, QualityError::ColumnNotFound { .. }));
    }

    #[test]
    fn empty_selection_gives_empty_matrix() {
        let matrix = compute_numeric_correlation(&DataFrame::new(), &[]).unwrap();
        assert_eq!(matrix.size(), 0);
        assert!(matrix.rows().is_empty());
    }

    // ── Selection ────────────────────────────────────────────────

    fn selection_frame() -> (DataFrame, DatasetColumns) {
        let df = DataFrame::new()
            .with_column("my_target", num(&[1.0, 2.0, 3.0, 1.0]))
            .and_then(|df| df.with_column("numerical_feature_1", num(&[0.0, 2.0, -1.0, 5.0])))
            .and_then(|df| df.with_column("numerical_feature_2", num(&[0.3, 5.0, 0.3, 3.4])))
            .and_then(|df| df.with_column("numerical_feature_empty", num(&[f64::NAN; 4])))
            .and_then(|df| df.with_column("numerical_feature_constant", num(&[1.0; 4])))
            .and_then(|df| df.with_column("categorical_feature_1", num(&[1.0, 1.0, 5.0, 2.0])))
            .and_then(|df| {
                df.with_column(
                    "categorical_feature_2",
                    Column::categorical_from(vec![Some("y"), Some("y"), Some("n"), Some("y")]),
                )
            })
            .and_then(|df| df.with_column("categorical_feature_empty", num(&[f64::NAN; 4])))
            .and_then(|df| df.with_column("categorical_feature_constant", num(&[1.0, 1.0, 1.0, f64::NAN])))
            .expect("equal lengths");
        let columns = DatasetColumns::new()
            .with_target("my_target")
            .with_numerical([
                "numerical_feature_1",
                "numerical_feature_2",
                "numerical_feature_empty",
                "numerical_feature_constant",
            ])
            .with_categorical([
                "categorical_feature_1",
                "categorical_feature_2",
                "categorical_feature_empty",
                "categorical_feature_constant",
            ])
            .with_task(TaskType::Regression);
        (df, columns)
    }

    #[test]
    fn selection_drops_empty_and_constant_columns() {
        let (df, columns) = selection_frame();
        let stats = dataset_statistics(&df, &columns, FeatureType::Numeric).unwrap();
        let (numeric, categorical) = select_correlated_features(&stats, Some("my_target"));
        assert_eq!(numeric, names(&["numerical_feature_1", "numerical_feature_2", "my_target"]));
        assert_eq!(categorical, names(&["categorical_feature_1", "categorical_feature_2"]));
    }

    #[test]
    fn categorical_target_is_never_selected() {
        let (df, columns) = selection_frame();
        let stats = dataset_statistics(&df, &columns, FeatureType::Categorical).unwrap();
        let (numeric, categorical) = select_correlated_features(&stats, Some("my_target"));
        assert!(!numeric.contains(&"my_target".to_string()));
        assert!(!categorical.contains(&"my_target".to_string()));
    }

    #[test]
    fn correlations_for_reference_and_current() {
        let (df, columns) = selection_frame();
        let result = DataQualityAnalyzer::new().calculate(&df, Some(&df), &columns).unwrap();
        let config = CorrelationConfig::default().numeric_methods([CorrelationMethod::Pearson]);

        let (reference, current) = correlations_for(&result, &df, Some(&df), &config).unwrap();
        let pearson = reference.pearson().expect("configured");
        assert_eq!(pearson.names(), &names(&["numerical_feature_1", "numerical_feature_2", "my_target"])[..]);
        assert_eq!(reference.numeric.len(), 1);
        assert_eq!(reference.cramer_v.size(), 2);
        assert_eq!(current.expect("current supplied"), reference);
    }

    // ── Properties ───────────────────────────────────────────────

    proptest! {
        #[test]
        fn prop_cramers_v_symmetric_and_bounded(
            pairs in prop::collection::vec((0u8..3, 0u8..4), 2..60)
        ) {
            let x = Column::text_from(pairs.iter().map(|(a, _)| Some(a.to_string())).collect());
            let y = Column::text_from(pairs.iter().map(|(_, b)| Some(b.to_string())).collect());
            let (kx, ky) = (category_keys(&x), category_keys(&y));
            for correction in [CramersVCorrection::None, CramersVCorrection::Bergsma] {
                let xy = cramers_v(&kx, &ky, correction);
                let yx = cramers_v(&ky, &kx, correction);
                prop_assert_eq!(xy.to_bits(), yx.to_bits());
                prop_assert!((0.0..=1.0).contains(&xy));
            }
        }
    }
}

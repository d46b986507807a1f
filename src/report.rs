//! JSON encoding of analysis results.
//!
//! JSON has no representation for `NaN` or infinities. Every float written
//! by this crate goes through [`serialize_float`], which emits `null` for
//! non-finite values, so undefined statistics survive encoding.
//!
//! ```
//! use u_quality::columns::DatasetColumns;
//! use u_quality::dataframe::{Column, DataFrame};
//! use u_quality::quality::DataQualityAnalyzer;
//! use u_quality::report::to_json_value;
//!
//! let df = DataFrame::new()
//!     .with_column("x", Column::numeric_from(vec![Some(1.0)]))
//!     .unwrap();
//! let columns = DatasetColumns::new().with_numerical(["x"]);
//! let result = DataQualityAnalyzer::new().calculate(&df, None, &columns).unwrap();
//!
//! let json = to_json_value(&result).unwrap();
//! let x = &json["reference_features_stats"]["num_features_stats"]["x"];
//! assert_eq!(x["mean"], 1.0);
//! assert!(x["std"].is_null()); // undefined for a single value
//! ```

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::error::Result;

/// Writes `value`, or `null` when it is `NaN` or infinite.
pub(crate) fn serialize_float<S: Serializer>(
    value: &f64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}

/// [`serialize_float`] lifted over `Option`.
pub(crate) fn serialize_opt_float<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(v) => serialize_float(v, serializer),
        None => serializer.serialize_none(),
    }
}

/// Float slice serialized as a sequence with non-finite entries as `null`.
pub(crate) struct FiniteSlice<'a>(pub &'a [f64]);

impl Serialize for FiniteSlice<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for value in self.0 {
            seq.serialize_element(&json_float(*value))?;
        }
        seq.end()
    }
}

/// JSON number for finite floats, `null` otherwise.
pub fn json_float(value: f64) -> serde_json::Value {
    serde_json::Number::from_f64(value).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

/// Encodes a result as a JSON tree.
pub fn to_json_value<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}

/// Encodes a result as JSON text.
pub fn to_json_string<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Contract — static, defined at load time. Named input/output specification
//! a verified tool must satisfy (spec §3, §4.4).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputType {
    Numeric,
    Dict,
    Boolean,
    List,
    Frame,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputConstraints {
    Numeric {
        min: Option<f64>,
        max: Option<f64>,
    },
    Dict {
        required_keys: Vec<String>,
    },
    Boolean,
    List {
        min_len: Option<usize>,
        max_len: Option<usize>,
        element_type: Option<String>,
    },
    Frame {
        required_columns: Vec<String>,
        min_rows: Option<usize>,
        max_rows: Option<usize>,
    },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("expected a finite numeric value, got {0}")]
    NotNumeric(String),
    #[error("numeric value {value} outside bound [{min:?}, {max:?}]")]
    OutOfRange { value: f64, min: Option<f64>, max: Option<f64> },
    #[error("expected an object, got {0}")]
    NotDict(String),
    #[error("missing required key: {0}")]
    MissingKey(String),
    #[error("expected a boolean, got {0}")]
    NotBoolean(String),
    #[error("expected a list, got {0}")]
    NotList(String),
    #[error("list length {len} outside bound [{min:?}, {max:?}]")]
    ListLengthOutOfRange { len: usize, min: Option<usize>, max: Option<usize> },
    #[error("expected a table with columns, got {0}")]
    NotFrame(String),
    #[error("missing required column: {0}")]
    MissingColumn(String),
    #[error("row count {rows} outside bound [{min:?}, {max:?}]")]
    RowCountOutOfRange { rows: usize, min: Option<usize>, max: Option<usize> },
}

impl OutputConstraints {
    /// Validates `value` against this constraint set. Mirrors spec §4.4's
    /// per-type validator list exactly.
    pub fn validate(&self, value: &Value) -> Result<(), ContractViolation> {
        match self {
            OutputConstraints::Numeric { min, max } => {
                let n = value
                    .as_f64()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| ContractViolation::NotNumeric(value.to_string()))?;
                if min.map(|m| n < m).unwrap_or(false) || max.map(|m| n > m).unwrap_or(false) {
                    return Err(ContractViolation::OutOfRange { value: n, min: *min, max: *max });
                }
                Ok(())
            }
            OutputConstraints::Dict { required_keys } => {
                let obj = value.as_object().ok_or_else(|| ContractViolation::NotDict(value.to_string()))?;
                for key in required_keys {
                    if !obj.contains_key(key) {
                        return Err(ContractViolation::MissingKey(key.clone()));
                    }
                }
                Ok(())
            }
            OutputConstraints::Boolean => {
                match value {
                    Value::Bool(_) => Ok(()),
                    // Accept the string encodings "True"/"False" from JSON (spec §4.4).
                    Value::String(s) if s == "True" || s == "False" => Ok(()),
                    _ => Err(ContractViolation::NotBoolean(value.to_string())),
                }
            }
            OutputConstraints::List { min_len, max_len, .. } => {
                let arr = value.as_array().ok_or_else(|| ContractViolation::NotList(value.to_string()))?;
                let len = arr.len();
                if min_len.map(|m| len < m).unwrap_or(false) || max_len.map(|m| len > m).unwrap_or(false) {
                    return Err(ContractViolation::ListLengthOutOfRange { len, min: *min_len, max: *max_len });
                }
                Ok(())
            }
            OutputConstraints::Frame { required_columns, min_rows, max_rows } => {
                // A Frame is represented on the wire as {"columns": [...], "rows": [[...], ...]}.
                let obj = value.as_object().ok_or_else(|| ContractViolation::NotFrame(value.to_string()))?;
                let columns: HashSet<String> = obj
                    .get("columns")
                    .and_then(|c| c.as_array())
                    .map(|c| c.iter().filter_map(|v| v.as_str().map(String::from)).collect())
                    .unwrap_or_default();
                for col in required_columns {
                    if !columns.contains(col) {
                        return Err(ContractViolation::MissingColumn(col.clone()));
                    }
                }
                let rows = obj.get("rows").and_then(|r| r.as_array()).map(|r| r.len()).unwrap_or(0);
                if min_rows.map(|m| rows < m).unwrap_or(false) || max_rows.map(|m| rows > m).unwrap_or(false) {
                    return Err(ContractViolation::RowCountOutOfRange { rows, min: *min_rows, max: *max_rows });
                }
                Ok(())
            }
        }
    }

    pub fn output_type(&self) -> OutputType {
        match self {
            OutputConstraints::Numeric { .. } => OutputType::Numeric,
            OutputConstraints::Dict { .. } => OutputType::Dict,
            OutputConstraints::Boolean => OutputType::Boolean,
            OutputConstraints::List { .. } => OutputType::List,
            OutputConstraints::Frame { .. } => OutputType::Frame,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub contract_id: String,
    pub input_types: HashMap<String, String>,
    pub required_inputs: HashSet<String>,
    #[serde(skip)]
    pub output_constraints: Option<OutputConstraints>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_in_range_passes() {
        let c = OutputConstraints::Numeric { min: Some(0.0), max: Some(100.0) };
        assert!(c.validate(&json!(55.2)).is_ok());
    }

    #[test]
    fn numeric_out_of_range_fails() {
        let c = OutputConstraints::Numeric { min: Some(0.0), max: Some(100.0) };
        assert!(c.validate(&json!(150.0)).is_err());
    }

    #[test]
    fn dict_missing_key_fails() {
        let c = OutputConstraints::Dict { required_keys: vec!["price".into()] };
        assert!(c.validate(&json!({"timestamp": "x"})).is_err());
        assert!(c.validate(&json!({"price": 1.0})).is_ok());
    }

    #[test]
    fn boolean_accepts_string_encoding() {
        let c = OutputConstraints::Boolean;
        assert!(c.validate(&json!("True")).is_ok());
        assert!(c.validate(&json!(true)).is_ok());
        assert!(c.validate(&json!("yes")).is_err());
    }

    #[test]
    fn frame_requires_columns_and_row_bounds() {
        let c = OutputConstraints::Frame {
            required_columns: vec!["Close".into()],
            min_rows: Some(1),
            max_rows: None,
        };
        let ok = json!({"columns": ["Date", "Close"], "rows": [[1, 2]]});
        assert!(c.validate(&ok).is_ok());
        let missing_col = json!({"columns": ["Date"], "rows": [[1]]});
        assert!(c.validate(&missing_col).is_err());
        let empty = json!({"columns": ["Close"], "rows": []});
        assert!(c.validate(&empty).is_err());
    }

    #[test]
    fn numeric_rejects_non_finite() {
        let c = OutputConstraints::Numeric { min: None, max: None };
        assert!(c.validate(&json!("not a number")).is_err());
    }
}

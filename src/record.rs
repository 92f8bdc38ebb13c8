//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Merx.
//! The Merx project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Merx Record Module
//!
//! Tabular data as it flows into the merge engine. A [`MxDataSet`] owns a
//! uniform column set; every [`MxDataRow`] carries one raw scalar per column
//! in column order.

use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Raw scalar held by one cell of a data row.
#[derive(Clone, Debug, PartialEq)]
pub enum MxCellValue {
    Empty,
    Bool(bool),
    Number(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Text(String),
}

impl MxCellValue {
    /// Builds a cell from a JSON scalar. Arrays and objects are kept as their
    /// compact JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => MxCellValue::Empty,
            Value::Bool(b) => MxCellValue::Bool(*b),
            Value::Number(n) => n
                .as_f64()
                .map(MxCellValue::Number)
                .unwrap_or_else(|| MxCellValue::Text(n.to_string())),
            Value::String(s) if s.is_empty() => MxCellValue::Empty,
            Value::String(s) => MxCellValue::Text(s.clone()),
            other => MxCellValue::Text(other.to_string()),
        }
    }

    /// A cell is empty when it holds nothing or only whitespace.
    pub fn is_empty(&self) -> bool {
        match self {
            MxCellValue::Empty => true,
            MxCellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            MxCellValue::Empty => Value::Null,
            MxCellValue::Bool(b) => Value::Bool(*b),
            MxCellValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            other => Value::String(other.to_string()),
        }
    }
}

impl fmt::Display for MxCellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MxCellValue::Empty => Ok(()),
            MxCellValue::Bool(b) => write!(f, "{}", b),
            MxCellValue::Number(n) => write!(f, "{}", format_plain_number(*n)),
            MxCellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            MxCellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            MxCellValue::Text(s) => f.write_str(s),
        }
    }
}

/// Integral floats print without a fractional part, so `10.0` reads `10`.
pub(crate) fn format_plain_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One row of a data set: an ordered mapping from column name to raw scalar.
#[derive(Clone, Debug, PartialEq)]
pub struct MxDataRow {
    /// Zero-based position of the row inside its data set.
    pub index: usize,
    columns: Arc<Vec<String>>,
    values: Vec<MxCellValue>,
}

impl MxDataRow {
    /// Builds a row from `(column, value)` pairs.
    pub fn from_pairs<I, K>(index: usize, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, MxCellValue)>,
        K: Into<String>,
    {
        let (columns, values): (Vec<String>, Vec<MxCellValue>) =
            pairs.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        MxDataRow {
            index,
            columns: Arc::new(columns),
            values,
        }
    }

    /// Looks a column up by exact name.
    pub fn get(&self, column: &str) -> Option<&MxCellValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.values.get(idx))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MxCellValue)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// JSON object view, used by previews and job payloads.
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (k, v) in self.iter() {
            map.insert(k.to_string(), v.to_json());
        }
        Value::Object(map)
    }
}

/// A batch of rows sharing one column set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MxDataSet {
    columns: Arc<Vec<String>>,
    rows: Vec<MxDataRow>,
}

impl MxDataSet {
    /// Creates an empty data set over the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        MxDataSet {
            columns: Arc::new(columns),
            rows: Vec::new(),
        }
    }

    /// Appends a row. Values are aligned to the column set: missing trailing
    /// values become [`MxCellValue::Empty`], surplus values are dropped.
    pub fn push_row(&mut self, mut values: Vec<MxCellValue>) {
        values.resize(self.columns.len(), MxCellValue::Empty);
        let index = self.rows.len();
        self.rows.push(MxDataRow {
            index,
            columns: Arc::clone(&self.columns),
            values,
        });
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[MxDataRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<MxDataRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_lookup_is_exact() {
        let row = MxDataRow::from_pairs(
            0,
            vec![
                ("name", MxCellValue::Text("Ada".into())),
                ("Name", MxCellValue::Text("other".into())),
            ],
        );
        assert_eq!(row.get("name"), Some(&MxCellValue::Text("Ada".into())));
        assert_eq!(row.get("NAME"), None);
    }

    #[test]
    fn dataset_aligns_values_to_columns() {
        let mut set = MxDataSet::new(vec!["a".into(), "b".into()]);
        set.push_row(vec![MxCellValue::Number(1.0)]);
        assert_eq!(set.rows()[0].get("b"), Some(&MxCellValue::Empty));
        assert_eq!(set.rows()[0].index, 0);
    }

    #[test]
    fn integral_numbers_print_without_fraction() {
        assert_eq!(MxCellValue::Number(10.0).to_string(), "10");
        assert_eq!(MxCellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(MxCellValue::from_json(&json!("")), MxCellValue::Empty);
    }
}

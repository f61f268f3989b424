//! Row-oriented dataset with lightweight schema inference.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
  Numeric,
  Text,
}

/// An immutable tabular dataset: ordered rows of column → scalar maps.
///
/// Column order follows the first row of the caller's data (serde_json
/// is built with `preserve_order`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
  rows: Vec<Map<String, Value>>,
}

impl Dataset {
  pub fn new(rows: Vec<Map<String, Value>>) -> Self {
    Self { rows }
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  pub fn rows(&self) -> &[Map<String, Value>] {
    &self.rows
  }

  /// Column names in first-seen order across all rows.
  pub fn columns(&self) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in &self.rows {
      for key in row.keys() {
        if !columns.iter().any(|c| c == key) {
          columns.push(key.clone());
        }
      }
    }
    columns
  }

  pub fn has_column(&self, name: &str) -> bool {
    self.rows.iter().any(|row| row.contains_key(name))
  }

  /// Numeric if every non-null value in the column is a number.
  pub fn column_type(&self, name: &str) -> ColumnType {
    let mut saw_value = false;
    for row in &self.rows {
      match row.get(name) {
        Some(Value::Number(_)) => saw_value = true,
        Some(Value::Null) | None => {}
        Some(_) => return ColumnType::Text,
      }
    }
    if saw_value {
      ColumnType::Numeric
    } else {
      ColumnType::Text
    }
  }

  pub fn numeric_columns(&self) -> Vec<String> {
    self
      .columns()
      .into_iter()
      .filter(|c| self.column_type(c) == ColumnType::Numeric)
      .collect()
  }

  pub fn text_columns(&self) -> Vec<String> {
    self
      .columns()
      .into_iter()
      .filter(|c| self.column_type(c) == ColumnType::Text)
      .collect()
  }

  /// All numeric values in a column, skipping nulls and non-numbers.
  pub fn numeric_series(&self, name: &str) -> Vec<f64> {
    self
      .rows
      .iter()
      .filter_map(|row| row.get(name).and_then(Value::as_f64))
      .collect()
  }

  /// (label, value) pairs where `value_column` is numeric, keeping the
  /// label column aligned with the kept rows.
  pub fn aligned_series(&self, label_column: &str, value_column: &str) -> Vec<(String, f64)> {
    self
      .rows
      .iter()
      .filter_map(|row| {
        let value = row.get(value_column).and_then(Value::as_f64)?;
        let label = row.get(label_column).map(display_value).unwrap_or_default();
        Some((label, value))
      })
      .collect()
  }
}

/// Render a scalar for labels and insight text: strings unquoted,
/// integers without a trailing `.0`.
pub fn display_value(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    Value::Number(n) => n.to_string(),
    Value::Bool(b) => b.to_string(),
    Value::Null => String::new(),
    other => other.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn rows(raw: Value) -> Vec<Map<String, Value>> {
    serde_json::from_value(raw).unwrap()
  }

  #[test]
  fn infers_column_types() {
    let data = Dataset::new(rows(json!([
      {"month": "Jan", "revenue": 120},
      {"month": "Feb", "revenue": 135.5},
      {"month": "Mar", "revenue": null}
    ])));

    assert_eq!(data.column_type("month"), ColumnType::Text);
    assert_eq!(data.column_type("revenue"), ColumnType::Numeric);
    assert_eq!(data.numeric_columns(), vec!["revenue".to_string()]);
  }

  #[test]
  fn numeric_series_skips_nulls() {
    let data = Dataset::new(rows(json!([
      {"v": 1}, {"v": null}, {"v": 3}
    ])));
    assert_eq!(data.numeric_series("v"), vec![1.0, 3.0]);
  }

  #[test]
  fn aligned_series_keeps_labels_in_step() {
    let data = Dataset::new(rows(json!([
      {"month": "Jan", "revenue": 10},
      {"month": "Feb", "revenue": null},
      {"month": "Mar", "revenue": 30}
    ])));

    let pairs = data.aligned_series("month", "revenue");
    assert_eq!(pairs, vec![("Jan".to_string(), 10.0), ("Mar".to_string(), 30.0)]);
  }

  #[test]
  fn columns_preserve_first_seen_order() {
    let data = Dataset::new(rows(json!([
      {"month": "Jan", "revenue": 10, "cost": 4}
    ])));
    assert_eq!(data.columns(), vec!["month", "revenue", "cost"]);
  }
}

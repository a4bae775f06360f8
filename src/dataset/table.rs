//! Columnar feature table loaded from the telemetry CSV export.
//!
//! A column's kind (numeric vs. categorical) is decided once, when the table
//! is built, by attempting to parse the whole column; it is never re-inferred
//! per row. Training and evaluation must see the same column names, kinds and
//! order, so the table is immutable after construction.

use std::path::Path;

use crate::error::{EvalError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }
}

#[derive(Debug, Clone)]
pub struct FeatureTable {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl FeatureTable {
    pub fn new(named_columns: Vec<(String, Column)>) -> Result<Self> {
        let n_rows = named_columns.first().map_or(0, |(_, c)| c.len());
        for (name, column) in &named_columns {
            if column.len() != n_rows {
                return Err(EvalError::Dataset(format!(
                    "column {name} has {} rows, expected {n_rows}",
                    column.len()
                )));
            }
        }
        let (names, columns) = named_columns.into_iter().unzip();
        Ok(Self {
            names,
            columns,
            n_rows,
        })
    }

    /// Load a CSV export, splitting off `target` as the label column and
    /// dropping the named columns. Every remaining column is numeric if all
    /// of its values parse as floats, categorical otherwise.
    pub fn from_csv(
        path: &Path,
        target: &str,
        drop: &[String],
    ) -> Result<(FeatureTable, Vec<String>)> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| EvalError::Dataset(format!("open {}: {e}", path.display())))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| EvalError::Dataset(format!("read headers: {e}")))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record.map_err(|e| EvalError::Dataset(format!("read row: {e}")))?;
            if record.len() != headers.len() {
                return Err(EvalError::Dataset(format!(
                    "row has {} fields, expected {}",
                    record.len(),
                    headers.len()
                )));
            }
            for (idx, field) in record.iter().enumerate() {
                raw_columns[idx].push(field.to_string());
            }
        }

        let mut labels: Option<Vec<String>> = None;
        let mut named_columns: Vec<(String, Column)> = Vec::new();
        for (name, values) in headers.into_iter().zip(raw_columns) {
            if name == target {
                labels = Some(values);
            } else if !drop.iter().any(|d| d == &name) {
                named_columns.push((name, build_column(values)));
            }
        }

        let labels = labels.ok_or_else(|| {
            EvalError::Dataset(format!("target column {target} not found in {}", path.display()))
        })?;

        let table = FeatureTable::new(named_columns)?;
        if table.n_rows() != labels.len() {
            return Err(EvalError::Dataset(format!(
                "{} feature rows but {} labels",
                table.n_rows(),
                labels.len()
            )));
        }
        Ok((table, labels))
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| &self.columns[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter())
    }

    /// New table containing the given rows, preserving column names, kinds
    /// and order.
    pub fn select_rows(&self, rows: &[usize]) -> FeatureTable {
        let columns = self
            .columns
            .iter()
            .map(|column| match column {
                Column::Numeric(v) => Column::Numeric(rows.iter().map(|&r| v[r]).collect()),
                Column::Categorical(v) => {
                    Column::Categorical(rows.iter().map(|&r| v[r].clone()).collect())
                }
            })
            .collect();
        FeatureTable {
            names: self.names.clone(),
            columns,
            n_rows: rows.len(),
        }
    }
}

fn build_column(values: Vec<String>) -> Column {
    let parsed: Option<Vec<f64>> = values.iter().map(|v| v.trim().parse::<f64>().ok()).collect();
    match parsed {
        Some(numbers) => Column::Numeric(numbers),
        None => Column::Categorical(values),
    }
}

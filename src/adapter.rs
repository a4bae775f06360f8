//! Reshapes the held-out table into what each artifact kind consumes.
//!
//! Graph models take one named `(n, 1)` tensor per column; the feed is keyed
//! by name, so the table's column order never matters. Native scorers take a
//! flat `f64` vector per row, packed in the exact feature order the scorer
//! was generated against.

use ndarray::Array2;

use crate::dataset::{Column, FeatureTable};
use crate::error::{EvalError, Result};

/// One column of a graph feed, already in tensor layout.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphColumn {
    Float(Array2<f32>),
    Text(Array2<String>),
}

/// Per-column tensors keyed by column name.
#[derive(Debug, Clone)]
pub struct GraphInputs {
    columns: Vec<(String, GraphColumn)>,
}

impl GraphInputs {
    pub fn get(&self, name: &str) -> Option<&GraphColumn> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }
}

#[inline]
fn as_f32(v: f64) -> f32 {
    let f = v as f32;
    if f.is_finite() {
        f
    } else {
        0.0
    }
}

/// Build the per-column feed for a graph model. Numeric columns become f32
/// tensors, categorical columns stay strings.
pub fn graph_inputs(table: &FeatureTable) -> GraphInputs {
    let n_rows = table.n_rows();
    let columns = table
        .iter()
        .map(|(name, column)| {
            let tensor = match column {
                Column::Numeric(values) => GraphColumn::Float(Array2::from_shape_fn(
                    (n_rows, 1),
                    |(row, _)| as_f32(values[row]),
                )),
                Column::Categorical(values) => GraphColumn::Text(Array2::from_shape_fn(
                    (n_rows, 1),
                    |(row, _)| values[row].clone(),
                )),
            };
            (name.to_string(), tensor)
        })
        .collect();
    GraphInputs { columns }
}

/// Pack each row into a fixed-length vector in `features` order. A missing
/// or categorical column in the subset is a configuration error, never a
/// silent coercion.
pub fn native_rows(table: &FeatureTable, features: &[String]) -> Result<Vec<Vec<f64>>> {
    let mut selected: Vec<&[f64]> = Vec::with_capacity(features.len());
    for name in features {
        match table.column(name) {
            Some(Column::Numeric(values)) => selected.push(values),
            Some(Column::Categorical(_)) => {
                return Err(EvalError::Config(format!(
                    "native feature {name} is categorical; scorers take numeric input only"
                )))
            }
            None => {
                return Err(EvalError::Config(format!(
                    "native feature {name} not present in the held-out table"
                )))
            }
        }
    }

    Ok((0..table.n_rows())
        .map(|row| selected.iter().map(|col| col[row]).collect())
        .collect())
}

/// Default native feature subset: every numeric column, in table order.
/// Matches what the exporter sees when no explicit list was recorded.
pub fn numeric_feature_names(table: &FeatureTable) -> Vec<String> {
    table
        .iter()
        .filter(|(_, c)| c.is_numeric())
        .map(|(n, _)| n.to_string())
        .collect()
}

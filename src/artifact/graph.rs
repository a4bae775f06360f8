//! ONNX graph artifacts executed through the `ort` runtime.
//!
//! The session feed is built per declared input name, so the held-out
//! table's column order is irrelevant; only a missing column is an error.
//! The graph exporter encodes classes against the target column's uniques
//! in order of first appearance over the dataset rows, so that registry is
//! attached here.

use std::path::Path;
use std::sync::Arc;

use ndarray::{CowArray, Ix2, IxDyn};
use ort::{Environment, GraphOptimizationLevel, LoggingLevel, Session, SessionBuilder, Value};

use crate::adapter::{self, GraphColumn};
use crate::dataset::FeatureTable;
use crate::error::{EvalError, Result};
use crate::registry::ClassRegistry;
use crate::types::{ArtifactRef, RawOutput};

use super::LoadedModel;

pub struct GraphSession {
    // The environment must outlive the session.
    _environment: Arc<Environment>,
    session: Session,
    registry: ClassRegistry,
    name: String,
}

fn load_err(path: &Path, e: impl std::fmt::Display) -> EvalError {
    EvalError::Load {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

impl GraphSession {
    pub fn load(artifact: &ArtifactRef, class_labels: &[String]) -> Result<Self> {
        let environment = Arc::new(
            Environment::builder()
                .with_name("orion-eval")
                .with_log_level(LoggingLevel::Warning)
                .build()
                .map_err(|e| load_err(&artifact.path, e))?,
        );

        let session = SessionBuilder::new(&environment)
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(1))
            .and_then(|b| b.with_model_from_file(&artifact.path))
            .map_err(|e| load_err(&artifact.path, e))?;

        Ok(Self {
            _environment: environment,
            session,
            registry: ClassRegistry::insertion_order(class_labels),
            name: artifact.name.clone(),
        })
    }
}

enum InputArray<'a> {
    Float(CowArray<'a, f32, IxDyn>),
    Text(CowArray<'a, String, IxDyn>),
}

impl LoadedModel for GraphSession {
    fn run(&self, batch: &FeatureTable) -> Result<RawOutput> {
        let feed = adapter::graph_inputs(batch);

        // Order the feed by the graph's declared inputs, by name.
        let mut arrays: Vec<InputArray> = Vec::with_capacity(self.session.inputs.len());
        for input in &self.session.inputs {
            let column = feed.get(&input.name).ok_or_else(|| EvalError::Shape {
                artifact: self.name.clone(),
                reason: format!(
                    "graph expects input column {}, table has: {}",
                    input.name,
                    feed.names().collect::<Vec<_>>().join(", ")
                ),
            })?;
            arrays.push(match column {
                GraphColumn::Float(data) => InputArray::Float(CowArray::from(data.clone().into_dyn())),
                GraphColumn::Text(data) => InputArray::Text(CowArray::from(data.clone().into_dyn())),
            });
        }

        let mut values: Vec<Value> = Vec::with_capacity(arrays.len());
        for array in &arrays {
            let value = match array {
                InputArray::Float(cow) => Value::from_array(self.session.allocator(), cow),
                InputArray::Text(cow) => Value::from_array(self.session.allocator(), cow),
            }
            .map_err(|e| EvalError::Shape {
                artifact: self.name.clone(),
                reason: format!("building input tensor failed: {e}"),
            })?;
            values.push(value);
        }

        let outputs = self.session.run(values).map_err(|e| EvalError::Shape {
            artifact: self.name.clone(),
            reason: format!("graph execution failed: {e}"),
        })?;

        let first = outputs
            .first()
            .ok_or_else(|| EvalError::Decode("graph produced no outputs".into()))?;

        extract_raw_output(first)
    }

    fn registry(&self) -> &ClassRegistry {
        &self.registry
    }
}

/// Pull the first declared output into a RawOutput, preferring float
/// probabilities, then integer indices, then label strings.
fn extract_raw_output(value: &Value) -> Result<RawOutput> {
    if let Ok(tensor) = value.try_extract::<f32>() {
        let view = tensor.view();
        return match view.ndim() {
            2 => {
                let matrix = view
                    .to_owned()
                    .into_dimensionality::<Ix2>()
                    .map_err(|e| EvalError::Decode(format!("bad output shape: {e}")))?;
                Ok(RawOutput::Probabilities(matrix))
            }
            1 => Ok(RawOutput::Scores(view.iter().map(|v| *v as f64).collect())),
            n => Err(EvalError::Decode(format!(
                "unsupported {n}-dimensional float output"
            ))),
        };
    }

    if let Ok(tensor) = value.try_extract::<i64>() {
        let view = tensor.view();
        let flat_column = view.ndim() == 1 || (view.ndim() == 2 && view.shape()[1] == 1);
        if !flat_column {
            return Err(EvalError::Decode(format!(
                "integer output has shape {:?}, expected one index per row",
                view.shape()
            )));
        }
        return Ok(RawOutput::Indices(view.iter().copied().collect()));
    }

    if let Ok(tensor) = value.try_extract::<String>() {
        let view = tensor.view();
        return Ok(RawOutput::Labels(view.iter().cloned().collect()));
    }

    Err(EvalError::Decode(
        "first graph output is neither float, integer nor string".into(),
    ))
}

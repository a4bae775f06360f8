use std::fmt;
use std::path::PathBuf;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// The two exported artifact formats the harness understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// Serialized computation graph run by the ONNX runtime (`.onnx`).
    GraphModel,
    /// Compiled scorer exposing a fixed `score()` entry point (`.so`).
    NativeScorer,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::GraphModel => write!(f, "graph"),
            ArtifactKind::NativeScorer => write!(f, "native"),
        }
    }
}

/// Reference to an on-disk artifact discovered by the directory scan.
///
/// For native scorers the companion class-map path is part of the artifact's
/// identity: the same directory may hold scorers exported against different
/// class orderings.
#[derive(Debug, Clone)]
pub struct ArtifactRef {
    pub name: String,
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub companion: Option<PathBuf>,
}

/// Raw numeric output of one artifact run, before label decoding.
#[derive(Debug, Clone)]
pub enum RawOutput {
    /// rows x class probabilities
    Probabilities(Array2<f32>),
    /// one class index per row
    Indices(Vec<i64>),
    /// one continuous score per row
    Scores(Vec<f64>),
    /// already-decoded label strings
    Labels(Vec<String>),
}

impl RawOutput {
    pub fn len(&self) -> usize {
        match self {
            RawOutput::Probabilities(m) => m.nrows(),
            RawOutput::Indices(v) => v.len(),
            RawOutput::Scores(v) => v.len(),
            RawOutput::Labels(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One evaluated artifact's report entry. Immutable once computed.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsRow {
    pub model: String,
    pub kind: ArtifactKind,
    pub disk_size_bytes: u64,
    pub memory_delta_bytes: i64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// A report keeps skipped artifacts visible instead of collapsing them.
#[derive(Debug, Clone)]
pub enum ReportRow {
    Evaluated(MetricsRow),
    Skipped {
        name: String,
        kind: ArtifactKind,
        reason: String,
    },
}

impl ReportRow {
    pub fn name(&self) -> &str {
        match self {
            ReportRow::Evaluated(row) => &row.model,
            ReportRow::Skipped { name, .. } => name,
        }
    }
}

pub mod graph;
pub mod native;

use std::fs;
use std::path::Path;

use crate::decode::ScoreEncoding;
use crate::dataset::FeatureTable;
use crate::error::{EvalError, Result};
use crate::registry::ClassRegistry;
use crate::types::{ArtifactKind, ArtifactRef, RawOutput};

pub use graph::GraphSession;
pub use native::NativeScorer;

const GRAPH_EXTENSION: &str = "onnx";
const NATIVE_EXTENSION: &str = "so";
const COMPANION_SUFFIX: &str = ".classes.json";

/// A loaded artifact behind the shared run contract. The harness is written
/// against this trait and never branches on kind.
pub trait LoadedModel {
    /// Execute the artifact over the whole batch. The input is adapted
    /// internally to whatever the artifact consumes.
    fn run(&self, batch: &FeatureTable) -> Result<RawOutput>;

    /// The class ordering this artifact's output was encoded against.
    fn registry(&self) -> &ClassRegistry;

    /// Pinned score encoding, when the exporter recorded one.
    fn score_encoding(&self) -> Option<ScoreEncoding> {
        None
    }
}

/// Scan a directory for artifacts, in directory-listing order. Companion
/// class-map files and unrelated extensions are skipped.
pub fn discover(dir: &Path) -> Result<Vec<ArtifactRef>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| EvalError::Dataset(format!("read models dir {}: {e}", dir.display())))?;

    let mut artifacts = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| EvalError::Dataset(format!("read dir entry: {e}")))?;
        let path = entry.path();
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };

        let kind = match extension {
            GRAPH_EXTENSION => ArtifactKind::GraphModel,
            NATIVE_EXTENSION => ArtifactKind::NativeScorer,
            _ => continue,
        };

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let companion = match kind {
            ArtifactKind::GraphModel => None,
            ArtifactKind::NativeScorer => {
                Some(path.with_file_name(format!("{stem}{COMPANION_SUFFIX}")))
            }
        };

        artifacts.push(ArtifactRef {
            name: stem.to_string(),
            path,
            kind,
            companion,
        });
    }
    Ok(artifacts)
}

/// Open an artifact into its executable form. The single place that
/// dispatches on kind. `class_labels` is the full target column in dataset
/// row order; kinds that derive their registry from it scan it themselves.
pub fn load(artifact: &ArtifactRef, class_labels: &[String]) -> Result<Box<dyn LoadedModel>> {
    if !artifact.path.is_file() {
        return Err(EvalError::Load {
            path: artifact.path.clone(),
            reason: "file missing or not readable".into(),
        });
    }
    match artifact.kind {
        ArtifactKind::GraphModel => Ok(Box::new(GraphSession::load(artifact, class_labels)?)),
        ArtifactKind::NativeScorer => Ok(Box::new(NativeScorer::load(artifact)?)),
    }
}

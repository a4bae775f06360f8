//! Compiled native scorers bound at runtime.
//!
//! A scorer exposes one fixed entry point, `score(input, output)`: a vector
//! of doubles in, a single double out, one call per row. Its class ordering
//! and feature subset come from the companion class-map JSON written at
//! export time; without that file the output cannot be decoded safely, so a
//! missing companion is a configuration error rather than a guess.

use std::fs;

use libloading::{Library, Symbol};
use serde::Deserialize;

use crate::adapter;
use crate::dataset::FeatureTable;
use crate::decode::ScoreEncoding;
use crate::error::{EvalError, Result};
use crate::registry::ClassRegistry;
use crate::types::{ArtifactRef, RawOutput};

use super::LoadedModel;

const ENTRY_POINT: &[u8] = b"score";

type ScoreFn = unsafe extern "C" fn(*const f64, *mut f64);

/// Companion class-map file, written by the export step next to each scorer.
#[derive(Debug, Deserialize)]
struct ClassMapFile {
    classes: Vec<String>,
    #[serde(default)]
    features: Option<Vec<String>>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug)]
pub struct NativeScorer {
    // Keeps the scorer's code mapped; `score` points into it.
    _library: Library,
    score: ScoreFn,
    registry: ClassRegistry,
    features: Option<Vec<String>>,
    encoding: Option<ScoreEncoding>,
    name: String,
}

impl NativeScorer {
    pub fn load(artifact: &ArtifactRef) -> Result<Self> {
        let companion_path = artifact.companion.as_ref().ok_or_else(|| {
            EvalError::Config(format!("{}: no class map associated", artifact.name))
        })?;
        let raw = fs::read_to_string(companion_path).map_err(|e| {
            EvalError::Config(format!(
                "{}: class map {} unreadable: {e}",
                artifact.name,
                companion_path.display()
            ))
        })?;
        let class_map: ClassMapFile = serde_json::from_str(&raw).map_err(|e| {
            EvalError::Config(format!(
                "{}: class map {} invalid: {e}",
                artifact.name,
                companion_path.display()
            ))
        })?;
        if class_map.classes.is_empty() {
            return Err(EvalError::Config(format!(
                "{}: class map lists no classes",
                artifact.name
            )));
        }

        let encoding = match class_map.encoding.as_deref() {
            None => None,
            Some("index") => Some(ScoreEncoding::ClassIndex),
            Some("score") => Some(ScoreEncoding::RawScore),
            Some(other) => {
                return Err(EvalError::Config(format!(
                    "{}: unknown output encoding {other:?}",
                    artifact.name
                )))
            }
        };

        let library = unsafe { Library::new(&artifact.path) }.map_err(|e| EvalError::Load {
            path: artifact.path.clone(),
            reason: format!("dlopen failed: {e}"),
        })?;

        // Bind the entry point once; a miscompiled scorer fails at load,
        // not mid-run.
        let score = {
            let symbol: Symbol<ScoreFn> =
                unsafe { library.get(ENTRY_POINT) }.map_err(|e| EvalError::Load {
                    path: artifact.path.clone(),
                    reason: format!("no score() entry point: {e}"),
                })?;
            *symbol
        };

        Ok(Self {
            _library: library,
            score,
            registry: ClassRegistry::from_exported(class_map.classes),
            features: class_map.features,
            encoding,
            name: artifact.name.clone(),
        })
    }
}

impl LoadedModel for NativeScorer {
    fn run(&self, batch: &FeatureTable) -> Result<RawOutput> {
        let features = match &self.features {
            Some(list) => list.clone(),
            None => adapter::numeric_feature_names(batch),
        };
        if features.is_empty() {
            return Err(EvalError::Shape {
                artifact: self.name.clone(),
                reason: "scorer input vector would be empty".into(),
            });
        }

        let rows = adapter::native_rows(batch, &features)?;

        // No batch API on the native side: one foreign call per row.
        let mut scores = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut out = [0f64; 1];
            unsafe { (self.score)(row.as_ptr(), out.as_mut_ptr()) };
            scores.push(out[0]);
        }
        Ok(RawOutput::Scores(scores))
    }

    fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    fn score_encoding(&self) -> Option<ScoreEncoding> {
        self.encoding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn artifact_with(dir: &std::path::Path, companion_json: Option<&str>) -> ArtifactRef {
        let so_path = dir.join("gnb_m2c.so");
        let mut file = std::fs::File::create(&so_path).unwrap();
        file.write_all(b"not a real shared object").unwrap();

        let companion = companion_json.map(|json| {
            let path = dir.join("gnb_m2c.classes.json");
            std::fs::write(&path, json).unwrap();
            path
        });

        ArtifactRef {
            name: "gnb_m2c".into(),
            path: so_path,
            kind: crate::types::ArtifactKind::NativeScorer,
            companion,
        }
    }

    #[test]
    fn test_missing_companion_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_with(dir.path(), None);
        let err = NativeScorer::load(&artifact).unwrap_err();
        assert!(matches!(err, EvalError::Config(_)));
    }

    #[test]
    fn test_invalid_companion_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_with(dir.path(), Some("{ not json"));
        let err = NativeScorer::load(&artifact).unwrap_err();
        assert!(matches!(err, EvalError::Config(_)));
    }

    #[test]
    fn test_empty_class_list_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_with(dir.path(), Some(r#"{"classes": []}"#));
        let err = NativeScorer::load(&artifact).unwrap_err();
        assert!(matches!(err, EvalError::Config(_)));
    }

    #[test]
    fn test_unknown_encoding_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_with(
            dir.path(),
            Some(r#"{"classes": ["a", "b"], "encoding": "onehot"}"#),
        );
        let err = NativeScorer::load(&artifact).unwrap_err();
        assert!(matches!(err, EvalError::Config(_)));
    }

    #[test]
    fn test_corrupt_library_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_with(dir.path(), Some(r#"{"classes": ["a", "b"]}"#));
        let err = NativeScorer::load(&artifact).unwrap_err();
        assert!(matches!(err, EvalError::Load { .. }));
    }

    #[test]
    fn test_companion_parse_accepts_optional_fields() {
        let json = r#"{"classes": ["a"], "features": ["Port"], "encoding": "score"}"#;
        let parsed: ClassMapFile = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.classes, ["a"]);
        assert_eq!(parsed.features.as_deref(), Some(&["Port".to_string()][..]));
        assert_eq!(parsed.encoding.as_deref(), Some("score"));
    }

    #[test]
    fn test_missing_library_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut artifact = artifact_with(dir.path(), Some(r#"{"classes": ["a", "b"]}"#));
        artifact.path = PathBuf::from(dir.path().join("ghost.so"));
        let err = NativeScorer::load(&artifact).unwrap_err();
        assert!(matches!(err, EvalError::Load { .. }));
    }
}

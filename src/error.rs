//! Error taxonomy for the evaluation harness.
//!
//! Load/Shape/Decode/Config errors are recovered per artifact inside the
//! harness loop and turn into skipped report rows. Only Dataset and Report
//! errors abort a run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("failed to load artifact {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("input shape mismatch for {artifact}: {reason}")]
    Shape { artifact: String, reason: String },

    #[error("could not decode raw output: {0}")]
    Decode(String),

    #[error("bad artifact configuration: {0}")]
    Config(String),

    #[error("failed to read dataset: {0}")]
    Dataset(String),

    #[error("failed to write report: {0}")]
    Report(String),
}

impl EvalError {
    /// True for errors that skip one artifact rather than aborting the run.
    pub fn is_artifact_scoped(&self) -> bool {
        matches!(
            self,
            EvalError::Load { .. }
                | EvalError::Shape { .. }
                | EvalError::Decode(_)
                | EvalError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;

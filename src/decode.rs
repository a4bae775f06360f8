//! Decodes an artifact's raw numeric output back into class labels.
//!
//! Every exported format comes back differently: graph models emit a
//! probability matrix, an index vector or label strings; native scorers emit
//! one double per row that is either an approximate class index or an
//! unbounded decision score. All of them normalize to one label per row,
//! resolved against the registry the artifact was encoded with.

use crate::error::{EvalError, Result};
use crate::registry::ClassRegistry;
use crate::types::RawOutput;

/// How a single-score-per-row output maps to classes. Exporters that tag
/// their artifacts pin this; untagged artifacts fall back to the magnitude
/// heuristic in [`decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreEncoding {
    /// The score already approximates a class index; round and clamp.
    ClassIndex,
    /// Unbounded score; snap to the nearest class center on the number line.
    RawScore,
}

/// Normalize raw output to one label per row. Length-preserving.
pub fn decode(raw: &RawOutput, registry: &ClassRegistry) -> Result<Vec<String>> {
    decode_with_encoding(raw, registry, None)
}

/// Like [`decode`], but lets a companion-tagged artifact pin the score
/// branch instead of re-deriving it from value magnitudes.
pub fn decode_with_encoding(
    raw: &RawOutput,
    registry: &ClassRegistry,
    encoding: Option<ScoreEncoding>,
) -> Result<Vec<String>> {
    if registry.is_empty() {
        return Err(EvalError::Decode("class registry has no classes".into()));
    }

    match raw {
        RawOutput::Probabilities(matrix) => {
            if matrix.ncols() == 0 {
                return Err(EvalError::Decode(
                    "probability matrix has zero columns".into(),
                ));
            }
            if matrix.ncols() == 1 {
                // A single-column float matrix carries no per-class
                // probabilities; treat it as one score per row.
                let scores: Vec<f64> = matrix.column(0).iter().map(|v| *v as f64).collect();
                return decode_scores(&scores, registry, encoding);
            }
            matrix
                .rows()
                .into_iter()
                .map(|row| {
                    let idx = row
                        .iter()
                        .enumerate()
                        .max_by(|(_, a), (_, b)| {
                            a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)
                        })
                        .map(|(idx, _)| idx)
                        .ok_or_else(|| EvalError::Decode("empty probability row".into()))?;
                    registry.label(idx).map(str::to_string)
                })
                .collect()
        }
        RawOutput::Indices(indices) => indices
            .iter()
            .map(|&idx| {
                if idx < 0 {
                    return Err(EvalError::Decode(format!("negative class index {idx}")));
                }
                registry.label(idx as usize).map(str::to_string)
            })
            .collect(),
        RawOutput::Scores(scores) => decode_scores(scores, registry, encoding),
        RawOutput::Labels(labels) => Ok(labels.clone()),
    }
}

fn decode_scores(
    scores: &[f64],
    registry: &ClassRegistry,
    encoding: Option<ScoreEncoding>,
) -> Result<Vec<String>> {
    let n_classes = registry.len();

    // Non-finite scores collapse to zero before any branch is chosen.
    let cleaned: Vec<f64> = scores
        .iter()
        .map(|v| if v.is_finite() { *v } else { 0.0 })
        .collect();

    let encoding = encoding.unwrap_or_else(|| {
        let index_like = cleaned
            .iter()
            .all(|v| *v >= -1.0 && *v < n_classes as f64 + 1.0);
        if index_like {
            ScoreEncoding::ClassIndex
        } else {
            ScoreEncoding::RawScore
        }
    });

    cleaned
        .iter()
        .map(|&value| {
            let idx = match encoding {
                ScoreEncoding::ClassIndex => {
                    let rounded = round_half_up(value);
                    rounded.clamp(0, n_classes as i64 - 1) as usize
                }
                ScoreEncoding::RawScore => nearest_center(value, n_classes),
            };
            registry.label(idx).map(str::to_string)
        })
        .collect()
}

/// Round half up, so x.5 always resolves to x+1 regardless of platform.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Nearest class center in `0..n_classes`; distance ties go to the higher
/// index, matching the round-half-up convention of the index branch.
fn nearest_center(value: f64, n_classes: usize) -> usize {
    let mut best = 0usize;
    let mut best_dist = f64::INFINITY;
    for center in 0..n_classes {
        let dist = (value - center as f64).abs();
        if dist <= best_dist {
            best = center;
            best_dist = dist;
        }
    }
    best
}

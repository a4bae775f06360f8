//! Orchestrates a full evaluation run: discover artifacts, then per
//! artifact load, run, decode and score, aggregating one report row each.
//!
//! Failures are recovered at artifact granularity: a corrupt file or a bad
//! companion skips that artifact with a visible reason and the scan moves
//! on. Only dataset or report I/O aborts the run. Artifacts are processed
//! in directory-listing order and the report preserves it.

use std::fmt::Write as _;
use std::path::Path;

use crate::artifact::{self, LoadedModel};
use crate::dataset::{FeatureTable, HeldOutSplit};
use crate::decode;
use crate::error::{EvalError, Result};
use crate::metrics::{self, ClassificationMetrics};
use crate::profile;
use crate::types::{ArtifactRef, MetricsRow, ReportRow};

pub struct Harness {
    heldout: FeatureTable,
    truth: Vec<String>,
    class_labels: Vec<String>,
}

impl Harness {
    pub fn new(split: HeldOutSplit) -> Self {
        Self {
            heldout: split.heldout,
            truth: split.truth,
            class_labels: split.class_labels,
        }
    }

    /// Evaluate every artifact under `models_dir` and aggregate the report.
    pub fn run(&self, models_dir: &Path) -> Result<Report> {
        let artifacts = artifact::discover(models_dir)?;
        tracing::info!(count = artifacts.len(), dir = %models_dir.display(), "discovered artifacts");

        let mut rows = Vec::with_capacity(artifacts.len());
        for artifact in &artifacts {
            match self.evaluate(artifact) {
                Ok(row) => {
                    tracing::info!(model = %row.model, accuracy = row.accuracy, "evaluated");
                    rows.push(ReportRow::Evaluated(row));
                }
                Err(e) if e.is_artifact_scoped() => {
                    tracing::warn!(model = %artifact.name, error = %e, "skipping artifact");
                    rows.push(ReportRow::Skipped {
                        name: artifact.name.clone(),
                        kind: artifact.kind,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Report { rows })
    }

    fn evaluate(&self, artifact: &ArtifactRef) -> Result<MetricsRow> {
        let disk_size_bytes = profile::disk_size(&artifact.path)?;

        let (loaded, memory_delta_bytes) =
            profile::measure_load(|| artifact::load(artifact, &self.class_labels));
        let loaded = loaded?;

        let metrics = self.score_model(loaded.as_ref())?;
        // The session / dylib handle is released here, before the next
        // artifact is touched.
        drop(loaded);

        Ok(MetricsRow {
            model: artifact.name.clone(),
            kind: artifact.kind,
            disk_size_bytes,
            memory_delta_bytes,
            accuracy: metrics.accuracy,
            precision: metrics.precision,
            recall: metrics.recall,
            f1_score: metrics.f1,
        })
    }

    /// Run one loaded model over the held-out set and score it against the
    /// ground truth.
    pub fn score_model(&self, model: &dyn LoadedModel) -> Result<ClassificationMetrics> {
        let raw = model.run(&self.heldout)?;
        if raw.len() != self.truth.len() {
            return Err(EvalError::Decode(format!(
                "model produced {} predictions for {} held-out rows",
                raw.len(),
                self.truth.len()
            )));
        }
        let predicted =
            decode::decode_with_encoding(&raw, model.registry(), model.score_encoding())?;
        metrics::weighted_metrics(&self.truth, &predicted)
    }
}

/// The comparison report: one row per discovered artifact, evaluated or
/// skipped, in discovery order.
#[derive(Debug, Clone)]
pub struct Report {
    rows: Vec<ReportRow>,
}

const CSV_HEADER: [&str; 9] = [
    "Model",
    "Kind",
    "Disk_Size_Bytes",
    "Memory_Delta_Bytes",
    "Accuracy",
    "Precision",
    "Recall",
    "F1_Score",
    "Status",
];

impl Report {
    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn evaluated_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r, ReportRow::Evaluated(_)))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.rows.len() - self.evaluated_count()
    }

    /// Write the report as CSV, once per run.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .map_err(|e| EvalError::Report(format!("open {}: {e}", path.display())))?;

        let write = |writer: &mut csv::Writer<std::fs::File>, record: &[String]| {
            writer
                .write_record(record)
                .map_err(|e| EvalError::Report(format!("write row: {e}")))
        };

        write(
            &mut writer,
            &CSV_HEADER.map(str::to_string),
        )?;
        for row in &self.rows {
            match row {
                ReportRow::Evaluated(m) => write(
                    &mut writer,
                    &[
                        m.model.clone(),
                        m.kind.to_string(),
                        m.disk_size_bytes.to_string(),
                        m.memory_delta_bytes.to_string(),
                        format!("{:.6}", m.accuracy),
                        format!("{:.6}", m.precision),
                        format!("{:.6}", m.recall),
                        format!("{:.6}", m.f1_score),
                        "evaluated".to_string(),
                    ],
                )?,
                ReportRow::Skipped { name, kind, reason } => write(
                    &mut writer,
                    &[
                        name.clone(),
                        kind.to_string(),
                        String::new(),
                        String::new(),
                        String::new(),
                        String::new(),
                        String::new(),
                        String::new(),
                        format!("skipped: {reason}"),
                    ],
                )?,
            }
        }

        writer
            .flush()
            .map_err(|e| EvalError::Report(format!("flush {}: {e}", path.display())))
    }

    /// Console rendering of the same table.
    pub fn render(&self) -> String {
        let name_width = self
            .rows
            .iter()
            .map(|r| r.name().len())
            .chain(std::iter::once("Model".len()))
            .max()
            .unwrap_or(5);

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<name_width$}  {:<6}  {:>12}  {:>12}  {:>8}  {:>9}  {:>8}  {:>8}",
            "Model", "Kind", "Disk(bytes)", "Mem(bytes)", "Accuracy", "Precision", "Recall", "F1"
        );
        for row in &self.rows {
            match row {
                ReportRow::Evaluated(m) => {
                    let _ = writeln!(
                        out,
                        "{:<name_width$}  {:<6}  {:>12}  {:>12}  {:>8.4}  {:>9.4}  {:>8.4}  {:>8.4}",
                        m.model,
                        m.kind.to_string(),
                        m.disk_size_bytes,
                        m.memory_delta_bytes,
                        m.accuracy,
                        m.precision,
                        m.recall,
                        m.f1_score
                    );
                }
                ReportRow::Skipped { name, kind, reason } => {
                    let _ = writeln!(
                        out,
                        "{:<name_width$}  {:<6}  skipped: {}",
                        name,
                        kind.to_string(),
                        reason
                    );
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArtifactKind;

    fn sample_report() -> Report {
        Report {
            rows: vec![
                ReportRow::Evaluated(MetricsRow {
                    model: "gnb".into(),
                    kind: ArtifactKind::GraphModel,
                    disk_size_bytes: 4096,
                    memory_delta_bytes: 1024,
                    accuracy: 0.95,
                    precision: 0.94,
                    recall: 0.95,
                    f1_score: 0.945,
                }),
                ReportRow::Skipped {
                    name: "broken".into(),
                    kind: ArtifactKind::NativeScorer,
                    reason: "dlopen failed".into(),
                },
            ],
        }
    }

    #[test]
    fn test_counts_distinguish_skips() {
        let report = sample_report();
        assert_eq!(report.evaluated_count(), 1);
        assert_eq!(report.skipped_count(), 1);
    }

    #[test]
    fn test_render_shows_skip_reason() {
        let text = sample_report().render();
        assert!(text.contains("gnb"));
        assert!(text.contains("skipped: dlopen failed"));
    }

    #[test]
    fn test_csv_round_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_metrics.csv");
        sample_report().write_csv(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Model,Kind,Disk_Size_Bytes,Memory_Delta_Bytes,Accuracy,Precision,Recall,F1_Score,Status"
        );
        let evaluated = lines.next().unwrap();
        assert!(evaluated.starts_with("gnb,graph,4096,1024,"));
        assert!(evaluated.ends_with("evaluated"));
        let skipped = lines.next().unwrap();
        assert!(skipped.starts_with("broken,native,,,,,,,"));
        assert!(skipped.contains("skipped: dlopen failed"));
    }

    #[test]
    fn test_unwritable_report_path_is_fatal() {
        let err = sample_report()
            .write_csv(Path::new("/nonexistent/dir/report.csv"))
            .unwrap_err();
        assert!(!err.is_artifact_scoped());
    }
}

pub mod adapter;
pub mod artifact;
pub mod dataset;
pub mod decode;
pub mod error;
pub mod harness;
pub mod metrics;
pub mod profile;
pub mod registry;
pub mod types;

pub use artifact::{discover, load, LoadedModel};
pub use dataset::{heldout_split, FeatureTable, HeldOutSplit};
pub use decode::{decode, decode_with_encoding, ScoreEncoding};
pub use error::{EvalError, Result};
pub use harness::{Harness, Report};
pub use metrics::{weighted_metrics, ClassificationMetrics};
pub use registry::{ClassOrdering, ClassRegistry};
pub use types::{ArtifactKind, ArtifactRef, MetricsRow, RawOutput, ReportRow};

pub mod split;
pub mod table;

pub use split::{heldout_split, HeldOutSplit};
pub use table::{Column, FeatureTable};

/// Columns the ingestion step strips before training; the harness strips the
/// same ones so train-time and eval-time tables agree.
pub const DEFAULT_DROP_COLUMNS: &[&str] = &["SourceIP", "TCP", "ICMP", "Country"];

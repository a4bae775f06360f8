//! Deterministic held-out split.
//!
//! Metrics are compared release to release, so the partition must be
//! reproducible: a seeded shuffle of the row indices, with the first
//! `test_fraction` of the shuffled order held out for evaluation.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::dataset::table::FeatureTable;
use crate::error::{EvalError, Result};

#[derive(Debug)]
pub struct HeldOutSplit {
    /// The full target column in dataset row order. First-appearance class
    /// registries are derived from this, so the ordering must never depend
    /// on the shuffle.
    pub class_labels: Vec<String>,
    /// Held-out feature rows.
    pub heldout: FeatureTable,
    /// Ground-truth labels aligned with `heldout`.
    pub truth: Vec<String>,
}

pub fn heldout_split(
    table: &FeatureTable,
    labels: &[String],
    test_fraction: f64,
    seed: u64,
) -> Result<HeldOutSplit> {
    if table.n_rows() != labels.len() {
        return Err(EvalError::Dataset(format!(
            "{} rows but {} labels",
            table.n_rows(),
            labels.len()
        )));
    }
    if !(0.0..=1.0).contains(&test_fraction) {
        return Err(EvalError::Dataset(format!(
            "test fraction {test_fraction} outside [0, 1]"
        )));
    }

    let mut indices: Vec<usize> = (0..table.n_rows()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((table.n_rows() as f64) * test_fraction).round() as usize;
    let n_test = n_test.min(table.n_rows());
    let (test_idx, _train_idx) = indices.split_at(n_test);

    let truth: Vec<String> = test_idx.iter().map(|&i| labels[i].clone()).collect();

    tracing::debug!(
        train = labels.len() - truth.len(),
        heldout = truth.len(),
        seed,
        "dataset split"
    );

    Ok(HeldOutSplit {
        class_labels: labels.to_vec(),
        heldout: table.select_rows(test_idx),
        truth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::table::Column;

    fn table(n: usize) -> (FeatureTable, Vec<String>) {
        let values: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let labels: Vec<String> = (0..n)
            .map(|i| if i % 2 == 0 { "even" } else { "odd" }.to_string())
            .collect();
        let table = FeatureTable::new(vec![("x".into(), Column::Numeric(values))]).unwrap();
        (table, labels)
    }

    #[test]
    fn test_split_sizes() {
        let (table, labels) = table(100);
        let split = heldout_split(&table, &labels, 0.2, 42).unwrap();
        assert_eq!(split.heldout.n_rows(), 20);
        assert_eq!(split.truth.len(), 20);
        assert_eq!(split.class_labels.len(), 100);
    }

    #[test]
    fn test_same_seed_same_partition() {
        let (table, labels) = table(50);
        let a = heldout_split(&table, &labels, 0.2, 42).unwrap();
        let b = heldout_split(&table, &labels, 0.2, 42).unwrap();
        assert_eq!(a.truth, b.truth);
        assert_eq!(
            a.heldout.column("x").unwrap(),
            b.heldout.column("x").unwrap()
        );
    }

    #[test]
    fn test_different_seed_different_partition() {
        let (table, labels) = table(50);
        let a = heldout_split(&table, &labels, 0.2, 42).unwrap();
        let b = heldout_split(&table, &labels, 0.2, 7).unwrap();
        assert_ne!(
            a.heldout.column("x").unwrap(),
            b.heldout.column("x").unwrap()
        );
    }

    #[test]
    fn test_partitions_are_disjoint_and_complete() {
        let (table, labels) = table(30);
        let split = heldout_split(&table, &labels, 0.3, 1).unwrap();
        assert_eq!(split.truth.len(), 9);
        // Every held-out x value is distinct from the rest by construction,
        // so a size check on the union suffices.
        let Column::Numeric(heldout_x) = split.heldout.column("x").unwrap() else {
            panic!("x should be numeric");
        };
        let mut seen: Vec<i64> = heldout_x.iter().map(|v| *v as i64).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), split.truth.len());
    }

    #[test]
    fn test_bad_fraction_rejected() {
        let (table, labels) = table(10);
        assert!(heldout_split(&table, &labels, 1.5, 42).is_err());
    }

    #[test]
    fn test_class_order_follows_dataset_rows_not_shuffle() {
        // Labels cycle benign/scan/ddos, so first appearance in dataset
        // order is fixed; a registry built from shuffled rows would come
        // back permuted and every decoded index would resolve wrongly.
        let cycle = ["benign", "scan", "ddos"];
        let labels: Vec<String> = (0..30).map(|i| cycle[i % 3].to_string()).collect();
        let values: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let table = FeatureTable::new(vec![("x".into(), Column::Numeric(values))]).unwrap();

        for seed in [42, 7] {
            let split = heldout_split(&table, &labels, 0.2, seed).unwrap();
            let registry = crate::registry::ClassRegistry::insertion_order(&split.class_labels);
            assert_eq!(registry.labels(), &["benign", "scan", "ddos"]);
        }
    }

    #[test]
    fn test_class_labels_keep_heldout_only_classes() {
        // A class that only ever lands in the held-out rows must still be
        // present in the label column the registries are built from.
        let mut labels: Vec<String> = vec!["benign".into(); 10];
        labels[3] = "rare".into();
        let values: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let table = FeatureTable::new(vec![("x".into(), Column::Numeric(values))]).unwrap();

        let split = heldout_split(&table, &labels, 0.2, 42).unwrap();
        assert!(split.class_labels.iter().any(|l| l == "rare"));
    }
}

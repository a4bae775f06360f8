//! Class label registries.
//!
//! An exported model encodes classes as indices against a specific label
//! ordering. The two exporters in this pipeline use different conventions:
//! the graph exporter encodes against the uniques in order of first
//! appearance in the training target, while the native-scorer exporter
//! writes sorted uniques into the companion class map. Decoding against the
//! wrong ordering produces plausible-looking but wrong labels, so the
//! ordering travels with the registry value and is never a shared default.

use crate::error::{EvalError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassOrdering {
    /// Uniques in order of first appearance in the training target.
    InsertionOrder,
    /// Sorted uniques.
    Sorted,
    /// Whatever order the exporter wrote into the companion file.
    Exported,
}

#[derive(Debug, Clone)]
pub struct ClassRegistry {
    labels: Vec<String>,
    ordering: ClassOrdering,
}

impl ClassRegistry {
    /// Uniques in order of first appearance.
    pub fn insertion_order<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut uniques: Vec<String> = Vec::new();
        for label in labels {
            let label = label.as_ref();
            if !uniques.iter().any(|u| u == label) {
                uniques.push(label.to_string());
            }
        }
        Self {
            labels: uniques,
            ordering: ClassOrdering::InsertionOrder,
        }
    }

    /// Sorted uniques.
    pub fn sorted<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut uniques: Vec<String> = Vec::new();
        for label in labels {
            let label = label.as_ref();
            if !uniques.iter().any(|u| u == label) {
                uniques.push(label.to_string());
            }
        }
        uniques.sort();
        Self {
            labels: uniques,
            ordering: ClassOrdering::Sorted,
        }
    }

    /// Labels exactly as an exporter wrote them, trusted as-is.
    pub fn from_exported(labels: Vec<String>) -> Self {
        Self {
            labels,
            ordering: ClassOrdering::Exported,
        }
    }

    pub fn ordering(&self) -> ClassOrdering {
        self.ordering
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Resolve a class index to its label.
    pub fn label(&self, idx: usize) -> Result<&str> {
        self.labels.get(idx).map(String::as_str).ok_or_else(|| {
            EvalError::Decode(format!(
                "class index {idx} out of range for {} classes",
                self.labels.len()
            ))
        })
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_keeps_first_appearance() {
        let reg = ClassRegistry::insertion_order(["scan", "ddos", "scan", "benign", "ddos"]);
        assert_eq!(reg.labels(), &["scan", "ddos", "benign"]);
        assert_eq!(reg.ordering(), ClassOrdering::InsertionOrder);
    }

    #[test]
    fn test_sorted_orders_uniques() {
        let reg = ClassRegistry::sorted(["scan", "ddos", "scan", "benign"]);
        assert_eq!(reg.labels(), &["benign", "ddos", "scan"]);
        assert_eq!(reg.ordering(), ClassOrdering::Sorted);
    }

    #[test]
    fn test_round_trip_both_variants() {
        for reg in [
            ClassRegistry::insertion_order(["c", "a", "b"]),
            ClassRegistry::sorted(["c", "a", "b"]),
        ] {
            for label in reg.labels().to_vec() {
                let idx = reg.index_of(&label).unwrap();
                assert_eq!(reg.label(idx).unwrap(), label);
            }
        }
    }

    #[test]
    fn test_out_of_range_index_is_decode_error() {
        let reg = ClassRegistry::sorted(["a", "b"]);
        assert!(reg.label(2).is_err());
    }
}

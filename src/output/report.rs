#![forbid(unsafe_code)]

//! The slice of a validation snapshot a command reports on

use crate::types::{TargetKey, TargetResult, ValidationResult};

/// Per-target results selected for output, in key order
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub entries: Vec<(TargetKey, TargetResult)>,
}

impl Report {
    /// Select targets from a snapshot
    ///
    /// With no selection every target in the snapshot is reported. Selected
    /// targets missing from the snapshot are reported as valid.
    pub fn new(result: &ValidationResult, selected: &[TargetKey]) -> Self {
        let entries = if selected.is_empty() {
            result
                .targets
                .iter()
                .map(|(key, target)| (key.clone(), target.clone()))
                .collect()
        } else {
            let mut keys = selected.to_vec();
            keys.sort();
            keys.dedup();
            keys.into_iter()
                .map(|key| {
                    let target = result.target(&key);
                    (key, target)
                })
                .collect()
        };
        Report { entries }
    }

    /// True when every reported target is valid and settled
    pub fn passed(&self) -> bool {
        self.entries
            .iter()
            .all(|(_, target)| target.is_valid && !target.pending)
    }

    pub fn invalid_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, target)| !target.is_valid)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .map(|(_, target)| target.errors.len())
            .sum()
    }
}

#![forbid(unsafe_code)]

//! Per-target error reporting for UI bindings
//!
//! [`ErrorReporter`] answers the questions a form binding asks ("what is wrong
//! with this field", "is anything wrong at all") by reading the engine's
//! current snapshot. It holds no state of its own, so it can never disagree
//! with the engine.

use crate::engine::{SubscriptionId, ValidationEngine};
use crate::types::{TargetKey, ValidationResult};
use std::collections::BTreeSet;

/// Stateless projection of an engine's results onto individual targets
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    engine: ValidationEngine,
}

impl ErrorReporter {
    pub fn new(engine: ValidationEngine) -> Self {
        ErrorReporter { engine }
    }

    pub fn engine(&self) -> &ValidationEngine {
        &self.engine
    }

    /// Messages currently recorded for `key`; empty for unknown targets
    pub fn errors(&self, key: &TargetKey) -> Vec<String> {
        self.engine.result_for(key).errors
    }

    /// True when `key` currently has at least one message
    pub fn has_errors(&self, key: &TargetKey) -> bool {
        self.engine.result_for(key).has_errors()
    }

    /// True when any target currently has a message
    pub fn has_any_errors(&self) -> bool {
        self.engine.result().error_count() > 0
    }

    /// Call `callback` with each target whose messages changed
    ///
    /// Targets are reported in key order, once per published change.
    pub fn on_errors_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&TargetKey) + Send + Sync + 'static,
    {
        self.engine.subscribe(move |old, new| {
            for key in changed_targets(old, new) {
                callback(&key);
            }
        })
    }
}

/// Targets whose error messages differ between two snapshots
fn changed_targets(old: &ValidationResult, new: &ValidationResult) -> BTreeSet<TargetKey> {
    old.targets
        .keys()
        .chain(new.targets.keys())
        .filter(|key| old.errors_for(key) != new.errors_for(key))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleDescriptor;
    use crate::types::{RuleResult, TargetResult};
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    fn snapshot(entries: &[(&str, &[&str])]) -> ValidationResult {
        let targets: BTreeMap<TargetKey, TargetResult> = entries
            .iter()
            .map(|(key, errors)| {
                (
                    TargetKey::new(*key),
                    TargetResult::from_rule_result(
                        RuleResult::from_messages(errors.iter().copied()),
                        false,
                    ),
                )
            })
            .collect();
        ValidationResult::from_targets(targets)
    }

    #[test]
    fn test_changed_targets() {
        let old = snapshot(&[("A", &["a"]), ("B", &["b"]), ("C", &[])]);
        let new = snapshot(&[("A", &["a"]), ("B", &[]), ("D", &["d"])]);

        let changed: Vec<String> = changed_targets(&old, &new)
            .into_iter()
            .map(|key| key.as_str().to_string())
            .collect();
        assert_eq!(changed, vec!["B", "D"]);
    }

    #[tokio::test]
    async fn test_reporter_reads_engine() {
        let engine = ValidationEngine::new();
        engine.register(
            RuleDescriptor::builder("first-name-required")
                .target("FirstName")
                .check(|| RuleResult::invalid("First Name is required"))
                .unwrap(),
        );
        let reporter = ErrorReporter::new(engine.clone());

        assert!(!reporter.has_any_errors());
        assert!(reporter.errors(&TargetKey::new("FirstName")).is_empty());

        engine.validate_target("FirstName").await;

        assert!(reporter.has_any_errors());
        assert!(reporter.has_errors(&TargetKey::new("FirstName")));
        assert!(!reporter.has_errors(&TargetKey::new("LastName")));
        assert_eq!(
            reporter.errors(&TargetKey::new("FirstName")),
            vec!["First Name is required"]
        );
    }

    #[tokio::test]
    async fn test_on_errors_changed() {
        let engine = ValidationEngine::new();
        engine.register(
            RuleDescriptor::builder("pair")
                .targets(["A", "B"])
                .check(|| RuleResult::invalid("bad"))
                .unwrap(),
        );
        let reporter = ErrorReporter::new(engine.clone());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        reporter.on_errors_changed(move |key| sink.lock().unwrap().push(key.clone()));

        engine.validate_all().await;
        engine.validate_all().await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![TargetKey::new("A"), TargetKey::new("B")]
        );
    }
}

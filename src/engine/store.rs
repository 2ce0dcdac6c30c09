#![forbid(unsafe_code)]

//! Result store: last-known contributions per target and the published snapshot
//!
//! The store keeps, for every target, one slot per rule bound to it. A slot
//! holds the rule's latest contribution (resolved or still pending) and the
//! sequence number of the run that wrote it. Writes carrying a sequence lower
//! than the slot's are stale and dropped, so a slow run can never overwrite
//! the outcome of a run that started after it.
//!
//! Writes accumulate until [`ResultStore::publish`], which rebuilds the touched
//! targets, swaps in a new immutable snapshot, and reports the transition when
//! the snapshot differs by value from the previous one.

use crate::rules::RuleHandle;
use crate::types::{RuleResult, TargetKey, TargetResult, ValidationResult};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// What one rule currently contributes to a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contribution {
    /// An asynchronous evaluation is in flight
    Pending,
    Resolved(RuleResult),
}

/// A published change: the snapshot before and after
#[derive(Debug, Clone)]
pub struct Transition {
    pub old: Arc<ValidationResult>,
    pub new: Arc<ValidationResult>,
}

#[derive(Debug)]
struct Slot {
    sequence: u64,
    contribution: Contribution,
}

#[derive(Debug, Default)]
struct TargetState {
    /// Highest sequence accepted for this target
    sequence: u64,
    /// Keyed by handle, so iteration follows registration order
    slots: BTreeMap<RuleHandle, Slot>,
}

impl TargetState {
    fn result(&self) -> TargetResult {
        let mut pending = false;
        let combined: RuleResult = self
            .slots
            .values()
            .filter_map(|slot| match &slot.contribution {
                Contribution::Pending => {
                    pending = true;
                    None
                }
                Contribution::Resolved(result) => Some(result.clone()),
            })
            .collect();
        TargetResult::from_rule_result(combined, pending)
    }
}

/// Holds the current validation snapshot and the per-rule state behind it
///
/// Starts out holding the all-valid snapshot with no targets.
#[derive(Debug)]
pub struct ResultStore {
    targets: HashMap<TargetKey, TargetState>,
    dirty: BTreeSet<TargetKey>,
    current: Arc<ValidationResult>,
}

impl ResultStore {
    pub fn new() -> Self {
        ResultStore {
            targets: HashMap::new(),
            dirty: BTreeSet::new(),
            current: Arc::new(ValidationResult::empty()),
        }
    }

    /// Record a rule's contribution to a target
    ///
    /// Accepted when `sequence` is at least the slot's current sequence; an
    /// equal sequence is a later phase of the same run (an async rule
    /// resolving). Returns false when the write was stale and discarded.
    pub fn apply(
        &mut self,
        target: &TargetKey,
        rule: RuleHandle,
        contribution: Contribution,
        sequence: u64,
    ) -> bool {
        let state = self.targets.entry(target.clone()).or_default();

        if let Some(slot) = state.slots.get(&rule)
            && sequence < slot.sequence
        {
            return false;
        }

        state.slots.insert(
            rule,
            Slot {
                sequence,
                contribution,
            },
        );
        state.sequence = state.sequence.max(sequence);
        self.dirty.insert(target.clone());
        true
    }

    /// Clear a `Pending` marker left by a run that will never complete
    ///
    /// Only a slot still pending at exactly `sequence` is removed; a resolved
    /// slot or one written by a newer run is kept. Returns true if removed.
    pub fn withdraw(&mut self, target: &TargetKey, rule: RuleHandle, sequence: u64) -> bool {
        let Some(state) = self.targets.get_mut(target) else {
            return false;
        };
        let abandoned = state.slots.get(&rule).is_some_and(|slot| {
            slot.sequence == sequence && slot.contribution == Contribution::Pending
        });
        if abandoned {
            state.slots.remove(&rule);
            self.dirty.insert(target.clone());
        }
        abandoned
    }

    /// Drop a removed rule's contributions from the given targets
    pub fn forget_rule(&mut self, rule: RuleHandle, targets: &[TargetKey]) {
        for target in targets {
            if let Some(state) = self.targets.get_mut(target)
                && state.slots.remove(&rule).is_some()
            {
                self.dirty.insert(target.clone());
            }
        }
    }

    /// Rebuild touched targets and swap in the new snapshot
    ///
    /// Returns the transition when the new snapshot differs by value from the
    /// previous one, `None` when nothing observable changed.
    pub fn publish(&mut self) -> Option<Transition> {
        if self.dirty.is_empty() {
            return None;
        }

        let mut targets = self.current.targets.clone();
        for key in std::mem::take(&mut self.dirty) {
            match self.targets.get(&key) {
                Some(state) if !state.slots.is_empty() => {
                    targets.insert(key, state.result());
                }
                _ => {
                    self.targets.remove(&key);
                    targets.remove(&key);
                }
            }
        }

        let next = ValidationResult::from_targets(targets);
        if next == *self.current {
            return None;
        }

        let new = Arc::new(next);
        let old = std::mem::replace(&mut self.current, Arc::clone(&new));
        Some(Transition { old, new })
    }

    /// The current published snapshot
    pub fn current(&self) -> Arc<ValidationResult> {
        Arc::clone(&self.current)
    }

    /// Highest sequence accepted for a target, if it was ever written
    pub fn last_sequence(&self, target: &TargetKey) -> Option<u64> {
        self.targets.get(target).map(|state| state.sequence)
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{RuleDescriptor, RuleRegistry};

    fn key(name: &str) -> TargetKey {
        TargetKey::new(name)
    }

    // Handles can only be minted by a registry
    fn handles(count: usize) -> Vec<RuleHandle> {
        let mut registry = RuleRegistry::new();
        (0..count)
            .map(|i| {
                registry.register(
                    RuleDescriptor::builder(format!("r{}", i))
                        .target("A")
                        .check(|| RuleResult::Valid)
                        .unwrap(),
                )
            })
            .collect()
    }

    fn invalid(message: &str) -> Contribution {
        Contribution::Resolved(RuleResult::invalid(message))
    }

    #[test]
    fn test_initial_snapshot_is_empty_and_valid() {
        let store = ResultStore::new();
        let current = store.current();
        assert!(current.is_valid);
        assert!(current.targets.is_empty());
    }

    #[test]
    fn test_publish_without_writes_is_silent() {
        let mut store = ResultStore::new();
        assert!(store.publish().is_none());
    }

    #[test]
    fn test_apply_and_publish() {
        let h = handles(1);
        let mut store = ResultStore::new();

        assert!(store.apply(&key("A"), h[0], invalid("bad"), 1));
        let transition = store.publish().unwrap();

        assert!(transition.old.is_valid);
        assert!(!transition.new.is_valid);
        assert_eq!(transition.new.errors_for(&key("A")), &["bad"]);
        assert_eq!(store.last_sequence(&key("A")), Some(1));
    }

    #[test]
    fn test_slots_combine_in_registration_order() {
        let h = handles(2);
        let mut store = ResultStore::new();

        // Written out of order; combined by handle order
        store.apply(&key("A"), h[1], invalid("second"), 1);
        store.apply(&key("A"), h[0], invalid("first"), 1);
        store.publish();

        assert_eq!(store.current().errors_for(&key("A")), &["first", "second"]);
    }

    #[test]
    fn test_stale_write_is_discarded() {
        let h = handles(1);
        let mut store = ResultStore::new();

        assert!(store.apply(&key("A"), h[0], Contribution::Resolved(RuleResult::Valid), 2));
        assert!(!store.apply(&key("A"), h[0], invalid("old"), 1));
        store.publish();

        assert!(store.current().is_valid);
        assert_eq!(store.last_sequence(&key("A")), Some(2));
    }

    #[test]
    fn test_same_sequence_resolves_pending() {
        let h = handles(1);
        let mut store = ResultStore::new();

        store.apply(&key("A"), h[0], Contribution::Pending, 3);
        store.publish();
        let pending = store.current().target(&key("A"));
        assert!(pending.pending);
        assert!(!pending.is_valid);

        assert!(store.apply(&key("A"), h[0], Contribution::Resolved(RuleResult::Valid), 3));
        store.publish();
        let settled = store.current().target(&key("A"));
        assert!(!settled.pending);
        assert!(settled.is_valid);
    }

    #[test]
    fn test_sync_failure_visible_while_pending() {
        let h = handles(2);
        let mut store = ResultStore::new();

        store.apply(&key("A"), h[0], invalid("sync failure"), 1);
        store.apply(&key("A"), h[1], Contribution::Pending, 1);
        store.publish();

        let target = store.current().target(&key("A"));
        assert_eq!(target.errors, vec!["sync failure"]);
        assert!(target.pending);
        assert!(!target.is_valid);
    }

    #[test]
    fn test_identical_result_is_not_a_transition() {
        let h = handles(1);
        let mut store = ResultStore::new();

        store.apply(&key("A"), h[0], invalid("bad"), 1);
        assert!(store.publish().is_some());

        store.apply(&key("A"), h[0], invalid("bad"), 2);
        assert!(store.publish().is_none());
    }

    #[test]
    fn test_forget_rule_removes_target_without_other_rules() {
        let h = handles(2);
        let mut store = ResultStore::new();

        store.apply(&key("A"), h[0], invalid("a"), 1);
        store.apply(&key("B"), h[0], invalid("a"), 1);
        store.apply(&key("B"), h[1], invalid("b"), 1);
        store.publish();

        store.forget_rule(h[0], &[key("A"), key("B")]);
        let transition = store.publish().unwrap();

        assert!(!transition.new.targets.contains_key(&key("A")));
        assert_eq!(transition.new.errors_for(&key("B")), &["b"]);
        assert_eq!(store.last_sequence(&key("A")), None);
    }

    #[test]
    fn test_gate_is_independent_per_target() {
        let h = handles(1);
        let mut store = ResultStore::new();

        store.apply(&key("B"), h[0], Contribution::Resolved(RuleResult::Valid), 5);
        // Same run number 4 is fresh for A but stale for B
        assert!(store.apply(&key("A"), h[0], invalid("x"), 4));
        assert!(!store.apply(&key("B"), h[0], invalid("x"), 4));
    }

    #[test]
    fn test_withdraw_clears_only_matching_pending_slot() {
        let h = handles(2);
        let mut store = ResultStore::new();

        store.apply(&key("A"), h[0], Contribution::Pending, 1);
        store.apply(&key("A"), h[1], invalid("sync failure"), 1);
        store.apply(&key("B"), h[0], Contribution::Pending, 2);
        store.publish();

        // Resolved slots and slots owned by another run stay
        assert!(!store.withdraw(&key("A"), h[1], 1));
        assert!(!store.withdraw(&key("B"), h[0], 1));
        assert!(!store.withdraw(&key("C"), h[0], 1));

        assert!(store.withdraw(&key("A"), h[0], 1));
        let transition = store.publish().unwrap();
        let target = transition.new.target(&key("A"));
        assert!(!target.pending);
        assert_eq!(target.errors, vec!["sync failure"]);
        assert!(transition.new.target(&key("B")).pending);
    }
}

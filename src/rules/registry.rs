#![forbid(unsafe_code)]

//! Rule registry for storing rules and indexing them by target
//!
//! The RuleRegistry is responsible for:
//! - Keeping every registered descriptor in registration order
//! - Indexing descriptors under each target key they declare
//! - Answering "which rules affect this target" and "which rules exist"
//! - Removing rules, purging their index entries

use crate::rules::RuleDescriptor;
use crate::types::{RuleId, TargetKey};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Stable identity of a registered rule
///
/// Handles are assigned in registration order and never reused, so ordering
/// handles orders rules by registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleHandle(usize);

impl RuleHandle {
    /// Position of the rule in registration order
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for RuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A descriptor together with the handle it was registered under
#[derive(Debug, Clone)]
pub struct RegisteredRule {
    pub handle: RuleHandle,
    pub descriptor: Arc<RuleDescriptor>,
}

/// Registry for storing and looking up rules
///
/// Duplicate rules are allowed: registering the same logic twice yields two
/// independent entries. Removed rules leave a tombstone so handles stay stable.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    rules: Vec<Option<Arc<RuleDescriptor>>>,
    by_target: HashMap<TargetKey, Vec<RuleHandle>>,
}

impl RuleRegistry {
    /// Create a new empty RuleRegistry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor and index it under every target it declares
    pub fn register(&mut self, descriptor: RuleDescriptor) -> RuleHandle {
        let handle = RuleHandle(self.rules.len());

        for target in descriptor.targets() {
            self.by_target
                .entry(target.clone())
                .or_default()
                .push(handle);
        }

        self.rules.push(Some(Arc::new(descriptor)));
        handle
    }

    /// All rules declaring `key`, in registration order
    ///
    /// Multi-target rules that also cover other keys are included.
    pub fn rules_for(&self, key: &TargetKey) -> Vec<RegisteredRule> {
        self.by_target
            .get(key)
            .map(|handles| {
                handles
                    .iter()
                    .filter_map(|&handle| self.registered(handle))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every registered rule exactly once, in registration order
    ///
    /// A multi-target rule appears once even though it is indexed under
    /// several keys.
    pub fn all_rules(&self) -> Vec<RegisteredRule> {
        (0..self.rules.len())
            .filter_map(|index| self.registered(RuleHandle(index)))
            .collect()
    }

    /// Get a rule by its handle
    ///
    /// Returns `None` if the handle was never issued or the rule was removed.
    pub fn get(&self, handle: RuleHandle) -> Option<&Arc<RuleDescriptor>> {
        self.rules.get(handle.0).and_then(Option::as_ref)
    }

    /// True while the rule behind `handle` is registered
    pub fn contains(&self, handle: RuleHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Handle of the first registered rule with the given id
    pub fn find(&self, id: &RuleId) -> Option<RuleHandle> {
        self.all_rules()
            .into_iter()
            .find(|rule| rule.descriptor.id() == id)
            .map(|rule| rule.handle)
    }

    /// Remove a rule and purge its index entries
    ///
    /// Evaluations already holding the descriptor keep it alive until they finish.
    pub fn remove(&mut self, handle: RuleHandle) -> Option<Arc<RuleDescriptor>> {
        let descriptor = self.rules.get_mut(handle.0)?.take()?;

        for target in descriptor.targets() {
            if let Some(handles) = self.by_target.get_mut(target) {
                handles.retain(|&h| h != handle);
                if handles.is_empty() {
                    self.by_target.remove(target);
                }
            }
        }

        Some(descriptor)
    }

    /// Target keys with at least one registered rule, sorted
    pub fn targets(&self) -> Vec<TargetKey> {
        let mut targets: Vec<TargetKey> = self.by_target.keys().cloned().collect();
        targets.sort();
        targets
    }

    /// Get the number of rules in the registry
    pub fn len(&self) -> usize {
        self.rules.iter().filter(|rule| rule.is_some()).count()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn registered(&self, handle: RuleHandle) -> Option<RegisteredRule> {
        self.get(handle).map(|descriptor| RegisteredRule {
            handle,
            descriptor: Arc::clone(descriptor),
        })
    }
}

//! Test utilities for verdict integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use verdict::{RuleDescriptor, RuleResult};

/// Result type alias for tests
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Extract Ok value or panic with context
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("assertion failed: expected Ok, got Err({:?})", e),
        }
    };
    ($expr:expr, $msg:literal) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Extract Some value or panic with context
#[macro_export]
macro_rules! assert_some {
    ($expr:expr) => {
        match $expr {
            Some(v) => v,
            None => panic!("assertion failed: expected Some, got None"),
        }
    };
    ($expr:expr, $msg:literal) => {
        match $expr {
            Some(v) => v,
            None => panic!("{}: got None", $msg),
        }
    };
}

/// Releases for an async rule whose evaluations complete on demand
///
/// Call [`Gates::next`] before starting each evaluation; the returned sender
/// decides when, and with what result, that evaluation completes. An
/// evaluation started without a prepared gate resolves `Valid` immediately.
#[derive(Clone, Default)]
pub struct Gates {
    queue: Arc<Mutex<VecDeque<oneshot::Receiver<RuleResult>>>>,
}

impl Gates {
    pub fn next(&self) -> oneshot::Sender<RuleResult> {
        let (tx, rx) = oneshot::channel();
        self.queue.lock().unwrap().push_back(rx);
        tx
    }

    fn take(&self) -> Option<oneshot::Receiver<RuleResult>> {
        self.queue.lock().unwrap().pop_front()
    }
}

/// An async rule on `targets` whose completions are controlled by the returned gates
pub fn gated_rule(id: &str, targets: &[&str]) -> (RuleDescriptor, Gates) {
    let gates = Gates::default();
    let source = gates.clone();
    let rule = RuleDescriptor::builder(id)
        .targets(targets.iter().copied())
        .check_async(move || {
            let gate = source.take();
            async move {
                match gate {
                    Some(rx) => rx.await.unwrap_or_default(),
                    None => RuleResult::Valid,
                }
            }
        })
        .unwrap();
    (rule, gates)
}

/// A sync rule on `targets` that always returns `result`
pub fn fixed_rule(id: &str, targets: &[&str], result: RuleResult) -> RuleDescriptor {
    RuleDescriptor::builder(id)
        .targets(targets.iter().copied())
        .check(move || result.clone())
        .unwrap()
}

//! Integration tests for asynchronous rules
//!
//! These tests control exactly when each async evaluation completes and verify:
//! - Provisional results while async rules are in flight
//! - The newest run wins regardless of completion order
//! - Late completions after removal or engine drop are discarded

mod common;

use common::{fixed_rule, gated_rule};
use std::sync::{Arc, Mutex};
use verdict::{RuleResult, TargetKey, ValidationEngine};

fn key(name: &str) -> TargetKey {
    TargetKey::new(name)
}

#[tokio::test]
async fn test_newer_run_wins_when_it_finishes_first() {
    let engine = ValidationEngine::new();
    let (rule, gates) = gated_rule("user-name-free", &["T"]);
    engine.register(rule);

    let release_first = gates.next();
    let first = engine.spawn_validate_target("T");
    let release_second = gates.next();
    let second = engine.spawn_validate_target("T");
    assert!(second.sequence() > first.sequence());

    release_second.send(RuleResult::invalid("x")).unwrap();
    let settled = assert_some!(second.wait().await);
    assert_eq!(settled.errors_for(&key("T")), &["x"]);

    // The older run completes last and must not overwrite the newer result
    release_first.send(RuleResult::Valid).unwrap();
    assert_some!(first.wait().await);

    let target = engine.result_for(&key("T"));
    assert!(!target.is_valid);
    assert!(!target.pending);
    assert_eq!(target.errors, vec!["x"]);
}

#[tokio::test]
async fn test_older_result_is_discarded_while_newer_is_pending() {
    let engine = ValidationEngine::new();
    let (rule, gates) = gated_rule("user-name-free", &["T"]);
    engine.register(rule);

    let release_first = gates.next();
    let first = engine.spawn_validate_target("T");
    let release_second = gates.next();
    let second = engine.spawn_validate_target("T");

    release_first.send(RuleResult::invalid("stale")).unwrap();
    assert_some!(first.wait().await);

    let target = engine.result_for(&key("T"));
    assert!(target.pending, "newer run still in flight");
    assert!(target.errors.is_empty());

    release_second.send(RuleResult::Valid).unwrap();
    let settled = assert_some!(second.wait().await);
    assert!(settled.is_valid);
}

#[tokio::test]
async fn test_provisional_result_shows_sync_failures() {
    let engine = ValidationEngine::new();
    engine.register(fixed_rule("length", &["UserName"], RuleResult::invalid("too short")));
    let (rule, gates) = gated_rule("user-name-free", &["UserName"]);
    engine.register(rule);

    let release = gates.next();
    let pending = engine.spawn_validate_target("UserName");

    let provisional = engine.result();
    assert!(!provisional.is_valid);
    assert!(provisional.is_pending());
    assert_eq!(provisional.errors_for(&key("UserName")), &["too short"]);

    release.send(RuleResult::invalid("taken")).unwrap();
    let settled = assert_some!(pending.wait().await);
    assert!(!settled.is_pending());
    assert_eq!(settled.errors_for(&key("UserName")), &["too short", "taken"]);
}

#[tokio::test]
async fn test_valid_only_after_all_rules_resolve() {
    let engine = ValidationEngine::new();
    engine.register(fixed_rule("length", &["UserName"], RuleResult::Valid));
    let (rule, gates) = gated_rule("user-name-free", &["UserName"]);
    engine.register(rule);

    let release = gates.next();
    let pending = engine.spawn_validate_target("UserName");
    assert!(!engine.result_for(&key("UserName")).is_valid);

    release.send(RuleResult::Valid).unwrap();
    pending.wait().await;
    assert!(engine.result_for(&key("UserName")).is_valid);
}

#[tokio::test]
async fn test_async_transitions_notify_in_order() {
    let engine = ValidationEngine::new();
    let (rule, gates) = gated_rule("user-name-free", &["UserName"]);
    engine.register(rule);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.subscribe(move |_, new| {
        let target = new.target(&TargetKey::new("UserName"));
        sink.lock().unwrap().push((target.pending, target.errors.clone()));
    });

    let release = gates.next();
    let pending = engine.spawn_validate_target("UserName");
    release.send(RuleResult::invalid("taken")).unwrap();
    pending.wait().await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(true, vec![]), (false, vec!["taken".to_string()])]
    );
}

#[tokio::test]
async fn test_concurrent_runs_through_shared_rule() {
    let engine = ValidationEngine::new();
    let (rule, gates) = gated_rule("pair", &["A", "B"]);
    engine.register(rule);

    let release_a = gates.next();
    let via_a = engine.spawn_validate_target("A");
    let release_b = gates.next();
    let via_b = engine.spawn_validate_target("B");

    release_b.send(RuleResult::invalid("newest")).unwrap();
    release_a.send(RuleResult::invalid("oldest")).unwrap();
    via_a.wait().await;
    via_b.wait().await;

    let result = engine.result();
    assert_eq!(result.errors_for(&key("A")), &["newest"]);
    assert_eq!(result.errors_for(&key("B")), &["newest"]);
}

#[tokio::test]
async fn test_removed_rule_result_is_discarded() {
    let engine = ValidationEngine::new();
    let (rule, gates) = gated_rule("user-name-free", &["UserName"]);
    let handle = engine.register(rule);

    let release = gates.next();
    let pending = engine.spawn_validate_target("UserName");
    assert!(engine.remove_rule(handle));

    release.send(RuleResult::invalid("taken")).unwrap();
    let settled = assert_some!(pending.wait().await);

    assert!(settled.is_valid);
    assert!(!settled.targets.contains_key(&key("UserName")));
}

#[tokio::test]
async fn test_completion_after_engine_drop_is_discarded() {
    let engine = ValidationEngine::new();
    let (rule, gates) = gated_rule("user-name-free", &["UserName"]);
    engine.register(rule);

    let release = gates.next();
    let pending = engine.spawn_validate_target("UserName");
    drop(engine);

    release.send(RuleResult::invalid("taken")).unwrap();
    assert_eq!(pending.wait().await, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_settled_form_on_multi_thread_runtime() {
    let engine = ValidationEngine::new();
    engine.register(
        verdict::RuleDescriptor::builder("slow")
            .target("Zip")
            .check_async(|| async {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                RuleResult::invalid("unknown zip code")
            })
            .unwrap(),
    );

    futures::future::join_all((0..8).map(|_| engine.validate_target("Zip"))).await;

    // Every run has resolved, so the newest one is no longer pending
    let settled = engine.result_for(&key("Zip"));
    assert!(!settled.pending);
    assert_eq!(settled.errors, vec!["unknown zip code"]);
}

#[test]
fn test_abandoned_run_without_runtime_does_not_stay_pending() {
    let engine = ValidationEngine::new();
    engine.register(
        verdict::RuleDescriptor::builder("always-valid")
            .target("A")
            .check_async(|| async { RuleResult::Valid })
            .unwrap(),
    );

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.subscribe(move |_, new| sink.lock().unwrap().push(new.is_valid));

    let pending = engine.spawn_validate_target("A");
    assert!(!engine.result().is_valid);
    drop(pending);

    let target = engine.result_for(&key("A"));
    assert!(!target.pending);
    assert!(target.is_valid);
    assert!(engine.result().is_valid);
    assert_eq!(*seen.lock().unwrap(), vec![false, true]);
}

#[tokio::test]
async fn test_settled_form_reflects_newer_pending_run() {
    let engine = ValidationEngine::new();
    let (rule, gates) = gated_rule("user-name-free", &["T"]);
    engine.register(rule);

    let release_first = gates.next();
    let mut first = Box::pin(engine.validate_target("T"));
    assert!(futures::poll!(&mut first).is_pending());

    let release_second = gates.next();
    let second = engine.spawn_validate_target("T");

    // The first run's own rule resolves, but the newer run still owns the slot
    release_first.send(RuleResult::invalid("stale")).unwrap();
    let settled = first.await;
    assert!(settled.target(&key("T")).pending);
    assert!(settled.target(&key("T")).errors.is_empty());

    release_second.send(RuleResult::Valid).unwrap();
    let settled = assert_some!(second.wait().await);
    assert!(settled.is_valid);
}

#![forbid(unsafe_code)]

//! Validation engine: runs rules and feeds their results into the store
//!
//! Every run takes the next sequence number from the engine. Synchronous rules
//! run inline and their results, together with a `Pending` marker for each
//! asynchronous rule, are committed immediately. Asynchronous rules are then
//! driven to completion and each result is committed under the same sequence
//! number; the store drops it for any target a newer run has since written.
//!
//! Faults (an evaluate function returning an error or panicking) never escape:
//! they become an invalid result carrying the configured fault message and are
//! reported on the `tracing` channel.

use crate::config::EngineSettings;
use crate::engine::notifier::{ChangeNotifier, SubscriptionId};
use crate::engine::pending::{OnAbandon, PendingEvaluation, Scope};
use crate::engine::store::{Contribution, ResultStore};
use crate::engine::{lock, read, write};
use crate::error::{BoxError, RuleFault, panic_message};
use crate::rules::{Evaluator, RegisteredRule, RuleDescriptor, RuleHandle, RuleRegistry};
use crate::types::{RuleResult, TargetKey, TargetResult, ValidationResult};
use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

type Outcome = Result<Result<RuleResult, BoxError>, Box<dyn Any + Send>>;

/// An asynchronous rule started by a run, not yet resolved
struct InFlight {
    rule: RegisteredRule,
    future: BoxFuture<'static, Result<RuleResult, BoxError>>,
}

/// State shared by all handles of one engine
struct Shared {
    registry: RwLock<RuleRegistry>,
    store: Mutex<ResultStore>,
    notifier: ChangeNotifier,
    sequence: AtomicU64,
    settings: EngineSettings,
}

impl Shared {
    /// Write contributions under one sequence number, then notify
    fn commit<I>(&self, sequence: u64, updates: I)
    where
        I: IntoIterator<Item = (RegisteredRule, Contribution)>,
    {
        {
            let mut store = lock(&self.store);
            let registry = read(&self.registry);

            for (rule, contribution) in updates {
                // A rule removed mid-run must not resurrect its slots
                if !registry.contains(rule.handle) {
                    tracing::debug!(rule = %rule.descriptor.id(), sequence, "discarding result of removed rule");
                    continue;
                }
                for target in rule.descriptor.targets() {
                    if !store.apply(target, rule.handle, contribution.clone(), sequence) {
                        tracing::debug!(
                            rule = %rule.descriptor.id(),
                            target = %target,
                            sequence,
                            "discarding stale result"
                        );
                    }
                }
            }

            if let Some(transition) = store.publish() {
                self.notifier.enqueue(transition);
            }
        }
        self.notifier.drain();
    }

    /// Clear the pending markers of async rules a run will never resolve
    fn withdraw(&self, sequence: u64, rules: &[RegisteredRule]) {
        {
            let mut store = lock(&self.store);
            for rule in rules {
                for target in rule.descriptor.targets() {
                    if store.withdraw(target, rule.handle, sequence) {
                        tracing::debug!(rule = %rule.descriptor.id(), target = %target, sequence, "abandoned pending result");
                    }
                }
            }
            if let Some(transition) = store.publish() {
                self.notifier.enqueue(transition);
            }
        }
        self.notifier.drain();
    }

    /// Turn a rule's outcome into the result it contributes
    fn settle(&self, rule: &RegisteredRule, outcome: Outcome) -> RuleResult {
        let fault = match outcome {
            Ok(Ok(result)) => return result.normalized(),
            Ok(Err(source)) => RuleFault::Failed {
                rule: rule.descriptor.id().clone(),
                source,
            },
            Err(panic) => RuleFault::Panicked {
                rule: rule.descriptor.id().clone(),
                message: panic_message(panic.as_ref()),
            },
        };

        tracing::warn!(rule = %fault.rule(), handle = %rule.handle, error = %fault, "rule faulted");
        RuleResult::invalid(self.settings.fault_message.clone())
    }

    fn current(&self) -> Arc<ValidationResult> {
        lock(&self.store).current()
    }
}

/// Validation engine for one host object
///
/// Cloning the engine yields another handle to the same registry, store and
/// subscribers. Separate engines share nothing.
#[derive(Clone)]
pub struct ValidationEngine {
    shared: Arc<Shared>,
}

impl ValidationEngine {
    /// Creates an engine with default settings
    pub fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        ValidationEngine {
            shared: Arc::new(Shared {
                registry: RwLock::new(RuleRegistry::new()),
                store: Mutex::new(ResultStore::new()),
                notifier: ChangeNotifier::new(),
                sequence: AtomicU64::new(0),
                settings,
            }),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.shared.settings
    }

    /// Register a rule under every target it declares
    ///
    /// Rules are expected to be registered before validation starts.
    pub fn register(&self, descriptor: RuleDescriptor) -> RuleHandle {
        let handle = write(&self.shared.registry).register(descriptor);
        tracing::debug!(handle = %handle, "registered rule");
        handle
    }

    /// Remove a rule and its stored contributions
    ///
    /// Runs already evaluating the rule finish, but their results for it are
    /// discarded. Returns false if the handle was not registered.
    pub fn remove_rule(&self, handle: RuleHandle) -> bool {
        let Some(descriptor) = write(&self.shared.registry).remove(handle) else {
            return false;
        };

        {
            let mut store = lock(&self.shared.store);
            store.forget_rule(handle, descriptor.targets());
            if let Some(transition) = store.publish() {
                self.shared.notifier.enqueue(transition);
            }
        }
        self.shared.notifier.drain();
        true
    }

    /// Number of registered rules
    pub fn rule_count(&self) -> usize {
        read(&self.shared.registry).len()
    }

    /// Targets with at least one registered rule, sorted
    pub fn targets(&self) -> Vec<TargetKey> {
        read(&self.shared.registry).targets()
    }

    /// All registered rules in registration order
    pub fn rules(&self) -> Vec<RegisteredRule> {
        read(&self.shared.registry).all_rules()
    }

    /// The current snapshot; never triggers evaluation
    pub fn result(&self) -> Arc<ValidationResult> {
        self.shared.current()
    }

    /// The current result for one target; unknown targets are valid
    pub fn result_for(&self, key: &TargetKey) -> TargetResult {
        self.shared.current().target(key)
    }

    /// Observe every observably different change of the snapshot
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&ValidationResult, &ValidationResult) + Send + Sync + 'static,
    {
        self.shared.notifier.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.notifier.unsubscribe(id)
    }

    /// Validate one target and wait until this run's rules have resolved
    ///
    /// Returns the engine's snapshot at that point. A newer overlapping run
    /// may still have rules in flight, so targets can be reported as pending.
    pub async fn validate_target(&self, key: impl Into<TargetKey>) -> Arc<ValidationResult> {
        self.run(Scope::Target(key.into())).await
    }

    /// Validate every rule and wait until this run's rules have resolved
    pub async fn validate_all(&self) -> Arc<ValidationResult> {
        self.run(Scope::All).await
    }

    /// Validate one target without waiting for asynchronous rules
    ///
    /// Synchronous rules have run and been stored when this returns.
    /// Asynchronous rules continue on the current Tokio runtime. Without one,
    /// they run when the returned handle is awaited; dropping the handle
    /// unawaited abandons them and clears their pending markers.
    pub fn spawn_validate_target(&self, key: impl Into<TargetKey>) -> PendingEvaluation {
        self.spawn(Scope::Target(key.into()))
    }

    /// Validate every rule without waiting for asynchronous rules
    pub fn spawn_validate_all(&self) -> PendingEvaluation {
        self.spawn(Scope::All)
    }

    async fn run(&self, scope: Scope) -> Arc<ValidationResult> {
        let (sequence, in_flight) = self.begin(&scope);
        if !in_flight.is_empty() {
            drive(Arc::downgrade(&self.shared), sequence, in_flight).await;
        }
        self.result()
    }

    fn spawn(&self, scope: Scope) -> PendingEvaluation {
        let (sequence, in_flight) = self.begin(&scope);
        if in_flight.is_empty() {
            return PendingEvaluation::settled(scope, sequence, self.result());
        }

        let started: Vec<RegisteredRule> =
            in_flight.iter().map(|flight| flight.rule.clone()).collect();
        let settling = drive(Arc::downgrade(&self.shared), sequence, in_flight).boxed();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => PendingEvaluation::spawned(scope, sequence, runtime.spawn(settling)),
            Err(_) => {
                tracing::debug!(scope = %scope, sequence, "no runtime; async rules run when awaited");
                let shared = Arc::downgrade(&self.shared);
                let on_abandon = OnAbandon::new(move || {
                    if let Some(shared) = shared.upgrade() {
                        shared.withdraw(sequence, &started);
                    }
                });
                PendingEvaluation::detached(scope, sequence, settling, on_abandon)
            }
        }
    }

    /// Start a run: evaluate sync rules, start async ones, commit both
    fn begin(&self, scope: &Scope) -> (u64, Vec<InFlight>) {
        let rules = {
            let registry = read(&self.shared.registry);
            match scope {
                Scope::Target(key) => registry.rules_for(key),
                Scope::All => registry.all_rules(),
            }
        };
        let sequence = self.shared.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(scope = %scope, sequence, rules = rules.len(), "starting validation run");

        let mut updates = Vec::with_capacity(rules.len());
        let mut in_flight = Vec::new();

        for rule in rules {
            match rule.descriptor.evaluator() {
                Evaluator::Sync(evaluate) => {
                    let outcome = catch_unwind(AssertUnwindSafe(|| evaluate()));
                    let result = self.shared.settle(&rule, outcome);
                    updates.push((rule, Contribution::Resolved(result)));
                }
                Evaluator::Async(start) => match catch_unwind(AssertUnwindSafe(|| start())) {
                    Ok(future) => {
                        updates.push((rule.clone(), Contribution::Pending));
                        in_flight.push(InFlight { rule, future });
                    }
                    Err(panic) => {
                        let result = self.shared.settle(&rule, Err(panic));
                        updates.push((rule, Contribution::Resolved(result)));
                    }
                },
            }
        }

        self.shared.commit(sequence, updates);
        (sequence, in_flight)
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("rules", &self.rule_count())
            .field("sequence", &self.shared.sequence.load(Ordering::SeqCst))
            .field("notifier", &self.shared.notifier)
            .finish()
    }
}

/// Resolve a run's async rules, committing each result as it arrives
///
/// Holds the engine weakly: once every handle is dropped, remaining results
/// are discarded and `None` is returned.
async fn drive(
    shared: Weak<Shared>,
    sequence: u64,
    in_flight: Vec<InFlight>,
) -> Option<Arc<ValidationResult>> {
    let mut running: FuturesUnordered<_> = in_flight
        .into_iter()
        .map(|InFlight { rule, future }| async move {
            let outcome = AssertUnwindSafe(future).catch_unwind().await;
            (rule, outcome)
        })
        .collect();

    while let Some((rule, outcome)) = running.next().await {
        let Some(engine) = shared.upgrade() else {
            tracing::debug!(sequence, "engine dropped; discarding async results");
            return None;
        };
        let result = engine.settle(&rule, outcome);
        engine.commit(sequence, [(rule, Contribution::Resolved(result))]);
    }

    shared.upgrade().map(|shared| shared.current())
}

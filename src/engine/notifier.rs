#![forbid(unsafe_code)]

//! Change notification for one engine instance
//!
//! Transitions are queued in the order the store published them and delivered
//! by whichever caller holds the drain flag. An observer that triggers another
//! validation from inside its callback only enqueues; the outer drain delivers
//! that transition after the current callback returns, so observers always see
//! transitions in publish order and never re-entrantly.
//!
//! Delivery happens on the publishing thread as long as the engine is driven
//! from one logical thread. When two threads publish at once, the one that
//! finds a drain already running returns immediately and its transition is
//! delivered by the other thread.

use crate::engine::lock;
use crate::engine::store::Transition;
use crate::error::panic_message;
use crate::types::ValidationResult;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Callback receiving `(old, new)` snapshots
pub type Observer = Arc<dyn Fn(&ValidationResult, &ValidationResult) + Send + Sync>;

/// Token returned by [`ChangeNotifier::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscription-{}", self.0)
    }
}

/// Subscriber set and delivery queue
pub struct ChangeNotifier {
    observers: Mutex<Vec<(SubscriptionId, Observer)>>,
    next_id: AtomicU64,
    queue: Mutex<VecDeque<Transition>>,
    draining: AtomicBool,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        ChangeNotifier {
            observers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            queue: Mutex::new(VecDeque::new()),
            draining: AtomicBool::new(false),
        }
    }

    /// Register an observer; it sees every transition published from now on
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&ValidationResult, &ValidationResult) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.observers).push((id, Arc::new(observer)));
        id
    }

    /// Remove an observer; returns false if it was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = lock(&self.observers);
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.observers).len()
    }

    /// Queue a transition for delivery
    ///
    /// Callers enqueue while still holding the store lock so queue order
    /// matches publish order, then call [`drain`](Self::drain) after releasing it.
    pub fn enqueue(&self, transition: Transition) {
        lock(&self.queue).push_back(transition);
    }

    /// Deliver queued transitions unless another caller is already doing so
    pub fn drain(&self) {
        loop {
            if self
                .draining
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return;
            }

            loop {
                let next = lock(&self.queue).pop_front();
                match next {
                    Some(transition) => self.deliver(&transition),
                    None => break,
                }
            }

            self.draining.store(false, Ordering::Release);

            // A transition enqueued after our last pop but before the flag
            // was cleared would otherwise wait for the next publish
            if lock(&self.queue).is_empty() {
                return;
            }
        }
    }

    fn deliver(&self, transition: &Transition) {
        let observers: Vec<(SubscriptionId, Observer)> = lock(&self.observers).clone();
        tracing::trace!(
            observers = observers.len(),
            is_valid = transition.new.is_valid,
            "delivering validation change"
        );

        for (id, observer) in observers {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                observer(&transition.old, &transition.new)
            }));
            if let Err(panic) = outcome {
                tracing::error!(
                    subscription = %id,
                    panic = %panic_message(panic.as_ref()),
                    "validation observer panicked"
                );
            }
        }
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscriber_count())
            .field("queued", &lock(&self.queue).len())
            .finish()
    }
}

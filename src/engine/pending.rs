#![forbid(unsafe_code)]

//! Deferred validation handles

use crate::types::{TargetKey, ValidationResult};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// What a validation run covers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The rules bound to one target
    Target(TargetKey),
    /// Every registered rule
    All,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Target(key) => write!(f, "{}", key),
            Scope::All => f.write_str("*"),
        }
    }
}

pub(crate) type Settling = BoxFuture<'static, Option<Arc<ValidationResult>>>;

/// Runs a cleanup when a detached run is dropped before it settles
pub(crate) struct OnAbandon(Option<Box<dyn FnOnce() + Send>>);

impl OnAbandon {
    pub(crate) fn new(cleanup: impl FnOnce() + Send + 'static) -> Self {
        OnAbandon(Some(Box::new(cleanup)))
    }

    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for OnAbandon {
    fn drop(&mut self) {
        if let Some(cleanup) = self.0.take() {
            cleanup();
        }
    }
}

enum State {
    /// No asynchronous rules were involved
    Settled(Arc<ValidationResult>),
    /// Async rules are being driven on a Tokio task
    Spawned(JoinHandle<Option<Arc<ValidationResult>>>),
    /// No runtime was available; async rules run when the handle is awaited
    Detached(Settling, OnAbandon),
}

/// A validation run whose asynchronous rules may still be in flight
///
/// Dropping the handle does not stop a spawned run; its results still reach
/// the engine. A detached run (started outside a Tokio runtime) only makes
/// progress while awaited, so dropping it, or dropping `wait` part way,
/// abandons its unresolved rules and clears their pending markers.
/// Superseded runs are not cancelled, their results are simply discarded
/// when they arrive.
pub struct PendingEvaluation {
    scope: Scope,
    sequence: u64,
    state: State,
}

impl PendingEvaluation {
    pub(crate) fn settled(scope: Scope, sequence: u64, result: Arc<ValidationResult>) -> Self {
        PendingEvaluation {
            scope,
            sequence,
            state: State::Settled(result),
        }
    }

    pub(crate) fn spawned(
        scope: Scope,
        sequence: u64,
        handle: JoinHandle<Option<Arc<ValidationResult>>>,
    ) -> Self {
        PendingEvaluation {
            scope,
            sequence,
            state: State::Spawned(handle),
        }
    }

    pub(crate) fn detached(
        scope: Scope,
        sequence: u64,
        settling: Settling,
        on_abandon: OnAbandon,
    ) -> Self {
        PendingEvaluation {
            scope,
            sequence,
            state: State::Detached(settling, on_abandon),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Sequence number the run was tagged with
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// True once every asynchronous rule of the run has completed
    pub fn is_finished(&self) -> bool {
        match &self.state {
            State::Settled(_) => true,
            State::Spawned(handle) => handle.is_finished(),
            State::Detached(..) => false,
        }
    }

    /// Wait for the run's asynchronous rules and return the snapshot after them
    ///
    /// Returns `None` if the engine was dropped before the run settled.
    pub async fn wait(self) -> Option<Arc<ValidationResult>> {
        match self.state {
            State::Settled(result) => Some(result),
            State::Spawned(handle) => match handle.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!(scope = %self.scope, sequence = self.sequence, error = %e, "validation task did not complete");
                    None
                }
            },
            State::Detached(settling, on_abandon) => {
                let result = settling.await;
                on_abandon.disarm();
                result
            }
        }
    }
}

impl fmt::Debug for PendingEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingEvaluation")
            .field("scope", &self.scope)
            .field("sequence", &self.sequence)
            .field("finished", &self.is_finished())
            .finish()
    }
}

#![forbid(unsafe_code)]

//! Rule descriptors: the immutable unit of validation logic
//!
//! A [`RuleDescriptor`] binds one evaluate function to one or more target keys.
//! The function is either synchronous (runs inline during validation) or
//! asynchronous (returns a future the engine drives without blocking the caller).

use crate::error::{BoxError, RuleError};
use crate::types::{RuleId, RuleResult, TargetKey};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// Synchronous evaluate function
pub type SyncEvaluate = Arc<dyn Fn() -> Result<RuleResult, BoxError> + Send + Sync>;

/// Asynchronous evaluate function; each call starts one independent evaluation
pub type AsyncEvaluate =
    Arc<dyn Fn() -> BoxFuture<'static, Result<RuleResult, BoxError>> + Send + Sync>;

/// How a rule produces its verdict
#[derive(Clone)]
pub enum Evaluator {
    Sync(SyncEvaluate),
    Async(AsyncEvaluate),
}

impl Evaluator {
    pub fn is_async(&self) -> bool {
        matches!(self, Evaluator::Async(_))
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Evaluator::Sync(_) => f.write_str("Evaluator::Sync(<fn>)"),
            Evaluator::Async(_) => f.write_str("Evaluator::Async(<fn>)"),
        }
    }
}

/// A registered unit of validation logic bound to one or more targets
///
/// Descriptors are immutable once built. The registry owns them behind an
/// `Arc`; evaluation runs hold clones of that `Arc`, never copies of the rule.
#[derive(Debug)]
pub struct RuleDescriptor {
    id: RuleId,
    description: Option<String>,
    targets: Vec<TargetKey>,
    evaluator: Evaluator,
}

impl RuleDescriptor {
    /// Starts building a descriptor with the given rule id
    pub fn builder(id: impl Into<String>) -> RuleBuilder {
        RuleBuilder::new(id)
    }

    pub fn id(&self) -> &RuleId {
        &self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Target keys in declaration order, without duplicates
    pub fn targets(&self) -> &[TargetKey] {
        &self.targets
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn is_async(&self) -> bool {
        self.evaluator.is_async()
    }

    /// True when the rule declares `key` among its targets
    pub fn covers(&self, key: &TargetKey) -> bool {
        self.targets.contains(key)
    }
}

/// Builder for [`RuleDescriptor`]
///
/// ```
/// use verdict::rules::RuleDescriptor;
/// use verdict::RuleResult;
///
/// let rule = RuleDescriptor::builder("first-name-required")
///     .target("FirstName")
///     .check(|| RuleResult::invalid("First Name is required"))
///     .unwrap();
/// assert_eq!(rule.targets().len(), 1);
/// ```
#[derive(Debug)]
pub struct RuleBuilder {
    id: String,
    description: Option<String>,
    targets: Vec<TargetKey>,
}

impl RuleBuilder {
    fn new(id: impl Into<String>) -> Self {
        RuleBuilder {
            id: id.into(),
            description: None,
            targets: Vec::new(),
        }
    }

    /// Binds the rule to one more target; repeated keys are ignored
    pub fn target(mut self, key: impl Into<TargetKey>) -> Self {
        let key = key.into();
        if !self.targets.contains(&key) {
            self.targets.push(key);
        }
        self
    }

    /// Binds the rule to several targets, keeping their order
    pub fn targets<I, K>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<TargetKey>,
    {
        keys.into_iter().fold(self, |builder, key| builder.target(key))
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Finishes with an infallible synchronous check
    pub fn check<F>(self, check: F) -> Result<RuleDescriptor, RuleError>
    where
        F: Fn() -> RuleResult + Send + Sync + 'static,
    {
        self.build(Evaluator::Sync(Arc::new(move || Ok::<_, BoxError>(check()))))
    }

    /// Finishes with a fallible synchronous check; an error is a rule fault
    pub fn try_check<F, E>(self, check: F) -> Result<RuleDescriptor, RuleError>
    where
        F: Fn() -> Result<RuleResult, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.build(Evaluator::Sync(Arc::new(move || {
            check().map_err(Into::<BoxError>::into)
        })))
    }

    /// Finishes with an infallible asynchronous check
    pub fn check_async<F, Fut>(self, check: F) -> Result<RuleDescriptor, RuleError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RuleResult> + Send + 'static,
    {
        self.build(Evaluator::Async(Arc::new(move || {
            check().map(Ok::<_, BoxError>).boxed()
        })))
    }

    /// Finishes with a fallible asynchronous check; an error is a rule fault
    pub fn try_check_async<F, Fut, E>(self, check: F) -> Result<RuleDescriptor, RuleError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RuleResult, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        self.build(Evaluator::Async(Arc::new(move || {
            check()
                .map(|outcome| outcome.map_err(Into::<BoxError>::into))
                .boxed()
        })))
    }

    /// Finishes with an already-assembled evaluator
    pub fn build(self, evaluator: Evaluator) -> Result<RuleDescriptor, RuleError> {
        let id = RuleId::new(self.id.clone())
            .ok_or_else(|| RuleError::InvalidDefinition(format!("Invalid rule ID: {}", self.id)))?;

        if self.targets.is_empty() {
            return Err(RuleError::InvalidDefinition(format!(
                "Rule '{}' must declare at least one target",
                id
            )));
        }

        Ok(RuleDescriptor {
            id,
            description: self.description,
            targets: self.targets,
            evaluator,
        })
    }
}

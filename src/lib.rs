#![forbid(unsafe_code)]

//! Verdict: declarative validation for field-based objects
//!
//! Rules bind an evaluate function, synchronous or asynchronous, to one or
//! more target keys. The engine runs them on demand, keeps the latest result
//! of every rule per target, and publishes immutable snapshots to observers
//! whenever the combined outcome changes. Results of superseded asynchronous
//! evaluations are discarded, and a rule that errors or panics is reported as
//! a validation failure rather than propagated.

pub mod adapter;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod output;
pub mod record;
pub mod rules;
pub mod types;

// Re-export error types for convenient access
pub use error::{BoxError, ConfigError, RuleError, RuleFault, VerdictError};

// Re-export core domain types for convenient access
pub use adapter::ErrorReporter;
pub use engine::{PendingEvaluation, Scope, SubscriptionId, ValidationEngine};
pub use record::Record;
pub use rules::{RuleDescriptor, RuleHandle};
pub use types::{RuleId, RuleResult, TargetKey, TargetResult, ValidationResult};

#![forbid(unsafe_code)]

//! Rule definitions and registry

pub mod builtin;
pub mod registry;
mod rule;

// Re-export core types
pub use builtin::{Check, CompiledCheck};
pub use registry::{RegisteredRule, RuleHandle, RuleRegistry};
pub use rule::{AsyncEvaluate, Evaluator, RuleBuilder, RuleDescriptor, SyncEvaluate};

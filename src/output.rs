//! Output formatters (human and JSONL)

pub mod human;
pub mod jsonl;
pub mod report;
pub mod rule_listing;

pub use human::HumanFormatter;
pub use jsonl::JsonlFormatter;
pub use report::Report;
pub use rule_listing::{Mode, RuleListing, RuleListingHumanFormatter, RuleListingJsonlFormatter};

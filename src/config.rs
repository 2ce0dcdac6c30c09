//! Configuration file parsing and validation

pub mod verdict_toml;

pub use verdict_toml::{
    ColorOption, Config, DEFAULT_FAULT_MESSAGE, EngineSettings, OutputConfig, OutputFormat,
    RuleDefinition, VerdictMeta,
};

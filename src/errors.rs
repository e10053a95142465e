//! Typed error hierarchy for the Prism back-end.
//!
//! Three enums cover the three subsystems that surface typed failures:
//! - `ConfigError` — startup configuration problems
//! - `ScriptError` — lexing, parsing, and evaluation failures
//! - `ExecutorError` — executor selection and script execution failures
//!
//! Data-source probes and token verification deliberately do NOT appear
//! here: both collapse every failure into a sentinel (`false` / `None`)
//! so call sites branch instead of matching on causes.

use thiserror::Error;

/// Errors raised while loading startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Errors from the script front end and evaluator.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Lex error at byte {offset}: {message}")]
    Lex { offset: usize, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("Type error: {0}")]
    Type(String),

    #[error("Evaluation budget exhausted")]
    FuelExhausted,
}

/// Errors from the code-executor subsystem.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Unsupported executor type: {0}")]
    UnsupportedKind(String),

    #[error(transparent)]
    Script(#[from] ScriptError),
}

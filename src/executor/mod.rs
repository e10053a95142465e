//! Pluggable code execution.
//!
//! Two interchangeable strategies run a code string against a variable
//! context: `local` shares the caller's scope (trusted code only) and
//! `sandbox` copies it into an isolated, fuel-limited scope. Selection is
//! an exhaustive enum rather than a string switch; the string form only
//! exists at the configuration boundary, where the legacy wire identifiers
//! `js-local` / `js-vm2` are still accepted alongside the native names.

pub mod local;
pub mod sandbox;
pub mod script;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ExecutorError;

pub use local::LocalExecutor;
pub use sandbox::SandboxExecutor;
pub use script::Scope;

/// Evaluate a code string against a variable context.
///
/// One-shot contract: no state persists between calls. Whether `context`
/// mutations made by the script survive the call is the variant's defining
/// difference — the local executor exposes them, the sandbox discards them.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn execute(&self, code: &str, context: &mut Scope) -> Result<Value, ExecutorError>;
}

/// The available executor strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorKind {
    /// Host-scope evaluation; unsafe for untrusted input.
    Local,
    /// Isolated scope with a fuel budget.
    Sandbox,
}

impl ExecutorKind {
    /// Build the executor for this kind.
    pub fn build(self) -> Box<dyn CodeExecutor> {
        match self {
            ExecutorKind::Local => Box::new(LocalExecutor::new()),
            ExecutorKind::Sandbox => Box::new(SandboxExecutor::new()),
        }
    }
}

impl FromStr for ExecutorKind {
    type Err = ExecutorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" | "js-local" => Ok(ExecutorKind::Local),
            "sandbox" | "js-vm2" => Ok(ExecutorKind::Sandbox),
            other => Err(ExecutorError::UnsupportedKind(other.to_string())),
        }
    }
}

impl fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorKind::Local => write!(f, "local"),
            ExecutorKind::Sandbox => write!(f, "sandbox"),
        }
    }
}

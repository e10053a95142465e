//! Isolated-scope executor.
//!
//! The sandboxed counterpart of [`LocalExecutor`](super::local::LocalExecutor):
//! the context is copied into a private scope before evaluation, so the
//! script can read the supplied bindings but none of its writes reach the
//! host map, and a fuel budget bounds how much work one evaluation may do
//! (the analogue of the original VM's wall-clock timeout).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ExecutorError;

use super::CodeExecutor;
use super::script::{self, Scope};

/// Evaluation steps one sandboxed run may spend before it is cut off.
pub const DEFAULT_FUEL: u64 = 100_000;

/// Executor that runs scripts in an isolated scope under a fuel budget.
#[derive(Debug)]
pub struct SandboxExecutor {
    fuel: u64,
}

impl SandboxExecutor {
    pub fn new() -> Self {
        Self { fuel: DEFAULT_FUEL }
    }

    /// Override the fuel budget, mainly for tests.
    pub fn with_fuel(fuel: u64) -> Self {
        Self { fuel }
    }
}

impl Default for SandboxExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CodeExecutor for SandboxExecutor {
    async fn execute(&self, code: &str, context: &mut Scope) -> Result<Value, ExecutorError> {
        let mut isolated = context.clone();
        Ok(script::run(code, &mut isolated, self.fuel)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ScriptError;
    use serde_json::json;

    #[tokio::test]
    async fn test_execute_returns_sum() {
        let executor = SandboxExecutor::new();
        let mut context = Scope::new();
        context.insert("a".to_string(), json!(1));
        context.insert("b".to_string(), json!(2));
        let result = executor.execute("return a + b", &mut context).await.unwrap();
        assert_eq!(result, json!(3));
    }

    #[tokio::test]
    async fn test_host_context_is_not_mutated() {
        let executor = SandboxExecutor::new();
        let mut context = Scope::new();
        context.insert("counter".to_string(), json!(0));
        executor
            .execute("counter = counter + 1; return counter", &mut context)
            .await
            .unwrap();
        // The script saw its own copy; the host value is untouched.
        assert_eq!(context.get("counter"), Some(&json!(0)));
    }

    #[tokio::test]
    async fn test_fuel_budget_cuts_off_long_scripts() {
        let executor = SandboxExecutor::with_fuel(2);
        let mut context = Scope::new();
        let err = executor
            .execute("return 1 + 2 + 3", &mut context)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutorError::Script(ScriptError::FuelExhausted)
        ));
    }
}

//! Host-scope executor.
//!
//! IMPORTANT: this executor is not safe to use with untrusted code. It
//! evaluates against the caller's own context map with no fuel budget, so
//! scripts run unbounded and every assignment lands in the host-visible
//! map. Gate it behind a trust boundary; untrusted input belongs on
//! [`SandboxExecutor`](super::sandbox::SandboxExecutor).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ExecutorError;

use super::CodeExecutor;
use super::script::{self, Scope};

/// Executor that shares the caller's scope with the script.
#[derive(Debug, Default)]
pub struct LocalExecutor;

impl LocalExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CodeExecutor for LocalExecutor {
    async fn execute(&self, code: &str, context: &mut Scope) -> Result<Value, ExecutorError> {
        Ok(script::run(code, context, u64::MAX)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_execute_returns_sum() {
        let executor = LocalExecutor::new();
        let mut context = Scope::new();
        context.insert("a".to_string(), json!(1));
        context.insert("b".to_string(), json!(2));
        let result = executor.execute("return a + b", &mut context).await.unwrap();
        assert_eq!(result, json!(3));
    }

    #[tokio::test]
    async fn test_mutations_escape_to_host_context() {
        let executor = LocalExecutor::new();
        let mut context = Scope::new();
        context.insert("counter".to_string(), json!(0));
        executor
            .execute("counter = counter + 1;", &mut context)
            .await
            .unwrap();
        assert_eq!(context.get("counter"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_script_errors_propagate() {
        let executor = LocalExecutor::new();
        let mut context = Scope::new();
        let err = executor.execute("return missing", &mut context).await.unwrap_err();
        assert!(matches!(err, ExecutorError::Script(_)));
    }
}

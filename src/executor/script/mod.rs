//! Script front end and evaluator shared by the code executors.
//!
//! The original platform evaluated arbitrary JavaScript snippets against a
//! dynamically-scoped context. Here the same contract is served by an
//! explicit interpreter over a small script subset: the supplied context
//! mapping becomes the root scope (a typed binding table), `lexer` and
//! `parser` build the AST, and `eval` walks it under a fuel budget.

pub mod eval;
pub mod lexer;
pub mod parser;

use serde_json::Value;

use crate::errors::ScriptError;

/// Variable context for one evaluation: names bound to JSON values.
pub type Scope = serde_json::Map<String, Value>;

/// Lex, parse, and evaluate `code` against `scope` with the given fuel.
pub fn run(code: &str, scope: &mut Scope, fuel: u64) -> Result<Value, ScriptError> {
    let tokens = lexer::tokenize(code)?;
    let program = parser::parse(&tokens)?;
    eval::Evaluator::new(fuel).run(&program, scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_run_end_to_end() {
        let mut scope = Scope::new();
        scope.insert("a".to_string(), json!(1));
        scope.insert("b".to_string(), json!(2));
        assert_eq!(run("return a + b", &mut scope, u64::MAX).unwrap(), json!(3));
    }

    #[test]
    fn test_run_surfaces_parse_errors() {
        let mut scope = Scope::new();
        assert!(matches!(
            run("return (", &mut scope, u64::MAX),
            Err(ScriptError::Parse(_))
        ));
    }
}

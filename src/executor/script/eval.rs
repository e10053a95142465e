//! Tree-walking evaluator for the script subset.
//!
//! Evaluates a parsed statement list against a scope of JSON values. The
//! scope doubles as the variable context supplied by the caller: reads
//! resolve against it and writes land in it, so an executor that hands the
//! caller's own map to the evaluator exposes every mutation to the host.
//!
//! Every evaluation step burns one unit of fuel; a sandboxing caller sets a
//! finite budget to bound runaway scripts.

use serde_json::{Number, Value};

use crate::errors::ScriptError;

use super::Scope;
use super::parser::{BinaryOp, Expr, Stmt, UnaryOp};

/// Result of running a statement: either fall through or return a value.
enum Flow {
    Normal(Value),
    Return(Value),
}

/// Evaluator with a fuel budget. `u64::MAX` means effectively unlimited.
pub struct Evaluator {
    fuel: u64,
}

impl Evaluator {
    pub fn new(fuel: u64) -> Self {
        Self { fuel }
    }

    /// Run a program against `scope`.
    ///
    /// The program's value is the operand of the first `return` executed,
    /// or the value of the last expression statement, or `null` if the
    /// program ends without either.
    pub fn run(&mut self, program: &[Stmt], scope: &mut Scope) -> Result<Value, ScriptError> {
        match self.run_block(program, scope)? {
            Flow::Return(value) | Flow::Normal(value) => Ok(value),
        }
    }

    fn run_block(&mut self, stmts: &[Stmt], scope: &mut Scope) -> Result<Flow, ScriptError> {
        let mut last = Value::Null;
        for stmt in stmts {
            match self.run_stmt(stmt, scope)? {
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal(value) => last = value,
            }
        }
        Ok(Flow::Normal(last))
    }

    fn run_stmt(&mut self, stmt: &Stmt, scope: &mut Scope) -> Result<Flow, ScriptError> {
        self.burn()?;
        match stmt {
            Stmt::Let { name, value } | Stmt::Assign { name, value } => {
                let value = self.eval(value, scope)?;
                scope.insert(name.clone(), value);
                Ok(Flow::Normal(Value::Null))
            }
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, scope)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::If { cond, then_branch, else_branch } => {
                let cond = self.eval(cond, scope)?;
                if truthy(&cond) {
                    self.run_block(then_branch, scope)
                } else if let Some(else_branch) = else_branch {
                    self.run_block(else_branch, scope)
                } else {
                    Ok(Flow::Normal(Value::Null))
                }
            }
            Stmt::Expr(expr) => Ok(Flow::Normal(self.eval(expr, scope)?)),
        }
    }

    fn eval(&mut self, expr: &Expr, scope: &mut Scope) -> Result<Value, ScriptError> {
        self.burn()?;
        match expr {
            Expr::Number(value) => number(*value),
            Expr::Str(value) => Ok(Value::String(value.clone())),
            Expr::Bool(value) => Ok(Value::Bool(*value)),
            Expr::Null => Ok(Value::Null),
            Expr::Ident(name) => scope
                .get(name)
                .cloned()
                .ok_or_else(|| ScriptError::UndefinedVariable(name.clone())),
            Expr::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item, scope)?);
                }
                Ok(Value::Array(values))
            }
            Expr::Object(fields) => {
                let mut object = serde_json::Map::new();
                for (key, value) in fields {
                    let value = self.eval(value, scope)?;
                    object.insert(key.clone(), value);
                }
                Ok(Value::Object(object))
            }
            Expr::Unary { op, rhs } => {
                let rhs = self.eval(rhs, scope)?;
                match op {
                    UnaryOp::Neg => match rhs.as_f64() {
                        Some(value) => number(-value),
                        None => Err(ScriptError::Type(format!(
                            "cannot negate {}",
                            type_name(&rhs)
                        ))),
                    },
                    UnaryOp::Not => Ok(Value::Bool(!truthy(&rhs))),
                }
            }
            Expr::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs, scope),
            Expr::Member { object, field } => {
                let object = self.eval(object, scope)?;
                match object {
                    Value::Object(map) => Ok(map.get(field).cloned().unwrap_or(Value::Null)),
                    other => Err(ScriptError::Type(format!(
                        "cannot read field '{field}' of {}",
                        type_name(&other)
                    ))),
                }
            }
            Expr::Index { object, index } => {
                let object = self.eval(object, scope)?;
                let index = self.eval(index, scope)?;
                match (&object, &index) {
                    (Value::Array(items), Value::Number(n)) => {
                        let idx = n.as_f64().unwrap_or(-1.0);
                        if idx >= 0.0 && (idx as usize) < items.len() && idx.fract() == 0.0 {
                            Ok(items[idx as usize].clone())
                        } else {
                            Ok(Value::Null)
                        }
                    }
                    (Value::Object(map), Value::String(key)) => {
                        Ok(map.get(key).cloned().unwrap_or(Value::Null))
                    }
                    _ => Err(ScriptError::Type(format!(
                        "cannot index {} with {}",
                        type_name(&object),
                        type_name(&index)
                    ))),
                }
            }
        }
    }

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        scope: &mut Scope,
    ) -> Result<Value, ScriptError> {
        // Short-circuit operators evaluate the right side lazily.
        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            let lhs = self.eval(lhs, scope)?;
            return match (op, truthy(&lhs)) {
                (BinaryOp::And, false) | (BinaryOp::Or, true) => Ok(lhs),
                _ => self.eval(rhs, scope),
            };
        }

        let lhs = self.eval(lhs, scope)?;
        let rhs = self.eval(rhs, scope)?;

        match op {
            BinaryOp::Add => match (&lhs, &rhs) {
                (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
                _ => arithmetic(&lhs, &rhs, "+", |a, b| a + b),
            },
            BinaryOp::Sub => arithmetic(&lhs, &rhs, "-", |a, b| a - b),
            BinaryOp::Mul => arithmetic(&lhs, &rhs, "*", |a, b| a * b),
            BinaryOp::Div => arithmetic(&lhs, &rhs, "/", |a, b| a / b),
            BinaryOp::Rem => arithmetic(&lhs, &rhs, "%", |a, b| a % b),
            BinaryOp::Eq => Ok(Value::Bool(lhs == rhs)),
            BinaryOp::Ne => Ok(Value::Bool(lhs != rhs)),
            BinaryOp::Lt => ordering(&lhs, &rhs, "<", |o| o == std::cmp::Ordering::Less),
            BinaryOp::Le => ordering(&lhs, &rhs, "<=", |o| o != std::cmp::Ordering::Greater),
            BinaryOp::Gt => ordering(&lhs, &rhs, ">", |o| o == std::cmp::Ordering::Greater),
            BinaryOp::Ge => ordering(&lhs, &rhs, ">=", |o| o != std::cmp::Ordering::Less),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }

    fn burn(&mut self) -> Result<(), ScriptError> {
        if self.fuel == 0 {
            return Err(ScriptError::FuelExhausted);
        }
        if self.fuel != u64::MAX {
            self.fuel -= 1;
        }
        Ok(())
    }
}

fn arithmetic(
    lhs: &Value,
    rhs: &Value,
    op: &str,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Value, ScriptError> {
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(a), Some(b)) => number(f(a, b)),
        _ => Err(ScriptError::Type(format!(
            "cannot apply '{op}' to {} and {}",
            type_name(lhs),
            type_name(rhs)
        ))),
    }
}

fn ordering(
    lhs: &Value,
    rhs: &Value,
    op: &str,
    f: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<Value, ScriptError> {
    let ord = match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    };
    match ord {
        Some(ord) => Ok(Value::Bool(f(ord))),
        None => Err(ScriptError::Type(format!(
            "cannot compare {} {op} {}",
            type_name(lhs),
            type_name(rhs)
        ))),
    }
}

fn number(value: f64) -> Result<Value, ScriptError> {
    // Integral results render without a fractional part.
    if value.fract() == 0.0 && value.abs() < (i64::MAX as f64) {
        return Ok(Value::Number(Number::from(value as i64)));
    }
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| ScriptError::Type("arithmetic produced a non-finite number".to_string()))
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::script::{lexer::tokenize, parser::parse};
    use serde_json::json;

    fn run(source: &str, scope: &mut Scope) -> Result<Value, ScriptError> {
        let program = parse(&tokenize(source).unwrap()).unwrap();
        Evaluator::new(u64::MAX).run(&program, scope)
    }

    fn scope_of(value: Value) -> Scope {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_return_sum_of_context_bindings() {
        let mut scope = scope_of(json!({"a": 1, "b": 2}));
        assert_eq!(run("return a + b", &mut scope).unwrap(), json!(3));
    }

    #[test]
    fn test_string_concatenation() {
        let mut scope = scope_of(json!({"name": "prism"}));
        assert_eq!(
            run(r#"return "hello " + name"#, &mut scope).unwrap(),
            json!("hello prism")
        );
    }

    #[test]
    fn test_assignment_writes_to_scope() {
        let mut scope = scope_of(json!({"count": 1}));
        run("count = count + 10;", &mut scope).unwrap();
        assert_eq!(scope.get("count"), Some(&json!(11)));
    }

    #[test]
    fn test_if_else_branches() {
        let mut scope = scope_of(json!({"n": 5}));
        let result = run(
            "if (n > 3) { return \"big\"; } else { return \"small\"; }",
            &mut scope,
        )
        .unwrap();
        assert_eq!(result, json!("big"));
    }

    #[test]
    fn test_member_and_index_access() {
        let mut scope = scope_of(json!({"user": {"tags": ["admin", "staff"]}}));
        assert_eq!(
            run("return user.tags[1]", &mut scope).unwrap(),
            json!("staff")
        );
    }

    #[test]
    fn test_missing_field_is_null() {
        let mut scope = scope_of(json!({"user": {}}));
        assert_eq!(run("return user.missing", &mut scope).unwrap(), json!(null));
    }

    #[test]
    fn test_undefined_variable_errors() {
        let mut scope = Scope::new();
        let err = run("return nope", &mut scope).unwrap_err();
        assert!(matches!(err, ScriptError::UndefinedVariable(_)));
    }

    #[test]
    fn test_short_circuit_skips_rhs() {
        // The right operand references an undefined variable; && must not
        // evaluate it when the left side is false.
        let mut scope = scope_of(json!({"flag": false}));
        assert_eq!(
            run("return flag && missing", &mut scope).unwrap(),
            json!(false)
        );
    }

    #[test]
    fn test_fuel_exhaustion() {
        let program = parse(&tokenize("return 1 + 2 + 3 + 4").unwrap()).unwrap();
        let mut scope = Scope::new();
        let err = Evaluator::new(3).run(&program, &mut scope).unwrap_err();
        assert!(matches!(err, ScriptError::FuelExhausted));
    }

    #[test]
    fn test_division_produces_fraction() {
        let mut scope = Scope::new();
        assert_eq!(run("return 7 / 2", &mut scope).unwrap(), json!(3.5));
    }

    #[test]
    fn test_last_expression_is_program_value() {
        let mut scope = scope_of(json!({"a": 2}));
        assert_eq!(run("let b = 3; a * b", &mut scope).unwrap(), json!(6));
    }

    #[test]
    fn test_type_error_on_bad_operands() {
        let mut scope = scope_of(json!({"xs": [1]}));
        let err = run("return xs - 1", &mut scope).unwrap_err();
        assert!(matches!(err, ScriptError::Type(_)));
    }
}

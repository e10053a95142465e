//! Recursive-descent parser for the script subset.
//!
//! Grammar (loosest-binding first):
//!
//! ```text
//! program    := stmt*
//! stmt       := "let" IDENT "=" expr ";"
//!             | IDENT "=" expr ";"
//!             | "return" expr? ";"
//!             | "if" "(" expr ")" block ("else" block)?
//!             | expr ";"?
//! block      := "{" stmt* "}"
//! expr       := or
//! or         := and ("||" and)*
//! and        := equality ("&&" equality)*
//! equality   := comparison (("==" | "!=") comparison)*
//! comparison := additive (("<" | "<=" | ">" | ">=") additive)*
//! additive   := multiplicative (("+" | "-") multiplicative)*
//! multiplicative := unary (("*" | "/" | "%") unary)*
//! unary      := ("-" | "!") unary | postfix
//! postfix    := primary ("." IDENT | "[" expr "]")*
//! primary    := NUMBER | STRING | "true" | "false" | "null" | IDENT
//!             | "(" expr ")" | "[" (expr ("," expr)*)? "]"
//!             | "{" (STRING|IDENT ":" expr ("," ...)*)? "}"
//! ```

use crate::errors::ScriptError;

use super::lexer::{Token, TokenKind};

/// A parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let { name: String, value: Expr },
    Assign { name: String, value: Expr },
    Return(Option<Expr>),
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },
    Expr(Expr),
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Ident(String),
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Unary { op: UnaryOp, rhs: Box<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Member { object: Box<Expr>, field: String },
    Index { object: Box<Expr>, index: Box<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Parse a token stream into a statement list.
pub fn parse(tokens: &[Token]) -> Result<Vec<Stmt>, ScriptError> {
    let mut parser = Parser { tokens, pos: 0 };
    let mut stmts = Vec::new();
    while !parser.at_end() {
        stmts.push(parser.statement()?);
    }
    Ok(stmts)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_at(&self, lookahead: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + lookahead).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<&TokenKind> {
        let token = self.tokens.get(self.pos).map(|t| &t.kind);
        self.pos += 1;
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<(), ScriptError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, expected: &str) -> ScriptError {
        match self.tokens.get(self.pos) {
            Some(token) => ScriptError::Parse(format!(
                "expected {expected}, found {:?} at byte {}",
                token.kind, token.offset
            )),
            None => ScriptError::Parse(format!("expected {expected}, found end of input")),
        }
    }

    fn statement(&mut self) -> Result<Stmt, ScriptError> {
        match self.peek() {
            Some(TokenKind::Let) => {
                self.advance();
                let name = self.ident("variable name")?;
                self.expect(&TokenKind::Assign, "'='")?;
                let value = self.expression()?;
                self.expect(&TokenKind::Semi, "';'")?;
                Ok(Stmt::Let { name, value })
            }
            Some(TokenKind::Return) => {
                self.advance();
                if self.eat(&TokenKind::Semi) {
                    return Ok(Stmt::Return(None));
                }
                let value = self.expression()?;
                // Trailing semicolon is optional on the final return.
                self.eat(&TokenKind::Semi);
                Ok(Stmt::Return(Some(value)))
            }
            Some(TokenKind::If) => self.if_statement(),
            // `name = expr;` — assignment, distinguished from an expression
            // statement by one-token lookahead.
            Some(TokenKind::Ident(_)) if self.peek_at(1) == Some(&TokenKind::Assign) => {
                let name = self.ident("variable name")?;
                self.advance(); // '='
                let value = self.expression()?;
                self.expect(&TokenKind::Semi, "';'")?;
                Ok(Stmt::Assign { name, value })
            }
            Some(_) => {
                let value = self.expression()?;
                self.eat(&TokenKind::Semi);
                Ok(Stmt::Expr(value))
            }
            None => Err(self.unexpected("a statement")),
        }
    }

    fn if_statement(&mut self) -> Result<Stmt, ScriptError> {
        self.advance(); // 'if'
        self.expect(&TokenKind::LParen, "'('")?;
        let cond = self.expression()?;
        self.expect(&TokenKind::RParen, "')'")?;
        let then_branch = self.block()?;
        let else_branch = if self.eat(&TokenKind::Else) {
            if self.peek() == Some(&TokenKind::If) {
                Some(vec![self.if_statement()?])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If { cond, then_branch, else_branch })
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        while self.peek() != Some(&TokenKind::RBrace) {
            if self.at_end() {
                return Err(self.unexpected("'}'"));
            }
            stmts.push(self.statement()?);
        }
        self.advance(); // '}'
        Ok(stmts)
    }

    fn ident(&mut self, what: &str) -> Result<String, ScriptError> {
        match self.peek() {
            Some(TokenKind::Ident(name)) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn expression(&mut self) -> Result<Expr, ScriptError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.and_expr()?;
        while self.eat(&TokenKind::OrOr) {
            let rhs = self.and_expr()?;
            lhs = Expr::Binary { op: BinaryOp::Or, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.equality()?;
        while self.eat(&TokenKind::AndAnd) {
            let rhs = self.equality()?;
            lhs = Expr::Binary { op: BinaryOp::And, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.comparison()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::EqEq) => BinaryOp::Eq,
                Some(TokenKind::NotEq) => BinaryOp::Ne,
                _ => break,
            };
            self.advance();
            let rhs = self.comparison()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn comparison(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Lt) => BinaryOp::Lt,
                Some(TokenKind::Le) => BinaryOp::Le,
                Some(TokenKind::Gt) => BinaryOp::Gt,
                Some(TokenKind::Ge) => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let rhs = self.additive()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.multiplicative()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                Some(TokenKind::Percent) => BinaryOp::Rem,
                _ => break,
            };
            self.advance();
            let rhs = self.unary()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ScriptError> {
        let op = match self.peek() {
            Some(TokenKind::Minus) => Some(UnaryOp::Neg),
            Some(TokenKind::Bang) => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let rhs = self.unary()?;
            return Ok(Expr::Unary { op, rhs: Box::new(rhs) });
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, ScriptError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(&TokenKind::Dot) {
                let field = self.ident("field name")?;
                expr = Expr::Member { object: Box::new(expr), field };
            } else if self.eat(&TokenKind::LBracket) {
                let index = self.expression()?;
                self.expect(&TokenKind::RBracket, "']'")?;
                expr = Expr::Index { object: Box::new(expr), index: Box::new(index) };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, ScriptError> {
        match self.peek().cloned() {
            Some(TokenKind::Number(value)) => {
                self.advance();
                Ok(Expr::Number(value))
            }
            Some(TokenKind::Str(value)) => {
                self.advance();
                Ok(Expr::Str(value))
            }
            Some(TokenKind::True) => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            Some(TokenKind::False) => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            Some(TokenKind::Null) => {
                self.advance();
                Ok(Expr::Null)
            }
            Some(TokenKind::Ident(name)) => {
                self.advance();
                Ok(Expr::Ident(name))
            }
            Some(TokenKind::LParen) => {
                self.advance();
                let expr = self.expression()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            Some(TokenKind::LBracket) => {
                self.advance();
                let mut items = Vec::new();
                if !self.eat(&TokenKind::RBracket) {
                    loop {
                        items.push(self.expression()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(&TokenKind::RBracket, "']'")?;
                }
                Ok(Expr::Array(items))
            }
            Some(TokenKind::LBrace) => {
                self.advance();
                let mut fields = Vec::new();
                if !self.eat(&TokenKind::RBrace) {
                    loop {
                        let key = match self.peek().cloned() {
                            Some(TokenKind::Str(key)) => {
                                self.advance();
                                key
                            }
                            Some(TokenKind::Ident(key)) => {
                                self.advance();
                                key
                            }
                            _ => return Err(self.unexpected("an object key")),
                        };
                        self.expect(&TokenKind::Colon, "':'")?;
                        fields.push((key, self.expression()?));
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(&TokenKind::RBrace, "'}'")?;
                }
                Ok(Expr::Object(fields))
            }
            _ => Err(self.unexpected("an expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::script::lexer::tokenize;

    fn parse_source(source: &str) -> Vec<Stmt> {
        parse(&tokenize(source).unwrap()).unwrap()
    }

    #[test]
    fn test_parse_return_expression() {
        let stmts = parse_source("return a + b");
        assert_eq!(stmts.len(), 1);
        match &stmts[0] {
            Stmt::Return(Some(Expr::Binary { op: BinaryOp::Add, .. })) => {}
            other => panic!("unexpected statement: {other:?}"),
        }
    }

    #[test]
    fn test_parse_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let stmts = parse_source("1 + 2 * 3;");
        match &stmts[0] {
            Stmt::Expr(Expr::Binary { op: BinaryOp::Add, rhs, .. }) => {
                assert!(matches!(**rhs, Expr::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("unexpected statement: {other:?}"),
        }
    }

    #[test]
    fn test_parse_let_and_assign() {
        let stmts = parse_source("let x = 1; x = x + 1;");
        assert!(matches!(stmts[0], Stmt::Let { .. }));
        assert!(matches!(stmts[1], Stmt::Assign { .. }));
    }

    #[test]
    fn test_parse_if_else() {
        let stmts = parse_source("if (a > 1) { return a; } else { return 0; }");
        match &stmts[0] {
            Stmt::If { else_branch, .. } => assert!(else_branch.is_some()),
            other => panic!("unexpected statement: {other:?}"),
        }
    }

    #[test]
    fn test_parse_member_and_index() {
        let stmts = parse_source("return user.tags[0];");
        match &stmts[0] {
            Stmt::Return(Some(Expr::Index { object, .. })) => {
                assert!(matches!(**object, Expr::Member { .. }));
            }
            other => panic!("unexpected statement: {other:?}"),
        }
    }

    #[test]
    fn test_parse_object_literal() {
        let stmts = parse_source(r#"return {name: "prism", "count": 2};"#);
        match &stmts[0] {
            Stmt::Return(Some(Expr::Object(fields))) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].0, "name");
                assert_eq!(fields[1].0, "count");
            }
            other => panic!("unexpected statement: {other:?}"),
        }
    }

    #[test]
    fn test_parse_missing_semicolon_after_let_fails() {
        let tokens = tokenize("let x = 1 let y = 2;").unwrap();
        assert!(parse(&tokens).is_err());
    }

    #[test]
    fn test_parse_unclosed_paren_fails() {
        let tokens = tokenize("return (1 + 2;").unwrap();
        assert!(parse(&tokens).is_err());
    }
}

//! Tokenizer for the script subset.
//!
//! Produces a flat token stream for the parser. Supports `//` line
//! comments, double-quoted strings with the usual escapes, decimal
//! numbers, and the operator set of the expression grammar.

use crate::errors::ScriptError;

/// A single lexical token, tagged with its byte offset in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Str(String),
    Ident(String),

    // Keywords
    Let,
    If,
    Else,
    Return,
    True,
    False,
    Null,

    // Operators and punctuation
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Assign,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Dot,
    Colon,
}

/// Tokenize `source` into a token vector.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ScriptError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        let c = bytes[pos] as char;

        match c {
            ' ' | '\t' | '\r' | '\n' => {
                pos += 1;
            }
            '/' if bytes.get(pos + 1) == Some(&b'/') => {
                while pos < bytes.len() && bytes[pos] != b'\n' {
                    pos += 1;
                }
            }
            '"' => {
                let (value, next) = lex_string(source, pos)?;
                tokens.push(Token { kind: TokenKind::Str(value), offset: start });
                pos = next;
            }
            '0'..='9' => {
                let (value, next) = lex_number(source, pos)?;
                tokens.push(Token { kind: TokenKind::Number(value), offset: start });
                pos = next;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = pos;
                while end < bytes.len()
                    && ((bytes[end] as char).is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                let word = &source[pos..end];
                let kind = match word {
                    "let" => TokenKind::Let,
                    "if" => TokenKind::If,
                    "else" => TokenKind::Else,
                    "return" => TokenKind::Return,
                    "true" => TokenKind::True,
                    "false" => TokenKind::False,
                    "null" => TokenKind::Null,
                    _ => TokenKind::Ident(word.to_string()),
                };
                tokens.push(Token { kind, offset: start });
                pos = end;
            }
            _ => {
                let (kind, width) = lex_operator(bytes, pos).ok_or_else(|| ScriptError::Lex {
                    offset: pos,
                    message: format!("unexpected character '{c}'"),
                })?;
                tokens.push(Token { kind, offset: start });
                pos += width;
            }
        }
    }

    Ok(tokens)
}

fn lex_operator(bytes: &[u8], pos: usize) -> Option<(TokenKind, usize)> {
    let two = if pos + 1 < bytes.len() {
        Some(&bytes[pos..pos + 2])
    } else {
        None
    };

    if let Some(pair) = two {
        let kind = match pair {
            b"==" => Some(TokenKind::EqEq),
            b"!=" => Some(TokenKind::NotEq),
            b"<=" => Some(TokenKind::Le),
            b">=" => Some(TokenKind::Ge),
            b"&&" => Some(TokenKind::AndAnd),
            b"||" => Some(TokenKind::OrOr),
            _ => None,
        };
        if let Some(kind) = kind {
            return Some((kind, 2));
        }
    }

    let kind = match bytes[pos] {
        b'+' => TokenKind::Plus,
        b'-' => TokenKind::Minus,
        b'*' => TokenKind::Star,
        b'/' => TokenKind::Slash,
        b'%' => TokenKind::Percent,
        b'!' => TokenKind::Bang,
        b'=' => TokenKind::Assign,
        b'<' => TokenKind::Lt,
        b'>' => TokenKind::Gt,
        b'(' => TokenKind::LParen,
        b')' => TokenKind::RParen,
        b'{' => TokenKind::LBrace,
        b'}' => TokenKind::RBrace,
        b'[' => TokenKind::LBracket,
        b']' => TokenKind::RBracket,
        b',' => TokenKind::Comma,
        b';' => TokenKind::Semi,
        b'.' => TokenKind::Dot,
        b':' => TokenKind::Colon,
        _ => return None,
    };
    Some((kind, 1))
}

fn lex_number(source: &str, start: usize) -> Result<(f64, usize), ScriptError> {
    let bytes = source.as_bytes();
    let mut end = start;
    let mut seen_dot = false;

    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => end += 1,
            // A dot only continues the number when a digit follows; otherwise
            // it belongs to member access on a (nonsensical) number.
            b'.' if !seen_dot && matches!(bytes.get(end + 1), Some(b'0'..=b'9')) => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }

    source[start..end]
        .parse::<f64>()
        .map(|value| (value, end))
        .map_err(|e| ScriptError::Lex {
            offset: start,
            message: format!("bad number literal: {e}"),
        })
}

fn lex_string(source: &str, start: usize) -> Result<(String, usize), ScriptError> {
    let bytes = source.as_bytes();
    let mut value = String::new();
    let mut pos = start + 1;

    while pos < bytes.len() {
        match bytes[pos] {
            b'"' => return Ok((value, pos + 1)),
            b'\\' => {
                let escaped = bytes.get(pos + 1).ok_or(ScriptError::Lex {
                    offset: pos,
                    message: "unterminated escape".to_string(),
                })?;
                match escaped {
                    b'n' => value.push('\n'),
                    b't' => value.push('\t'),
                    b'r' => value.push('\r'),
                    b'"' => value.push('"'),
                    b'\\' => value.push('\\'),
                    other => {
                        return Err(ScriptError::Lex {
                            offset: pos,
                            message: format!("unknown escape '\\{}'", *other as char),
                        });
                    }
                }
                pos += 2;
            }
            _ => {
                // Multi-byte UTF-8 sequences pass through untouched.
                let ch = source[pos..].chars().next().ok_or(ScriptError::Lex {
                    offset: pos,
                    message: "invalid UTF-8".to_string(),
                })?;
                value.push(ch);
                pos += ch.len_utf8();
            }
        }
    }

    Err(ScriptError::Lex {
        offset: start,
        message: "unterminated string literal".to_string(),
    })
}

//! Arithmetic-only expression evaluator.
//!
//! Accepts numeric literals, `+ - * / %`, `**` or `^` for powers, unary signs
//! and parentheses. Names of any kind are refused at tokenization, so there is
//! no path from an input string to anything but arithmetic.
//!
//! ```rust
//! use ttooling::math::evaluate;
//!
//! assert_eq!(evaluate("2*(3+4)").expect("valid expression"), 14.0);
//! assert_eq!(evaluate("-2 ** 2").expect("valid expression"), -4.0);
//! assert!(evaluate("__import__('os')").is_err());
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::ToolError;

pub const MAX_EXPRESSION_LEN: usize = 1024;
pub const MAX_NESTING_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum ExprError {
    Empty,
    TooLong { len: usize },
    TooDeep,
    Identifier { name: String, position: usize },
    UnexpectedChar { found: char, position: usize },
    MalformedNumber { text: String, position: usize },
    UnexpectedToken { found: String, position: usize },
    UnexpectedEnd,
    DivisionByZero,
    ModuloByZero,
    NotFinite,
}

impl ExprError {
    /// Errors raised while computing a well-formed expression, as opposed to
    /// rejecting its text.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Self::DivisionByZero | Self::ModuloByZero | Self::NotFinite
        )
    }
}

impl Display for ExprError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("expression is empty"),
            Self::TooLong { len } => write!(
                f,
                "expression is {len} bytes long; the limit is {MAX_EXPRESSION_LEN}"
            ),
            Self::TooDeep => write!(
                f,
                "expression nests deeper than {MAX_NESTING_DEPTH} levels"
            ),
            Self::Identifier { name, position } => write!(
                f,
                "names are not allowed in expressions: '{name}' at position {position}"
            ),
            Self::UnexpectedChar { found, position } => {
                write!(f, "unexpected character '{found}' at position {position}")
            }
            Self::MalformedNumber { text, position } => {
                write!(f, "malformed number '{text}' at position {position}")
            }
            Self::UnexpectedToken { found, position } => {
                write!(f, "unexpected '{found}' at position {position}")
            }
            Self::UnexpectedEnd => f.write_str("expression ended unexpectedly"),
            Self::DivisionByZero => f.write_str("division by zero"),
            Self::ModuloByZero => f.write_str("modulo by zero"),
            Self::NotFinite => f.write_str("result is not a finite number"),
        }
    }
}

impl Error for ExprError {}

impl From<ExprError> for ToolError {
    fn from(error: ExprError) -> Self {
        if error.is_arithmetic() {
            ToolError::execution(error.to_string())
        } else {
            ToolError::invalid_arguments(error.to_string())
        }
    }
}

pub fn evaluate(expression: &str) -> Result<f64, ExprError> {
    if expression.len() > MAX_EXPRESSION_LEN {
        return Err(ExprError::TooLong {
            len: expression.len(),
        });
    }

    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(ExprError::Empty);
    }

    let mut parser = Parser {
        tokens: &tokens,
        cursor: 0,
        depth: 0,
    };
    let value = parser.expression()?;

    if let Some(token) = parser.peek() {
        return Err(token.unexpected());
    }

    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TokenKind {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Power,
    LeftParen,
    RightParen,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Token {
    kind: TokenKind,
    position: usize,
}

impl Token {
    fn unexpected(&self) -> ExprError {
        let found = match self.kind {
            TokenKind::Number(value) => value.to_string(),
            TokenKind::Plus => "+".to_string(),
            TokenKind::Minus => "-".to_string(),
            TokenKind::Star => "*".to_string(),
            TokenKind::Slash => "/".to_string(),
            TokenKind::Percent => "%".to_string(),
            TokenKind::Power => "**".to_string(),
            TokenKind::LeftParen => "(".to_string(),
            TokenKind::RightParen => ")".to_string(),
        };

        ExprError::UnexpectedToken {
            found,
            position: self.position,
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut index = 0;

    while index < bytes.len() {
        let byte = bytes[index];
        let start = index;

        let kind = match byte {
            b' ' | b'\t' | b'\r' | b'\n' => {
                index += 1;
                continue;
            }
            b'0'..=b'9' | b'.' => {
                let (value, end) = scan_number(input, start)?;
                index = end;
                TokenKind::Number(value)
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                let end = scan_word(bytes, start);
                return Err(ExprError::Identifier {
                    name: input[start..end].to_string(),
                    position: start,
                });
            }
            b'+' => {
                index += 1;
                TokenKind::Plus
            }
            b'-' => {
                index += 1;
                TokenKind::Minus
            }
            b'*' if bytes.get(index + 1) == Some(&b'*') => {
                index += 2;
                TokenKind::Power
            }
            b'*' => {
                index += 1;
                TokenKind::Star
            }
            b'^' => {
                index += 1;
                TokenKind::Power
            }
            b'/' => {
                index += 1;
                TokenKind::Slash
            }
            b'%' => {
                index += 1;
                TokenKind::Percent
            }
            b'(' => {
                index += 1;
                TokenKind::LeftParen
            }
            b')' => {
                index += 1;
                TokenKind::RightParen
            }
            _ => {
                let found = input[start..].chars().next().unwrap_or('?');
                return Err(ExprError::UnexpectedChar {
                    found,
                    position: start,
                });
            }
        };

        tokens.push(Token {
            kind,
            position: start,
        });
    }

    Ok(tokens)
}

fn scan_word(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
        end += 1;
    }
    end
}

fn scan_number(input: &str, start: usize) -> Result<(f64, usize), ExprError> {
    let bytes = input.as_bytes();
    let mut end = start;
    let mut digits = 0;

    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }

    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            digits += 1;
        }
    }

    if digits == 0 {
        // A lone dot.
        return Err(ExprError::UnexpectedChar {
            found: '.',
            position: start,
        });
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exponent_end = end + 1;
        if exponent_end < bytes.len() && matches!(bytes[exponent_end], b'+' | b'-') {
            exponent_end += 1;
        }
        let exponent_digits_start = exponent_end;
        while exponent_end < bytes.len() && bytes[exponent_end].is_ascii_digit() {
            exponent_end += 1;
        }
        if exponent_end > exponent_digits_start {
            end = exponent_end;
        }
    }

    // `2x`, `1e`, `3.5.1`, `0x10` are all refused here.
    if end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || matches!(bytes[end], b'_' | b'.'))
    {
        let word_end = scan_word(bytes, end).max(end + 1);
        return Err(ExprError::MalformedNumber {
            text: input[start..word_end].to_string(),
            position: start,
        });
    }

    let text = &input[start..end];
    text.parse::<f64>()
        .map(|value| (value, end))
        .map_err(|_| ExprError::MalformedNumber {
            text: text.to_string(),
            position: start,
        })
}

struct Parser<'t> {
    tokens: &'t [Token],
    cursor: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.cursor).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek()?;
        self.cursor += 1;
        Some(token)
    }

    fn enter(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(ExprError::TooDeep);
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<f64, ExprError> {
        let mut value = self.term()?;

        while let Some(token) = self.peek() {
            let op = match token.kind {
                TokenKind::Plus | TokenKind::Minus => token.kind,
                _ => break,
            };
            self.cursor += 1;
            let rhs = self.term()?;
            value = finite(match op {
                TokenKind::Plus => value + rhs,
                _ => value - rhs,
            })?;
        }

        Ok(value)
    }

    // term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> Result<f64, ExprError> {
        let mut value = self.unary()?;

        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Star | TokenKind::Slash | TokenKind::Percent => {}
                _ => break,
            }
            self.cursor += 1;
            let rhs = self.unary()?;
            value = match token.kind {
                TokenKind::Star => finite(value * rhs)?,
                TokenKind::Slash if rhs == 0.0 => return Err(ExprError::DivisionByZero),
                TokenKind::Slash => finite(value / rhs)?,
                _ if rhs == 0.0 => return Err(ExprError::ModuloByZero),
                _ => finite(floored_modulo(value, rhs))?,
            };
        }

        Ok(value)
    }

    // unary := ('+' | '-') unary | power
    fn unary(&mut self) -> Result<f64, ExprError> {
        match self.peek().map(|token| token.kind) {
            Some(TokenKind::Plus) => {
                self.cursor += 1;
                self.enter()?;
                let value = self.unary();
                self.leave();
                value
            }
            Some(TokenKind::Minus) => {
                self.cursor += 1;
                self.enter()?;
                let value = self.unary().map(|value| -value);
                self.leave();
                value
            }
            _ => self.power(),
        }
    }

    // power := primary (('**' | '^') unary)?
    fn power(&mut self) -> Result<f64, ExprError> {
        let base = self.primary()?;

        if self.peek().map(|token| token.kind) != Some(TokenKind::Power) {
            return Ok(base);
        }

        self.cursor += 1;
        self.enter()?;
        let exponent = self.unary();
        self.leave();
        let exponent = exponent?;

        if base == 0.0 && exponent < 0.0 {
            return Err(ExprError::DivisionByZero);
        }

        finite(base.powf(exponent))
    }

    // primary := number | '(' expression ')'
    fn primary(&mut self) -> Result<f64, ExprError> {
        let token = self.advance().ok_or(ExprError::UnexpectedEnd)?;

        match token.kind {
            TokenKind::Number(value) => Ok(value),
            TokenKind::LeftParen => {
                self.enter()?;
                let value = self.expression();
                self.leave();
                let value = value?;

                match self.advance() {
                    Some(Token {
                        kind: TokenKind::RightParen,
                        ..
                    }) => Ok(value),
                    Some(other) => Err(other.unexpected()),
                    None => Err(ExprError::UnexpectedEnd),
                }
            }
            _ => Err(token.unexpected()),
        }
    }
}

fn finite(value: f64) -> Result<f64, ExprError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ExprError::NotFinite)
    }
}

/// Remainder with the sign of the divisor.
fn floored_modulo(lhs: f64, rhs: f64) -> f64 {
    lhs - rhs * (lhs / rhs).floor()
}

//! Points formulas
//!
//! A formula is a small arithmetic expression over two bound results:
//!
//! - `[RESULT]`: the result being scored
//! - `[FIRST_RESULT]`: the class leader after sorting
//!
//! Each binding exposes `.time`, `.points`, `.position` and `.difference`. Numbers,
//! `+ - * /`, unary minus and parentheses are supported; nothing else is. Values are
//! computed as `f64` and rounded to the nearest integer, halves away from zero.
//!
//! ```rust
//! use punchcard::scoring::formula::Expr;
//! use punchcard::types::RaceResult;
//!
//! let expr = Expr::parse("1000 - (([RESULT].time - [FIRST_RESULT].time) / [FIRST_RESULT].time) * 1000").unwrap();
//! let leader = RaceResult { time: 1000, ..RaceResult::new("a") };
//! let second = RaceResult { time: 1100, ..RaceResult::new("b") };
//! assert_eq!(expr.evaluate(&second, &leader).unwrap().round(), 900.0);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;
use tracing::{trace, warn};

use super::ranking::result_sort;
use crate::types::{RaceResult, ResultStatus};
use crate::{Result, ScoringError};

/// Formulas for results with and without `Ok` status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct PointsFormula {
    pub ok: String,
    /// Formula for every other status; those results get no points when unset
    #[serde(default)]
    pub not_ok: Option<String>,
}

impl PointsFormula {
    pub fn new(ok: impl Into<String>) -> Self {
        Self { ok: ok.into(), not_ok: None }
    }

    pub fn with_not_ok(mut self, not_ok: impl Into<String>) -> Self {
        self.not_ok = Some(not_ok.into());
        self
    }

    /// Parse both expressions without evaluating them.
    pub fn check(&self) -> Result<()> {
        Expr::parse(&self.ok)?;
        if let Some(not_ok) = &self.not_ok {
            Expr::parse(not_ok)?;
        }
        Ok(())
    }
}

/// A result a formula can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Result,
    FirstResult,
}

/// A numeric field of a bound result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Time,
    Points,
    Position,
    Difference,
}

impl Field {
    fn value(self, result: &RaceResult) -> f64 {
        match self {
            Field::Time => result.time as f64,
            Field::Points => result.points_value() as f64,
            Field::Position => f64::from(result.position.unwrap_or_default()),
            Field::Difference => result.difference.unwrap_or_default() as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Parsed formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Field(Binding, Field),
    Neg(Box<Expr>),
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Field(Binding, Field),
    Op(BinaryOp),
    Open,
    Close,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(value) => write!(f, "{value}"),
            Token::Field(binding, field) => write!(f, "{binding:?}.{field:?}"),
            Token::Op(op) => write!(f, "{op:?}"),
            Token::Open => f.write_str("("),
            Token::Close => f.write_str(")"),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => tokens.push(Token::Number(number(&mut chars, source)?)),
            '[' => tokens.push(field_reference(&mut chars, source)?),
            '+' | '-' | '*' | '/' => {
                chars.next();
                tokens.push(Token::Op(match c {
                    '+' => BinaryOp::Add,
                    '-' => BinaryOp::Sub,
                    '*' => BinaryOp::Mul,
                    _ => BinaryOp::Div,
                }));
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            other => {
                return Err(ScoringError::formula(source, format!("unexpected character '{other}'")));
            }
        }
    }
    Ok(tokens)
}

fn number(chars: &mut Peekable<Chars<'_>>, source: &str) -> Result<f64> {
    let mut literal = String::new();
    while let Some(&c) = chars.peek() {
        if !(c.is_ascii_digit() || c == '.') {
            break;
        }
        literal.push(c);
        chars.next();
    }
    literal.parse().map_err(|_| ScoringError::formula(source, format!("invalid number '{literal}'")))
}

fn field_reference(chars: &mut Peekable<Chars<'_>>, source: &str) -> Result<Token> {
    chars.next();
    let binding_name: String = chars.by_ref().take_while(|&c| c != ']').collect();
    let binding = match binding_name.as_str() {
        "RESULT" => Binding::Result,
        "FIRST_RESULT" => Binding::FirstResult,
        other => return Err(ScoringError::formula(source, format!("unknown binding '[{other}]'"))),
    };

    if chars.next() != Some('.') {
        return Err(ScoringError::formula(source, format!("expected '.field' after [{binding_name}]")));
    }
    let mut field_name = String::new();
    while let Some(&c) = chars.peek() {
        if !(c.is_ascii_alphanumeric() || c == '_') {
            break;
        }
        field_name.push(c);
        chars.next();
    }
    let field = match field_name.as_str() {
        "time" => Field::Time,
        "points" => Field::Points,
        "position" => Field::Position,
        "difference" => Field::Difference,
        other => return Err(ScoringError::formula(source, format!("unknown field '{other}'"))),
    };
    Ok(Token::Field(binding, field))
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    cursor: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).cloned();
        self.cursor += 1;
        token
    }

    fn error(&self, details: impl Into<String>) -> ScoringError {
        ScoringError::formula(self.source, details)
    }

    fn expression(&mut self) -> Result<Expr> {
        let mut left = self.term()?;
        while let Some(Token::Op(op @ (BinaryOp::Add | BinaryOp::Sub))) = self.peek().cloned() {
            self.advance();
            let right = self.term()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut left = self.unary()?;
        while let Some(Token::Op(op @ (BinaryOp::Mul | BinaryOp::Div))) = self.peek().cloned() {
            self.advance();
            let right = self.unary()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.peek() == Some(&Token::Op(BinaryOp::Sub)) {
            self.advance();
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::Field(binding, field)) => Ok(Expr::Field(binding, field)),
            Some(Token::Open) => {
                let inner = self.expression()?;
                match self.advance() {
                    Some(Token::Close) => Ok(inner),
                    Some(token) => Err(self.error(format!("expected ')' but found {token}"))),
                    None => Err(self.error("missing ')'")),
                }
            }
            Some(token) => Err(self.error(format!("unexpected {token}"))),
            None => Err(self.error("unexpected end of formula")),
        }
    }
}

impl Expr {
    /// Parse a formula.
    pub fn parse(source: &str) -> Result<Expr> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { source, tokens, cursor: 0 };
        let expr = parser.expression()?;
        if let Some(token) = parser.peek() {
            return Err(parser.error(format!("unexpected {token} after expression")));
        }
        Ok(expr)
    }

    /// Evaluate against a result and the class leader.
    pub fn evaluate(&self, result: &RaceResult, first: &RaceResult) -> std::result::Result<f64, String> {
        let value = match self {
            Expr::Number(value) => *value,
            Expr::Field(Binding::Result, field) => field.value(result),
            Expr::Field(Binding::FirstResult, field) => field.value(first),
            Expr::Neg(inner) => -inner.evaluate(result, first)?,
            Expr::Binary(left, op, right) => {
                let left = left.evaluate(result, first)?;
                let right = right.evaluate(result, first)?;
                match op {
                    BinaryOp::Add => left + right,
                    BinaryOp::Sub => left - right,
                    BinaryOp::Mul => left * right,
                    BinaryOp::Div if right == 0.0 => return Err("division by zero".to_string()),
                    BinaryOp::Div => left / right,
                }
            }
        };
        if value.is_finite() { Ok(value) } else { Err("result is not a finite number".to_string()) }
    }
}

/// Parse and evaluate `source`, rounding to whole points.
pub fn evaluate(source: &str, result: &RaceResult, first: &RaceResult) -> Result<i64> {
    let value = Expr::parse(source)?.evaluate(result, first).map_err(|details| ScoringError::formula(source, details))?;
    Ok(value.round() as i64)
}

/// Assign formula points to every result, returned in ranking order.
///
/// `Ok` results use the `ok` formula; others use `not_ok` or get no points. A formula that
/// fails for one result leaves that result without points and does not stop the batch.
pub fn calculate_points(results: &[RaceResult], formula: &PointsFormula) -> Vec<RaceResult> {
    let mut sorted = results.to_vec();
    sorted.sort_by(result_sort);
    let Some(first) = sorted.first().cloned() else {
        return sorted;
    };

    for result in &mut sorted {
        let source = if result.status == ResultStatus::Ok { Some(formula.ok.as_str()) } else { formula.not_ok.as_deref() };
        result.points = match source {
            Some(source) => match evaluate(source, result, &first) {
                Ok(points) => Some(points),
                Err(err) => {
                    warn!(result = %result.id, error = %err, "Points formula failed");
                    None
                }
            },
            None => None,
        };
        trace!(result = %result.id, points = ?result.points, "Formula points");
    }
    sorted
}

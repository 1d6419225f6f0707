//! Arithmetic formulas for quality curves.
//!
//! A [`Formula`] is parsed once, usually while the registry is being built,
//! into a small expression tree and evaluated many times against named
//! [`Bindings`]. Evaluation is plain `f64` arithmetic with no hidden state, so
//! the same formula and bindings always produce the same bits.
//!
//! Supported syntax:
//!
//! - decimal literals (`3`, `0.25`, `1e-3`)
//! - variables (`age`, `quality`) and the constants `pi` and `e`
//! - binary `+ - * / % ^` and unary `+ -`
//! - one-argument functions `abs acos asin atan cbrt ceil cos cosh exp floor
//!   log log10 log2 sin sinh sqrt tan tanh signum`, two-argument `min max pow`
//!
//! `^` binds tighter than a unary sign and is right associative, so
//! `-2^2 == -4` and `2^3^2 == 512`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Variable bound to the item age, in seconds.
pub const AGE: &str = "age";

/// Variable bound to the incoming quality when one formula feeds another.
pub const QUALITY: &str = "quality";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while parsing or evaluating a formula.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormulaError {
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("unexpected token '{found}' at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },
    #[error("unexpected end of formula")]
    UnexpectedEnd,
    #[error("unbound variable: {0}")]
    UnboundVariable(String),
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    #[error("function {name} takes {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NonFinite,
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// Named variable values for one evaluation. Later bindings of the same name
/// replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings<'a> {
    values: Vec<(&'a str, f64)>,
}

impl<'a> Bindings<'a> {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Bind `name` to `value`, returning the updated set.
    pub fn with(mut self, name: &'a str, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &'a str, value: f64) {
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(v) => write!(f, "{v}"),
            Token::Ident(name) => f.write_str(name),
            Token::Op(op) => write!(f, "{op}"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Comma => f.write_str(","),
        }
    }
}

/// Return the end offset of the numeric literal starting at `start`.
fn scan_number(bytes: &[u8], start: usize) -> usize {
    let digits = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut i = digits(start);
    if i < bytes.len() && bytes[i] == b'.' {
        i = digits(i + 1);
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        // A bare `e` after a number is left for the parser to reject.
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            i = digits(j);
        }
    }
    i
}

fn tokenize(src: &str) -> Result<Vec<(Token, usize)>, FormulaError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while let Some(ch) = src[i..].chars().next() {
        if ch.is_whitespace() {
            i += ch.len_utf8();
            continue;
        }

        if ch.is_ascii_digit() || ch == '.' {
            let end = scan_number(bytes, i);
            let text = &src[i..end];
            let value = text
                .parse::<f64>()
                .map_err(|_| FormulaError::UnexpectedToken {
                    found: text.to_string(),
                    offset: i,
                })?;
            tokens.push((Token::Number(value), i));
            i = end;
            continue;
        }

        if ch.is_alphabetic() || ch == '_' {
            let start = i;
            while let Some(c) = src[i..].chars().next() {
                if c.is_alphanumeric() || c == '_' {
                    i += c.len_utf8();
                } else {
                    break;
                }
            }
            tokens.push((Token::Ident(src[start..i].to_string()), start));
            continue;
        }

        let token = match ch {
            '+' | '-' | '*' | '/' | '%' | '^' => Token::Op(ch),
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            _ => return Err(FormulaError::UnexpectedChar { ch, offset: i }),
        };
        tokens.push((token, i));
        i += ch.len_utf8();
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Expression tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Abs,
    Acos,
    Asin,
    Atan,
    Cbrt,
    Ceil,
    Cos,
    Cosh,
    Exp,
    Floor,
    Log,
    Log10,
    Log2,
    Sin,
    Sinh,
    Sqrt,
    Tan,
    Tanh,
    Signum,
    Min,
    Max,
    Pow,
}

impl Func {
    fn lookup(name: &str) -> Option<Self> {
        let func = match name {
            "abs" => Func::Abs,
            "acos" => Func::Acos,
            "asin" => Func::Asin,
            "atan" => Func::Atan,
            "cbrt" => Func::Cbrt,
            "ceil" => Func::Ceil,
            "cos" => Func::Cos,
            "cosh" => Func::Cosh,
            "exp" => Func::Exp,
            "floor" => Func::Floor,
            "log" => Func::Log,
            "log10" => Func::Log10,
            "log2" => Func::Log2,
            "sin" => Func::Sin,
            "sinh" => Func::Sinh,
            "sqrt" => Func::Sqrt,
            "tan" => Func::Tan,
            "tanh" => Func::Tanh,
            "signum" => Func::Signum,
            "min" => Func::Min,
            "max" => Func::Max,
            "pow" => Func::Pow,
            _ => return None,
        };
        Some(func)
    }

    fn arity(self) -> usize {
        match self {
            Func::Min | Func::Max | Func::Pow => 2,
            _ => 1,
        }
    }

    fn apply(self, args: &[f64]) -> f64 {
        let x = args[0];
        match self {
            Func::Abs => x.abs(),
            Func::Acos => x.acos(),
            Func::Asin => x.asin(),
            Func::Atan => x.atan(),
            Func::Cbrt => x.cbrt(),
            Func::Ceil => x.ceil(),
            Func::Cos => x.cos(),
            Func::Cosh => x.cosh(),
            Func::Exp => x.exp(),
            Func::Floor => x.floor(),
            Func::Log => x.ln(),
            Func::Log10 => x.log10(),
            Func::Log2 => x.log2(),
            Func::Sin => x.sin(),
            Func::Sinh => x.sinh(),
            Func::Sqrt => x.sqrt(),
            Func::Tan => x.tan(),
            Func::Tanh => x.tanh(),
            // f64::signum maps +0.0 to 1.0; zero must stay zero here.
            Func::Signum => {
                if x == 0.0 {
                    x
                } else {
                    x.signum()
                }
            }
            Func::Min => x.min(args[1]),
            Func::Max => x.max(args[1]),
            Func::Pow => x.powf(args[1]),
        }
    }
}

#[derive(Debug, Clone)]
enum Expr {
    Number(f64),
    Var(String),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

fn apply_op(left: f64, op: BinaryOp, right: f64) -> Result<f64, FormulaError> {
    let value = match op {
        BinaryOp::Add => left + right,
        BinaryOp::Subtract => left - right,
        BinaryOp::Multiply => left * right,
        BinaryOp::Divide => {
            if right == 0.0 {
                return Err(FormulaError::DivisionByZero);
            }
            left / right
        }
        BinaryOp::Modulo => {
            if right == 0.0 {
                return Err(FormulaError::DivisionByZero);
            }
            left % right
        }
        BinaryOp::Power => left.powf(right),
    };
    Ok(value)
}

impl Expr {
    fn eval(&self, bindings: &Bindings<'_>) -> Result<f64, FormulaError> {
        match self {
            Expr::Number(v) => Ok(*v),
            Expr::Var(name) => bindings
                .get(name)
                .or_else(|| constant(name))
                .ok_or_else(|| FormulaError::UnboundVariable(name.clone())),
            Expr::Neg(inner) => Ok(-inner.eval(bindings)?),
            Expr::Binary(op, left, right) => {
                let l = left.eval(bindings)?;
                let r = right.eval(bindings)?;
                apply_op(l, *op, r)
            }
            Expr::Call(func, args) => {
                let values = args
                    .iter()
                    .map(|arg| arg.eval(bindings))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(func.apply(&values))
            }
        }
    }
}

fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" | "π" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn next(&mut self) -> Option<(Token, usize)> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(token: Token, offset: usize) -> FormulaError {
        FormulaError::UnexpectedToken {
            found: token.to_string(),
            offset,
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), FormulaError> {
        match self.next() {
            Some((token, _)) if token == expected => Ok(()),
            Some((token, offset)) => Err(Self::unexpected(token, offset)),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op('+')) => BinaryOp::Add,
                Some(Token::Op('-')) => BinaryOp::Subtract,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_term(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op('*')) => BinaryOp::Multiply,
                Some(Token::Op('/')) => BinaryOp::Divide,
                Some(Token::Op('%')) => BinaryOp::Modulo,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.parse_atom()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.pos += 1;
            // Right associative; the exponent may carry its own sign.
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary(
                BinaryOp::Power,
                Box::new(base),
                Box::new(exponent),
            ));
        }
        Ok(base)
    }

    fn parse_atom(&mut self) -> Result<Expr, FormulaError> {
        let (token, offset) = self.next().ok_or(FormulaError::UnexpectedEnd)?;
        match token {
            Token::Number(v) => Ok(Expr::Number(v)),
            Token::LParen => {
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) => {
                if self.peek() != Some(&Token::LParen) {
                    return Ok(Expr::Var(name));
                }
                self.pos += 1;
                let func =
                    Func::lookup(&name).ok_or_else(|| FormulaError::UnknownFunction(name.clone()))?;
                let args = self.parse_args()?;
                if args.len() != func.arity() {
                    return Err(FormulaError::Arity {
                        name,
                        expected: func.arity(),
                        found: args.len(),
                    });
                }
                Ok(Expr::Call(func, args))
            }
            other => Err(Self::unexpected(other, offset)),
        }
    }

    /// Parse a comma-separated argument list; the opening paren is consumed.
    fn parse_args(&mut self) -> Result<Vec<Expr>, FormulaError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            match self.next() {
                Some((Token::Comma, _)) => continue,
                Some((Token::RParen, _)) => return Ok(args),
                Some((token, offset)) => return Err(Self::unexpected(token, offset)),
                None => return Err(FormulaError::UnexpectedEnd),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Formula
// ---------------------------------------------------------------------------

/// A parsed arithmetic formula. Compares, prints and serializes as its
/// source text.
#[derive(Clone)]
pub struct Formula {
    source: String,
    root: Expr,
}

impl Formula {
    /// Parse `source` into an evaluable formula.
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        let root = parser.parse_expr()?;
        if let Some((token, offset)) = parser.next() {
            return Err(Parser::unexpected(token, offset));
        }
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    /// A formula that always evaluates to `value`.
    pub fn constant(value: f64) -> Self {
        Self {
            source: value.to_string(),
            root: Expr::Number(value),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against `bindings`. NaN and infinite results are errors.
    pub fn evaluate(&self, bindings: &Bindings<'_>) -> Result<f64, FormulaError> {
        let value = self.root.eval(bindings)?;
        if !value.is_finite() {
            return Err(FormulaError::NonFinite);
        }
        Ok(value)
    }

    /// Shorthand for evaluating with only `age` bound.
    pub fn evaluate_age(&self, age: f64) -> Result<f64, FormulaError> {
        self.evaluate(&Bindings::new().with(AGE, age))
    }
}

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Formula").field(&self.source).finish()
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Formula {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Formula {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Self::parse(&source).map_err(serde::de::Error::custom)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

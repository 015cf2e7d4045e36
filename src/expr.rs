//! Arithmetic expressions over peer integer variables.
//!
//! Constraints frequently need to reference a value that hasn't been
//! generated yet (`Between(1, "2*N")`). [`Expr`] parses such a string once,
//! up front, into a tree; [`Expr::dependencies`] then tells the resolver
//! which peer variables must be generated before this expression can be
//! evaluated, and [`Expr::eval`] evaluates it against a lookup closure once
//! those values are known.
//!
//! The parser is a hand-written scanner feeding a Pratt (binding-power)
//! parser: standard precedence, `^` right-associative, then unary `-`, then
//! `* / %`, then `+ -`, plus `min`/`max`/`abs` function calls.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::EvalError;

/// A parsed arithmetic expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A 64-bit integer literal.
    Literal(i64),
    /// A reference to a named peer variable.
    Identifier(String),
    /// `-operand`
    Neg(Box<Expr>),
    /// `lhs op rhs`
    Binary {
        /// Left operand.
        lhs: Box<Expr>,
        /// The operator.
        op: BinOp,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// A call to one of the built-in functions (`min`, `max`, `abs`).
    Call {
        /// Function name.
        name: String,
        /// Argument expressions.
        args: Vec<Expr>,
    },
}

/// A binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `^` (power)
    Pow,
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(n) => write!(f, "{n}"),
            Expr::Identifier(name) => write!(f, "{name}"),
            Expr::Neg(e) => write!(f, "-{e}"),
            Expr::Binary { lhs, op, rhs } => {
                let op = match op {
                    BinOp::Add => "+",
                    BinOp::Sub => "-",
                    BinOp::Mul => "*",
                    BinOp::Div => "/",
                    BinOp::Mod => "%",
                    BinOp::Pow => "^",
                };
                write!(f, "({lhs} {op} {rhs})")
            }
            Expr::Call { name, args } => {
                write!(f, "{name}(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Expr {
    /// Parses `text` into an expression tree.
    ///
    /// An integer literal written bare (e.g. `"5"`) is accepted as a
    /// degenerate expression, which is what lets constraints take either a
    /// plain integer or an expression string interchangeably.
    pub fn parse(text: &str) -> Result<Self, EvalError> {
        let tokens = lex(text).map_err(|message| EvalError::InvalidExpression {
            text: text.to_string(),
            message,
        })?;
        if tokens.is_empty() {
            return Err(EvalError::InvalidExpression {
                text: text.to_string(),
                message: "expression is empty".to_string(),
            });
        }
        let mut parser = ExprParser { tokens: &tokens, pos: 0 };
        let expr = parser
            .parse_expr(0)
            .map_err(|message| EvalError::InvalidExpression {
                text: text.to_string(),
                message,
            })?;
        if parser.pos != parser.tokens.len() {
            return Err(EvalError::InvalidExpression {
                text: text.to_string(),
                message: format!("unexpected trailing input at token {}", parser.pos),
            });
        }
        Ok(expr)
    }

    /// The set of distinct peer-variable names this expression references.
    pub fn dependencies(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_dependencies(&mut out);
        out
    }

    fn collect_dependencies(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Identifier(name) => {
                out.insert(name.clone());
            }
            Expr::Neg(e) => e.collect_dependencies(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_dependencies(out);
                rhs.collect_dependencies(out);
            }
            Expr::Call { args, .. } => {
                for a in args {
                    a.collect_dependencies(out);
                }
            }
        }
    }

    /// Evaluates this expression, resolving identifiers with `lookup`.
    pub fn eval(&self, lookup: &mut dyn FnMut(&str) -> Result<i64, EvalError>) -> Result<i64, EvalError> {
        match self {
            Expr::Literal(n) => Ok(*n),
            Expr::Identifier(name) => lookup(name),
            Expr::Neg(e) => {
                let v = e.eval(lookup)?;
                v.checked_neg().ok_or_else(|| EvalError::EvaluationError {
                    message: format!("overflow negating {v}"),
                })
            }
            Expr::Binary { lhs, op, rhs } => {
                let l = lhs.eval(lookup)?;
                let r = rhs.eval(lookup)?;
                eval_binop(*op, l, r)
            }
            Expr::Call { name, args } => {
                let values: Result<Vec<i64>, EvalError> =
                    args.iter().map(|a| a.eval(lookup)).collect();
                let values = values?;
                eval_call(name, &values)
            }
        }
    }

    /// Convenience: evaluates against a map-like lookup instead of a closure.
    pub fn eval_with(&self, env: &std::collections::HashMap<String, i64>) -> Result<i64, EvalError> {
        self.eval(&mut |name| {
            env.get(name)
                .copied()
                .ok_or_else(|| EvalError::VariableNotFound {
                    name: name.to_string(),
                })
        })
    }
}

fn eval_binop(op: BinOp, l: i64, r: i64) -> Result<i64, EvalError> {
    let overflow = |message: String| EvalError::EvaluationError { message };
    match op {
        BinOp::Add => l
            .checked_add(r)
            .ok_or_else(|| overflow(format!("overflow computing {l} + {r}"))),
        BinOp::Sub => l
            .checked_sub(r)
            .ok_or_else(|| overflow(format!("overflow computing {l} - {r}"))),
        BinOp::Mul => l
            .checked_mul(r)
            .ok_or_else(|| overflow(format!("overflow computing {l} * {r}"))),
        BinOp::Div => {
            if r == 0 {
                return Err(EvalError::EvaluationError {
                    message: format!("division by zero: {l} / {r}"),
                });
            }
            l.checked_div(r)
                .ok_or_else(|| overflow(format!("overflow computing {l} / {r}")))
        }
        BinOp::Mod => {
            if r == 0 {
                return Err(EvalError::EvaluationError {
                    message: format!("modulo by zero: {l} % {r}"),
                });
            }
            l.checked_rem(r)
                .ok_or_else(|| overflow(format!("overflow computing {l} % {r}")))
        }
        BinOp::Pow => {
            if r < 0 {
                return Err(EvalError::EvaluationError {
                    message: format!("negative exponent: {l} ^ {r}"),
                });
            }
            let exp = u32::try_from(r).map_err(|_| {
                overflow(format!("exponent {r} out of range"))
            })?;
            l.checked_pow(exp)
                .ok_or_else(|| overflow(format!("overflow computing {l} ^ {r}")))
        }
    }
}

fn eval_call(name: &str, args: &[i64]) -> Result<i64, EvalError> {
    match name {
        "min" => args.iter().copied().min().ok_or_else(|| EvalError::EvaluationError {
            message: "min() requires at least one argument".to_string(),
        }),
        "max" => args.iter().copied().max().ok_or_else(|| EvalError::EvaluationError {
            message: "max() requires at least one argument".to_string(),
        }),
        "abs" => {
            if args.len() != 1 {
                return Err(EvalError::EvaluationError {
                    message: format!("abs() takes exactly one argument, got {}", args.len()),
                });
            }
            args[0].checked_abs().ok_or_else(|| EvalError::EvaluationError {
                message: format!("overflow computing abs({})", args[0]),
            })
        }
        other => Err(EvalError::EvaluationError {
            message: format!("unknown function '{other}'"),
        }),
    }
}

// --- Lexer -----------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Int(i64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    Comma,
}

fn lex(text: &str) -> Result<Vec<Tok>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if ch.is_whitespace() {
            i += 1;
            continue;
        }
        match ch {
            '+' => {
                tokens.push(Tok::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Tok::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Tok::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Tok::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Tok::Percent);
                i += 1;
            }
            '^' => {
                tokens.push(Tok::Caret);
                i += 1;
            }
            '(' => {
                tokens.push(Tok::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Tok::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Tok::Comma);
                i += 1;
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n: i64 = text
                    .parse()
                    .map_err(|_| format!("integer literal '{text}' out of range"))?;
                tokens.push(Tok::Int(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(Tok::Ident(text));
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }
    Ok(tokens)
}

// --- Pratt parser ------------------------------------------------------------

struct ExprParser<'a> {
    tokens: &'a [Tok],
    pos: usize,
}

/// Binding powers for infix operators: `(left, right)`.
///
/// Higher binds tighter. `left < right` means right-associative.
fn infix_binding_power(tok: &Tok) -> Option<(u8, u8)> {
    Some(match tok {
        Tok::Plus | Tok::Minus => (10, 11),
        Tok::Star | Tok::Slash | Tok::Percent => (20, 21),
        Tok::Caret => (31, 30),
        _ => return None,
    })
}

const PREFIX_MINUS_BP: u8 = 25;

impl<'a> ExprParser<'a> {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Tok> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, want: &Tok) -> Result<(), String> {
        match self.advance() {
            Some(t) if t == want => Ok(()),
            Some(t) => Err(format!("expected {want:?}, found {t:?}")),
            None => Err(format!("expected {want:?}, found end of input")),
        }
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expr, String> {
        let mut lhs = self.parse_prefix()?;
        loop {
            let Some(tok) = self.peek() else { break };
            let Some((l_bp, r_bp)) = infix_binding_power(tok) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }
            let op = match self.advance().unwrap() {
                Tok::Plus => BinOp::Add,
                Tok::Minus => BinOp::Sub,
                Tok::Star => BinOp::Mul,
                Tok::Slash => BinOp::Div,
                Tok::Percent => BinOp::Mod,
                Tok::Caret => BinOp::Pow,
                _ => unreachable!(),
            };
            let rhs = self.parse_expr(r_bp)?;
            lhs = Expr::Binary {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, String> {
        match self.advance().cloned() {
            Some(Tok::Int(n)) => Ok(Expr::Literal(n)),
            Some(Tok::Minus) => {
                let operand = self.parse_expr(PREFIX_MINUS_BP)?;
                Ok(Expr::Neg(Box::new(operand)))
            }
            Some(Tok::LParen) => {
                let inner = self.parse_expr(0)?;
                self.expect(&Tok::RParen)?;
                Ok(inner)
            }
            Some(Tok::Ident(name)) => {
                if self.peek() == Some(&Tok::LParen) {
                    self.advance();
                    let mut args = Vec::new();
                    if self.peek() != Some(&Tok::RParen) {
                        loop {
                            args.push(self.parse_expr(0)?);
                            if self.peek() == Some(&Tok::Comma) {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(&Tok::RParen)?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Identifier(name))
                }
            }
            Some(other) => Err(format!("unexpected token {other:?}")),
            None => Err("unexpected end of input".to_string()),
        }
    }
}

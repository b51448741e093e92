//! The embedded expression language.
//!
//! A small K-flavored interpreter: atoms and numeric vector literals,
//! names, `name: expr` assignment, the arithmetic verbs `+ - * /` with
//! scalar↔vector broadcast, parentheses, and bracketed calls `f[a; b]`.
//! As in K, expressions evaluate right to left with no operator precedence
//! (`2*3+1` is `2*(3+1)`).
//!
//! Dashboard capabilities are not part of the interpreter; they reach it
//! through the [`HostCaps`] seam passed into every evaluation, so there is
//! no hidden global or thread-local engine state. The built-in verbs that
//! need no host are handled inline (`til`).

use crate::value::Value;
use abacus_bridge::{WidgetId, WidgetKind};
use std::collections::HashMap;
use std::fmt;

/// Evaluation and parse errors.
///
/// All recoverable: an error surfaces as an error-tagged console line and
/// never tears the session down.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Source text did not parse.
    Parse(String),
    /// Reference to an unassigned name.
    UnknownName(String),
    /// Call of an unknown function.
    UnknownFunction(String),
    /// Wrong number of call arguments.
    Arity {
        /// Function name.
        name: String,
        /// Expected argument count.
        expected: usize,
        /// Supplied argument count.
        got: usize,
    },
    /// Operand type not supported by the verb.
    Type {
        /// What the verb needed.
        wanted: &'static str,
        /// What it got.
        got: &'static str,
    },
    /// Element-wise verb over vectors of unequal length.
    LengthMismatch {
        /// Left length.
        lhs: usize,
        /// Right length.
        rhs: usize,
    },
    /// `widget` called with an unrecognized kind name.
    UnknownKind(String),
    /// A widget handle that no longer names a live widget.
    StaleWidget(WidgetId),
    /// A capability that is not available in this evaluation context
    /// (post-filters may not create widgets or draw).
    CapabilityDenied(&'static str),
    /// The engine→UI queue rejected the reply.
    Bridge(&'static str),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Parse(msg) => write!(f, "parse error: {msg}"),
            EvalError::UnknownName(name) => write!(f, "unknown name: {name}"),
            EvalError::UnknownFunction(name) => write!(f, "unknown function: {name}"),
            EvalError::Arity {
                name,
                expected,
                got,
            } => write!(f, "{name} takes {expected} arguments, got {got}"),
            EvalError::Type { wanted, got } => write!(f, "type error: wanted {wanted}, got {got}"),
            EvalError::LengthMismatch { lhs, rhs } => {
                write!(f, "length mismatch: {lhs} vs {rhs}")
            }
            EvalError::UnknownKind(kind) => write!(f, "unknown widget kind: {kind}"),
            EvalError::StaleWidget(id) => write!(f, "stale widget handle: {id}"),
            EvalError::CapabilityDenied(name) => write!(f, "{name} is not allowed here"),
            EvalError::Bridge(what) => write!(f, "bridge error: {what}"),
        }
    }
}

impl std::error::Error for EvalError {}

/// Capabilities the host exposes to scripts.
///
/// Implemented by the engine service; the interpreter calls through this
/// seam when a script invokes `widget[...]` or `draw[...]`.
pub trait HostCaps {
    /// Create a widget; the host emits `WidgetCreated` and returns the
    /// widget value the script sees.
    fn create_widget(&mut self, kind: WidgetKind, name: &str) -> Result<Value, EvalError>;

    /// Draw a value onto a widget; the host applies the widget's
    /// post-filter and emits `DataUpdate`.
    fn draw(&mut self, widget: WidgetId, value: Value) -> Result<(), EvalError>;
}

/// A [`HostCaps`] that refuses everything. Used for post-filter
/// evaluation, which must stay a pure data transform.
pub struct DeniedCaps;

impl HostCaps for DeniedCaps {
    fn create_widget(&mut self, _kind: WidgetKind, _name: &str) -> Result<Value, EvalError> {
        Err(EvalError::CapabilityDenied("widget"))
    }

    fn draw(&mut self, _widget: WidgetId, _value: Value) -> Result<(), EvalError> {
        Err(EvalError::CapabilityDenied("draw"))
    }
}

// ── Syntax ───────────────────────────────────────────────────────────────

/// A dyadic arithmetic verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

/// Parsed expression. Post-filters are stored in this form on the engine
/// widget so they parse once and run on every draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal atom or vector.
    Lit(Value),
    /// Name reference.
    Name(String),
    /// `name: expr` assignment.
    Assign(String, Box<Expr>),
    /// Dyadic verb application.
    BinOp(Verb, Box<Expr>, Box<Expr>),
    /// `f[a; b]` call.
    Call(String, Vec<Expr>),
    /// Monadic negation.
    Neg(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Int(i64),
    Float(f64),
    Str(String),
    Name(String),
    Verb(Verb),
    Colon,
    Semi,
    LBracket,
    RBracket,
    LParen,
    RParen,
}

fn lex(src: &str) -> Result<Vec<Tok>, EvalError> {
    let mut toks = Vec::new();
    let mut chars = src.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '0'..='9' => {
                let mut text = String::new();
                let mut is_float = false;
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        text.push(d);
                        chars.next();
                    } else if d == '.' && !is_float {
                        is_float = true;
                        text.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if is_float {
                    let f = text
                        .parse::<f64>()
                        .map_err(|_| EvalError::Parse(format!("bad number: {text}")))?;
                    toks.push(Tok::Float(f));
                } else {
                    let i = text
                        .parse::<i64>()
                        .map_err(|_| EvalError::Parse(format!("bad number: {text}")))?;
                    toks.push(Tok::Int(i));
                }
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let mut name = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        name.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                toks.push(Tok::Name(name));
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('n') => text.push('\n'),
                            Some('t') => text.push('\t'),
                            Some(other) => text.push(other),
                            None => return Err(EvalError::Parse("unterminated string".into())),
                        },
                        Some(other) => text.push(other),
                        None => return Err(EvalError::Parse("unterminated string".into())),
                    }
                }
                toks.push(Tok::Str(text));
            }
            '+' => {
                chars.next();
                toks.push(Tok::Verb(Verb::Add));
            }
            '-' => {
                chars.next();
                toks.push(Tok::Verb(Verb::Sub));
            }
            '*' => {
                chars.next();
                toks.push(Tok::Verb(Verb::Mul));
            }
            '/' => {
                chars.next();
                toks.push(Tok::Verb(Verb::Div));
            }
            ':' => {
                chars.next();
                toks.push(Tok::Colon);
            }
            ';' => {
                chars.next();
                toks.push(Tok::Semi);
            }
            '[' => {
                chars.next();
                toks.push(Tok::LBracket);
            }
            ']' => {
                chars.next();
                toks.push(Tok::RBracket);
            }
            '(' => {
                chars.next();
                toks.push(Tok::LParen);
            }
            ')' => {
                chars.next();
                toks.push(Tok::RParen);
            }
            other => return Err(EvalError::Parse(format!("unexpected character: {other}"))),
        }
    }
    Ok(toks)
}

/// Nesting bound for the parser. Evaluation recurses over the parsed
/// tree, so capping parse depth also bounds evaluation depth: a
/// pathological input becomes a recoverable parse error instead of a
/// stack overflow.
const MAX_PARSE_DEPTH: usize = 128;

struct Parser {
    toks: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.toks.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, tok: &Tok, what: &str) -> Result<(), EvalError> {
        match self.next() {
            Some(found) if &found == tok => Ok(()),
            _ => Err(EvalError::Parse(format!("expected {what}"))),
        }
    }

    // expr := name ':' expr | term (verb expr)?   (right-associative)
    fn expr(&mut self, depth: usize) -> Result<Expr, EvalError> {
        if depth > MAX_PARSE_DEPTH {
            return Err(EvalError::Parse("expression too deep".into()));
        }
        if let (Some(Tok::Name(name)), Some(Tok::Colon)) =
            (self.toks.get(self.pos), self.toks.get(self.pos + 1))
        {
            let name = name.clone();
            self.pos += 2;
            let rhs = self.expr(depth + 1)?;
            return Ok(Expr::Assign(name, Box::new(rhs)));
        }
        let lhs = self.term(depth)?;
        if let Some(Tok::Verb(verb)) = self.peek() {
            let verb = *verb;
            self.pos += 1;
            let rhs = self.expr(depth + 1)?;
            return Ok(Expr::BinOp(verb, Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    // term := numbers | string | name '[' args ']' | name | '-' term
    //       | '(' expr ')'
    fn term(&mut self, depth: usize) -> Result<Expr, EvalError> {
        if depth > MAX_PARSE_DEPTH {
            return Err(EvalError::Parse("expression too deep".into()));
        }
        match self.next() {
            Some(Tok::Int(first)) => self.number_tail(NumberSeq::from_int(first)),
            Some(Tok::Float(first)) => self.number_tail(NumberSeq::from_float(first)),
            Some(Tok::Str(text)) => Ok(Expr::Lit(Value::Str(text))),
            Some(Tok::Name(name)) => {
                if self.peek() == Some(&Tok::LBracket) {
                    self.pos += 1;
                    let mut args = Vec::new();
                    if self.peek() != Some(&Tok::RBracket) {
                        loop {
                            args.push(self.expr(depth + 1)?);
                            match self.peek() {
                                Some(Tok::Semi) => {
                                    self.pos += 1;
                                }
                                _ => break,
                            }
                        }
                    }
                    self.expect(&Tok::RBracket, "]")?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Some(Tok::Verb(Verb::Sub)) => {
                let inner = self.term(depth + 1)?;
                Ok(Expr::Neg(Box::new(inner)))
            }
            Some(Tok::LParen) => {
                let inner = self.expr(depth + 1)?;
                self.expect(&Tok::RParen, ")")?;
                Ok(inner)
            }
            Some(other) => Err(EvalError::Parse(format!("unexpected token: {other:?}"))),
            None => Err(EvalError::Parse("unexpected end of input".into())),
        }
    }

    // Adjacent number tokens form a vector literal: `1 2 3`.
    fn number_tail(&mut self, mut seq: NumberSeq) -> Result<Expr, EvalError> {
        loop {
            match self.peek() {
                Some(Tok::Int(i)) => {
                    seq.push_int(*i);
                    self.pos += 1;
                }
                Some(Tok::Float(f)) => {
                    seq.push_float(*f);
                    self.pos += 1;
                }
                _ => break,
            }
        }
        Ok(Expr::Lit(seq.into_value()))
    }
}

/// Accumulator for a numeric literal run; promotes to float on first float.
struct NumberSeq {
    ints: Vec<i64>,
    floats: Option<Vec<f64>>,
}

impl NumberSeq {
    fn from_int(i: i64) -> Self {
        Self {
            ints: vec![i],
            floats: None,
        }
    }

    fn from_float(f: f64) -> Self {
        Self {
            ints: Vec::new(),
            floats: Some(vec![f]),
        }
    }

    fn push_int(&mut self, i: i64) {
        match &mut self.floats {
            Some(floats) => floats.push(i as f64),
            None => self.ints.push(i),
        }
    }

    fn push_float(&mut self, f: f64) {
        let floats = self
            .floats
            .get_or_insert_with(|| self.ints.iter().map(|&i| i as f64).collect());
        floats.push(f);
    }

    fn into_value(self) -> Value {
        match self.floats {
            Some(floats) if floats.len() == 1 => Value::Float(floats[0]),
            Some(floats) => Value::FloatVec(floats),
            None if self.ints.len() == 1 => Value::Int(self.ints[0]),
            None => Value::IntVec(self.ints),
        }
    }
}

/// Parse one expression. Used directly for post-filter installation.
pub fn parse(src: &str) -> Result<Expr, EvalError> {
    let toks = lex(src)?;
    if toks.is_empty() {
        return Err(EvalError::Parse("empty expression".into()));
    }
    let mut parser = Parser { toks, pos: 0 };
    let expr = parser.expr(0)?;
    if parser.pos != parser.toks.len() {
        return Err(EvalError::Parse("trailing input".into()));
    }
    Ok(expr)
}

// ── Evaluation ───────────────────────────────────────────────────────────

/// Interpreter state: the session's global bindings.
///
/// Deliberately free of bridge state; dashboard side effects go through
/// the [`HostCaps`] argument of [`Interpreter::eval`].
#[derive(Default)]
pub struct Interpreter {
    vars: HashMap<String, Value>,
}

impl Interpreter {
    /// Create an interpreter with no bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and evaluate one expression against the session globals.
    pub fn eval(&mut self, src: &str, caps: &mut dyn HostCaps) -> Result<Value, EvalError> {
        let expr = parse(src)?;
        eval_expr(&expr, &mut self.vars, caps)
    }
}

/// Evaluate a parsed expression in an explicit scope.
pub fn eval_expr(
    expr: &Expr,
    vars: &mut HashMap<String, Value>,
    caps: &mut dyn HostCaps,
) -> Result<Value, EvalError> {
    match expr {
        Expr::Lit(value) => Ok(value.clone()),
        Expr::Name(name) => vars
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownName(name.clone())),
        Expr::Assign(name, rhs) => {
            let value = eval_expr(rhs, vars, caps)?;
            vars.insert(name.clone(), value.clone());
            Ok(value)
        }
        Expr::BinOp(verb, lhs, rhs) => {
            let left = eval_expr(lhs, vars, caps)?;
            let right = eval_expr(rhs, vars, caps)?;
            apply_verb(*verb, left, right)
        }
        Expr::Neg(inner) => {
            let value = eval_expr(inner, vars, caps)?;
            apply_verb(Verb::Sub, Value::Int(0), value)
        }
        Expr::Call(name, args) => eval_call(name, args, vars, caps),
    }
}

/// Apply a post-filter to an incoming value.
///
/// The filter runs in a scope containing only `x` (the drawn value) and
/// with all dashboard capabilities denied; it is a pure transform.
pub fn eval_filter(filter: &Expr, x: Value) -> Result<Value, EvalError> {
    let mut scope = HashMap::from([("x".to_string(), x)]);
    eval_expr(filter, &mut scope, &mut DeniedCaps)
}

fn eval_call(
    name: &str,
    args: &[Expr],
    vars: &mut HashMap<String, Value>,
    caps: &mut dyn HostCaps,
) -> Result<Value, EvalError> {
    let arity = |expected: usize| -> Result<(), EvalError> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(EvalError::Arity {
                name: name.to_string(),
                expected,
                got: args.len(),
            })
        }
    };
    match name {
        "til" => {
            arity(1)?;
            match eval_expr(&args[0], vars, caps)? {
                Value::Int(n) if n >= 0 => Ok(Value::IntVec((0..n).collect())),
                other => Err(EvalError::Type {
                    wanted: "non-negative int",
                    got: other.type_name(),
                }),
            }
        }
        "widget" => {
            arity(2)?;
            let kind = match eval_expr(&args[0], vars, caps)? {
                Value::Str(kind) => WidgetKind::parse(&kind)
                    .ok_or_else(|| EvalError::UnknownKind(kind.clone()))?,
                other => {
                    return Err(EvalError::Type {
                        wanted: "string",
                        got: other.type_name(),
                    });
                }
            };
            let widget_name = match eval_expr(&args[1], vars, caps)? {
                Value::Str(name) => name,
                other => {
                    return Err(EvalError::Type {
                        wanted: "string",
                        got: other.type_name(),
                    });
                }
            };
            caps.create_widget(kind, &widget_name)
        }
        "draw" => {
            arity(2)?;
            let target = eval_expr(&args[0], vars, caps)?;
            let value = eval_expr(&args[1], vars, caps)?;
            match target {
                Value::Widget { id, .. } => {
                    caps.draw(id, value)?;
                    Ok(target)
                }
                other => Err(EvalError::Type {
                    wanted: "widget",
                    got: other.type_name(),
                }),
            }
        }
        _ => Err(EvalError::UnknownFunction(name.to_string())),
    }
}

fn apply_verb(verb: Verb, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    use Value::*;
    match (lhs, rhs) {
        (Int(a), Int(b)) => Ok(int_op(verb, a, b)),
        (Int(a), Float(b)) => Ok(Float(float_op(verb, a as f64, b))),
        (Float(a), Int(b)) => Ok(Float(float_op(verb, a, b as f64))),
        (Float(a), Float(b)) => Ok(Float(float_op(verb, a, b))),
        (IntVec(a), Int(b)) => Ok(collect_ints(verb, a.iter().map(|&x| (x, b)))),
        (Int(a), IntVec(b)) => Ok(collect_ints(verb, b.iter().map(|&x| (a, x)))),
        (IntVec(a), IntVec(b)) => {
            if a.len() != b.len() {
                return Err(EvalError::LengthMismatch {
                    lhs: a.len(),
                    rhs: b.len(),
                });
            }
            Ok(collect_ints(verb, a.iter().copied().zip(b)))
        }
        (FloatVec(a), rhs @ (Int(_) | Float(_))) => {
            let b = as_f64(&rhs);
            Ok(FloatVec(a.iter().map(|&x| float_op(verb, x, b)).collect()))
        }
        (lhs @ (Int(_) | Float(_)), FloatVec(b)) => {
            let a = as_f64(&lhs);
            Ok(FloatVec(b.iter().map(|&x| float_op(verb, a, x)).collect()))
        }
        (FloatVec(a), FloatVec(b)) => {
            if a.len() != b.len() {
                return Err(EvalError::LengthMismatch {
                    lhs: a.len(),
                    rhs: b.len(),
                });
            }
            Ok(FloatVec(
                a.iter()
                    .zip(&b)
                    .map(|(&x, &y)| float_op(verb, x, y))
                    .collect(),
            ))
        }
        (IntVec(a), Float(b)) => Ok(FloatVec(
            a.iter().map(|&x| float_op(verb, x as f64, b)).collect(),
        )),
        (Float(a), IntVec(b)) => Ok(FloatVec(
            b.iter().map(|&x| float_op(verb, a, x as f64)).collect(),
        )),
        (IntVec(a), FloatVec(b)) => {
            if a.len() != b.len() {
                return Err(EvalError::LengthMismatch {
                    lhs: a.len(),
                    rhs: b.len(),
                });
            }
            Ok(FloatVec(
                a.iter()
                    .zip(&b)
                    .map(|(&x, &y)| float_op(verb, x as f64, y))
                    .collect(),
            ))
        }
        (FloatVec(a), IntVec(b)) => {
            if a.len() != b.len() {
                return Err(EvalError::LengthMismatch {
                    lhs: a.len(),
                    rhs: b.len(),
                });
            }
            Ok(FloatVec(
                a.iter()
                    .zip(&b)
                    .map(|(&x, &y)| float_op(verb, x, y as f64))
                    .collect(),
            ))
        }
        (lhs, rhs) => Err(EvalError::Type {
            wanted: "numeric operands",
            got: if matches!(lhs, Int(_) | Float(_) | IntVec(_) | FloatVec(_)) {
                rhs.type_name()
            } else {
                lhs.type_name()
            },
        }),
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        _ => unreachable!("caller matched a numeric atom"),
    }
}

// Division always produces floats, as in q. Integer + - * wrap rather
// than trap.
fn int_op(verb: Verb, a: i64, b: i64) -> Value {
    match verb {
        Verb::Add => Value::Int(a.wrapping_add(b)),
        Verb::Sub => Value::Int(a.wrapping_sub(b)),
        Verb::Mul => Value::Int(a.wrapping_mul(b)),
        Verb::Div => Value::Float(a as f64 / b as f64),
    }
}

fn float_op(verb: Verb, a: f64, b: f64) -> f64 {
    match verb {
        Verb::Add => a + b,
        Verb::Sub => a - b,
        Verb::Mul => a * b,
        Verb::Div => a / b,
    }
}

fn collect_ints(verb: Verb, pairs: impl Iterator<Item = (i64, i64)>) -> Value {
    if verb == Verb::Div {
        return Value::FloatVec(pairs.map(|(a, b)| a as f64 / b as f64).collect());
    }
    Value::IntVec(
        pairs
            .map(|(a, b)| match int_op(verb, a, b) {
                Value::Int(i) => i,
                _ => unreachable!("non-division int op yields an int"),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::format_value;

    fn eval(src: &str) -> Result<Value, EvalError> {
        Interpreter::new().eval(src, &mut DeniedCaps)
    }

    #[test]
    fn arithmetic_atoms() {
        assert_eq!(eval("1+1").unwrap(), Value::Int(2));
        assert_eq!(eval("7-2").unwrap(), Value::Int(5));
        assert_eq!(eval("3*4").unwrap(), Value::Int(12));
        assert_eq!(eval("1/2").unwrap(), Value::Float(0.5));
    }

    #[test]
    fn right_to_left_no_precedence() {
        // K evaluation order: 2*(3+1).
        assert_eq!(eval("2*3+1").unwrap(), Value::Int(8));
        assert_eq!(eval("(2*3)+1").unwrap(), Value::Int(7));
    }

    #[test]
    fn vector_literals_and_broadcast() {
        assert_eq!(eval("1 2 3").unwrap(), Value::IntVec(vec![1, 2, 3]));
        assert_eq!(eval("1 2 3+10").unwrap(), Value::IntVec(vec![11, 12, 13]));
        assert_eq!(eval("10+1 2 3").unwrap(), Value::IntVec(vec![11, 12, 13]));
        assert_eq!(eval("1 2+3 4").unwrap(), Value::IntVec(vec![4, 6]));
        assert_eq!(
            eval("1 2 3*2.5").unwrap(),
            Value::FloatVec(vec![2.5, 5.0, 7.5])
        );
    }

    #[test]
    fn length_mismatch_is_reported() {
        assert_eq!(
            eval("1 2+3 4 5"),
            Err(EvalError::LengthMismatch { lhs: 2, rhs: 3 })
        );
    }

    #[test]
    fn assignment_binds_and_returns() {
        let mut interp = Interpreter::new();
        assert_eq!(
            interp.eval("x: 2+3", &mut DeniedCaps).unwrap(),
            Value::Int(5)
        );
        assert_eq!(interp.eval("x*2", &mut DeniedCaps).unwrap(), Value::Int(10));
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert_eq!(eval("nope"), Err(EvalError::UnknownName("nope".into())));
    }

    #[test]
    fn til_builds_iota() {
        assert_eq!(eval("til[4]").unwrap(), Value::IntVec(vec![0, 1, 2, 3]));
        assert_eq!(eval("1+til[3]").unwrap(), Value::IntVec(vec![1, 2, 3]));
        assert!(matches!(eval("til[1 2]"), Err(EvalError::Type { .. })));
    }

    #[test]
    fn negation_and_floats() {
        assert_eq!(eval("-5").unwrap(), Value::Int(-5));
        assert_eq!(eval("1.5+2.5").unwrap(), Value::Float(4.0));
        assert_eq!(format_value(&eval("1+1").unwrap()), "2");
    }

    #[test]
    fn strings_parse_with_escapes() {
        assert_eq!(eval("\"a\\nb\"").unwrap(), Value::Str("a\nb".into()));
        assert!(matches!(eval("\"open"), Err(EvalError::Parse(_))));
    }

    #[test]
    fn deep_nesting_is_a_parse_error_not_a_crash() {
        let blown = format!("{}1{}", "(".repeat(5000), ")".repeat(5000));
        assert_eq!(
            eval(&blown),
            Err(EvalError::Parse("expression too deep".into()))
        );
        let negs = format!("{}5", "-".repeat(5000));
        assert_eq!(
            eval(&negs),
            Err(EvalError::Parse("expression too deep".into()))
        );
        // Reasonable nesting is untouched by the bound.
        let fine = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(eval(&fine).unwrap(), Value::Int(1));
    }

    #[test]
    fn parse_errors_are_recoverable_values() {
        assert!(matches!(eval(""), Err(EvalError::Parse(_))));
        assert!(matches!(eval("1+"), Err(EvalError::Parse(_))));
        assert!(matches!(eval("(1"), Err(EvalError::Parse(_))));
        assert!(matches!(eval("1)"), Err(EvalError::Parse(_))));
        assert!(matches!(eval("widget[\"table\""), Err(EvalError::Parse(_))));
    }

    #[test]
    fn capabilities_are_denied_outside_the_engine() {
        assert_eq!(
            eval("widget[\"table\"; \"T\"]"),
            Err(EvalError::CapabilityDenied("widget"))
        );
    }

    #[test]
    fn filters_see_only_x() {
        let filter = parse("x*2").unwrap();
        assert_eq!(
            eval_filter(&filter, Value::IntVec(vec![1, 2])).unwrap(),
            Value::IntVec(vec![2, 4])
        );
        let bad = parse("y+1").unwrap();
        assert_eq!(
            eval_filter(&bad, Value::Int(1)),
            Err(EvalError::UnknownName("y".into()))
        );
    }

    #[test]
    fn filters_cannot_draw() {
        let filter = parse("draw[x; 1]").unwrap();
        // `x` is not a widget here, but even with one the capability is
        // denied before the draw could happen.
        assert!(matches!(
            eval_filter(&filter, Value::Int(1)),
            Err(EvalError::Type { .. })
        ));
    }
}

use std::collections::HashSet;

use crate::{
    ast::{BinOp, ExprTree},
    lexer::Lexer,
    output,
    parser::{ParseError, Parser},
    record::{ClassAd, EnvLookup, Environment, Record},
    value::Value,
};
use tracing::debug;

/// The MY/TARGET record pair an expression is evaluated against.
///
/// Either side may be absent. `swapped` flips which record is "mine",
/// which is how a `TARGET.` prefix is resolved.
#[derive(Clone, Copy, Default)]
pub struct Scope<'a> {
    pub my: Option<&'a dyn Record>,
    pub target: Option<&'a dyn Record>,
}

impl<'a> Scope<'a> {
    pub fn new(my: Option<&'a dyn Record>, target: Option<&'a dyn Record>) -> Self {
        Scope { my, target }
    }

    fn swapped(self) -> Self {
        Scope {
            my: self.target,
            target: self.my,
        }
    }
}

/// Per-evaluation state threaded down the walk.
///
/// `in_flight` holds the identities of the nodes currently being
/// evaluated on this call stack; re-entering one means an attribute chain
/// has looped back on itself. Keeping this here rather than on the nodes
/// leaves trees free to be shared and evaluated concurrently.
pub(crate) struct EvalState {
    in_flight: HashSet<usize>,
    pub(crate) debug: bool,
}

impl EvalState {
    fn new() -> Self {
        EvalState {
            in_flight: HashSet::new(),
            debug: false,
        }
    }
}

enum Truth {
    True,
    False,
    Undef,
    Err,
}

fn truth_of(value: &Value) -> Truth {
    match value {
        Value::Undefined => Truth::Undef,
        Value::Error => Truth::Err,
        v => match v.truth() {
            Some(true) => Truth::True,
            Some(false) => Truth::False,
            None => Truth::Err, // strings and null have no truth value
        },
    }
}

enum Num {
    Int(i64),
    Float(f64),
}

fn num_of(value: &Value) -> Option<Num> {
    match value {
        Value::Integer(n) => Some(Num::Int(*n)),
        Value::Float(n) => Some(Num::Float(*n)),
        Value::Boolean(b) => Some(Num::Int(*b as i64)),
        _ => None,
    }
}

/// Evaluates expression trees against a record pair.
///
/// Evaluation is a synchronous recursive walk; faults come back as
/// [`Value::Error`], unknown attributes as [`Value::Undefined`], and
/// nothing panics. The evaluator itself is stateless between calls apart
/// from its environment-fallback hook.
///
/// # Examples
///
/// ```
/// use classad_lang::{ClassAd, Evaluator, Value};
///
/// let my = ClassAd::parse("Memory = 2048").unwrap();
/// let eval = Evaluator::new();
/// let result = eval.eval_str("Memory / 2", Some(&my), None).unwrap();
/// assert_eq!(result, Value::Integer(1024));
/// ```
pub struct Evaluator {
    env: Box<dyn EnvLookup>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    /// Evaluator with the default environment fallback.
    pub fn new() -> Self {
        Evaluator {
            env: Box::new(Environment),
        }
    }

    /// Evaluator with a caller-supplied environment fallback.
    pub fn with_env(env: Box<dyn EnvLookup>) -> Self {
        Evaluator { env }
    }

    /// Evaluate a tree against a MY/TARGET record pair.
    pub fn eval(
        &self,
        expr: &ExprTree,
        my: Option<&dyn Record>,
        target: Option<&dyn Record>,
    ) -> Value {
        let mut state = EvalState::new();
        self.eval_expr(expr, Scope::new(my, target), &mut state)
    }

    /// Parse and evaluate an expression from source text.
    pub fn eval_str(
        &self,
        text: &str,
        my: Option<&dyn Record>,
        target: Option<&dyn Record>,
    ) -> Result<Value, ParseError> {
        let mut parser = Parser::new(Lexer::new(text))?;
        let (expr, _) = parser.parse()?;
        Ok(self.eval(&expr, my, target))
    }

    pub(crate) fn eval_expr(
        &self,
        expr: &ExprTree,
        scope: Scope<'_>,
        state: &mut EvalState,
    ) -> Value {
        let id = expr as *const ExprTree as usize;
        if !state.in_flight.insert(id) {
            // this node is already being evaluated further up the stack:
            // an attribute chain has looped back on itself
            return Value::Error;
        }
        let result = self.eval_node(expr, scope, state);
        state.in_flight.remove(&id);
        result
    }

    fn eval_node(&self, expr: &ExprTree, scope: Scope<'_>, state: &mut EvalState) -> Value {
        match expr {
            ExprTree::Variable(name) => {
                let result = self.resolve(name, scope, false, state);
                self.trace(expr, &result, state);
                result
            }
            ExprTree::Integer { value, unit } => {
                if unit.is_kilo() {
                    Value::Integer(value / 1024)
                } else {
                    Value::Integer(*value)
                }
            }
            ExprTree::Float { value, unit } => {
                if unit.is_kilo() {
                    Value::Float(value / 1024.0)
                } else {
                    Value::Float(*value)
                }
            }
            // boolean literals evaluate to integer 0/1
            ExprTree::Boolean(b) => Value::Integer(*b as i64),
            ExprTree::Str(s) => Value::Str(s.clone()),
            ExprTree::Time(t) => Value::Time(t.clone()),
            ExprTree::Undefined => Value::Undefined,
            ExprTree::Error => Value::Error,
            ExprTree::Paren(inner) => self.eval_expr(inner, scope, state),
            ExprTree::Negate(inner) => match self.eval_expr(inner, scope, state) {
                Value::Integer(n) => Value::Integer(-n),
                Value::Float(n) => Value::Float(-n),
                Value::Undefined => Value::Undefined,
                _ => Value::Error,
            },
            ExprTree::BinaryOp { op, left, right } => self.eval_binary(*op, left, right, scope, state),
            ExprTree::Call { name, args } => {
                // a debug() call sets the trace flag for its own extent;
                // restore it here so the call itself still gets traced
                let saved_debug = state.debug;
                let result = self.eval_call(name, args, scope, state);
                self.trace(expr, &result, state);
                state.debug = saved_debug;
                result
            }
        }
    }

    fn trace(&self, expr: &ExprTree, result: &Value, state: &EvalState) {
        if state.debug {
            debug!(target: "classad::eval", "{} --> {}", output::render(expr), result);
        }
    }

    /// Resolve an attribute name against the scope.
    ///
    /// A `MY.`/`TARGET.` prefix pins the search to one record: the rest of
    /// the name is resolved with restricted search, so the found
    /// expression cannot silently fall through to the other record. The
    /// other record stays reachable via an explicit `TARGET.` inside
    /// whatever the name resolves to. An unrecognized prefix is simply an
    /// unknown attribute.
    fn resolve(&self, name: &str, scope: Scope<'_>, restricted: bool, state: &mut EvalState) -> Value {
        match name.split_once('.') {
            Some((prefix, rest)) => {
                if prefix.eq_ignore_ascii_case("MY") {
                    self.resolve(rest, scope, true, state)
                } else if prefix.eq_ignore_ascii_case("TARGET") {
                    self.resolve(rest, scope.swapped(), true, state)
                } else {
                    Value::Undefined
                }
            }
            None => self.resolve_simple(name, scope, restricted, state),
        }
    }

    /// Resolve a simple (prefix-free) name: MY first, then TARGET unless
    /// the search is restricted, then the environment fallback. The record
    /// that supplies the match becomes "my" scope for evaluating the found
    /// expression.
    fn resolve_simple(
        &self,
        name: &str,
        scope: Scope<'_>,
        restricted: bool,
        state: &mut EvalState,
    ) -> Value {
        if let Some(my) = scope.my {
            if let Some(found) = my.lookup_expr(name) {
                return self.eval_expr(found, scope, state);
            }
        }

        if !restricted {
            if let Some(target) = scope.target {
                if let Some(found) = target.lookup_expr(name) {
                    return self.eval_expr(found, scope.swapped(), state);
                }
            }
        }

        self.env.resolve(name)
    }

    fn eval_binary(
        &self,
        op: BinOp,
        left: &ExprTree,
        right: &ExprTree,
        scope: Scope<'_>,
        state: &mut EvalState,
    ) -> Value {
        // an assignment's value is its right-hand side
        if op == BinOp::Assign {
            return self.eval_expr(right, scope, state);
        }

        let lhs = self.eval_expr(left, scope, state);
        let rhs = self.eval_expr(right, scope, state);

        match op {
            BinOp::And | BinOp::Or => Self::apply_logical(op, &lhs, &rhs),
            BinOp::MetaEqual => Value::Integer(Self::is_identical(&lhs, &rhs) as i64),
            BinOp::MetaNotEqual => Value::Integer(!Self::is_identical(&lhs, &rhs) as i64),
            _ => {
                // strict operators: Error dominates, then Undefined
                if lhs == Value::Error || rhs == Value::Error {
                    return Value::Error;
                }
                if lhs == Value::Undefined || rhs == Value::Undefined {
                    return Value::Undefined;
                }
                match op {
                    BinOp::Add | BinOp::Subtract | BinOp::Multiply | BinOp::Divide => {
                        Self::apply_arithmetic(op, &lhs, &rhs)
                    }
                    _ => Self::apply_comparison(op, &lhs, &rhs),
                }
            }
        }
    }

    /// Three-valued logic over always-evaluated operands. A definitive
    /// FALSE wins `&&` (and TRUE wins `||`) even against an Error on the
    /// other side, so a guard clause can fence off a broken one.
    fn apply_logical(op: BinOp, lhs: &Value, rhs: &Value) -> Value {
        let l = truth_of(lhs);
        let r = truth_of(rhs);

        match op {
            BinOp::And => match (l, r) {
                (Truth::False, _) | (_, Truth::False) => Value::Integer(0),
                (Truth::Err, _) | (_, Truth::Err) => Value::Error,
                (Truth::Undef, _) | (_, Truth::Undef) => Value::Undefined,
                _ => Value::Integer(1),
            },
            BinOp::Or => match (l, r) {
                (Truth::True, _) | (_, Truth::True) => Value::Integer(1),
                (Truth::Err, _) | (_, Truth::Err) => Value::Error,
                (Truth::Undef, _) | (_, Truth::Undef) => Value::Undefined,
                _ => Value::Integer(0),
            },
            _ => Value::Error,
        }
    }

    /// Identity for `=?=`/`=!=`: same kind and equal payload. Total over
    /// every value kind; never Undefined or Error.
    fn is_identical(lhs: &Value, rhs: &Value) -> bool {
        match (lhs, rhs) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Str(a), Value::Str(b)) | (Value::Time(a), Value::Time(b)) => {
                a.eq_ignore_ascii_case(b)
            }
            (Value::Undefined, Value::Undefined) => true,
            (Value::Error, Value::Error) => true,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }

    fn apply_arithmetic(op: BinOp, lhs: &Value, rhs: &Value) -> Value {
        let (Some(l), Some(r)) = (num_of(lhs), num_of(rhs)) else {
            return Value::Error;
        };

        match (l, r) {
            (Num::Int(a), Num::Int(b)) => match op {
                BinOp::Add => Value::Integer(a.wrapping_add(b)),
                BinOp::Subtract => Value::Integer(a.wrapping_sub(b)),
                BinOp::Multiply => Value::Integer(a.wrapping_mul(b)),
                BinOp::Divide => {
                    if b == 0 {
                        Value::Error
                    } else {
                        Value::Integer(a / b)
                    }
                }
                _ => Value::Error,
            },
            (l, r) => {
                let a = match l {
                    Num::Int(n) => n as f64,
                    Num::Float(n) => n,
                };
                let b = match r {
                    Num::Int(n) => n as f64,
                    Num::Float(n) => n,
                };
                match op {
                    BinOp::Add => Value::Float(a + b),
                    BinOp::Subtract => Value::Float(a - b),
                    BinOp::Multiply => Value::Float(a * b),
                    BinOp::Divide => {
                        if b == 0.0 {
                            Value::Error
                        } else {
                            Value::Float(a / b)
                        }
                    }
                    _ => Value::Error,
                }
            }
        }
    }

    /// Ordered and equality comparison. Numerics compare cross-type;
    /// strings compare case-insensitively; mixing a string with a number
    /// is an error. Results are integer 0/1.
    fn apply_comparison(op: BinOp, lhs: &Value, rhs: &Value) -> Value {
        use std::cmp::Ordering;

        let ordering = match (lhs, rhs) {
            (Value::Str(a), Value::Str(b))
            | (Value::Str(a), Value::Time(b))
            | (Value::Time(a), Value::Str(b))
            | (Value::Time(a), Value::Time(b)) => {
                a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase())
            }
            _ => match (num_of(lhs), num_of(rhs)) {
                (Some(Num::Int(a)), Some(Num::Int(b))) => a.cmp(&b),
                (Some(l), Some(r)) => {
                    let a = match l {
                        Num::Int(n) => n as f64,
                        Num::Float(n) => n,
                    };
                    let b = match r {
                        Num::Int(n) => n as f64,
                        Num::Float(n) => n,
                    };
                    match a.partial_cmp(&b) {
                        Some(ord) => ord,
                        None => return Value::Error,
                    }
                }
                _ => return Value::Error,
            },
        };

        let result = match op {
            BinOp::Equal => ordering == Ordering::Equal,
            BinOp::NotEqual => ordering != Ordering::Equal,
            BinOp::LessThan => ordering == Ordering::Less,
            BinOp::LessEqual => ordering != Ordering::Greater,
            BinOp::GreaterThan => ordering == Ordering::Greater,
            BinOp::GreaterEqual => ordering != Ordering::Less,
            _ => return Value::Error,
        };
        Value::Integer(result as i64)
    }
}

/// Attribute names referenced by an expression, split by whether the base
/// record can satisfy them itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct References {
    pub internal: Vec<String>,
    pub external: Vec<String>,
}

/// Collect the attribute names a tree references, classified against
/// `base`. Both sides of every operator and every call argument are
/// walked; an assignment's left side is a definition site, not a
/// reference, and is skipped. Names are deduplicated case-insensitively.
pub fn collect_references(expr: &ExprTree, base: &ClassAd) -> References {
    let mut refs = References::default();
    walk_references(expr, base, &mut refs);
    refs
}

fn walk_references(expr: &ExprTree, base: &ClassAd, refs: &mut References) {
    match expr {
        ExprTree::Variable(name) => {
            let (external, simplified) = base.is_external_reference(name);
            let list = if external {
                &mut refs.external
            } else {
                &mut refs.internal
            };
            if !list.iter().any(|n| n.eq_ignore_ascii_case(&simplified)) {
                list.push(simplified);
            }
        }
        ExprTree::BinaryOp { op, left, right } => {
            if *op != BinOp::Assign {
                walk_references(left, base, refs);
            }
            walk_references(right, base, refs);
        }
        ExprTree::Paren(inner) | ExprTree::Negate(inner) => walk_references(inner, base, refs),
        ExprTree::Call { args, .. } => {
            for arg in args {
                walk_references(arg, base, refs);
            }
        }
        _ => {}
    }
}

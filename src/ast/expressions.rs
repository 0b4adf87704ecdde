use crate::ast::BinOp;

/// Scaling marker attached to numeric literals.
///
/// A numeric literal may be followed by a lone `k` in the source text
/// (`Memory > 4096 k`), which divides the value by 1024 at evaluation
/// time. The marker is preserved so the expression prints back exactly
/// as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    #[default]
    None,
    /// Divide by 1024 when evaluated; prints as a trailing `" k"`.
    Kilo,
}

impl Unit {
    pub fn is_kilo(self) -> bool {
        matches!(self, Unit::Kilo)
    }
}

/// A parsed ClassAd expression.
///
/// Expression trees are immutable after parsing: evaluation never mutates
/// the tree, so a single tree can be evaluated against many record pairs
/// (and from several threads at once). Deep copy is plain [`Clone`]; every
/// node exclusively owns its children.
///
/// # Examples
///
/// ```text
/// Memory * 2           BinaryOp(Multiply, Variable, Integer)
/// (1 + 2) * 3          BinaryOp(Multiply, Paren(..), Integer)
/// substr(Name, 0, 4)   Call { name, args }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ExprTree {
    /// Attribute reference, resolved against the MY/TARGET record pair at
    /// evaluation time. The name may carry a `MY.`/`TARGET.` scope prefix;
    /// it is kept intact here and split during resolution.
    Variable(String),

    /// Integer literal, with optional `k` scaling
    Integer { value: i64, unit: Unit },

    /// Float literal, with optional `k` scaling
    Float { value: f64, unit: Unit },

    /// String literal
    Str(String),

    /// ISO time literal (`'...'` in source text)
    Time(String),

    /// Boolean literal (TRUE/FALSE)
    Boolean(bool),

    /// The UNDEFINED literal
    Undefined,

    /// The ERROR literal
    Error,

    /// Explicit parenthesization; evaluates as a passthrough of the inner
    /// expression and prints as `(` inner `)`.
    Paren(Box<ExprTree>),

    /// Unary minus that could not be folded into a literal at parse time.
    /// Prints as ` - ` followed by the operand, matching a subtraction
    /// with an absent left side.
    Negate(Box<ExprTree>),

    /// Binary operation (arithmetic, comparison, logical, assignment)
    BinaryOp {
        op: BinOp,
        left: Box<ExprTree>,
        right: Box<ExprTree>,
    },

    /// Function call with an ordered argument list
    ///
    /// # Examples
    /// ```text
    /// ifThenElse(Busy, 0, Rank)
    /// strcat("slot", "1")
    /// ```
    Call { name: String, args: Vec<ExprTree> },
}

impl ExprTree {
    /// Integer literal without scaling.
    pub fn integer(value: i64) -> ExprTree {
        ExprTree::Integer {
            value,
            unit: Unit::None,
        }
    }

    /// Float literal without scaling.
    pub fn float(value: f64) -> ExprTree {
        ExprTree::Float {
            value,
            unit: Unit::None,
        }
    }

    /// An assignment's target name, if this tree is `Name = expr`.
    pub fn assignment_target(&self) -> Option<&str> {
        match self {
            ExprTree::BinaryOp {
                op: BinOp::Assign,
                left,
                ..
            } => match left.as_ref() {
                ExprTree::Variable(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    /// An assignment's right-hand side, if this tree is an assignment.
    pub fn assignment_value(&self) -> Option<&ExprTree> {
        match self {
            ExprTree::BinaryOp {
                op: BinOp::Assign,
                right,
                ..
            } => Some(right),
            _ => None,
        }
    }
}

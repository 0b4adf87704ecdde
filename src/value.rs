use std::fmt;

/// The result of evaluating a ClassAd expression.
///
/// This is a tagged union over every type the language can produce. Unlike
/// most expression languages there are two distinct non-value outcomes:
///
/// - [`Value::Undefined`] -- a well-formed lookup that legitimately has no
///   answer (an attribute defined in neither record).
/// - [`Value::Error`] -- a detected fault: type mismatch, arity violation,
///   failed coercion, or an evaluation cycle.
///
/// Both propagate through operators as ordinary values; evaluation never
/// panics and never returns `Err`.
///
/// # Examples
///
/// ```
/// use classad_lang::Value;
///
/// let n = Value::Integer(42);
/// assert!(n.is_number());
/// assert_eq!(n.as_float(), Some(42.0));
///
/// let missing = Value::Undefined;
/// assert_eq!(missing.to_string(), "UNDEFINED");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer number (booleans evaluate to 0/1 of this kind)
    Integer(i64),

    /// Floating-point number
    Float(f64),

    /// Boolean; produced by coercion and the shared-function ABI rather
    /// than by ordinary evaluation
    Boolean(bool),

    /// UTF-8 string
    Str(String),

    /// ISO time string (single-quoted literal in source text)
    Time(String),

    /// Legitimately unknown
    Undefined,

    /// Detected fault
    Error,

    /// Null; only crosses the boundary from external functions
    Null,
}

impl Value {
    /// Check if the value is a number (Integer or Float)
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Get as float, promoting integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as integer (floats are not rounded here; use `int()` for that)
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as string slice for String/Time kinds
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Time(s) => Some(s),
            _ => None,
        }
    }

    /// Truth of the value, if it has one.
    ///
    /// Integers and floats are true when nonzero. Strings, times, and null
    /// have no truth value; Undefined and Error have none either.
    pub fn truth(&self) -> Option<bool> {
        match self {
            Value::Integer(n) => Some(*n != 0),
            Value::Float(n) => Some(*n != 0.0),
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Coerce this value to a String in place.
    ///
    /// Integers and floats become their decimal text, booleans become
    /// `"TRUE"`/`"FALSE"`, strings stay as they are. Undefined and Error
    /// are left alone unless `force` is set, in which case they become the
    /// literal strings `"UNDEFINED"`/`"ERROR"`.
    ///
    /// Returns `true` when the value is a String afterwards. This is the
    /// conversion behind the `string()` builtin, and (with `force`) behind
    /// the pre-coercion every string-taking builtin applies to its
    /// arguments.
    pub fn coerce_to_string(&mut self, force: bool) -> bool {
        let converted = match &*self {
            Value::Str(_) => return true,
            Value::Time(s) => Some(Value::Str(s.clone())),
            Value::Integer(n) => Some(Value::Str(n.to_string())),
            Value::Float(n) => Some(Value::Str(format!("{:.6}", n))),
            Value::Boolean(b) => {
                Some(Value::Str(if *b { "TRUE" } else { "FALSE" }.to_string()))
            }
            Value::Undefined if force => Some(Value::Str("UNDEFINED".to_string())),
            Value::Error if force => Some(Value::Str("ERROR".to_string())),
            _ => None,
        };
        if let Some(value) = converted {
            *self = value;
        }
        matches!(self, Value::Str(_))
    }
}

/// Renders the value the way evaluation results are displayed: numbers in
/// decimal (floats with six fractional digits), strings raw, and the
/// non-values as their keyword text.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{:.6}", n),
            Value::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::Str(s) | Value::Time(s) => write!(f, "{}", s),
            Value::Undefined => write!(f, "UNDEFINED"),
            Value::Error => write!(f, "ERROR"),
            Value::Null => write!(f, "NULL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Floating-point number
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// 0.5
    /// ```
    Float(f64),

    /// Integer
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 1024
    /// ```
    Integer(i64),

    /// String literal enclosed in double quotes
    ///
    /// Embedded quotes are backslash-escaped in the source text.
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// "say \"hi\""
    /// ```
    String(String),

    /// ISO time literal enclosed in single quotes
    ///
    /// # Examples
    /// ```text
    /// '2004-01-01T12:00:00'
    /// ```
    Time(String),

    /// Boolean keyword, matched case-insensitively
    ///
    /// # Examples
    /// ```text
    /// TRUE
    /// false
    /// ```
    Boolean(bool),

    /// The UNDEFINED keyword
    Undefined,

    /// The ERROR keyword
    Error,

    /// Attribute name or function name
    ///
    /// Names may contain dots (`MY.Memory`, `TARGET.Disk`); the scope
    /// prefix is split off at evaluation time, not here.
    ///
    /// # Examples
    /// ```text
    /// Memory
    /// MY.Rank
    /// _condor_load
    /// ```
    Identifier(String),

    // Operators
    /// Addition (`+`)
    Plus,

    /// Subtraction or unary negation (`-`)
    Minus,

    /// Multiplication (`*`)
    Star,

    /// Division (`/`)
    Slash,

    /// Equality (`==`)
    EqEq,

    /// Inequality (`!=`)
    NotEq,

    /// Meta-equality (`=?=`) -- identity comparison that is also defined
    /// for UNDEFINED and ERROR operands
    MetaEq,

    /// Meta-inequality (`=!=`)
    MetaNeq,

    /// Less than
    Lt,

    /// Greater than
    Gt,

    /// Less than or equal
    LtEq,

    /// Greater than or equal
    GtEq,

    /// Logical AND (`&&`)
    And,

    /// Logical OR (`||`)
    Or,

    /// Attribute assignment (a single `=`)
    ///
    /// # Examples
    /// ```text
    /// Rank = Memory * 2
    /// ```
    Assign,

    // Delimiters
    /// Left parenthesis for grouping or function calls
    LParen,

    /// Right parenthesis
    RParen,

    /// Comma separating function arguments
    Comma,

    /// End of input
    Eof,
}

use crate::{
    ast::{BinOp, ExprTree, Token, Unit},
    lexer::{LexError, Lexer},
};
use thiserror::Error;

/// Parse errors. Every variant carries the character offset of the input
/// consumed before the failure, so callers can point at the offending
/// spot. No partial tree survives a failed parse.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("unexpected {found:?} at position {position}")]
    UnexpectedToken { found: Token, position: usize },

    #[error("expected {expected} at position {position}, got {found:?}")]
    Expected {
        expected: &'static str,
        found: Token,
        position: usize,
    },

    #[error("left side of assignment at position {position} is not an attribute name")]
    BadAssignmentTarget { position: usize },

    #[error("trailing input at position {position} after a complete expression")]
    TrailingInput { position: usize },
}

impl ParseError {
    /// Characters successfully consumed before the error.
    pub fn position(&self) -> usize {
        match self {
            ParseError::Lex(LexError::UnexpectedChar { position, .. })
            | ParseError::Lex(LexError::IncompleteOperator { position, .. })
            | ParseError::Lex(LexError::Unterminated { position, .. })
            | ParseError::UnexpectedToken { position, .. }
            | ParseError::Expected { position, .. }
            | ParseError::BadAssignmentTarget { position }
            | ParseError::TrailingInput { position } => *position,
        }
    }
}

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    current_start: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current_token = lexer.next_token()?;
        let current_start = lexer.token_start();
        Ok(Parser {
            lexer,
            current_token,
            current_start,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        self.current_start = self.lexer.token_start();
        Ok(())
    }

    fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(&self.current_token) == std::mem::discriminant(token)
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<(), ParseError> {
        if !self.check(&token) {
            return Err(ParseError::Expected {
                expected,
                found: self.current_token.clone(),
                position: self.current_start,
            });
        }
        self.advance()
    }

    /// Parse a complete rvalue expression, tolerating trailing input.
    ///
    /// Returns the tree and the number of characters consumed; the caller
    /// decides whether leftover input is acceptable.
    pub fn parse(&mut self) -> Result<(ExprTree, usize), ParseError> {
        let expr = self.parse_expression()?;
        Ok((expr, self.current_start))
    }

    /// Parse exactly one `Name = expr` assignment.
    ///
    /// The left side must be a bare attribute name and the input must end
    /// after the right side; anything else is an error, never a partial
    /// success.
    pub fn parse_assignment(&mut self) -> Result<ExprTree, ParseError> {
        let lhs_start = self.current_start;
        let lhs = self.parse_expression()?;

        if !matches!(lhs, ExprTree::Variable(_)) {
            return Err(ParseError::BadAssignmentTarget {
                position: lhs_start,
            });
        }
        self.expect(Token::Assign, "'='")?;
        let rhs = self.parse_expression()?;

        if !self.check(&Token::Eof) {
            return Err(ParseError::TrailingInput {
                position: self.current_start,
            });
        }

        Ok(ExprTree::BinaryOp {
            op: BinOp::Assign,
            left: Box::new(lhs),
            right: Box::new(rhs),
        })
    }

    /// Lowest precedence: `a || b || c`, left-associative.
    pub fn parse_expression(&mut self) -> Result<ExprTree, ParseError> {
        let mut left = self.parse_and()?;

        while self.check(&Token::Or) {
            self.advance()?;
            let right = self.parse_and()?;

            left = ExprTree::BinaryOp {
                op: BinOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<ExprTree, ParseError> {
        let mut left = self.parse_equality()?;

        while self.check(&Token::And) {
            self.advance()?;
            let right = self.parse_equality()?;

            left = ExprTree::BinaryOp {
                op: BinOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<ExprTree, ParseError> {
        let mut left = self.parse_relational()?;

        loop {
            let op = match &self.current_token {
                Token::MetaEq => BinOp::MetaEqual,
                Token::MetaNeq => BinOp::MetaNotEqual,
                Token::EqEq => BinOp::Equal,
                Token::NotEq => BinOp::NotEqual,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_relational()?;

            left = ExprTree::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<ExprTree, ParseError> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match &self.current_token {
                Token::Lt => BinOp::LessThan,
                Token::LtEq => BinOp::LessEqual,
                Token::Gt => BinOp::GreaterThan,
                Token::GtEq => BinOp::GreaterEqual,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_additive()?;

            left = ExprTree::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<ExprTree, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current_token {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Subtract,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_multiplicative()?;

            left = ExprTree::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<ExprTree, ParseError> {
        let mut left = self.parse_factor()?;

        loop {
            let op = match &self.current_token {
                Token::Star => BinOp::Multiply,
                Token::Slash => BinOp::Divide,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_factor()?;

            left = ExprTree::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<ExprTree, ParseError> {
        match std::mem::replace(&mut self.current_token, Token::Eof) {
            Token::Integer(value) => {
                self.advance()?;
                let unit = self.parse_unit()?;
                Ok(ExprTree::Integer { value, unit })
            }
            Token::Float(value) => {
                self.advance()?;
                let unit = self.parse_unit()?;
                Ok(ExprTree::Float { value, unit })
            }
            Token::String(s) => {
                self.advance()?;
                Ok(ExprTree::Str(s))
            }
            Token::Time(t) => {
                self.advance()?;
                Ok(ExprTree::Time(t))
            }
            Token::Boolean(b) => {
                self.advance()?;
                Ok(ExprTree::Boolean(b))
            }
            Token::Undefined => {
                self.advance()?;
                Ok(ExprTree::Undefined)
            }
            Token::Error => {
                self.advance()?;
                Ok(ExprTree::Error)
            }
            Token::LParen => {
                self.advance()?;
                let inner = self.parse_expression()?;
                self.expect(Token::RParen, "')'")?;
                Ok(ExprTree::Paren(Box::new(inner)))
            }
            Token::Minus => {
                self.advance()?;
                let operand = self.parse_factor()?;
                // fold a minus on a numeric literal into the literal;
                // anything else keeps an explicit negation node
                Ok(match operand {
                    ExprTree::Integer { value, unit } => ExprTree::Integer {
                        value: -value,
                        unit,
                    },
                    ExprTree::Float { value, unit } => ExprTree::Float {
                        value: -value,
                        unit,
                    },
                    other => ExprTree::Negate(Box::new(other)),
                })
            }
            Token::Identifier(name) => {
                self.advance()?;

                // one-token lookahead: a name directly followed by '(' is
                // a function call, not a variable
                if self.check(&Token::LParen) {
                    self.advance()?;
                    let args = self.parse_arguments()?;
                    Ok(ExprTree::Call { name, args })
                } else {
                    Ok(ExprTree::Variable(name))
                }
            }
            token => Err(ParseError::UnexpectedToken {
                found: token,
                position: self.current_start,
            }),
        }
    }

    /// Consume a trailing `k`/`K` scaling marker after a numeric literal.
    fn parse_unit(&mut self) -> Result<Unit, ParseError> {
        if let Token::Identifier(name) = &self.current_token {
            if name.eq_ignore_ascii_case("k") {
                self.advance()?;
                return Ok(Unit::Kilo);
            }
        }
        Ok(Unit::None)
    }

    /// Argument list after the opening paren of a call; consumes the
    /// closing paren. Zero arguments is legal (`time()`).
    fn parse_arguments(&mut self) -> Result<Vec<ExprTree>, ParseError> {
        let mut args = vec![];

        if self.check(&Token::RParen) {
            self.advance()?;
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);

            if self.check(&Token::Comma) {
                self.advance()?;
            } else {
                self.expect(Token::RParen, "')' or ','")?;
                return Ok(args);
            }
        }
    }
}

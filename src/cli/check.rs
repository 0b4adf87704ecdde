use crate::{
    cli::CliError,
    lexer::Lexer,
    parser::Parser,
};

pub struct CheckOptions {
    /// The expression to validate
    pub expr: String,
}

pub enum CheckResult {
    /// The expression parsed; holds its canonical rendering and how many
    /// characters of the input were consumed.
    Valid { canonical: String, consumed: usize },
}

/// Validate an expression and return its canonical form.
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let mut parser = Parser::new(Lexer::new(&options.expr))?;
    let (tree, consumed) = parser.parse()?;

    Ok(CheckResult::Valid {
        canonical: crate::output::render(&tree),
        consumed,
    })
}

use std::fs;

use crate::{
    cli::CliError,
    evaluator::Evaluator,
    lexer::Lexer,
    parser::Parser,
    record::ClassAd,
    value::Value,
    ExprTree,
};

pub struct EvalOptions {
    /// The expression to evaluate
    pub expr: String,

    /// Path to the MY record, or inline ad text piped via stdin
    pub my: Option<String>,

    /// Inline MY ad text (from stdin)
    pub my_text: Option<String>,

    /// Path to the TARGET record
    pub target: Option<String>,

    /// Trace every evaluation step
    pub debug: bool,
}

fn load_ad(path: &str) -> Result<ClassAd, CliError> {
    let text = fs::read_to_string(path)?;
    ClassAd::parse(&text).map_err(|source| CliError::Ad {
        path: path.to_string(),
        source,
    })
}

/// Parse the expression and both ads, then evaluate.
pub fn execute_eval(options: &EvalOptions) -> Result<Value, CliError> {
    let mut parser = Parser::new(Lexer::new(&options.expr))?;
    let (mut tree, _) = parser.parse()?;

    if options.debug {
        // same effect as writing debug(expr) by hand
        tree = ExprTree::Call {
            name: "debug".to_string(),
            args: vec![tree],
        };
    }

    let my = match (&options.my, &options.my_text) {
        (Some(path), _) => Some(load_ad(path)?),
        (None, Some(text)) => Some(ClassAd::parse(text).map_err(|source| CliError::Ad {
            path: "<stdin>".to_string(),
            source,
        })?),
        (None, None) => None,
    };
    let target = match &options.target {
        Some(path) => Some(load_ad(path)?),
        None => None,
    };

    let evaluator = Evaluator::new();
    Ok(evaluator.eval(
        &tree,
        my.as_ref().map(|ad| ad as &dyn crate::Record),
        target.as_ref().map(|ad| ad as &dyn crate::Record),
    ))
}

pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod evaluator;
mod functions;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod record;
pub mod shared;
pub mod value;

pub use ast::{BinOp, ExprTree, Token, Unit};
pub use evaluator::{collect_references, Evaluator, References, Scope};
pub use lexer::{LexError, Lexer};
pub use output::{calc_print_len, render, to_json};
pub use parser::{ParseError, Parser};
pub use record::{AdParseError, ClassAd, EnvLookup, Environment, Record};
pub use value::Value;

use std::collections::HashMap;

use crate::{
    ast::ExprTree,
    lexer::Lexer,
    parser::{ParseError, Parser},
    value::Value,
};
use thiserror::Error;

/// Attribute lookup, the only capability evaluation needs from a record.
///
/// Names are matched case-insensitively. The returned tree is the stored
/// right-hand side of the attribute's assignment.
pub trait Record {
    fn lookup_expr(&self, name: &str) -> Option<&ExprTree>;
}

/// Fallback resolution for simple names found in neither record.
///
/// Implementations must return [`Value::Undefined`] for unknown names,
/// never fail.
pub trait EnvLookup {
    fn resolve(&self, name: &str) -> Value;
}

/// The default environment: resolves the `CurrentTime` pseudo-attribute
/// to epoch seconds and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct Environment;

impl EnvLookup for Environment {
    fn resolve(&self, name: &str) -> Value {
        if name.eq_ignore_ascii_case("CurrentTime") {
            Value::Integer(chrono::Utc::now().timestamp())
        } else {
            Value::Undefined
        }
    }
}

/// Error from parsing a multi-line ad, pointing at the offending line.
#[derive(Debug, Error)]
#[error("line {line}: {source}")]
pub struct AdParseError {
    pub line: usize,
    #[source]
    pub source: ParseError,
}

/// A set of named attributes, each holding an expression tree.
///
/// This is the record type expressions are evaluated against: a job ad, a
/// machine ad, a policy fragment. Attribute names are case-insensitive;
/// the spelling of the first insert is preserved for display.
///
/// # Examples
///
/// ```
/// use classad_lang::ClassAd;
///
/// let ad = ClassAd::parse("Memory = 2048\nRank = Memory * 2").unwrap();
/// assert!(ad.lookup("memory").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClassAd {
    // lowercased name -> (name as written, stored expression)
    attrs: HashMap<String, (String, ExprTree)>,
}

impl ClassAd {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an ad from `Name = expr` lines.
    ///
    /// Blank lines and lines starting with `#` are skipped. Each
    /// remaining line must be a complete assignment with nothing trailing.
    pub fn parse(text: &str) -> Result<ClassAd, AdParseError> {
        let mut ad = ClassAd::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            ad.insert_line(line).map_err(|source| AdParseError {
                line: idx + 1,
                source,
            })?;
        }
        Ok(ad)
    }

    /// Parse and insert a single `Name = expr` line.
    pub fn insert_line(&mut self, line: &str) -> Result<(), ParseError> {
        let mut parser = Parser::new(Lexer::new(line))?;
        let assign = parser.parse_assignment()?;
        // parse_assignment guarantees the shape
        let name = assign
            .assignment_target()
            .map(str::to_string)
            .unwrap_or_default();
        let value = assign
            .assignment_value()
            .cloned()
            .unwrap_or(ExprTree::Undefined);
        self.insert(name, value);
        Ok(())
    }

    /// Store an attribute, replacing any existing one with the same
    /// case-insensitive name.
    pub fn insert(&mut self, name: impl Into<String>, expr: ExprTree) {
        let name = name.into();
        self.attrs.insert(name.to_ascii_lowercase(), (name, expr));
    }

    /// Look an attribute up by case-insensitive name.
    pub fn lookup(&self, name: &str) -> Option<&ExprTree> {
        self.attrs
            .get(&name.to_ascii_lowercase())
            .map(|(_, expr)| expr)
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Iterate attributes as (name-as-written, expression) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExprTree)> {
        self.attrs
            .values()
            .map(|(name, expr)| (name.as_str(), expr))
    }

    /// Classify a referenced name relative to this record.
    ///
    /// A `TARGET.`-prefixed name refers elsewhere; any other prefix
    /// (including `MY.`) is internal. An unprefixed name is internal
    /// exactly when this record defines it. The returned string is the
    /// simplified name, with any prefix stripped.
    pub fn is_external_reference(&self, name: &str) -> (bool, String) {
        match name.split_once('.') {
            Some((prefix, rest)) => {
                let external = prefix.eq_ignore_ascii_case("TARGET");
                (external, rest.to_string())
            }
            None => (self.lookup(name).is_none(), name.to_string()),
        }
    }
}

impl Record for ClassAd {
    fn lookup_expr(&self, name: &str) -> Option<&ExprTree> {
        self.lookup(name)
    }
}

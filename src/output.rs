//! Canonical printing of expression trees.
//!
//! Printing is a two-pass protocol: [`calc_print_len`] computes the exact
//! number of bytes the canonical rendering occupies, then the renderer
//! appends the text into a buffer reserved to that size. The two passes
//! must agree exactly; a mismatch means the printer itself is wrong and
//! is treated as a fatal assertion, not a recoverable error.
//!
//! Rendering rules:
//!
//! - string literals are double-quoted with embedded `"` escaped as `\"`
//! - time literals are single-quoted
//! - binary operators print as `left op right` with single spaces
//! - user parenthesization prints as `(` inner `)`
//! - an unfolded unary minus prints as ` - ` then its operand
//! - numeric literals carry their `" k"` scaling suffix
//!
//! The module also exports evaluation results as JSON for host tooling.

use std::fmt;

use crate::{
    ast::{ExprTree, Unit},
    value::Value,
};

/// Exact byte length of the canonical rendering.
pub fn calc_print_len(expr: &ExprTree) -> usize {
    match expr {
        ExprTree::Variable(name) => name.len(),
        ExprTree::Integer { value, unit } => {
            let mut length = value.to_string().len();
            if unit.is_kilo() {
                length += 2; // for " k"
            }
            length
        }
        ExprTree::Float { value, unit } => {
            let mut length = format!("{:.6}", value).len();
            if unit.is_kilo() {
                length += 2; // for " k"
            }
            length
        }
        ExprTree::Str(s) => {
            // embedded quote marks print escaped, two bytes each
            let escaped: usize = s.bytes().map(|b| if b == b'"' { 2 } else { 1 }).sum();
            escaped + 2 // opening and closing quote marks
        }
        ExprTree::Time(t) => t.len() + 2,
        ExprTree::Boolean(b) => {
            if *b {
                4 // TRUE
            } else {
                5 // FALSE
            }
        }
        ExprTree::Undefined => 9,
        ExprTree::Error => 5,
        ExprTree::Paren(inner) => calc_print_len(inner) + 2,
        ExprTree::Negate(inner) => calc_print_len(inner) + 3, // for " - "
        ExprTree::BinaryOp { op, left, right } => {
            calc_print_len(left) + op.symbol().len() + 2 + calc_print_len(right)
        }
        ExprTree::Call { name, args } => {
            let mut length = name.len() + 1; // name and left paren
            for (i, arg) in args.iter().enumerate() {
                length += calc_print_len(arg);
                if i + 1 < args.len() {
                    length += 2; // for ", "
                }
            }
            length + 1 // right paren
        }
    }
}

fn render_into(expr: &ExprTree, out: &mut String) {
    match expr {
        ExprTree::Variable(name) => out.push_str(name),
        ExprTree::Integer { value, unit } => {
            out.push_str(&value.to_string());
            if unit.is_kilo() {
                out.push_str(" k");
            }
        }
        ExprTree::Float { value, unit } => {
            out.push_str(&format!("{:.6}", value));
            if unit.is_kilo() {
                out.push_str(" k");
            }
        }
        ExprTree::Str(s) => {
            out.push('"');
            for ch in s.chars() {
                if ch == '"' {
                    out.push('\\');
                }
                out.push(ch);
            }
            out.push('"');
        }
        ExprTree::Time(t) => {
            out.push('\'');
            out.push_str(t);
            out.push('\'');
        }
        ExprTree::Boolean(b) => out.push_str(if *b { "TRUE" } else { "FALSE" }),
        ExprTree::Undefined => out.push_str("UNDEFINED"),
        ExprTree::Error => out.push_str("ERROR"),
        ExprTree::Paren(inner) => {
            out.push('(');
            render_into(inner, out);
            out.push(')');
        }
        ExprTree::Negate(inner) => {
            out.push_str(" - ");
            render_into(inner, out);
        }
        ExprTree::BinaryOp { op, left, right } => {
            render_into(left, out);
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            render_into(right, out);
        }
        ExprTree::Call { name, args } => {
            out.push_str(name);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                render_into(arg, out);
                if i + 1 < args.len() {
                    out.push_str(", ");
                }
            }
            out.push(')');
        }
    }
}

/// Render a tree to its canonical source text.
///
/// Runs both print passes and asserts they agree; disagreement is an
/// internal consistency violation.
pub fn render(expr: &ExprTree) -> String {
    let expected = calc_print_len(expr);
    let mut out = String::with_capacity(expected);
    render_into(expr, &mut out);
    assert_eq!(
        expected,
        out.len(),
        "print length pass disagrees with rendering"
    );
    out
}

impl fmt::Display for ExprTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self))
    }
}

/// Export an evaluation result as a JSON value.
///
/// Undefined and Error map to their keyword strings, the same text they
/// display as; times become plain strings.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Integer(n) => serde_json::Value::from(*n),
        Value::Float(n) => serde_json::Value::from(*n),
        Value::Boolean(b) => serde_json::Value::from(*b),
        Value::Str(s) | Value::Time(s) => serde_json::Value::from(s.as_str()),
        Value::Undefined => serde_json::Value::from("UNDEFINED"),
        Value::Error => serde_json::Value::from("ERROR"),
        Value::Null => serde_json::Value::Null,
    }
}

//! # ClassAd Expression Language - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for ClassAd
//! expressions: the typed, dynamically evaluated expression language used
//! to describe jobs, machines, and policies, evaluated against a pair of
//! cooperating attribute records.
//!
//! ## Architecture Overview
//!
//! The AST module is organized into focused submodules:
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression tree nodes (literals, operators, calls)
//! - **[operators]** - Binary operators (arithmetic, comparison, logical)
//!
//! ## Core Concepts
//!
//! ### Two-record evaluation
//!
//! An expression is evaluated against a MY record and a TARGET record.
//! Unprefixed names search MY first, then TARGET; a `MY.` or `TARGET.`
//! prefix pins the search to one side:
//!
//! ```text
//! Requirements = TARGET.Memory >= MY.ImageSize
//! ```
//!
//! ### Value taxonomy
//!
//! Evaluation produces a typed [`Value`](crate::Value). Looking up an
//! attribute that exists nowhere yields UNDEFINED (legitimately unknown);
//! type mismatches, arity violations, and evaluation cycles yield ERROR.
//! Both propagate through operators as values, never as panics.
//!
//! ### Canonical printing
//!
//! Every tree prints back to canonical source text (see
//! [`output`](crate::output)), with string quotes escaped, time literals
//! single-quoted, and user parenthesization preserved.
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::{ExprTree, Unit};
pub use operators::BinOp;
pub use tokens::Token;

//! Query language: lexing, parsing and name binding.
//!
//! Parsing is split in two. [`parse_query`] turns text into an [`Expr`]
//! without looking at any distribution; [`bind`] then resolves the names
//! and states of that tree against a [`VariableCatalog`](crate::catalog::VariableCatalog).

pub mod ast;
pub mod bind;
pub mod lexer;
pub mod parser;

pub use ast::{BinOp, BoundSpec, Expr, Query, StateSelector, VarSpec};
pub use bind::bind;
pub use lexer::{lex, Span, Token, TokenKind};
pub use parser::parse_query;

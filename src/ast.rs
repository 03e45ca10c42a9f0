//! # UTL-X Abstract Syntax Tree
//!
//! A script is a header of directives, a `---` separator and a single content
//! expression that maps the input tree to the output tree:
//!
//! ```text
//! %utlx 1.0
//! input json
//! output json
//! ---
//! {
//!   let lines = $input.order.lines,
//!   id: $input.order.@id,
//!   count: lines |> count(),
//!   ...$input.defaults
//! }
//! ```
//!
//! ## Submodules
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes, including the `Errored` placeholder
//! - **[operators]** - Binary/unary operators and the precedence table
//! - **[program]** - Header directives and the compiled program
//!
//! The expression variant set is closed: every consumer matches exhaustively,
//! so adding an operator or node kind is a compile-checked change.
pub mod expressions;
pub mod operators;
pub mod program;
pub mod tokens;

pub use expressions::{Expr, ExprKind, Literal, MemberKey, ObjectEntry};
pub use operators::{Assoc, BinOp, CONDITIONAL_LEVEL, Infix, PIPE_LEVEL, UnaryOp};
pub use program::{Directive, Program};
pub use tokens::{Token, TokenKind};

pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod codec;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod stdlib;
pub mod transformation;
pub mod udm;

pub use ast::{BinOp, Expr, ExprKind, Program, Token};
pub use codec::{Codec, CodecError, JsonCodec};
pub use config::{Config, Limits};
pub use diagnostics::{Diagnostic, Diagnostics, ErrorKind, Location, ParseError, Section, Severity};
pub use error::{Error, Result};
pub use evaluator::{CancellationToken, Env, EvalError, Evaluation, Evaluator};
pub use lexer::{Lexer, tokenize};
pub use parser::{ParseOutcome, Parser, parse};
pub use stdlib::{Builtins, Stdlib};
pub use transformation::{Report, Transformation, validate};
pub use udm::Udm;

use std::fmt;

use crate::ast::TokenKind;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    // Arithmetic
    /// Exponentiation (`**`)
    Power,
    /// Multiplication (`*`)
    Multiply,
    /// Division (`/`)
    Divide,
    /// Modulo (`%`)
    Modulo,
    /// Addition or string concatenation (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,

    // Comparison
    /// Less than (`<`)
    LessThan,
    /// Greater than (`>`)
    GreaterThan,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than or equal (`>=`)
    GreaterEqual,
    /// Equal (`==`)
    Equal,
    /// Not equal (`!=`)
    NotEqual,

    // Logical
    /// Logical AND (`&&`)
    And,
    /// Logical OR (`||`)
    Or,

    // Null-coalescing
    /// Null-coalescing (`??`)
    NullCoalesce,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

/// What an infix token builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Infix {
    Binary(BinOp),
    Pipe,
}

/// Binding level of `if (c) a else b`; both branches stop before `|>`.
pub const CONDITIONAL_LEVEL: u8 = 11;
/// Binding level of `|>`, the loosest operator.
pub const PIPE_LEVEL: u8 = 12;

/// Infix operator table. A lower level binds tighter.
///
/// | Level | Operators            | Assoc |
/// |-------|----------------------|-------|
/// | 3     | `**`                 | right |
/// | 4     | `*` `/` `%`          | left  |
/// | 5     | `+` `-`              | left  |
/// | 6     | `<` `>` `<=` `>=`    | left  |
/// | 7     | `==` `!=`            | left  |
/// | 8     | `&&`                 | left  |
/// | 9     | `\|\|`               | left  |
/// | 10    | `??`                 | left  |
/// | 12    | `\|>`                | right |
///
/// Levels 1 (postfix `.`, `?.`, `[]`, calls, `=>`, `...`) and 2 (unary) are
/// handled by the prefix/postfix parsers; level 11 is `if ... else`.
pub fn infix(kind: &TokenKind) -> Option<(Infix, u8, Assoc)> {
    use Assoc::*;
    let entry = match kind {
        TokenKind::StarStar => (Infix::Binary(BinOp::Power), 3, Right),
        TokenKind::Star => (Infix::Binary(BinOp::Multiply), 4, Left),
        TokenKind::Slash => (Infix::Binary(BinOp::Divide), 4, Left),
        TokenKind::Percent => (Infix::Binary(BinOp::Modulo), 4, Left),
        TokenKind::Plus => (Infix::Binary(BinOp::Add), 5, Left),
        TokenKind::Minus => (Infix::Binary(BinOp::Subtract), 5, Left),
        TokenKind::Lt => (Infix::Binary(BinOp::LessThan), 6, Left),
        TokenKind::Gt => (Infix::Binary(BinOp::GreaterThan), 6, Left),
        TokenKind::LtEq => (Infix::Binary(BinOp::LessEqual), 6, Left),
        TokenKind::GtEq => (Infix::Binary(BinOp::GreaterEqual), 6, Left),
        TokenKind::EqEq => (Infix::Binary(BinOp::Equal), 7, Left),
        TokenKind::NotEq => (Infix::Binary(BinOp::NotEqual), 7, Left),
        TokenKind::AndAnd => (Infix::Binary(BinOp::And), 8, Left),
        TokenKind::OrOr => (Infix::Binary(BinOp::Or), 9, Left),
        TokenKind::QuestionQuestion => (Infix::Binary(BinOp::NullCoalesce), 10, Left),
        TokenKind::PipeForward => (Infix::Pipe, PIPE_LEVEL, Right),
        _ => return None,
    };
    Some(entry)
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Power => "**",
            BinOp::Multiply => "*",
            BinOp::Divide => "/",
            BinOp::Modulo => "%",
            BinOp::Add => "+",
            BinOp::Subtract => "-",
            BinOp::LessThan => "<",
            BinOp::GreaterThan => ">",
            BinOp::LessEqual => "<=",
            BinOp::GreaterEqual => ">=",
            BinOp::Equal => "==",
            BinOp::NotEqual => "!=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::NullCoalesce => "??",
        }
    }
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Negate => "-",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

use std::sync::Arc;

use crate::ast::{BinOp, UnaryOp};
use crate::diagnostics::Location;

/// An expression node and where it starts in the source.
///
/// Equality compares structure only, so an AST re-parsed from its printed
/// form equals the original even though every location moved.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub location: Location,
}

impl Expr {
    pub fn new(kind: ExprKind, location: Location) -> Self {
        Expr { kind, location }
    }

    /// Placeholder for a sub-expression that failed to parse.
    pub fn errored(location: Location) -> Self {
        Expr::new(ExprKind::Errored, location)
    }

    pub fn is_errored(&self) -> bool {
        matches!(self.kind, ExprKind::Errored)
    }

    /// True if this tree contains an [`ExprKind::Errored`] node anywhere.
    pub fn contains_errors(&self) -> bool {
        match &self.kind {
            ExprKind::Errored => true,
            ExprKind::Literal(_) | ExprKind::Identifier(_) => false,
            ExprKind::Binary { left, right, .. } => {
                left.contains_errors() || right.contains_errors()
            }
            ExprKind::Unary { operand, .. } => operand.contains_errors(),
            ExprKind::Member { object, .. } => object.contains_errors(),
            ExprKind::Index { object, index } => {
                object.contains_errors() || index.contains_errors()
            }
            ExprKind::Call { callee, args } => {
                callee.contains_errors() || args.iter().any(Expr::contains_errors)
            }
            ExprKind::Lambda { body, .. } => body.contains_errors(),
            ExprKind::Pipe { source, target } => {
                source.contains_errors() || target.contains_errors()
            }
            ExprKind::Object(entries) => entries.iter().any(|entry| match entry {
                ObjectEntry::Property { value, .. }
                | ObjectEntry::Attribute { value, .. }
                | ObjectEntry::Let { value, .. } => value.contains_errors(),
                ObjectEntry::Spread(expr) => expr.contains_errors(),
            }),
            ExprKind::Array(items) => items.iter().any(Expr::contains_errors),
            ExprKind::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.contains_errors()
                    || then_branch.contains_errors()
                    || else_branch.contains_errors()
            }
        }
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Constant value
    ///
    /// # Example
    /// ```text
    /// 42, 3.5, "hello", true, null
    /// ```
    Literal(Literal),

    /// Reference to a binding
    ///
    /// # Example
    /// ```text
    /// $input
    /// total
    /// ```
    Identifier(String),

    /// Binary operation (arithmetic, comparison, logical, `??`)
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Prefix `!` or `-`
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Member access
    ///
    /// # Examples
    /// ```text
    /// $input.order
    /// $input.order?.customer
    /// $input.order.@id
    /// ```
    Member {
        object: Box<Expr>,
        key: MemberKey,
        safe: bool,
    },

    /// Computed access
    ///
    /// # Examples
    /// ```text
    /// $input.items[0]
    /// $input["odd key"]
    /// ```
    Index { object: Box<Expr>, index: Box<Expr> },

    /// Function or closure call
    ///
    /// # Example
    /// ```text
    /// upper($input.name)
    /// ```
    Call { callee: Box<Expr>, args: Vec<Expr> },

    /// Lambda
    ///
    /// # Examples
    /// ```text
    /// x => x * 2
    /// (acc, x) => acc + x
    /// ```
    Lambda { params: Vec<String>, body: Arc<Expr> },

    /// Pipe: `source |> target`
    Pipe { source: Box<Expr>, target: Box<Expr> },

    /// Object literal, entries in source order
    ///
    /// # Example
    /// ```text
    /// { ...$input.base, let t = 2, @id: "x", total: t * 10 }
    /// ```
    Object(Vec<ObjectEntry>),

    /// Array literal
    Array(Vec<Expr>),

    /// `if (condition) then_branch else else_branch`
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// A sub-expression that failed to parse; its error is already reported.
    Errored,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

/// The key of a member access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKey {
    /// `.name`
    Property(String),
    /// `.@name`
    Attribute(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectEntry {
    /// `key: value`
    Property { key: String, value: Expr },
    /// `@name: value`, sets an attribute on the built object
    Attribute { name: String, value: Expr },
    /// `...expr`, merges another object's properties at this position
    Spread(Expr),
    /// `let name = value`, visible to later entries only
    Let { name: String, value: Expr },
}

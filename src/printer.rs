//! Canonical source rendering of parsed scripts.
//!
//! Every compound expression is wrapped in parentheses so the printed text
//! does not depend on operator precedence. Parsing the output again yields a
//! structurally equal AST for any tree without `Errored` nodes.
//!
//! ```
//! use utlx_core::{Config, parse, printer::print_program};
//!
//! let outcome = parse("%utlx 1.0\n---\n1 + 2 * 3", &Config::new(10));
//! let program = outcome.program().unwrap();
//! assert_eq!(print_program(program), "%utlx 1.0\n---\n(1 + (2 * 3))\n");
//! ```

use crate::ast::{Directive, Expr, ExprKind, Literal, MemberKey, ObjectEntry, Program};

/// Source printer for programs and expressions.
pub struct ScriptPrinter {
    /// One object entry / array element per line
    pretty: bool,
}

impl ScriptPrinter {
    pub fn new(pretty: bool) -> Self {
        ScriptPrinter { pretty }
    }

    pub fn print_program(&self, program: &Program) -> String {
        let mut out = String::new();
        for directive in &program.directives {
            out.push_str(&self.print_directive(directive));
            out.push('\n');
        }
        out.push_str("---\n");
        out.push_str(&self.print_expr(&program.content, 0));
        out.push('\n');
        out
    }

    fn print_directive(&self, directive: &Directive) -> String {
        let mut line = format!("{} {}", directive.name, directive.value);
        let separator = if directive.name == "schema" { ':' } else { '=' };
        for (key, value) in &directive.params {
            line.push(' ');
            line.push_str(key);
            line.push(separator);
            line.push_str(value);
        }
        line
    }

    pub fn print_expr(&self, expr: &Expr, indent: usize) -> String {
        match &expr.kind {
            ExprKind::Literal(literal) => self.print_literal(literal),
            ExprKind::Identifier(name) => name.clone(),
            ExprKind::Binary { op, left, right } => format!(
                "({} {} {})",
                self.print_expr(left, indent),
                op,
                self.print_expr(right, indent)
            ),
            ExprKind::Unary { op, operand } => {
                format!("({}{})", op, self.print_expr(operand, indent))
            }
            ExprKind::Member { object, key, safe } => {
                let access = if *safe { "?." } else { "." };
                let key = match key {
                    MemberKey::Property(name) => self.print_key(name),
                    MemberKey::Attribute(name) => format!("@{}", name),
                };
                format!("{}{}{}", self.print_expr(object, indent), access, key)
            }
            ExprKind::Index { object, index } => format!(
                "{}[{}]",
                self.print_expr(object, indent),
                self.print_expr(index, indent)
            ),
            ExprKind::Call { callee, args } => {
                let args: Vec<String> = args.iter().map(|a| self.print_expr(a, indent)).collect();
                format!("{}({})", self.print_expr(callee, indent), args.join(", "))
            }
            ExprKind::Lambda { params, body } => format!(
                "(({}) => {})",
                params.join(", "),
                self.print_expr(body, indent)
            ),
            ExprKind::Pipe { source, target } => format!(
                "({} |> {})",
                self.print_expr(source, indent),
                self.print_expr(target, indent)
            ),
            ExprKind::Object(entries) => self.print_object(entries, indent),
            ExprKind::Array(items) => {
                let items: Vec<String> = items
                    .iter()
                    .map(|item| self.print_expr(item, indent + 1))
                    .collect();
                self.wrap('[', ']', items, indent)
            }
            ExprKind::Conditional {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "(if ({}) {} else {})",
                self.print_expr(condition, indent),
                self.print_expr(then_branch, indent),
                self.print_expr(else_branch, indent)
            ),
            ExprKind::Errored => "<error>".to_string(),
        }
    }

    fn print_object(&self, entries: &[ObjectEntry], indent: usize) -> String {
        let items: Vec<String> = entries
            .iter()
            .map(|entry| match entry {
                ObjectEntry::Property { key, value } => format!(
                    "{}: {}",
                    self.print_key(key),
                    self.print_expr(value, indent + 1)
                ),
                ObjectEntry::Attribute { name, value } => {
                    format!("@{}: {}", name, self.print_expr(value, indent + 1))
                }
                ObjectEntry::Spread(source) => {
                    format!("...{}", self.print_expr(source, indent + 1))
                }
                ObjectEntry::Let { name, value } => {
                    format!("let {} = {}", name, self.print_expr(value, indent + 1))
                }
            })
            .collect();
        self.wrap('{', '}', items, indent)
    }

    fn wrap(&self, open: char, close: char, items: Vec<String>, indent: usize) -> String {
        if items.is_empty() {
            return format!("{}{}", open, close);
        }
        if self.pretty {
            let inner = self.indent(indent + 1);
            let lines: Vec<String> = items.iter().map(|i| format!("{}{}", inner, i)).collect();
            format!("{}\n{}\n{}{}", open, lines.join(",\n"), self.indent(indent), close)
        } else {
            format!("{}{}{}", open, items.join(", "), close)
        }
    }

    fn print_literal(&self, literal: &Literal) -> String {
        match literal {
            Literal::Null => "null".to_string(),
            Literal::Boolean(b) => b.to_string(),
            Literal::Integer(n) => n.to_string(),
            // Debug keeps the fraction: 1.0, not 1
            Literal::Float(n) => format!("{:?}", n),
            Literal::String(s) => format!("\"{}\"", escape_string(s)),
        }
    }

    /// Bare when the key lexes as a single name, quoted otherwise.
    fn print_key(&self, key: &str) -> String {
        if is_plain_name(key) {
            key.to_string()
        } else {
            format!("\"{}\"", escape_string(key))
        }
    }

    fn indent(&self, level: usize) -> String {
        "  ".repeat(level)
    }
}

fn is_plain_name(key: &str) -> bool {
    let name = key.strip_prefix('$').unwrap_or(key);
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

pub(crate) fn escape_string(s: &str) -> String {
    s.chars()
        .flat_map(|c| match c {
            '"' => vec!['\\', '"'],
            '\\' => vec!['\\', '\\'],
            '\n' => vec!['\\', 'n'],
            '\r' => vec!['\\', 'r'],
            '\t' => vec!['\\', 't'],
            c if c.is_control() => format!("\\u{:04x}", c as u32).chars().collect(),
            c => vec![c],
        })
        .collect()
}

/// Canonical single-line form of a program.
pub fn print_program(program: &Program) -> String {
    ScriptPrinter::new(false).print_program(program)
}

/// Canonical single-line form of an expression.
pub fn print_expr(expr: &Expr) -> String {
    ScriptPrinter::new(false).print_expr(expr, 0)
}

//! Content expressions: precedence climbing over the operator table, postfix
//! chains and composite literals with per-element recovery.

use std::sync::Arc;

use super::{PResult, Parser};
use crate::ast::operators::{self, Assoc};
use crate::ast::{
    CONDITIONAL_LEVEL, Expr, ExprKind, Infix, Literal, MemberKey, ObjectEntry, PIPE_LEVEL,
    TokenKind, UnaryOp,
};
use crate::diagnostics::Location;

impl Parser<'_> {
    pub(crate) fn parse_expression(&mut self) -> PResult<Expr> {
        self.parse_binary(PIPE_LEVEL)
    }

    /// Parse operators whose level is at most `max_level`.
    ///
    /// Every fold adds a level to the tree, so each one counts against the
    /// nesting limit until this call returns.
    fn parse_binary(&mut self, max_level: u8) -> PResult<Expr> {
        let mut left = self.parse_unary()?;
        let mut folds = 0;

        while let Some((infix, level, assoc)) = operators::infix(self.kind()) {
            if level > max_level {
                break;
            }
            self.enter()?;
            folds += 1;
            self.advance();
            let right = match assoc {
                Assoc::Left => self.parse_binary(level - 1)?,
                Assoc::Right => self.parse_binary(level)?,
            };
            let location = left.location;
            let kind = match infix {
                Infix::Binary(op) => ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                Infix::Pipe => ExprKind::Pipe {
                    source: Box::new(left),
                    target: Box::new(right),
                },
            };
            left = Expr::new(kind, location);
        }

        self.leave_by(folds);
        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        self.enter()?;
        let result = self.parse_unary_operand();
        self.leave();
        result
    }

    fn parse_unary_operand(&mut self) -> PResult<Expr> {
        let op = match self.kind() {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Negate,
            _ => return self.parse_postfix(),
        };
        let token = self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            token.location,
        ))
    }

    /// Member access, indexing and calls.
    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary()?;
        let mut links = 0;

        loop {
            let location = expr.location;
            let postfix = matches!(
                self.kind(),
                TokenKind::Dot | TokenKind::QuestionDot | TokenKind::LBracket | TokenKind::LParen
            );
            if !postfix {
                break;
            }
            self.enter()?;
            links += 1;
            match self.kind() {
                TokenKind::Dot | TokenKind::QuestionDot => {
                    let safe = self.check(&TokenKind::QuestionDot);
                    self.advance();
                    expr = match self.parse_member_key()? {
                        Some(key) => Expr::new(
                            ExprKind::Member {
                                object: Box::new(expr),
                                key,
                                safe,
                            },
                            location,
                        ),
                        None => Expr::errored(location),
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    if !self.expect(&TokenKind::RBracket, "']' after index")? {
                        self.recover_to(&TokenKind::RBracket);
                    }
                    expr = Expr::new(
                        ExprKind::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                        },
                        location,
                    );
                }
                TokenKind::LParen => {
                    let open = self.advance();
                    let args = self.parse_delimited(
                        open.location,
                        TokenKind::RParen,
                        "argument list",
                        |p| p.parse_expression().map(Some),
                    )?;
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        location,
                    );
                }
                _ => break,
            }
        }

        self.leave_by(links);
        Ok(expr)
    }

    fn parse_member_key(&mut self) -> PResult<Option<MemberKey>> {
        let key = match self.kind() {
            TokenKind::Identifier(name) | TokenKind::String(name) => {
                MemberKey::Property(name.clone())
            }
            TokenKind::Attribute(name) => MemberKey::Attribute(name.clone()),
            kind => match kind.keyword_text() {
                Some(word) => MemberKey::Property(word.to_string()),
                None => {
                    let message = format!("expected property name after '.', found {}", kind);
                    self.error(message)?;
                    return Ok(None);
                }
            },
        };
        self.advance();
        Ok(Some(key))
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let location = self.current().location;
        let literal = |value| Expr::new(ExprKind::Literal(value), location);

        match self.kind().clone() {
            // Literals
            TokenKind::Integer(n) => {
                self.advance();
                Ok(literal(Literal::Integer(n)))
            }
            TokenKind::Float(n) => {
                self.advance();
                Ok(literal(Literal::Float(n)))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(literal(Literal::String(s)))
            }
            TokenKind::Boolean(b) => {
                self.advance();
                Ok(literal(Literal::Boolean(b)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(literal(Literal::Null))
            }

            // x => body
            TokenKind::Identifier(name) if *self.peek_kind(1) == TokenKind::FatArrow => {
                self.advance();
                self.advance();
                self.parse_lambda_body(vec![name], location)
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expr::new(ExprKind::Identifier(name), location))
            }

            // (a, b) => body
            TokenKind::LParen if self.at_lambda_params() => self.parse_lambda(location),
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                if !self.expect(&TokenKind::RParen, "')' to close group")? {
                    self.recover_to(&TokenKind::RParen);
                }
                Ok(expr)
            }

            TokenKind::LBrace => self.parse_object_literal(),
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::If => self.parse_conditional(),

            // Already reported by the lexer
            TokenKind::Error => {
                self.advance();
                Ok(Expr::errored(location))
            }

            TokenKind::Ellipsis => {
                self.error("spread is only allowed inside object literals")?;
                self.advance();
                let _ = self.parse_unary()?;
                Ok(Expr::errored(location))
            }

            other => {
                self.error(format!("expected expression, found {}", other))?;
                let resumable = matches!(
                    other,
                    TokenKind::Comma
                        | TokenKind::RParen
                        | TokenKind::RBracket
                        | TokenKind::RBrace
                        | TokenKind::Eof
                        | TokenKind::Separator
                );
                if !resumable {
                    self.advance();
                }
                Ok(Expr::errored(location))
            }
        }
    }

    /// `(` followed by zero or more comma separated identifiers, `)` and `=>`.
    fn at_lambda_params(&self) -> bool {
        let mut offset = 1;
        loop {
            match self.peek_kind(offset) {
                TokenKind::Identifier(_) | TokenKind::Comma => offset += 1,
                TokenKind::RParen => return *self.peek_kind(offset + 1) == TokenKind::FatArrow,
                _ => return false,
            }
        }
    }

    fn parse_lambda(&mut self, location: Location) -> PResult<Expr> {
        self.advance(); // (
        let mut params: Vec<String> = Vec::new();
        while let TokenKind::Identifier(name) = self.kind().clone() {
            let at = self.current().location;
            self.advance();
            if params.contains(&name) {
                self.error_at(at, format!("duplicate parameter '{}'", name))?;
            }
            params.push(name);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "')' after lambda parameters")?;
        self.expect(&TokenKind::FatArrow, "'=>' after lambda parameters")?;
        self.parse_lambda_body(params, location)
    }

    fn parse_lambda_body(&mut self, params: Vec<String>, location: Location) -> PResult<Expr> {
        let body = self.parse_expression()?;
        Ok(Expr::new(
            ExprKind::Lambda {
                params,
                body: Arc::new(body),
            },
            location,
        ))
    }

    /// `if (condition) then else otherwise`
    fn parse_conditional(&mut self) -> PResult<Expr> {
        let location = self.advance().location;

        let condition = if self.expect(&TokenKind::LParen, "'(' after 'if'")? {
            let condition = self.parse_expression()?;
            if !self.expect(&TokenKind::RParen, "')' after condition")? {
                self.recover_to(&TokenKind::RParen);
            }
            condition
        } else {
            self.parse_unary()?
        };

        let then_branch = self.parse_binary(CONDITIONAL_LEVEL)?;
        let else_branch = if self.expect(&TokenKind::Else, "'else' branch")? {
            self.parse_binary(CONDITIONAL_LEVEL)?
        } else {
            Expr::errored(self.current().location)
        };

        Ok(Expr::new(
            ExprKind::Conditional {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            location,
        ))
    }

    fn parse_object_literal(&mut self) -> PResult<Expr> {
        let open = self.advance();
        let entries = self.parse_delimited(
            open.location,
            TokenKind::RBrace,
            "object",
            Self::parse_object_entry,
        )?;
        Ok(Expr::new(ExprKind::Object(entries), open.location))
    }

    fn parse_object_entry(&mut self) -> PResult<Option<ObjectEntry>> {
        match self.kind().clone() {
            TokenKind::Ellipsis => {
                self.advance();
                let source = self.parse_expression()?;
                Ok(Some(ObjectEntry::Spread(source)))
            }
            TokenKind::Let => {
                self.advance();
                let TokenKind::Identifier(name) = self.kind().clone() else {
                    let message =
                        format!("expected binding name after 'let', found {}", self.kind());
                    self.error(message)?;
                    self.synchronize();
                    return Ok(None);
                };
                self.advance();
                let value = self.parse_entry_value(&TokenKind::Equals, "'=' after binding name")?;
                Ok(Some(ObjectEntry::Let { name, value }))
            }
            TokenKind::Attribute(name) => {
                self.advance();
                let value = self.parse_entry_value(&TokenKind::Colon, "':' after attribute name")?;
                Ok(Some(ObjectEntry::Attribute { name, value }))
            }
            TokenKind::Identifier(key) | TokenKind::String(key) => {
                self.advance();
                let value = self.parse_entry_value(&TokenKind::Colon, "':' after property name")?;
                Ok(Some(ObjectEntry::Property { key, value }))
            }
            kind => match kind.keyword_text() {
                Some(word) => {
                    self.advance();
                    let value =
                        self.parse_entry_value(&TokenKind::Colon, "':' after property name")?;
                    Ok(Some(ObjectEntry::Property {
                        key: word.to_string(),
                        value,
                    }))
                }
                None => {
                    self.error(format!("expected property name, found {}", kind))?;
                    self.synchronize();
                    Ok(None)
                }
            },
        }
    }

    /// `<delimiter> expr`; a missing delimiter leaves an errored value.
    fn parse_entry_value(&mut self, delimiter: &TokenKind, what: &str) -> PResult<Expr> {
        let location = self.current().location;
        if !self.expect(delimiter, what)? {
            self.synchronize();
            return Ok(Expr::errored(location));
        }
        self.parse_expression()
    }

    fn parse_array_literal(&mut self) -> PResult<Expr> {
        let open = self.advance();
        let elements = self.parse_delimited(
            open.location,
            TokenKind::RBracket,
            "array",
            |p| p.parse_expression().map(Some),
        )?;
        Ok(Expr::new(ExprKind::Array(elements), open.location))
    }

    /// Comma separated items up to `close`. The opening bracket is already
    /// consumed. A malformed item is reported once, skipped up to the next
    /// `,` or bracket and the remaining items are still parsed.
    fn parse_delimited<T>(
        &mut self,
        opened_at: Location,
        close: TokenKind,
        what: &str,
        mut item: impl FnMut(&mut Self) -> PResult<Option<T>>,
    ) -> PResult<Vec<T>> {
        let mut items = Vec::new();

        loop {
            match self.kind() {
                kind if *kind == close => {
                    self.advance();
                    return Ok(items);
                }
                TokenKind::Eof | TokenKind::Separator => {
                    let message =
                        format!("unclosed {} opened at {}, expected {}", what, opened_at, close);
                    self.error(message)?;
                    return Ok(items);
                }
                kind if kind.is_closing() => {
                    let message = format!(
                        "expected {} to close {} opened at {}, found {}",
                        close, what, opened_at, kind
                    );
                    self.error(message)?;
                    return Ok(items);
                }
                _ => {}
            }

            if let Some(parsed) = item(self)? {
                items.push(parsed);
            }

            match self.kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                kind if *kind == close || kind.is_closing() => {}
                TokenKind::Eof | TokenKind::Separator => {}
                kind => {
                    let message = format!("expected ',' or {} in {}, found {}", close, what, kind);
                    self.error(message)?;
                    self.synchronize();
                    self.eat(&TokenKind::Comma);
                }
            }
        }
    }
}

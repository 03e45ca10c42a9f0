//! Recursive-descent parser with error recovery.
//!
//! A script is parsed in three phases that follow its layout: header
//! directives, the `---` separator and the content expression. The current
//! phase lives in [`ParseContext`] and tags every diagnostic.
//!
//! Errors do not unwind the parse. A failed sub-expression becomes an
//! [`ExprKind::Errored`](crate::ast::ExprKind::Errored) node, list parsers
//! resynchronize at the next `,` or closing bracket, and a report is dropped
//! when it is only a consequence of the previous one. The only thing that
//! stops the parse early is [`Halt`]: the error ceiling, `failFast` or
//! disabled recovery.

mod expression;
mod header;

use tracing::{debug, trace};

use crate::ast::{Program, Token, TokenKind};
use crate::config::Config;
use crate::diagnostics::{Diagnostic, Diagnostics, ErrorKind, Location, Push, Section};
use crate::lexer::Lexer;

/// Result of parsing a script.
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    /// No errors. Header lint warnings, if any, are kept.
    Success {
        program: Program,
        warnings: Vec<Diagnostic>,
    },
    /// A best-effort program with `Errored` placeholders, plus every diagnostic.
    Partial {
        program: Program,
        diagnostics: Vec<Diagnostic>,
    },
    /// Parsing stopped early; the list ends with the reason.
    Aborted { diagnostics: Vec<Diagnostic> },
}

impl ParseOutcome {
    pub fn program(&self) -> Option<&Program> {
        match self {
            ParseOutcome::Success { program, .. } | ParseOutcome::Partial { program, .. } => {
                Some(program)
            }
            ParseOutcome::Aborted { .. } => None,
        }
    }

    pub fn into_program(self) -> Option<Program> {
        match self {
            ParseOutcome::Success { program, .. } | ParseOutcome::Partial { program, .. } => {
                Some(program)
            }
            ParseOutcome::Aborted { .. } => None,
        }
    }

    /// All diagnostics, warnings included, in discovery order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            ParseOutcome::Success { warnings, .. } => warnings,
            ParseOutcome::Partial { diagnostics, .. } | ParseOutcome::Aborted { diagnostics } => {
                diagnostics
            }
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics().iter().filter(|d| d.is_error())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ParseOutcome::Success { .. })
    }
}

/// The parse must stop; the reason has already been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Halt;

pub(crate) type PResult<T> = Result<T, Halt>;

/// Mutable parse state threaded through every rule.
pub(crate) struct ParseContext<'c> {
    pub section: Section,
    pub diagnostics: Diagnostics,
    config: &'c Config,
    /// Token index of the last reported error
    last_error_at: Option<usize>,
    /// Current expression nesting
    depth: usize,
}

pub struct Parser<'c> {
    tokens: Vec<Token>,
    position: usize,
    lex_errors: Vec<Diagnostic>,
    ctx: ParseContext<'c>,
}

/// Lex and parse a whole script.
pub fn parse(source: &str, config: &Config) -> ParseOutcome {
    Parser::new(Lexer::new(source), config).parse()
}

impl<'c> Parser<'c> {
    pub fn new(lexer: Lexer, config: &'c Config) -> Self {
        let (tokens, lex_errors) = lexer.tokenize();
        Parser {
            tokens,
            position: 0,
            lex_errors,
            ctx: ParseContext {
                section: Section::Header,
                diagnostics: Diagnostics::new(config.max_errors),
                config,
                last_error_at: None,
                depth: 0,
            },
        }
    }

    pub fn parse(mut self) -> ParseOutcome {
        debug!(tokens = self.tokens.len(), "parsing script");
        for error in std::mem::take(&mut self.lex_errors) {
            if self.record(error).is_err() {
                return self.aborted();
            }
        }
        match self.parse_program() {
            Ok(program) => self.finish(program),
            Err(Halt) => self.aborted(),
        }
    }

    fn parse_program(&mut self) -> PResult<Program> {
        let directives = self.parse_header()?;
        self.parse_separator()?;

        self.ctx.section = Section::Content;
        debug!(position = self.position, "parsing content");
        if self.check(&TokenKind::Eof) {
            let location = self.current().location;
            self.error("expected expression after '---'")?;
            return Ok(Program {
                directives,
                content: crate::ast::Expr::errored(location),
            });
        }

        let content = self.parse_expression()?;
        match self.kind() {
            TokenKind::Eof => {}
            TokenKind::Separator => self.error("unexpected second '---' separator")?,
            other => {
                let message = format!("unexpected {} after expression", other);
                self.error(message)?;
            }
        }
        Ok(Program {
            directives,
            content,
        })
    }

    fn finish(self, program: Program) -> ParseOutcome {
        let diagnostics = self.ctx.diagnostics.into_vec();
        if diagnostics.iter().any(Diagnostic::is_error) {
            debug!(count = diagnostics.len(), "parsed with errors");
            ParseOutcome::Partial {
                program,
                diagnostics,
            }
        } else {
            ParseOutcome::Success {
                program,
                warnings: diagnostics,
            }
        }
    }

    fn aborted(self) -> ParseOutcome {
        debug!("parse aborted");
        ParseOutcome::Aborted {
            diagnostics: self.ctx.diagnostics.into_vec(),
        }
    }

    // Token cursor

    fn current(&self) -> &Token {
        // The stream always ends with Eof and the cursor never moves past it.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_kind(&self, offset: usize) -> &TokenKind {
        let index = (self.position + offset).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.kind()) == std::mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or report "expected {what}". Returns whether it was there.
    fn expect(&mut self, kind: &TokenKind, what: &str) -> PResult<bool> {
        if self.eat(kind) {
            return Ok(true);
        }
        let message = format!("expected {}, found {}", what, self.kind());
        self.error(message)?;
        Ok(false)
    }

    // Reporting

    fn error(&mut self, message: impl Into<String>) -> PResult<()> {
        let location = self.current().location;
        self.error_at(location, message)
    }

    fn error_at(&mut self, location: Location, message: impl Into<String>) -> PResult<()> {
        let message = message.into();
        if self.is_cascade() {
            trace!(%location, %message, "suppressed cascading error");
            return Ok(());
        }
        self.ctx.last_error_at = Some(self.position);
        let diagnostic = Diagnostic::error(ErrorKind::Parse, self.ctx.section, location, message);
        self.record(diagnostic)
    }

    fn warn_at(&mut self, location: Location, message: impl Into<String>) -> PResult<()> {
        let diagnostic = Diagnostic::warning(self.ctx.section, location, message);
        self.record(diagnostic)
    }

    /// An error is a consequence of an earlier one when nothing was consumed
    /// since the last report, or when it sits on input the lexer rejected.
    fn is_cascade(&self) -> bool {
        if self.ctx.last_error_at == Some(self.position) {
            return true;
        }
        match self.kind() {
            TokenKind::Error => true,
            TokenKind::Eof => {
                self.position > 0 && self.tokens[self.position - 1].kind == TokenKind::Error
            }
            _ => false,
        }
    }

    fn record(&mut self, diagnostic: Diagnostic) -> PResult<()> {
        let is_error = diagnostic.is_error();
        if self.ctx.diagnostics.push(diagnostic) == Push::Saturated {
            return Err(Halt);
        }
        if is_error && !self.ctx.config.recovers() {
            return Err(Halt);
        }
        Ok(())
    }

    // Recovery

    /// Skip to a token a list or the top level can resume from: a `,` or
    /// `let` at bracket depth zero, an unmatched closing bracket, `---` or the
    /// end of input. Nothing at the resume point is reported again.
    fn synchronize(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.kind() {
                TokenKind::Eof | TokenKind::Separator => break,
                kind if kind.is_opening() => depth += 1,
                kind if kind.is_closing() => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                TokenKind::Comma | TokenKind::Let if depth == 0 => break,
                _ => {}
            }
            self.advance();
        }
        trace!(position = self.position, "synchronized");
        self.ctx.last_error_at = Some(self.position);
    }

    /// Skip past the `close` bracket that ends the current group.
    fn recover_to(&mut self, close: &TokenKind) {
        let mut depth = 0usize;
        loop {
            match self.kind() {
                TokenKind::Eof | TokenKind::Separator => break,
                kind if depth == 0 && kind == close => {
                    self.advance();
                    break;
                }
                kind if kind.is_opening() => depth += 1,
                kind if kind.is_closing() => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
        }
        self.ctx.last_error_at = Some(self.position);
    }

    fn enter(&mut self) -> PResult<()> {
        self.ctx.depth += 1;
        if self.ctx.depth > self.ctx.config.limits.max_depth {
            let location = self.current().location;
            self.ctx.diagnostics.push_terminal(Diagnostic::error(
                ErrorKind::ResourceExhausted,
                self.ctx.section,
                location,
                format!(
                    "expression nested deeper than {} levels",
                    self.ctx.config.limits.max_depth
                ),
            ));
            return Err(Halt);
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.leave_by(1);
    }

    fn leave_by(&mut self, levels: usize) {
        self.ctx.depth -= levels;
    }
}

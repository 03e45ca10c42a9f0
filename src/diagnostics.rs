//! Diagnostics shared by the lexer, parser and evaluator.
//!
//! Every fault the pipeline can observe is described by a [`Diagnostic`]:
//! a message, a source [`Location`], the [`Section`] of the script it was found
//! in, an [`ErrorKind`] from the error taxonomy and a [`Severity`].
//!
//! Diagnostics are kept in discovery order and are never deduplicated. The
//! [`Diagnostics`] collector enforces the caller supplied error ceiling and
//! appends a single terminal `TooManyErrors` marker once it is reached.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 1-based position in the script source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Location { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The logical part of a script a diagnostic originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Section {
    /// Directive lines before the separator
    Header,
    /// The `---` line itself
    Separator,
    /// The transformation expression
    Content,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Header => "HEADER",
            Section::Separator => "SEPARATOR",
            Section::Content => "CONTENT",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// Error taxonomy.
///
/// Everything except the abort kinds is a recoverable, collectable fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Lex,
    Parse,
    UndefinedVariable,
    TypeMismatch,
    MissingPath,
    FunctionCall,
    /// Terminal: the configured error ceiling was reached
    TooManyErrors,
    /// Terminal: recursion depth or step budget exceeded
    ResourceExhausted,
    /// Terminal: the caller cancelled the evaluation
    Cancelled,
    /// Not an error: header lint findings
    Lint,
}

impl ErrorKind {
    /// Stable code used by tooling.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Lex => "UTLX-L001",
            ErrorKind::Parse => "UTLX-P001",
            ErrorKind::UndefinedVariable => "UTLX-E001",
            ErrorKind::TypeMismatch => "UTLX-E002",
            ErrorKind::MissingPath => "UTLX-E003",
            ErrorKind::FunctionCall => "UTLX-E004",
            ErrorKind::TooManyErrors => "UTLX-A001",
            ErrorKind::ResourceExhausted => "UTLX-A002",
            ErrorKind::Cancelled => "UTLX-A003",
            ErrorKind::Lint => "UTLX-W001",
        }
    }

    pub fn is_abort(self) -> bool {
        matches!(
            self,
            ErrorKind::TooManyErrors | ErrorKind::ResourceExhausted | ErrorKind::Cancelled
        )
    }
}

/// A single error or warning.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{location} [{section}] {severity} {}: {message}", .kind.code())]
pub struct Diagnostic {
    pub message: String,
    pub location: Location,
    pub section: Section,
    pub kind: ErrorKind,
    pub severity: Severity,
}

/// Parser diagnostics share the diagnostic representation.
pub type ParseError = Diagnostic;

impl Diagnostic {
    pub fn error(
        kind: ErrorKind,
        section: Section,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            message: message.into(),
            location,
            section,
            kind,
            severity: Severity::Error,
        }
    }

    pub fn warning(section: Section, location: Location, message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            location,
            section,
            kind: ErrorKind::Lint,
            severity: Severity::Warning,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Flat wire shape: `{message, line, column, section, code, severity}`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireDiagnostic<'a> {
    message: &'a str,
    line: usize,
    column: usize,
    section: Section,
    code: &'static str,
    kind: ErrorKind,
    severity: Severity,
}

impl Serialize for Diagnostic {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireDiagnostic {
            message: &self.message,
            line: self.location.line,
            column: self.location.column,
            section: self.section,
            code: self.code(),
            kind: self.kind,
            severity: self.severity,
        }
        .serialize(serializer)
    }
}

/// Outcome of recording an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Push {
    Recorded,
    /// The ceiling was hit; the terminal marker has been appended.
    Saturated,
}

/// Ordered diagnostic collector with an error ceiling.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    error_count: usize,
    max_errors: usize,
    saturated: bool,
}

impl Diagnostics {
    pub fn new(max_errors: usize) -> Self {
        Diagnostics {
            items: Vec::new(),
            error_count: 0,
            max_errors,
            saturated: false,
        }
    }

    /// Record a diagnostic. Warnings never count toward the ceiling.
    ///
    /// Once `max_errors` errors have been recorded, the next error is replaced
    /// by a single `TooManyErrors` marker and every later push is dropped.
    pub fn push(&mut self, diagnostic: Diagnostic) -> Push {
        if self.saturated {
            return Push::Saturated;
        }
        if !diagnostic.is_error() {
            self.items.push(diagnostic);
            return Push::Recorded;
        }
        if self.error_count >= self.max_errors {
            self.saturated = true;
            self.items.push(Diagnostic::error(
                ErrorKind::TooManyErrors,
                diagnostic.section,
                diagnostic.location,
                format!(
                    "too many errors ({} allowed), stopping",
                    self.max_errors
                ),
            ));
            return Push::Saturated;
        }
        self.error_count += 1;
        self.items.push(diagnostic);
        Push::Recorded
    }

    /// Append a terminal abort diagnostic, bypassing the ceiling.
    pub fn push_terminal(&mut self, diagnostic: Diagnostic) {
        if !self.saturated {
            self.saturated = true;
            self.items.push(diagnostic);
        }
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) -> Push {
        for diagnostic in diagnostics {
            if self.push(diagnostic) == Push::Saturated {
                return Push::Saturated;
            }
        }
        Push::Recorded
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn is_saturated(&self) -> bool {
        self.saturated
    }

    pub fn first_error(&self) -> Option<&Diagnostic> {
        self.items.iter().find(|d| d.is_error())
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

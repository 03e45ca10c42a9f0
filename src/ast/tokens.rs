use std::fmt;

use crate::diagnostics::Location;

/// A lexical token with its source text and position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The exact source text the token was read from
    pub lexeme: String,
    pub location: Location,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, location: Location) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            location,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Header
    /// First word of a header line when it names a known directive
    ///
    /// # Examples
    /// ```text
    /// %utlx 1.0
    /// input json
    /// schema ./order.xsd type:xsd
    /// ```
    Directive(String),

    /// Any other whitespace-delimited word on a header line
    Word(String),

    /// End of a header line
    Newline,

    /// A line consisting of `---`
    Separator,

    // Literals
    Integer(i64),
    Float(f64),

    /// String literal enclosed in double or single quotes
    String(String),

    Boolean(bool),
    Null,

    // Names
    /// Identifier, including `$`-prefixed bindings such as `$input`
    Identifier(String),

    /// Attribute name (`@id`)
    Attribute(String),

    // Keywords
    Let,
    If,
    Else,

    // Operators
    /// Addition or string concatenation
    Plus,
    Minus,
    Star,
    /// Exponentiation (`**`)
    StarStar,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    AndAnd,
    OrOr,
    Bang,
    /// Safe navigation (`?.`)
    QuestionDot,
    /// Nullish coalescing (`??`)
    QuestionQuestion,
    /// Lambda arrow (`=>`)
    FatArrow,
    /// Spread (`...`)
    Ellipsis,
    /// Pipe (`|>`)
    PipeForward,

    // Delimiters
    Dot,
    Comma,
    Colon,
    /// `=` in `let` bindings
    Equals,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    /// Input the lexer could not make sense of; already reported
    Error,

    Eof,
}

impl TokenKind {
    pub fn is_closing(&self) -> bool {
        matches!(
            self,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace
        )
    }

    pub fn is_opening(&self) -> bool {
        matches!(
            self,
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace
        )
    }

    /// Keywords that may still be used as property names.
    pub fn keyword_text(&self) -> Option<&'static str> {
        match self {
            TokenKind::Let => Some("let"),
            TokenKind::If => Some("if"),
            TokenKind::Else => Some("else"),
            TokenKind::Boolean(true) => Some("true"),
            TokenKind::Boolean(false) => Some("false"),
            TokenKind::Null => Some("null"),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Directive(name) => write!(f, "directive '{}'", name),
            TokenKind::Word(word) => write!(f, "'{}'", word),
            TokenKind::Newline => f.write_str("end of line"),
            TokenKind::Separator => f.write_str("'---'"),
            TokenKind::Integer(n) => write!(f, "number {}", n),
            TokenKind::Float(n) => write!(f, "number {}", n),
            TokenKind::String(_) => f.write_str("string literal"),
            TokenKind::Boolean(b) => write!(f, "'{}'", b),
            TokenKind::Null => f.write_str("'null'"),
            TokenKind::Identifier(name) => write!(f, "identifier '{}'", name),
            TokenKind::Attribute(name) => write!(f, "attribute '@{}'", name),
            TokenKind::Let => f.write_str("'let'"),
            TokenKind::If => f.write_str("'if'"),
            TokenKind::Else => f.write_str("'else'"),
            TokenKind::Plus => f.write_str("'+'"),
            TokenKind::Minus => f.write_str("'-'"),
            TokenKind::Star => f.write_str("'*'"),
            TokenKind::StarStar => f.write_str("'**'"),
            TokenKind::Slash => f.write_str("'/'"),
            TokenKind::Percent => f.write_str("'%'"),
            TokenKind::EqEq => f.write_str("'=='"),
            TokenKind::NotEq => f.write_str("'!='"),
            TokenKind::Lt => f.write_str("'<'"),
            TokenKind::Gt => f.write_str("'>'"),
            TokenKind::LtEq => f.write_str("'<='"),
            TokenKind::GtEq => f.write_str("'>='"),
            TokenKind::AndAnd => f.write_str("'&&'"),
            TokenKind::OrOr => f.write_str("'||'"),
            TokenKind::Bang => f.write_str("'!'"),
            TokenKind::QuestionDot => f.write_str("'?.'"),
            TokenKind::QuestionQuestion => f.write_str("'??'"),
            TokenKind::FatArrow => f.write_str("'=>'"),
            TokenKind::Ellipsis => f.write_str("'...'"),
            TokenKind::PipeForward => f.write_str("'|>'"),
            TokenKind::Dot => f.write_str("'.'"),
            TokenKind::Comma => f.write_str("','"),
            TokenKind::Colon => f.write_str("':'"),
            TokenKind::Equals => f.write_str("'='"),
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
            TokenKind::LBracket => f.write_str("'['"),
            TokenKind::RBracket => f.write_str("']'"),
            TokenKind::LBrace => f.write_str("'{'"),
            TokenKind::RBrace => f.write_str("'}'"),
            TokenKind::Error => f.write_str("invalid input"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

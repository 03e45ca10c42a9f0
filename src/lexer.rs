//! Source text to tokens.
//!
//! The lexer never stops at a bad character: it records a `Lex` diagnostic,
//! emits a [`TokenKind::Error`] token so the parser knows the spot is already
//! reported, and keeps scanning.
//!
//! Header lines are lexed as whitespace-delimited words; everything after the
//! `---` line is lexed as expression tokens. When the script has no separator
//! line, the leading lines that start with a directive keyword form the header.

use crate::ast::{Token, TokenKind};
use crate::diagnostics::{Diagnostic, ErrorKind, Location, Section};

/// Directive keywords recognised at the start of a header line.
pub const DIRECTIVES: [&str; 4] = ["%utlx", "input", "output", "schema"];

pub fn is_directive_keyword(word: &str) -> bool {
    DIRECTIVES.contains(&word)
}

/// Tokenize a whole script. The token list always ends with `Eof`.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    Lexer::new(source).tokenize()
}

/// Number of leading lines that belong to the header.
fn header_line_count(source: &str) -> usize {
    let lines: Vec<&str> = source.lines().collect();
    if let Some(separator) = lines.iter().position(|line| line.trim() == "---") {
        return separator;
    }
    lines
        .iter()
        .take_while(|line| {
            let trimmed = line.trim();
            trimmed.is_empty()
                || trimmed.starts_with("//")
                || trimmed
                    .split_whitespace()
                    .next()
                    .is_some_and(is_directive_keyword)
        })
        .count()
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    header_lines: usize,
    /// Whether a token has been produced on the current line
    line_has_token: bool,
    diagnostics: Vec<Diagnostic>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            header_lines: header_line_count(input),
            line_has_token: false,
            diagnostics: Vec::new(),
        }
    }

    /// Consume the lexer, producing every token and the lex diagnostics.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        (tokens, self.diagnostics)
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
                self.line_has_token = false;
            } else {
                self.column += 1;
            }
        }
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }

    fn in_header(&self) -> bool {
        self.line <= self.header_lines
    }

    fn section(&self) -> Section {
        if self.in_header() {
            Section::Header
        } else {
            Section::Content
        }
    }

    fn error(&mut self, location: Location, message: impl Into<String>) {
        let section = self.section();
        self.diagnostics
            .push(Diagnostic::error(ErrorKind::Lex, section, location, message));
    }

    fn text_since(&self, start: usize) -> String {
        self.input[start..self.position].iter().collect()
    }

    fn finish(&mut self, kind: TokenKind, start: usize, location: Location) -> Token {
        self.line_has_token = true;
        Token::new(kind, self.text_since(start), location)
    }

    fn single(&mut self, kind: TokenKind, width: usize) -> Token {
        let start = self.position;
        let location = self.location();
        self.advance_by(width);
        self.finish(kind, start, location)
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            if !self.in_header() {
                return self.next_content_token();
            }
            while matches!(self.current_char(), Some(' ' | '\t' | '\r')) {
                self.advance();
            }
            match self.current_char() {
                None => return Token::new(TokenKind::Eof, "", self.location()),
                Some('\n') => {
                    let location = self.location();
                    let had_token = self.line_has_token;
                    self.advance();
                    if had_token {
                        return Token::new(TokenKind::Newline, "\n", location);
                    }
                }
                Some('/') if self.peek_char(1) == Some('/') => self.skip_line_comment(),
                Some(_) => return self.read_header_word(),
            }
        }
    }

    fn read_header_word(&mut self) -> Token {
        let start = self.position;
        let location = self.location();
        let first_on_line = !self.line_has_token;
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                break;
            }
            self.advance();
        }
        let word = self.text_since(start);
        let kind = if first_on_line && is_directive_keyword(&word) {
            TokenKind::Directive(word)
        } else {
            TokenKind::Word(word)
        };
        self.finish(kind, start, location)
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.current_char() {
                Some(ch) if ch.is_whitespace() => self.advance(),
                Some('/') if self.peek_char(1) == Some('/') => self.skip_line_comment(),
                Some('/') if self.peek_char(1) == Some('*') => {
                    let location = self.location();
                    self.advance_by(2);
                    loop {
                        match self.current_char() {
                            None => {
                                self.error(location, "unterminated block comment");
                                break;
                            }
                            Some('*') if self.peek_char(1) == Some('/') => {
                                self.advance_by(2);
                                break;
                            }
                            Some(_) => self.advance(),
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn next_content_token(&mut self) -> Token {
        self.skip_trivia();

        let Some(ch) = self.current_char() else {
            return Token::new(TokenKind::Eof, "", self.location());
        };

        match ch {
            '-' if !self.line_has_token
                && self.peek_char(1) == Some('-')
                && self.peek_char(2) == Some('-')
                && self.peek_char(3) != Some('-') =>
            {
                self.single(TokenKind::Separator, 3)
            }
            '+' => self.single(TokenKind::Plus, 1),
            '-' => self.single(TokenKind::Minus, 1),
            '*' if self.peek_char(1) == Some('*') => self.single(TokenKind::StarStar, 2),
            '*' => self.single(TokenKind::Star, 1),
            '/' => self.single(TokenKind::Slash, 1),
            '%' => self.single(TokenKind::Percent, 1),
            '=' if self.peek_char(1) == Some('=') => self.single(TokenKind::EqEq, 2),
            '=' if self.peek_char(1) == Some('>') => self.single(TokenKind::FatArrow, 2),
            '=' => self.single(TokenKind::Equals, 1),
            '!' if self.peek_char(1) == Some('=') => self.single(TokenKind::NotEq, 2),
            '!' => self.single(TokenKind::Bang, 1),
            '<' if self.peek_char(1) == Some('=') => self.single(TokenKind::LtEq, 2),
            '<' => self.single(TokenKind::Lt, 1),
            '>' if self.peek_char(1) == Some('=') => self.single(TokenKind::GtEq, 2),
            '>' => self.single(TokenKind::Gt, 1),
            '&' if self.peek_char(1) == Some('&') => self.single(TokenKind::AndAnd, 2),
            '|' if self.peek_char(1) == Some('|') => self.single(TokenKind::OrOr, 2),
            '|' if self.peek_char(1) == Some('>') => self.single(TokenKind::PipeForward, 2),
            '?' if self.peek_char(1) == Some('.') => self.single(TokenKind::QuestionDot, 2),
            '?' if self.peek_char(1) == Some('?') => self.single(TokenKind::QuestionQuestion, 2),
            '.' if self.peek_char(1) == Some('.') && self.peek_char(2) == Some('.') => {
                self.single(TokenKind::Ellipsis, 3)
            }
            '.' => self.single(TokenKind::Dot, 1),
            ',' => self.single(TokenKind::Comma, 1),
            ':' => self.single(TokenKind::Colon, 1),
            '(' => self.single(TokenKind::LParen, 1),
            ')' => self.single(TokenKind::RParen, 1),
            '[' => self.single(TokenKind::LBracket, 1),
            ']' => self.single(TokenKind::RBracket, 1),
            '{' => self.single(TokenKind::LBrace, 1),
            '}' => self.single(TokenKind::RBrace, 1),
            '"' | '\'' => self.read_string(ch),
            '@' if self.peek_char(1).is_some_and(is_identifier_start) => {
                let start = self.position;
                let location = self.location();
                self.advance();
                let name = self.read_identifier();
                self.finish(TokenKind::Attribute(name), start, location)
            }
            '$' if self.peek_char(1).is_some_and(is_identifier_start) => {
                let start = self.position;
                let location = self.location();
                self.advance();
                let name = format!("${}", self.read_identifier());
                self.finish(TokenKind::Identifier(name), start, location)
            }
            c if is_identifier_start(c) => {
                let start = self.position;
                let location = self.location();
                let ident = self.read_identifier();
                let kind = match ident.as_str() {
                    "let" => TokenKind::Let,
                    "if" => TokenKind::If,
                    "else" => TokenKind::Else,
                    "true" => TokenKind::Boolean(true),
                    "false" => TokenKind::Boolean(false),
                    "null" => TokenKind::Null,
                    _ => TokenKind::Identifier(ident),
                };
                self.finish(kind, start, location)
            }
            c if c.is_ascii_digit() => self.read_number(),
            c => {
                let location = self.location();
                self.error(location, format!("unexpected character '{}'", c));
                self.single(TokenKind::Error, 1)
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char) -> Token {
        let start = self.position;
        let location = self.location();
        let mut result = String::new();
        let mut malformed = false;
        self.advance(); // opening quote

        loop {
            match self.current_char() {
                None | Some('\n') => {
                    self.error(location, "unterminated string literal");
                    return self.finish(TokenKind::Error, start, location);
                }
                Some(c) if c == quote => {
                    self.advance();
                    // Bad escapes were reported; the literal must not reach the parser
                    let kind = if malformed {
                        TokenKind::Error
                    } else {
                        TokenKind::String(result)
                    };
                    return self.finish(kind, start, location);
                }
                Some('\\') => {
                    let escape_at = self.location();
                    self.advance();
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('"') => result.push('"'),
                        Some('\'') => result.push('\''),
                        Some('\\') => result.push('\\'),
                        Some('/') => result.push('/'),
                        Some('u') => {
                            if let Some(decoded) = self.read_unicode_escape() {
                                result.push(decoded);
                            } else {
                                malformed = true;
                                self.error(escape_at, "invalid unicode escape");
                            }
                            continue;
                        }
                        Some(other) => {
                            malformed = true;
                            let message = format!("invalid escape sequence '\\{}'", other);
                            self.error(escape_at, message);
                        }
                        None => continue,
                    }
                    self.advance();
                }
                Some(c) => {
                    result.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Reads `uXXXX` (cursor on `u`); leaves the cursor after what it consumed.
    fn read_unicode_escape(&mut self) -> Option<char> {
        self.advance(); // u
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self.current_char()?.to_digit(16)?;
            code = code * 16 + digit;
            self.advance();
        }
        char::from_u32(code)
    }

    fn read_number(&mut self) -> Token {
        let start = self.position;
        let location = self.location();
        let mut is_float = false;

        while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        let fraction = self.peek_char(1).is_some_and(|c| c.is_ascii_digit());
        if self.current_char() == Some('.') && fraction {
            is_float = true;
            self.advance();
            while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.current_char(), Some('e' | 'E')) {
            let digits_at = match self.peek_char(1) {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if self.peek_char(digits_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.advance_by(digits_at);
                while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let text = self.text_since(start);
        let kind = if is_float {
            match text.parse::<f64>() {
                Ok(n) if n.is_finite() => TokenKind::Float(n),
                Ok(_) => {
                    self.error(location, format!("float literal '{}' is out of range", text));
                    TokenKind::Error
                }
                Err(_) => {
                    self.error(location, format!("invalid number '{}'", text));
                    TokenKind::Error
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(n) => TokenKind::Integer(n),
                Err(_) => {
                    self.error(location, format!("integer literal '{}' is out of range", text));
                    TokenKind::Error
                }
            }
        };
        self.finish(kind, start, location)
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("--- \nlet if else true false null"),
            vec![
                TokenKind::Separator,
                TokenKind::Let,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::Boolean(true),
                TokenKind::Boolean(false),
                TokenKind::Null,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_header_words() {
        let source = "%utlx 1.0\nschema ./order.xsd type:xsd\n---\n$input";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Directive("%utlx".into()),
                TokenKind::Word("1.0".into()),
                TokenKind::Newline,
                TokenKind::Directive("schema".into()),
                TokenKind::Word("./order.xsd".into()),
                TokenKind::Word("type:xsd".into()),
                TokenKind::Newline,
                TokenKind::Separator,
                TokenKind::Identifier("$input".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_header_without_separator() {
        let source = "input json\n{ a: 1 }";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Directive("input".into()),
                TokenKind::Word("json".into()),
                TokenKind::Newline,
                TokenKind::LBrace,
                TokenKind::Identifier("a".into()),
                TokenKind::Colon,
                TokenKind::Integer(1),
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_locations() {
        let (tokens, _) = tokenize("---\n  a +\n b");
        assert_eq!(tokens[1].location, Location::new(2, 3));
        assert_eq!(tokens[2].location, Location::new(2, 5));
        assert_eq!(tokens[3].location, Location::new(3, 2));
        assert_eq!(tokens[3].lexeme, "b");
    }
}

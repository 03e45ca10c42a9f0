//! Header directives and the `---` separator.

use tracing::debug;

use super::{PResult, Parser};
use crate::ast::{Directive, TokenKind};
use crate::diagnostics::{Location, Section};

/// A whitespace-delimited header word and where it starts.
type Word = (String, Location);

impl Parser<'_> {
    pub(super) fn parse_header(&mut self) -> PResult<Vec<Directive>> {
        self.ctx.section = Section::Header;
        let mut directives: Vec<Directive> = Vec::new();

        loop {
            match self.kind().clone() {
                TokenKind::Newline => {
                    self.advance();
                }
                TokenKind::Directive(name) => {
                    let keyword = self.advance();
                    let words = self.line_words();
                    let Some(directive) = self.parse_directive(name, keyword.location, words)?
                    else {
                        continue;
                    };
                    if directive.name != "schema"
                        && directives.iter().any(|d| d.name == directive.name)
                    {
                        self.warn_at(
                            directive.location,
                            format!(
                                "duplicate '{}' directive, the last one wins",
                                directive.name
                            ),
                        )?;
                    }
                    directives.push(directive);
                }
                TokenKind::Word(word) => {
                    self.error(format!("unknown directive '{}'", word))?;
                    self.advance();
                    self.line_words();
                }
                _ => break,
            }
        }

        debug!(count = directives.len(), "parsed header");
        Ok(directives)
    }

    /// Remaining words on the current header line.
    fn line_words(&mut self) -> Vec<Word> {
        let mut words = Vec::new();
        while let TokenKind::Word(word) = self.kind() {
            words.push((word.clone(), self.current().location));
            self.advance();
        }
        words
    }

    fn parse_directive(
        &mut self,
        name: String,
        location: Location,
        words: Vec<Word>,
    ) -> PResult<Option<Directive>> {
        let mut words = words.into_iter();
        let Some((value, value_location)) = words.next() else {
            let expected = match name.as_str() {
                "%utlx" => "a language version",
                "schema" => "a schema path",
                _ => "a format name",
            };
            self.error_at(location, format!("'{}' expects {}", name, expected))?;
            return Ok(None);
        };
        let rest: Vec<Word> = words.collect();

        let params = match name.as_str() {
            "%utlx" => {
                if !is_version(&value) {
                    let message = format!("invalid language version '{}'", value);
                    self.error_at(value_location, message)?;
                    return Ok(None);
                }
                if let Some((extra, at)) = rest.first() {
                    self.error_at(*at, format!("unexpected '{}' after version", extra))?;
                    return Ok(None);
                }
                Vec::new()
            }
            "schema" => match rest.as_slice() {
                [(option, at)] => match option.split_once(':') {
                    Some(("type", format)) if !format.is_empty() => {
                        vec![("type".to_string(), format.to_string())]
                    }
                    _ => {
                        let message = format!("expected 'type:<format>', found '{}'", option);
                        self.error_at(*at, message)?;
                        return Ok(None);
                    }
                },
                [] => {
                    self.error_at(location, "'schema' expects 'type:<format>' after the path")?;
                    return Ok(None);
                }
                [_, (extra, at), ..] => {
                    self.error_at(*at, format!("unexpected '{}' in schema directive", extra))?;
                    return Ok(None);
                }
            },
            _ => {
                let mut params = Vec::with_capacity(rest.len());
                for (option, at) in rest {
                    match option.split_once('=') {
                        Some((key, val)) if !key.is_empty() => {
                            params.push((key.to_string(), val.to_string()))
                        }
                        _ => {
                            let message =
                                format!("expected 'key=value' option, found '{}'", option);
                            self.error_at(at, message)?;
                            return Ok(None);
                        }
                    }
                }
                params
            }
        };

        Ok(Some(Directive {
            name,
            value,
            params,
            location,
        }))
    }

    /// Expect the `---` line and move to the content section.
    pub(super) fn parse_separator(&mut self) -> PResult<()> {
        if self.check(&TokenKind::Separator) {
            let separator = self.advance();
            self.ctx.section = Section::Separator;
            let trailing = self.current().location;
            if !self.check(&TokenKind::Eof) && trailing.line == separator.location.line {
                self.error_at(trailing, "unexpected input after '---' on the separator line")?;
                while !self.check(&TokenKind::Eof)
                    && self.current().location.line == separator.location.line
                {
                    self.advance();
                }
            }
            return Ok(());
        }

        self.error("expected '---' separator")?;
        if let Some(offset) = self.tokens[self.position..]
            .iter()
            .position(|t| t.kind == TokenKind::Separator)
        {
            self.position += offset + 1;
        }
        Ok(())
    }
}

/// `1`, `1.0`, `2.1.3`
fn is_version(text: &str) -> bool {
    text.split('.')
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

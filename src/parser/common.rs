use super::lexer::{Lexer, Token, TokenKind};
use super::Parser;
use crate::types::SyntaxError;

/// Keywords that begin a command; a statement missing its `;` resumes here.
const COMMAND_KEYWORDS: &[&str] = &["create", "drop", "load", "select"];

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            lexer: Lexer::new(source),
            token: Token::new(TokenKind::EndOfInput, "", 1, 1),
            pending: None,
            lexical_failure: false,
            resume_here: false,
        }
    }

    /// Moves to the next token.
    pub(super) fn advance(&mut self) -> Result<(), SyntaxError> {
        if let Some(token) = self.pending.take() {
            self.token = token;
            return Ok(());
        }
        match self.lexer.next_token() {
            Ok(token) => {
                self.token = token;
                Ok(())
            }
            Err(err) => {
                self.lexical_failure = true;
                Err(err)
            }
        }
    }

    /// Validates the current token's kind and, when `values` is non-empty,
    /// its text.
    pub(super) fn expect_current(
        &self,
        kinds: &[TokenKind],
        values: &[&str],
    ) -> Result<(), SyntaxError> {
        if !kinds.contains(&self.token.kind) {
            let expecting: Vec<String> = kinds.iter().map(ToString::to_string).collect();
            return Err(self.error(format!(
                "Unexpected {} {:?} (expecting {})",
                self.token.kind,
                self.token.text,
                expecting.join(" | ")
            )));
        }
        if !values.is_empty() && !values.contains(&self.token.text.as_str()) {
            return Err(self.error(format!(
                "Unexpected token value {:?} (expecting {})",
                self.token.text,
                values.join(" | ")
            )));
        }
        Ok(())
    }

    /// `advance` followed by `expect_current`.
    pub(super) fn expect_next(
        &mut self,
        kinds: &[TokenKind],
        values: &[&str],
    ) -> Result<(), SyntaxError> {
        self.advance()?;
        self.expect_current(kinds, values)
    }

    pub(super) fn expect_keyword(&self, keyword: &str) -> Result<(), SyntaxError> {
        self.expect_current(&[TokenKind::Keyword], &[keyword])
    }

    pub(super) fn expect_next_keyword(&mut self, keyword: &str) -> Result<(), SyntaxError> {
        self.expect_next(&[TokenKind::Keyword], &[keyword])
    }

    pub(super) fn expect_next_identifier(&mut self) -> Result<String, SyntaxError> {
        self.expect_next(&[TokenKind::Identifier], &[])?;
        Ok(self.token.text.clone())
    }

    /// Every statement ends on a `;` that stays current.
    pub(super) fn expect_terminator(&mut self) -> Result<(), SyntaxError> {
        let result = self.expect_current(&[TokenKind::Operator], &[";"]);
        if result.is_err()
            && self.token.kind == TokenKind::Keyword
            && COMMAND_KEYWORDS.contains(&self.token.text.as_str())
        {
            self.resume_here = true;
        }
        result
    }

    pub(super) fn at_keyword(&self, keyword: &str) -> bool {
        self.token.is(TokenKind::Keyword, keyword)
    }

    pub(super) fn at_operator(&self, op: &str) -> bool {
        self.token.is(TokenKind::Operator, op)
    }

    pub(super) fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, self.token.line, self.token.col, self.source)
    }

    /// Discards the rest of a failed statement.
    ///
    /// Stops after the terminating `;`, at end of input, or in front of a
    /// command keyword that showed up where `;` was expected.
    pub(super) fn recover(&mut self) {
        let lexical = std::mem::take(&mut self.lexical_failure);
        if std::mem::take(&mut self.resume_here) {
            self.pending = Some(self.token.clone());
            return;
        }
        if !lexical && (self.at_operator(";") || self.token.kind == TokenKind::EndOfInput) {
            return;
        }
        loop {
            match self.advance() {
                Ok(()) if self.at_operator(";") || self.token.kind == TokenKind::EndOfInput => {
                    break;
                }
                Ok(()) => {}
                Err(_) => self.lexical_failure = false,
            }
        }
    }
}

// Module declarations
pub mod lexer;
mod statement;
mod common;
mod ddl;
mod dml;
mod queries;

// Re-export all public types
pub use lexer::{Lexer, Token, TokenKind, is_identifier};
pub use statement::{
    Statement,
    TableSource,
    FieldDef,
    Select,
    Projection,
    ProjectionExpr,
    AggregateFunction,
    Condition,
    CompareOp,
    Constant,
    OrderField,
    SortOrder,
};

use crate::types::SyntaxError;

/// Recursive-descent parser over a lazily lexed command text.
///
/// Each grammar rule is one method (see `ddl`, `dml`, `queries`); all of them
/// are built from `expect_current` / `expect_next`.
pub struct Parser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    token: Token,
    /// Token to hand out before lexing further (set by recovery).
    pending: Option<Token>,
    lexical_failure: bool,
    resume_here: bool,
}

impl Parser<'_> {
    /// Parses the next command; `None` at end of input.
    pub fn parse_one(&mut self) -> Result<Option<Statement>, SyntaxError> {
        self.advance()?;
        while self.at_operator(";") {
            self.advance()?;
        }
        if self.token.kind == TokenKind::EndOfInput {
            return Ok(None);
        }
        self.expect_current(&[TokenKind::Keyword], &[])?;
        let statement = match self.token.text.as_str() {
            "create" => self.parse_create()?,
            "drop" => self.parse_drop()?,
            "load" => self.parse_load()?,
            "select" => Statement::Select(self.parse_select()?),
            other => return Err(self.error(format!("Unexpected command: {other}"))),
        };
        Ok(Some(statement))
    }

    /// Position of the first token of the next command, skipping empty
    /// statements; `None` at end of input. The token is not consumed.
    pub fn next_command_location(&mut self) -> Result<Option<(usize, usize)>, SyntaxError> {
        self.advance()?;
        while self.at_operator(";") {
            self.advance()?;
        }
        if self.token.kind == TokenKind::EndOfInput {
            return Ok(None);
        }
        self.pending = Some(self.token.clone());
        Ok(Some((self.token.line, self.token.col)))
    }

    /// Parses every command, stopping at the first syntax error.
    pub fn parse_all(&mut self) -> Result<Vec<Statement>, SyntaxError> {
        let mut statements = Vec::new();
        while let Some(statement) = self.parse_one()? {
            statements.push(statement);
        }
        Ok(statements)
    }
}

/// Error-tolerant iteration: a failed statement yields its `SyntaxError`,
/// is discarded up to its `;`, and parsing continues with the next one.
impl Iterator for Parser<'_> {
    type Item = Result<Statement, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.parse_one() {
            Ok(statement) => statement.map(Ok),
            Err(err) => {
                self.recover();
                Some(Err(err))
            }
        }
    }
}

/// Parses a whole script, stopping at the first syntax error.
pub fn parse_statements(source: &str) -> Result<Vec<Statement>, SyntaxError> {
    Parser::new(source).parse_all()
}

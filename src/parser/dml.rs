/// LOAD DATA rule.
use super::lexer::TokenKind;
use super::statement::Statement;
use super::Parser;
use crate::types::SyntaxError;

impl Parser<'_> {
    /// `LOAD DATA INFILE "path" INTO TABLE name [IGNORE n LINES] ;`
    pub(super) fn parse_load(&mut self) -> Result<Statement, SyntaxError> {
        self.expect_keyword("load")?;
        self.expect_next_keyword("data")?;
        self.expect_next_keyword("infile")?;
        self.expect_next(&[TokenKind::LiteralString], &[])?;
        let infile = self.token.text.clone();

        self.expect_next_keyword("into")?;
        self.expect_next_keyword("table")?;
        self.advance()?;
        let table = self.table_name()?;
        self.advance()?;

        let mut ignore_lines = 0;
        if self.at_keyword("ignore") {
            self.expect_next(&[TokenKind::LiteralNumber], &[])?;
            ignore_lines = self.token.text.parse::<u64>().map_err(|_| {
                self.error(format!(
                    "Line count must be a non-negative whole number, found {}",
                    self.token.text
                ))
            })?;
            self.expect_next_keyword("lines")?;
            self.advance()?;
        }

        self.expect_terminator()?;
        Ok(Statement::LoadData {
            infile,
            table,
            ignore_lines,
        })
    }
}

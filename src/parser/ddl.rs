/// CREATE TABLE and DROP TABLE rules.
use super::lexer::{TokenKind, is_identifier};
use super::statement::{FieldDef, Statement, TableSource};
use super::Parser;
use crate::types::{ScalarType, SyntaxError};

const TYPE_KEYWORDS: &[&str] = &["int", "float", "varchar", "timestamp"];

impl Parser<'_> {
    /// `CREATE TABLE [IF NOT EXISTS] name ( field type {, field type} ) ;`
    /// `CREATE TABLE [IF NOT EXISTS] name AS select ;`
    pub(super) fn parse_create(&mut self) -> Result<Statement, SyntaxError> {
        self.expect_keyword("create")?;
        self.expect_next_keyword("table")?;
        self.advance()?;

        let mut if_not_exists = false;
        if self.at_keyword("if") {
            self.expect_next_keyword("not")?;
            self.expect_next_keyword("exists")?;
            self.advance()?;
            if_not_exists = true;
        }

        let name = self.table_name()?;
        self.advance()?;
        self.expect_current(&[TokenKind::Keyword, TokenKind::Operator], &[])?;

        let source = if self.at_operator("(") {
            let mut fields = Vec::new();
            loop {
                let field = self.expect_next_identifier()?;
                self.expect_next(&[TokenKind::Keyword], TYPE_KEYWORDS)?;
                let scalar_type = ScalarType::from_keyword(&self.token.text)
                    .ok_or_else(|| self.error(format!("Unknown type {}", self.token.text)))?;
                fields.push(FieldDef {
                    name: field,
                    scalar_type,
                });

                self.expect_next(&[TokenKind::Operator], &[",", ")"])?;
                if self.at_operator(")") {
                    self.advance()?;
                    break;
                }
            }
            TableSource::Schema(fields)
        } else {
            self.expect_keyword("as")?;
            self.expect_next_keyword("select")?;
            TableSource::Query(Box::new(self.parse_select()?))
        };

        self.expect_terminator()?;
        Ok(Statement::CreateTable {
            if_not_exists,
            name,
            source,
        })
    }

    /// `DROP TABLE [IF EXISTS] name ;`
    pub(super) fn parse_drop(&mut self) -> Result<Statement, SyntaxError> {
        self.expect_keyword("drop")?;
        self.expect_next_keyword("table")?;
        self.advance()?;

        let mut if_exists = false;
        if self.at_keyword("if") {
            self.expect_next_keyword("exists")?;
            self.advance()?;
            if_exists = true;
        }

        let name = self.table_name()?;
        self.advance()?;
        self.expect_terminator()?;
        Ok(Statement::DropTable { name, if_exists })
    }

    /// Current token as a table name.
    pub(super) fn table_name(&self) -> Result<String, SyntaxError> {
        self.expect_current(&[TokenKind::Identifier], &[])?;
        if !is_identifier(&self.token.text) {
            return Err(self.error(format!("Invalid table name {:?}", self.token.text)));
        }
        Ok(self.token.text.clone())
    }
}

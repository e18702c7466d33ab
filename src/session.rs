use crate::executor::{QueryExecutor, QueryResult};
use crate::parser::{Parser, Statement};
use crate::storage::Catalog;
use crate::types::{DatabaseError, SyntaxError};
use std::path::Path;
use tracing::debug;

/// One user session over a root directory.
///
/// Owns the table cache for its lifetime; statements run one at a time.
#[derive(Debug)]
pub struct Session {
    catalog: Catalog,
}

impl Session {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, DatabaseError> {
        Ok(Self {
            catalog: Catalog::open(root)?,
        })
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn execute(&mut self, stmt: &Statement) -> Result<QueryResult, DatabaseError> {
        debug!(statement = %stmt, "executing");
        QueryExecutor::execute(&mut self.catalog, stmt)
    }

    /// Parses and runs exactly one statement.
    pub fn execute_sql(&mut self, sql: &str) -> Result<QueryResult, DatabaseError> {
        let mut parser = Parser::new(sql);
        let Some(stmt) = parser.parse_one()? else {
            return Err(SyntaxError::new("Expected a command", 1, 1, sql).into());
        };
        if let Some((line, col)) = parser.next_command_location()? {
            return Err(DatabaseError::Syntax(SyntaxError::new(
                "Expected a single command, found another",
                line,
                col,
                sql,
            )));
        }
        self.execute(&stmt)
    }

    /// Runs every statement of a script, in order.
    ///
    /// A syntax error skips only the failing statement; a runtime error
    /// aborts only the current command. Each outcome is handed to `report`
    /// before the next statement starts, so row sequences can be consumed
    /// while their column files are still consistent.
    pub fn run_script<F>(&mut self, sql: &str, mut report: F)
    where
        F: FnMut(Result<QueryResult, DatabaseError>),
    {
        for parsed in Parser::new(sql) {
            let outcome = parsed
                .map_err(DatabaseError::from)
                .and_then(|stmt| self.execute(&stmt));
            report(outcome);
        }
    }
}

use crate::parser::Statement;
use crate::storage::Catalog;
use crate::types::DatabaseError;

use super::ddl::DdlExecutor;
use super::dml::DmlExecutor;
use super::export;
use super::queries::SelectExecutor;
use super::rows::RowStream;

pub struct QueryExecutor;

/// Outcome of one statement.
#[derive(Debug)]
pub enum QueryResult {
    Success(String),
    /// An IF [NOT] EXISTS guard turned the statement into a no-op.
    Skipped(String),
    Rows(RowStream),
}

impl QueryExecutor {
    /// Executes one statement against the tables under the catalog's root.
    pub fn execute(catalog: &mut Catalog, stmt: &Statement) -> Result<QueryResult, DatabaseError> {
        match stmt {
            Statement::CreateTable {
                if_not_exists,
                name,
                source,
            } => DdlExecutor::create_table(catalog, name, source, *if_not_exists),
            Statement::DropTable { name, if_exists } => {
                DdlExecutor::drop_table(catalog, name, *if_exists)
            }
            Statement::LoadData {
                infile,
                table,
                ignore_lines,
            } => DmlExecutor::load_data(catalog, infile, table, *ignore_lines),
            Statement::Select(select) => {
                let stream = SelectExecutor::select(catalog, select)?;
                match &select.outfile {
                    Some(outfile) => {
                        let path = catalog.resolve_path(outfile);
                        let rows = export::export_csv(stream, &path)?;
                        Ok(QueryResult::Success(format!(
                            "{rows} rows written to {}",
                            path.display()
                        )))
                    }
                    None => Ok(QueryResult::Rows(stream)),
                }
            }
        }
    }
}

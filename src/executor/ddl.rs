/// DDL (Data Definition Language) operations
///
/// CREATE TABLE (from a field list or AS SELECT), DROP TABLE
use super::dispatcher::QueryResult;
use super::dml::DmlExecutor;
use super::export;
use super::queries::SelectExecutor;
use super::rows::RowStream;
use crate::parser::{Select, TableSource};
use crate::storage::{Catalog, Table};
use crate::types::DatabaseError;
use std::path::PathBuf;
use tracing::{info, warn};

pub struct DdlExecutor;

impl DdlExecutor {
    /// Execute CREATE TABLE statement
    ///
    /// An existing table is a no-op under IF NOT EXISTS; any other entry of
    /// the same name under the root is always an error.
    pub fn create_table(
        catalog: &mut Catalog,
        name: &str,
        source: &TableSource,
        if_not_exists: bool,
    ) -> Result<QueryResult, DatabaseError> {
        if catalog.table_exists(name) {
            if if_not_exists {
                return Ok(QueryResult::Skipped(format!(
                    "Table '{name}' already exists, skipping"
                )));
            }
            return Err(DatabaseError::TableAlreadyExists(name.to_string()));
        }
        if catalog.directory_exists(name) {
            return Err(DatabaseError::DirectoryAlreadyExists(name.to_string()));
        }

        match source {
            TableSource::Schema(fields) => {
                let table = Table::create(catalog.root(), name, fields)?;
                catalog.insert(table);
                info!(table = name, "created table");
                Ok(QueryResult::Success(format!("Table '{name}' created successfully")))
            }
            TableSource::Query(select) => Self::create_table_as(catalog, name, select),
        }
    }

    /// CREATE TABLE ... AS SELECT
    ///
    /// Column types come from the query's output. The rows go through a
    /// delimited file (the query's OUTFILE if it has one, else a temporary
    /// file) and are loaded like any other input. A failure removes the
    /// half-built table.
    fn create_table_as(
        catalog: &mut Catalog,
        name: &str,
        select: &Select,
    ) -> Result<QueryResult, DatabaseError> {
        let stream = SelectExecutor::select(catalog, select)?;
        let table = Table::create(catalog.root(), name, stream.columns())?;
        catalog.insert(table);

        match Self::populate(catalog, name, stream, select.outfile.as_deref()) {
            Ok(rows) => {
                info!(table = name, rows, "created table from query");
                Ok(QueryResult::Success(format!(
                    "Table '{name}' created successfully with {rows} rows"
                )))
            }
            Err(err) => {
                warn!(table = name, error = %err, "CREATE TABLE AS SELECT failed, dropping table");
                if let Some(table) = catalog.evict(name) {
                    if let Err(drop_err) = table.drop_files() {
                        warn!(table = name, error = %drop_err, "could not remove table directory");
                    }
                }
                Err(err)
            }
        }
    }

    fn populate(
        catalog: &mut Catalog,
        name: &str,
        stream: RowStream,
        outfile: Option<&str>,
    ) -> Result<u64, DatabaseError> {
        // The temporary file lives until this function returns.
        let (path, _temporary): (PathBuf, _) = match outfile {
            Some(outfile) => {
                let path = catalog.resolve_path(outfile);
                export::export_csv(stream, &path)?;
                (path, None)
            }
            None => {
                let mut temporary = tempfile::Builder::new()
                    .prefix("csvdb-")
                    .suffix(".csv")
                    .tempfile()?;
                export::write_csv(stream, temporary.as_file_mut())?;
                (temporary.path().to_path_buf(), Some(temporary))
            }
        };

        let table = catalog.get_mut(name)?;
        let loaded = DmlExecutor::load_into(table, &path, 1)?;
        table.row_count += loaded;
        table.write_manifest()?;
        Ok(loaded)
    }

    /// Execute DROP TABLE statement
    pub fn drop_table(
        catalog: &mut Catalog,
        name: &str,
        if_exists: bool,
    ) -> Result<QueryResult, DatabaseError> {
        if !catalog.table_exists(name) {
            catalog.evict(name);
            if if_exists {
                return Ok(QueryResult::Skipped(format!(
                    "Table '{name}' doesn't exist, skipping"
                )));
            }
            return Err(DatabaseError::TableNotExists(name.to_string()));
        }

        catalog.get(name)?;
        if let Some(table) = catalog.evict(name) {
            table.drop_files()?;
        }
        info!(table = name, "dropped table");
        Ok(QueryResult::Success(format!("Table '{name}' dropped successfully")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{FieldDef, parse_statements, Statement};
    use crate::types::{ScalarType, Value};
    use std::fs;
    use tempfile::TempDir;

    fn schema() -> TableSource {
        TableSource::Schema(vec![
            FieldDef {
                name: "k".to_string(),
                scalar_type: ScalarType::Varchar,
            },
            FieldDef {
                name: "v".to_string(),
                scalar_type: ScalarType::Int,
            },
        ])
    }

    fn entries(root: &TempDir) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(root.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn select(sql: &str) -> Select {
        match parse_statements(sql).unwrap().remove(0) {
            Statement::Select(select) => select,
            other => panic!("not a select: {other:?}"),
        }
    }

    #[test]
    fn test_create_twice() {
        let root = TempDir::new().unwrap();
        let mut catalog = Catalog::open(root.path()).unwrap();
        DdlExecutor::create_table(&mut catalog, "t", &schema(), false).unwrap();
        assert!(matches!(
            DdlExecutor::create_table(&mut catalog, "t", &schema(), false),
            Err(DatabaseError::TableAlreadyExists(_))
        ));
        assert!(matches!(
            DdlExecutor::create_table(&mut catalog, "t", &schema(), true),
            Ok(QueryResult::Skipped(_))
        ));
    }

    #[test]
    fn test_create_over_foreign_directory() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("t")).unwrap();
        let mut catalog = Catalog::open(root.path()).unwrap();
        for if_not_exists in [false, true] {
            assert!(matches!(
                DdlExecutor::create_table(&mut catalog, "t", &schema(), if_not_exists),
                Err(DatabaseError::DirectoryAlreadyExists(_))
            ));
        }
    }

    #[test]
    fn test_drop_outcomes() {
        let root = TempDir::new().unwrap();
        let mut catalog = Catalog::open(root.path()).unwrap();
        assert!(matches!(
            DdlExecutor::drop_table(&mut catalog, "t", false),
            Err(DatabaseError::TableNotExists(_))
        ));
        assert!(matches!(
            DdlExecutor::drop_table(&mut catalog, "t", true),
            Ok(QueryResult::Skipped(_))
        ));

        DdlExecutor::create_table(&mut catalog, "t", &schema(), false).unwrap();
        DdlExecutor::drop_table(&mut catalog, "t", false).unwrap();
        assert!(!catalog.is_cached("t"));
        assert!(entries(&root).is_empty());
    }

    #[test]
    fn test_create_as_select_copies_types_and_rows() {
        let root = TempDir::new().unwrap();
        let mut catalog = Catalog::open(root.path()).unwrap();
        DdlExecutor::create_table(&mut catalog, "src", &schema(), false).unwrap();
        fs::write(root.path().join("in.csv"), "a,1\nb,2\na,3\n").unwrap();
        DmlExecutor::load_data(&mut catalog, "in.csv", "src", 0).unwrap();

        let query = select("SELECT k, SUM(v) AS total FROM src GROUP BY k;");
        let result = DdlExecutor::create_table(
            &mut catalog,
            "totals",
            &TableSource::Query(Box::new(query)),
            false,
        )
        .unwrap();
        assert!(matches!(result, QueryResult::Success(_)));

        let table = catalog.get("totals").unwrap();
        assert_eq!(table.row_count, 2);
        assert_eq!(table.columns[1].scalar_type, ScalarType::Int);
        let totals: Vec<Value> = table.columns[1]
            .open_reader()
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(totals, vec![Value::Int(4), Value::Int(2)]);
        // No temporary file is left under the root.
        assert_eq!(entries(&root), ["in.csv", "src", "totals"]);
    }

    #[test]
    fn test_create_as_select_keeps_outfile() {
        let root = TempDir::new().unwrap();
        let mut catalog = Catalog::open(root.path()).unwrap();
        DdlExecutor::create_table(&mut catalog, "src", &schema(), false).unwrap();

        let query = select("SELECT v INTO OUTFILE \"copy.csv\" FROM src;");
        DdlExecutor::create_table(&mut catalog, "copy", &TableSource::Query(Box::new(query)), false)
            .unwrap();
        assert_eq!(fs::read_to_string(root.path().join("copy.csv")).unwrap(), "v\n");
        assert_eq!(catalog.get("copy").unwrap().row_count, 0);
    }

    #[test]
    fn test_create_as_select_requires_field_names() {
        let root = TempDir::new().unwrap();
        let mut catalog = Catalog::open(root.path()).unwrap();
        DdlExecutor::create_table(&mut catalog, "src", &schema(), false).unwrap();

        let query = select("SELECT COUNT(k) FROM src;");
        assert!(matches!(
            DdlExecutor::create_table(&mut catalog, "n", &TableSource::Query(Box::new(query)), false),
            Err(DatabaseError::InvalidName(name)) if name == "count(k)"
        ));
        assert_eq!(entries(&root), ["src"]);
    }
}

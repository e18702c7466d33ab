/// DML (Data Manipulation Language) operations
///
/// LOAD DATA INFILE: bulk append of comma-separated records.
use super::dispatcher::QueryResult;
use crate::storage::{Catalog, Column, ColumnWriter, Table};
use crate::types::DatabaseError;
use csv::{Reader, StringRecord};
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

pub struct DmlExecutor;

impl DmlExecutor {
    /// Execute LOAD DATA statement
    ///
    /// The manifest is rewritten once, after every record is on disk.
    pub fn load_data(
        catalog: &mut Catalog,
        infile: &str,
        table_name: &str,
        ignore_lines: u64,
    ) -> Result<QueryResult, DatabaseError> {
        let path = catalog.resolve_path(infile);
        if !path.is_file() {
            return Err(DatabaseError::InfileNotExists(infile.to_string()));
        }
        let table = catalog.get_mut(table_name)?;
        let loaded = Self::load_into(table, &path, ignore_lines)?;
        table.row_count += loaded;
        table.write_manifest()?;

        info!(table = table_name, rows = loaded, total = table.row_count, "loaded records");
        Ok(QueryResult::Success(format!("{loaded} rows loaded into {table_name}")))
    }

    /// Appends the records of `path` to every column of `table`.
    ///
    /// On any failure the column files are truncated back to their previous
    /// length so all columns keep the same record count. The manifest is
    /// left to the caller.
    pub fn load_into(table: &Table, path: &Path, ignore_lines: u64) -> Result<u64, DatabaseError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        let mut writers = table
            .columns
            .iter()
            .map(Column::open_writer)
            .collect::<Result<Vec<_>, _>>()?;

        let result = Self::append_records(&mut reader, &mut writers, ignore_lines)
            .and_then(|()| writers.iter_mut().try_for_each(ColumnWriter::flush));
        if let Err(err) = result {
            for writer in writers {
                if let Err(rollback_err) = writer.rollback() {
                    warn!(table = %table.name, error = %rollback_err, "could not restore column file");
                }
            }
            warn!(table = %table.name, error = %err, "load failed, column files restored");
            return Err(err);
        }
        Ok(writers.first().map_or(0, ColumnWriter::records))
    }

    fn append_records(
        reader: &mut Reader<File>,
        writers: &mut [ColumnWriter],
        ignore_lines: u64,
    ) -> Result<(), DatabaseError> {
        let expected = writers.len();
        let mut skipped = 0;
        let mut record = StringRecord::new();
        while reader.read_record(&mut record)? {
            if skipped < ignore_lines {
                skipped += 1;
                continue;
            }
            if record.len() != expected {
                return Err(DatabaseError::MalformedRecord {
                    line: record.position().map_or(0, csv::Position::line),
                    expected,
                    found: record.len(),
                });
            }
            for (writer, field) in writers.iter_mut().zip(record.iter()) {
                writer.append_text(field)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::FieldDef;
    use crate::types::{ScalarType, Value};
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Catalog) {
        let root = TempDir::new().unwrap();
        let fields = [
            FieldDef {
                name: "id".to_string(),
                scalar_type: ScalarType::Int,
            },
            FieldDef {
                name: "name".to_string(),
                scalar_type: ScalarType::Varchar,
            },
        ];
        Table::create(root.path(), "people", &fields).unwrap();
        let catalog = Catalog::open(root.path()).unwrap();
        (root, catalog)
    }

    fn values(catalog: &mut Catalog, field: &str) -> Vec<Value> {
        let table = catalog.get("people").unwrap();
        table
            .column(field)
            .unwrap()
            .open_reader()
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_load_with_header_and_blank_scalar() {
        let (root, mut catalog) = setup();
        fs::write(root.path().join("people.csv"), "id,name\n1,Ann\n,\"Smith, Bob\"\n").unwrap();

        let result = DmlExecutor::load_data(&mut catalog, "people.csv", "people", 1).unwrap();
        assert!(matches!(result, QueryResult::Success(msg) if msg == "2 rows loaded into people"));
        assert_eq!(values(&mut catalog, "id"), vec![Value::Int(1), Value::Null]);
        assert_eq!(
            values(&mut catalog, "name"),
            vec![Value::Varchar("Ann".to_string()), Value::Varchar("Smith, Bob".to_string())]
        );
        assert_eq!(Table::open(root.path(), "people").unwrap().row_count, 2);
    }

    #[test]
    fn test_malformed_record_rolls_back() {
        let (root, mut catalog) = setup();
        fs::write(root.path().join("ok.csv"), "1,Ann\n").unwrap();
        DmlExecutor::load_data(&mut catalog, "ok.csv", "people", 0).unwrap();

        fs::write(root.path().join("bad.csv"), "2,Bob\n3\n").unwrap();
        let err = DmlExecutor::load_data(&mut catalog, "bad.csv", "people", 0).unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::MalformedRecord { line: 2, expected: 2, found: 1 }
        ));
        assert_eq!(values(&mut catalog, "id"), vec![Value::Int(1)]);
        assert_eq!(values(&mut catalog, "name"), vec![Value::Varchar("Ann".to_string())]);
        assert_eq!(Table::open(root.path(), "people").unwrap().row_count, 1);
    }

    #[test]
    fn test_invalid_value_rolls_back() {
        let (root, mut catalog) = setup();
        fs::write(root.path().join("bad.csv"), "1,Ann\nsix,Bob\n").unwrap();
        let err = DmlExecutor::load_data(&mut catalog, "bad.csv", "people", 0).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidValue { .. }));
        assert!(values(&mut catalog, "id").is_empty());
        assert!(values(&mut catalog, "name").is_empty());
    }

    #[test]
    fn test_missing_inputs() {
        let (root, mut catalog) = setup();
        assert!(matches!(
            DmlExecutor::load_data(&mut catalog, "nope.csv", "people", 0),
            Err(DatabaseError::InfileNotExists(path)) if path == "nope.csv"
        ));
        fs::write(root.path().join("in.csv"), "1,a\n").unwrap();
        assert!(matches!(
            DmlExecutor::load_data(&mut catalog, "in.csv", "ghosts", 0),
            Err(DatabaseError::TableNotExists(_))
        ));
    }
}

use super::column::Column;
use super::manifest::{MANIFEST_FILE, ManifestField, TableManifest};
use crate::parser::{FieldDef, is_identifier};
use crate::types::{DatabaseError, ScalarType};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Runtime handle of one table directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub dir: PathBuf,
    pub columns: Vec<Column>,
    pub row_count: u64,
}

impl Table {
    /// True when `dir` holds a manifest and nothing but column files besides it.
    #[must_use]
    pub fn is_table_dir(dir: &Path) -> bool {
        let Ok(entries) = fs::read_dir(dir) else {
            return false;
        };
        let mut has_manifest = false;
        for entry in entries {
            let Ok(entry) = entry else {
                return false;
            };
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name == MANIFEST_FILE {
                has_manifest = true;
                continue;
            }
            let is_file = entry.file_type().is_ok_and(|t| t.is_file());
            if !is_file || !(name.ends_with(".col") || name.ends_with(".pointers")) {
                return false;
            }
        }
        has_manifest
    }

    /// Allocates `<root>/<name>/`, its empty column files and the manifest.
    pub fn create(root: &Path, name: &str, fields: &[FieldDef]) -> Result<Self, DatabaseError> {
        Self::validate_schema(name, fields)?;

        let dir = root.join(name);
        fs::create_dir(&dir)?;
        let columns: Vec<Column> = fields
            .iter()
            .enumerate()
            .map(|(ordinal, def)| Column::new(name, &dir, &def.name, def.scalar_type, ordinal))
            .collect();
        let table = Self {
            name: name.to_string(),
            dir,
            columns,
            row_count: 0,
        };

        let created = table
            .columns
            .iter()
            .try_for_each(Column::create_files)
            .and_then(|()| table.write_manifest());
        if let Err(err) = created {
            if let Err(cleanup_err) = fs::remove_dir_all(&table.dir) {
                warn!(table = name, error = %cleanup_err, "could not remove table directory");
            }
            return Err(err);
        }
        debug!(table = name, columns = table.columns.len(), "created table directory");
        Ok(table)
    }

    /// Re-instantiates a table from its manifest.
    pub fn open(root: &Path, name: &str) -> Result<Self, DatabaseError> {
        let dir = root.join(name);
        let manifest = TableManifest::read(&dir)?;
        let columns = manifest
            .schema
            .iter()
            .enumerate()
            .map(|(ordinal, entry)| {
                let column = Column {
                    table: name.to_string(),
                    field: entry.field.clone(),
                    scalar_type: entry.scalar_type,
                    ordinal,
                    data_path: dir.join(&entry.col_path),
                    pointers_path: entry.pointers_path.as_ref().map(|p| dir.join(p)),
                };
                if column.scalar_type == ScalarType::Varchar
                    && column.pointers_path.is_none()
                {
                    return Err(DatabaseError::CorruptColumn {
                        path: column.data_path,
                        reason: format!("varchar field '{}' has no offset index", entry.field),
                    });
                }
                Ok(column)
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(table = name, rows = manifest.rows, "opened table from manifest");
        Ok(Self {
            name: name.to_string(),
            dir,
            columns,
            row_count: manifest.rows,
        })
    }

    fn validate_schema(name: &str, fields: &[FieldDef]) -> Result<(), DatabaseError> {
        if !is_identifier(name) {
            return Err(DatabaseError::InvalidName(name.to_string()));
        }
        let mut seen = HashSet::new();
        for def in fields {
            if !is_identifier(&def.name) {
                return Err(DatabaseError::InvalidName(def.name.clone()));
            }
            if !seen.insert(def.name.as_str()) {
                return Err(DatabaseError::DuplicateColumn(def.name.clone()));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn manifest(&self) -> TableManifest {
        let schema = self
            .columns
            .iter()
            .map(|column| {
                let (col_path, pointers_path) = Column::file_names(&column.field, column.scalar_type);
                ManifestField {
                    field: column.field.clone(),
                    scalar_type: column.scalar_type,
                    col_path,
                    pointers_path,
                }
            })
            .collect();
        TableManifest {
            name: self.name.clone(),
            rows: self.row_count,
            cols: self.columns.len(),
            schema,
        }
    }

    pub fn write_manifest(&self) -> Result<(), DatabaseError> {
        self.manifest().write(&self.dir)
    }

    /// Deletes every file in the table directory, then the directory.
    pub fn drop_files(&self) -> Result<(), DatabaseError> {
        for entry in fs::read_dir(&self.dir)? {
            fs::remove_file(entry?.path())?;
        }
        fs::remove_dir(&self.dir)?;
        debug!(table = %self.name, "removed table directory");
        Ok(())
    }

    pub fn column(&self, field: &str) -> Result<&Column, DatabaseError> {
        self.columns
            .iter()
            .find(|c| c.field == field)
            .ok_or_else(|| DatabaseError::ColumnNotFound {
                table: self.name.clone(),
                field: field.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fields() -> Vec<FieldDef> {
        vec![
            FieldDef {
                name: "title".to_string(),
                scalar_type: ScalarType::Varchar,
            },
            FieldDef {
                name: "year".to_string(),
                scalar_type: ScalarType::Int,
            },
        ]
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_create_lays_out_directory() {
        let root = TempDir::new().unwrap();
        let table = Table::create(root.path(), "movies", &fields()).unwrap();
        assert_eq!(
            file_names(&table.dir),
            ["table.json", "title.col", "title.pointers", "year.col"]
        );
        assert!(Table::is_table_dir(&table.dir));
        assert_eq!(Table::open(root.path(), "movies").unwrap(), table);
    }

    #[test]
    fn test_create_then_drop_leaves_root_empty() {
        let root = TempDir::new().unwrap();
        let table = Table::create(root.path(), "movies", &fields()).unwrap();
        table.drop_files().unwrap();
        assert!(file_names(root.path()).is_empty());
    }

    #[test]
    fn test_foreign_files_disqualify_directory() {
        let root = TempDir::new().unwrap();
        let table = Table::create(root.path(), "movies", &fields()).unwrap();
        fs::write(table.dir.join("notes.txt"), "hi").unwrap();
        assert!(!Table::is_table_dir(&table.dir));

        let plain = root.path().join("plain");
        fs::create_dir(&plain).unwrap();
        assert!(!Table::is_table_dir(&plain));
    }

    #[test]
    fn test_schema_validation() {
        let root = TempDir::new().unwrap();
        let mut duplicated = fields();
        duplicated.push(duplicated[0].clone());
        assert!(matches!(
            Table::create(root.path(), "t", &duplicated),
            Err(DatabaseError::DuplicateColumn(name)) if name == "title"
        ));
        assert!(matches!(
            Table::create(root.path(), "sum(b)", &fields()),
            Err(DatabaseError::InvalidName(_))
        ));
        assert!(file_names(root.path()).is_empty());
    }

    #[test]
    fn test_failed_create_removes_directory() {
        let root = TempDir::new().unwrap();
        // A valid identifier whose column file name exceeds the file system limit.
        let long = FieldDef {
            name: "f".repeat(300),
            scalar_type: ScalarType::Int,
        };
        assert!(matches!(
            Table::create(root.path(), "wide", &[long]),
            Err(DatabaseError::Io(_))
        ));
        assert!(file_names(root.path()).is_empty());
    }

    #[test]
    fn test_column_lookup() {
        let root = TempDir::new().unwrap();
        let table = Table::create(root.path(), "movies", &fields()).unwrap();
        assert_eq!(table.column("year").unwrap().ordinal, 1);
        assert_eq!(table.column("title").unwrap().ordinal, 0);
        assert!(matches!(
            table.column("score"),
            Err(DatabaseError::ColumnNotFound { .. })
        ));
        let names: Vec<&str> = table.columns.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(names, ["title", "year", "score"]);
    }
}

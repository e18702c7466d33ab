use super::table::Table;
use crate::types::DatabaseError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Session-scoped table cache over one root directory.
///
/// Handles are loaded from their manifest on first reference and kept until
/// the table is dropped or the catalog is discarded.
#[derive(Debug)]
pub struct Catalog {
    root: PathBuf,
    tables: HashMap<String, Table>,
}

impl Catalog {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, DatabaseError> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(DatabaseError::RootNotDirectory(root));
        }
        Ok(Self {
            root,
            tables: HashMap::new(),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative INFILE / OUTFILE paths are taken from the root directory.
    #[must_use]
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    #[must_use]
    pub fn table_exists(&self, name: &str) -> bool {
        Table::is_table_dir(&self.root.join(name))
    }

    /// True when anything, table or not, already occupies `<root>/<name>`.
    #[must_use]
    pub fn directory_exists(&self, name: &str) -> bool {
        self.root.join(name).exists()
    }

    /// Looks a table up, loading it on a cache miss.
    pub fn get(&mut self, name: &str) -> Result<&Table, DatabaseError> {
        self.get_mut(name).map(|table| &*table)
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Table, DatabaseError> {
        if !self.table_exists(name) {
            self.tables.remove(name);
            return Err(DatabaseError::TableNotExists(name.to_string()));
        }
        if !self.tables.contains_key(name) {
            let table = Table::open(&self.root, name)?;
            debug!(table = name, "cached table handle");
            self.tables.insert(name.to_string(), table);
        }
        self.tables
            .get_mut(name)
            .ok_or_else(|| DatabaseError::TableNotExists(name.to_string()))
    }

    pub fn insert(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    pub fn evict(&mut self, name: &str) -> Option<Table> {
        self.tables.remove(name)
    }

    #[cfg(test)]
    pub(crate) fn is_cached(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }
}

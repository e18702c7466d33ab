/// Lazy row sequences produced by SELECT.
use super::conditions::ConditionEvaluator;
use crate::parser::FieldDef;
use crate::storage::{Column, ColumnReader};
use crate::types::{DatabaseError, Value};
use std::fmt;
use tracing::debug;

/// Lock-step scan over a set of columns: the n-th value of every column
/// forms the n-th row.
///
/// Readers are released as soon as the scan is exhausted or fails.
pub struct TableScan {
    readers: Option<Vec<ColumnReader>>,
    rows: u64,
}

impl TableScan {
    pub fn open(columns: &[&Column]) -> Result<Self, DatabaseError> {
        let readers = columns
            .iter()
            .map(|column| column.open_reader())
            .collect::<Result<Vec<_>, _>>()?;
        debug!(columns = readers.len(), "opened column readers");
        Ok(Self {
            readers: Some(readers),
            rows: 0,
        })
    }

    fn close(&mut self) {
        if self.readers.take().is_some() {
            debug!(rows = self.rows, "closed column readers");
        }
    }

    fn read_row(readers: &mut [ColumnReader]) -> Result<Option<Vec<Value>>, DatabaseError> {
        let mut row = Vec::with_capacity(readers.len());
        let mut exhausted = Vec::new();
        for reader in readers.iter_mut() {
            match reader.next() {
                Some(value) => row.push(value?),
                None => exhausted.push(reader.column().field.clone()),
            }
        }
        if exhausted.is_empty() {
            return Ok(Some(row));
        }
        if row.is_empty() {
            return Ok(None);
        }
        let reader = &readers[0];
        Err(DatabaseError::CorruptColumn {
            path: reader.column().data_path.clone(),
            reason: format!(
                "table {} has columns of unequal length ({} ended early)",
                reader.column().table,
                exhausted.join(", ")
            ),
        })
    }
}

impl Iterator for TableScan {
    type Item = Result<Vec<Value>, DatabaseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let readers = self.readers.as_mut()?;
        match Self::read_row(readers) {
            Ok(Some(row)) => {
                self.rows += 1;
                Some(Ok(row))
            }
            Ok(None) => {
                self.close();
                None
            }
            Err(err) => {
                self.close();
                Some(Err(err))
            }
        }
    }
}

enum RowSource {
    Scan {
        scan: TableScan,
        filter: Option<(usize, ConditionEvaluator)>,
        outputs: Vec<usize>,
    },
    Materialized(std::vec::IntoIter<Vec<Value>>),
}

/// Header plus a finite, non-restartable sequence of rows.
///
/// Rows are produced on demand; the sequence fuses after the first error.
pub struct RowStream {
    columns: Vec<FieldDef>,
    source: RowSource,
    failed: bool,
}

impl RowStream {
    /// Filters scan rows on `filter.0` and narrows them to `outputs`.
    #[must_use]
    pub fn scan(
        columns: Vec<FieldDef>,
        scan: TableScan,
        filter: Option<(usize, ConditionEvaluator)>,
        outputs: Vec<usize>,
    ) -> Self {
        Self {
            columns,
            source: RowSource::Scan {
                scan,
                filter,
                outputs,
            },
            failed: false,
        }
    }

    #[must_use]
    pub fn materialized(columns: Vec<FieldDef>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            source: RowSource::Materialized(rows.into_iter()),
            failed: false,
        }
    }

    /// Output identifiers with their types.
    #[must_use]
    pub fn columns(&self) -> &[FieldDef] {
        &self.columns
    }

    /// The header row.
    #[must_use]
    pub fn header(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    fn next_row(&mut self) -> Option<Result<Vec<Value>, DatabaseError>> {
        match &mut self.source {
            RowSource::Materialized(rows) => rows.next().map(Ok),
            RowSource::Scan {
                scan,
                filter,
                outputs,
            } => loop {
                let row = match scan.next()? {
                    Ok(row) => row,
                    Err(err) => return Some(Err(err)),
                };
                if let Some((slot, evaluator)) = filter {
                    if !evaluator.evaluate(&row[*slot]) {
                        continue;
                    }
                }
                return Some(Ok(outputs.iter().map(|&slot| row[slot].clone()).collect()));
            },
        }
    }
}

impl Iterator for RowStream {
    type Item = Result<Vec<Value>, DatabaseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.next_row();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}

impl fmt::Debug for RowStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            RowSource::Scan { .. } => "scan",
            RowSource::Materialized(_) => "materialized",
        };
        f.debug_struct("RowStream")
            .field("columns", &self.header())
            .field("source", &source)
            .finish()
    }
}

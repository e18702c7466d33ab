/// SELECT operations: scan, filter, projection, GROUP BY / aggregates,
/// HAVING and ORDER BY
use super::aggregate::{self, Accumulator, KeyPart};
use super::conditions::ConditionEvaluator;
use super::rows::{RowStream, TableScan};
use crate::parser::{
    AggregateFunction, FieldDef, OrderField, Projection, ProjectionExpr, Select, SortOrder,
};
use crate::storage::{Catalog, Column, Table};
use crate::types::{DatabaseError, ScalarType, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

pub struct SelectExecutor;

/// Columns a query reads, in the order the scan yields them.
#[derive(Debug, Default)]
struct ScanColumns {
    ordinals: Vec<usize>,
}

impl ScanColumns {
    /// Position of table column `ordinal` within a scanned row.
    fn slot(&mut self, ordinal: usize) -> usize {
        if let Some(slot) = self.ordinals.iter().position(|&o| o == ordinal) {
            return slot;
        }
        self.ordinals.push(ordinal);
        self.ordinals.len() - 1
    }

    fn open(&self, table: &Table) -> Result<TableScan, DatabaseError> {
        let columns: Vec<&Column> = self.ordinals.iter().map(|&o| &table.columns[o]).collect();
        TableScan::open(&columns)
    }
}

type Filter = Option<(usize, ConditionEvaluator)>;

enum OutputSource {
    Key(usize),
    Aggregate(usize),
}

struct AggregateSpec {
    function: AggregateFunction,
    source: ScalarType,
    slot: usize,
    label: String,
}

impl SelectExecutor {
    /// Plans `select` against its table and returns the row sequence.
    ///
    /// Plain queries without ORDER BY stream straight from the column files;
    /// sorted and grouped queries are materialized first.
    pub fn select(catalog: &mut Catalog, select: &Select) -> Result<RowStream, DatabaseError> {
        let table = catalog.get(&select.table)?;
        let projections = Self::expand_projections(table, select);
        let mut scan = ScanColumns::default();

        let filter = match &select.filter {
            Some(condition) => {
                let column = Self::resolve_source(table, &projections, &condition.field)?;
                let evaluator = ConditionEvaluator::new(condition, column.scalar_type)?;
                Some((scan.slot(column.ordinal), evaluator))
            }
            None => None,
        };

        let grouped =
            !select.group_by.is_empty() || projections.iter().any(Projection::is_aggregate);
        debug!(table = %table.name, grouped, "planning select");
        if grouped {
            Self::select_grouped(table, select, &projections, scan, filter)
        } else {
            Self::select_plain(table, select, &projections, scan, filter)
        }
    }

    /// `*` becomes every field of the table, in schema order.
    fn expand_projections(table: &Table, select: &Select) -> Vec<Projection> {
        if select.projections.is_empty() {
            table.columns.iter().map(|c| Projection::field(&c.field)).collect()
        } else {
            select.projections.clone()
        }
    }

    /// WHERE and GROUP BY names: a table field, else the alias of a plain
    /// field projection.
    fn resolve_source<'t>(
        table: &'t Table,
        projections: &[Projection],
        name: &str,
    ) -> Result<&'t Column, DatabaseError> {
        if let Some(column) = table.columns.iter().find(|c| c.field == name) {
            return Ok(column);
        }
        match projections.iter().find(|p| !p.is_aggregate() && p.identifier == name) {
            Some(projection) => table.column(projection.expr.field()),
            None => table.column(name),
        }
    }

    fn select_plain(
        table: &Table,
        select: &Select,
        projections: &[Projection],
        mut scan: ScanColumns,
        filter: Filter,
    ) -> Result<RowStream, DatabaseError> {
        if select.having.is_some() {
            return Err(DatabaseError::HavingWithoutGroup);
        }

        let mut columns = Vec::with_capacity(projections.len());
        let mut outputs = Vec::with_capacity(projections.len());
        for projection in projections {
            let column = table.column(projection.expr.field())?;
            outputs.push(scan.slot(column.ordinal));
            columns.push(FieldDef {
                name: projection.identifier.clone(),
                scalar_type: column.scalar_type,
            });
        }

        let mut order = Vec::with_capacity(select.order_by.len());
        for OrderField { field, order: direction } in &select.order_by {
            let column = match projections.iter().find(|p| &p.identifier == field) {
                Some(projection) => table.column(projection.expr.field())?,
                None => table.column(field)?,
            };
            order.push((scan.slot(column.ordinal), *direction));
        }

        let table_scan = scan.open(table)?;
        if order.is_empty() {
            return Ok(RowStream::scan(columns, table_scan, filter, outputs));
        }

        let mut rows = Vec::new();
        for row in table_scan {
            let row = row?;
            if passes(filter.as_ref(), &row) {
                rows.push(row);
            }
        }
        sort_rows(&mut rows, &order);
        debug!(rows = rows.len(), "sorted rows");
        let rows = rows
            .into_iter()
            .map(|row| outputs.iter().map(|&slot| row[slot].clone()).collect())
            .collect();
        Ok(RowStream::materialized(columns, rows))
    }

    fn select_grouped(
        table: &Table,
        select: &Select,
        projections: &[Projection],
        mut scan: ScanColumns,
        filter: Filter,
    ) -> Result<RowStream, DatabaseError> {
        let mut key_ordinals = Vec::with_capacity(select.group_by.len());
        let mut key_slots = Vec::with_capacity(select.group_by.len());
        for name in &select.group_by {
            let column = Self::resolve_source(table, projections, name)?;
            key_ordinals.push(column.ordinal);
            key_slots.push(scan.slot(column.ordinal));
        }

        let mut columns = Vec::with_capacity(projections.len());
        let mut sources = Vec::with_capacity(projections.len());
        let mut aggregates = Vec::new();
        for projection in projections {
            match &projection.expr {
                ProjectionExpr::Field(field) => {
                    let column = table.column(field)?;
                    let key = key_ordinals
                        .iter()
                        .position(|&o| o == column.ordinal)
                        .ok_or_else(|| DatabaseError::NotGrouped(projection.identifier.clone()))?;
                    sources.push(OutputSource::Key(key));
                    columns.push(FieldDef {
                        name: projection.identifier.clone(),
                        scalar_type: column.scalar_type,
                    });
                }
                ProjectionExpr::Aggregate { function, field } => {
                    let column = table.column(field)?;
                    let scalar_type = aggregate::result_type(*function, column.scalar_type)?;
                    sources.push(OutputSource::Aggregate(aggregates.len()));
                    aggregates.push(AggregateSpec {
                        function: *function,
                        source: column.scalar_type,
                        slot: scan.slot(column.ordinal),
                        label: projection.expr.to_string(),
                    });
                    columns.push(FieldDef {
                        name: projection.identifier.clone(),
                        scalar_type,
                    });
                }
            }
        }

        // Grouped rows are extended with their key values after the outputs,
        // so HAVING and ORDER BY can address group fields that are not projected.
        let outputs = columns.len();
        let resolve = |name: &str| -> Option<(usize, ScalarType)> {
            let index = columns
                .iter()
                .position(|c| c.name == name)
                .or_else(|| {
                    projections
                        .iter()
                        .position(|p| !p.is_aggregate() && p.expr.field() == name)
                })
                .or_else(|| select.group_by.iter().position(|g| g == name).map(|k| outputs + k))
                .or_else(|| {
                    key_ordinals
                        .iter()
                        .position(|&o| table.columns[o].field == name)
                        .map(|k| outputs + k)
                })?;
            let scalar_type = if index < outputs {
                columns[index].scalar_type
            } else {
                table.columns[key_ordinals[index - outputs]].scalar_type
            };
            Some((index, scalar_type))
        };

        let having = match &select.having {
            Some(condition) => {
                let (index, scalar_type) = resolve(&condition.field)
                    .ok_or_else(|| DatabaseError::UnknownHavingField(condition.field.clone()))?;
                Some((index, ConditionEvaluator::new(condition, scalar_type)?))
            }
            None => None,
        };
        let order = select
            .order_by
            .iter()
            .map(|order| {
                resolve(&order.field)
                    .map(|(index, _)| (index, order.order))
                    .ok_or_else(|| DatabaseError::ColumnNotFound {
                        table: table.name.clone(),
                        field: order.field.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let new_accumulators = || -> Vec<Accumulator> {
            aggregates
                .iter()
                .map(|spec| Accumulator::new(spec.function, spec.source, spec.label.clone()))
                .collect()
        };
        let mut index: HashMap<Vec<KeyPart>, usize> = HashMap::new();
        let mut groups: Vec<(Vec<Value>, Vec<Accumulator>)> = Vec::new();
        if select.group_by.is_empty() {
            // Aggregates without GROUP BY always produce one row.
            index.insert(Vec::new(), 0);
            groups.push((Vec::new(), new_accumulators()));
        }

        for row in scan.open(table)? {
            let row = row?;
            if !passes(filter.as_ref(), &row) {
                continue;
            }
            let key: Vec<KeyPart> = key_slots.iter().map(|&slot| KeyPart::from(&row[slot])).collect();
            let group = match index.get(&key) {
                Some(&group) => group,
                None => {
                    let values = key_slots.iter().map(|&slot| row[slot].clone()).collect();
                    groups.push((values, new_accumulators()));
                    index.insert(key, groups.len() - 1);
                    groups.len() - 1
                }
            };
            for (accumulator, spec) in groups[group].1.iter_mut().zip(&aggregates) {
                accumulator.update(&row[spec.slot])?;
            }
        }
        debug!(groups = groups.len(), "aggregated groups");

        let mut rows = Vec::with_capacity(groups.len());
        for (key, accumulators) in groups {
            let mut row = Vec::with_capacity(outputs + key.len());
            for source in &sources {
                row.push(match source {
                    OutputSource::Key(k) => key[*k].clone(),
                    OutputSource::Aggregate(a) => accumulators[*a].finish()?,
                });
            }
            row.extend(key);
            if passes(having.as_ref(), &row) {
                rows.push(row);
            }
        }
        sort_rows(&mut rows, &order);
        for row in &mut rows {
            row.truncate(outputs);
        }
        Ok(RowStream::materialized(columns, rows))
    }
}

fn passes(filter: Option<&(usize, ConditionEvaluator)>, row: &[Value]) -> bool {
    filter.is_none_or(|(slot, evaluator)| evaluator.evaluate(&row[*slot]))
}

/// Stable multi-key sort, leftmost key first.
fn sort_rows(rows: &mut [Vec<Value>], keys: &[(usize, SortOrder)]) {
    if keys.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for &(index, order) in keys {
            let ordering = a[index].sort_cmp(&b[index]);
            let ordering = match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

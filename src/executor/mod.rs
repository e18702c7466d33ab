/// Executor module - runs parsed statements against the table directories
///
/// Structure:
/// - dispatcher: statement routing and `QueryResult`
/// - ddl: CREATE TABLE (incl. AS SELECT) / DROP TABLE
/// - dml: LOAD DATA INFILE
/// - queries: SELECT planning, grouping and ordering
/// - conditions: WHERE / HAVING evaluation
/// - aggregate: MIN / MAX / AVG / SUM / COUNT accumulators
/// - rows: lazy row sequences over column files
/// - export: INTO OUTFILE writer

pub mod dispatcher;
pub mod conditions;
pub mod aggregate;
pub mod rows;
pub mod export;
pub mod dml;
pub mod ddl;
pub mod queries;

pub use dispatcher::{QueryExecutor, QueryResult};
pub use conditions::ConditionEvaluator;
pub use aggregate::{Accumulator, KeyPart};
pub use rows::{RowStream, TableScan};
pub use dml::DmlExecutor;
pub use ddl::DdlExecutor;
pub use queries::SelectExecutor;

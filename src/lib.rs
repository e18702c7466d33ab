// csvdb - file-backed columnar database with a small SQL dialect
// Modular architecture: parser -> executor -> columnar storage

// Clippy configuration - allow non-critical warnings
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::float_cmp)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]

// Core types (errors, values, scalar types)
pub mod core;

// Backward compatibility - re-export all core types as types module
pub mod types {
    pub use crate::core::*;
}

// Lexer and recursive-descent parser
pub mod parser;

// Statement execution (DDL, LOAD, SELECT with grouping and ordering)
pub mod executor;

// Columnar storage (column files, manifests, table cache)
pub mod storage;

// Session over one root directory
pub mod session;

// Console table rendering
pub mod printer;

// Re-export commonly used types for convenience
pub use crate::core::{DatabaseError, ScalarType, SyntaxError, Value};
pub use parser::{Parser, Statement, parse_statements};
pub use executor::{QueryExecutor, QueryResult, RowStream};
pub use storage::{Catalog, Table};
pub use session::Session;

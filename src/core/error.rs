use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use super::data_type::ScalarType;

/// A grammar or token mismatch, located at the offending token.
///
/// `line` and `col` are 1-based. The offending source line is kept so the
/// diagnostic can be rendered without the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub col: usize,
    pub source_line: String,
}

impl SyntaxError {
    #[must_use]
    pub fn new(message: impl Into<String>, line: usize, col: usize, source: &str) -> Self {
        let source_line = source
            .lines()
            .nth(line.saturating_sub(1))
            .unwrap_or_default()
            .to_string();
        Self {
            message: message.into(),
            line,
            col,
            source_line,
        }
    }

    /// Two-line location marker: the source line, then a caret under `col`.
    #[must_use]
    pub fn location_marker(&self) -> String {
        format!(
            "{}\n{}^",
            self.source_line,
            " ".repeat(self.col.saturating_sub(1))
        )
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Syntax error at line {} col {}:\n{}\n{}",
            self.line,
            self.col,
            self.location_marker(),
            self.message
        )
    }
}

impl std::error::Error for SyntaxError {}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("table {0} already exists")]
    TableAlreadyExists(String),
    #[error("table {0} doesn't exist")]
    TableNotExists(String),
    #[error("a directory named {0} already exists and is not a table")]
    DirectoryAlreadyExists(String),
    #[error("csv infile {0} doesn't exist")]
    InfileNotExists(String),
    #[error("root directory {} doesn't exist", .0.display())]
    RootNotDirectory(PathBuf),
    #[error("field '{field}' not found in table {table}")]
    ColumnNotFound { table: String, field: String },
    #[error("field '{0}' is declared more than once")]
    DuplicateColumn(String),
    #[error("'{0}' is not a valid table or field name")]
    InvalidName(String),
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("invalid {scalar_type} value {value:?} for field '{field}'")]
    InvalidValue {
        field: String,
        value: String,
        scalar_type: ScalarType,
    },
    #[error("record at line {line} has {found} fields, expected {expected}")]
    MalformedRecord {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("{0} is undefined over a group with no non-NULL values")]
    EmptyAggregate(String),
    #[error("field '{0}' must appear in GROUP BY or inside an aggregate")]
    NotGrouped(String),
    #[error("HAVING references '{0}', which is neither a grouped field nor an output identifier")]
    UnknownHavingField(String),
    #[error("HAVING requires GROUP BY or an aggregate projection")]
    HavingWithoutGroup,
    #[error("numeric overflow while computing {0}")]
    Overflow(String),
    #[error("column file {} is corrupt: {reason}", .path.display())]
    CorruptColumn { path: PathBuf, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("manifest error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl DatabaseError {
    /// Runtime errors are reported with this banner; syntax errors carry their own.
    #[must_use]
    pub const fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax(_))
    }
}

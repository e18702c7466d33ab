use serde::{Deserialize, Serialize};
use std::fmt;

/// Column types a table schema may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// Signed 64-bit integer, NULL is `i64::MIN`.
    Int,
    /// IEEE-754 double, NULL is negative infinity.
    Float,
    /// UTF-8 text stored back-to-back with an offset index. Has no NULL.
    Varchar,
    /// Unsigned 64-bit seconds since the epoch, NULL is 0.
    Timestamp,
}

impl ScalarType {
    pub const ALL: [Self; 4] = [Self::Int, Self::Float, Self::Varchar, Self::Timestamp];

    /// Maps a lowercased keyword to its type.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.keyword() == keyword)
    }

    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Varchar => "varchar",
            Self::Timestamp => "timestamp",
        }
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Varchar)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

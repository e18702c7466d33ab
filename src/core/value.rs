use std::cmp::Ordering;
use std::fmt;

/// A decoded cell. Scalar sentinels are translated to `Null` on read.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Timestamp(u64),
    Varchar(String),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Timestamp(t) => Some(*t as f64),
            Self::Null | Self::Varchar(_) => None,
        }
    }

    /// Total order used by ORDER BY, MIN and MAX.
    ///
    /// NULL sorts first; numbers of different types compare numerically;
    /// text sorts after every number.
    #[must_use]
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Null, _) => Ordering::Less,
            (_, Self::Null) => Ordering::Greater,
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::Varchar(a), Self::Varchar(b)) => a.cmp(b),
            (Self::Varchar(_), _) => Ordering::Greater,
            (_, Self::Varchar(_)) => Ordering::Less,
            (a, b) => {
                let (x, y) = (a.as_f64().unwrap_or_default(), b.as_f64().unwrap_or_default());
                x.total_cmp(&y)
            }
        }
    }

    /// Delimited-text rendering: NULL becomes an empty field.
    #[must_use]
    pub fn to_field(&self) -> String {
        match self {
            Self::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Timestamp(t) => write!(f, "{t}"),
            Self::Varchar(s) => write!(f, "{s}"),
        }
    }
}

/// Fixed-width encoding of scalar cells and parsing of delimited-text fields.
///
/// Every scalar is one little-endian 8-byte word. NULL is an in-band sentinel
/// per type, so a stored value equal to the sentinel reads back as NULL.
use crate::types::{DatabaseError, ScalarType, Value};
use chrono::{NaiveDate, NaiveDateTime};

pub const WORD_SIZE: usize = 8;

pub const INT_NULL: i64 = i64::MIN;
pub const FLOAT_NULL: f64 = f64::NEG_INFINITY;
pub const TIMESTAMP_NULL: u64 = 0;

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Encodes a scalar cell. `Null` becomes the type's sentinel.
pub fn encode_scalar(value: &Value, scalar_type: ScalarType) -> Result<[u8; WORD_SIZE], DatabaseError> {
    let word = match (scalar_type, value) {
        (ScalarType::Int, Value::Int(i)) => i.to_le_bytes(),
        (ScalarType::Int, Value::Null) => INT_NULL.to_le_bytes(),
        (ScalarType::Float, Value::Float(f)) => f.to_le_bytes(),
        (ScalarType::Float, Value::Int(i)) => (*i as f64).to_le_bytes(),
        (ScalarType::Float, Value::Null) => FLOAT_NULL.to_le_bytes(),
        (ScalarType::Timestamp, Value::Timestamp(t)) => t.to_le_bytes(),
        (ScalarType::Timestamp, Value::Null) => TIMESTAMP_NULL.to_le_bytes(),
        (scalar_type, value) => {
            return Err(DatabaseError::TypeMismatch(format!(
                "cannot store {value:?} in a {scalar_type} column"
            )));
        }
    };
    Ok(word)
}

/// Decodes one word of a fixed-width column. Varchar cells are not words.
pub fn decode_scalar(word: [u8; WORD_SIZE], scalar_type: ScalarType) -> Result<Value, DatabaseError> {
    let value = match scalar_type {
        ScalarType::Int => match i64::from_le_bytes(word) {
            INT_NULL => Value::Null,
            i => Value::Int(i),
        },
        ScalarType::Float => {
            let f = f64::from_le_bytes(word);
            if f == FLOAT_NULL { Value::Null } else { Value::Float(f) }
        }
        ScalarType::Timestamp => match u64::from_le_bytes(word) {
            TIMESTAMP_NULL => Value::Null,
            t => Value::Timestamp(t),
        },
        ScalarType::Varchar => {
            return Err(DatabaseError::TypeMismatch(
                "varchar cells cannot be decoded from a fixed-width word".to_string(),
            ));
        }
    };
    Ok(value)
}

/// Parses one delimited-text field for a column of `scalar_type`.
///
/// Blank scalar fields are NULL. Text keeps its content as-is except that
/// non-breaking spaces become regular spaces.
pub fn parse_field(field: &str, scalar_type: ScalarType, text: &str) -> Result<Value, DatabaseError> {
    if scalar_type == ScalarType::Varchar {
        return Ok(Value::Varchar(text.replace('\u{a0}', " ")));
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    let parsed = match scalar_type {
        ScalarType::Int => trimmed.parse::<i64>().ok().map(Value::Int),
        ScalarType::Float => trimmed.parse::<f64>().ok().map(Value::Float),
        ScalarType::Timestamp => parse_timestamp(trimmed).map(Value::Timestamp),
        ScalarType::Varchar => None,
    };
    parsed.ok_or_else(|| DatabaseError::InvalidValue {
        field: field.to_string(),
        value: text.to_string(),
        scalar_type,
    })
}

/// Seconds since the epoch, given either as a whole number or as a date
/// `YYYY-MM-DD`, optionally followed by ` HH:MM:SS` (or `T` as separator).
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<u64> {
    if let Ok(seconds) = text.parse::<u64>() {
        return Some(seconds);
    }
    let datetime = TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    u64::try_from(datetime.and_utc().timestamp()).ok()
}

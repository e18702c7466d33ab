/// Aggregate accumulators and hashable group keys.
use crate::parser::AggregateFunction;
use crate::types::{DatabaseError, ScalarType, Value};
use std::cmp::Ordering;

/// Hashable projection of a `Value`, used to partition rows into groups.
///
/// Floats hash by bit pattern after folding `-0.0` into `0.0` and every NaN
/// into one value, so rows that compare equal share a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Null,
    Int(i64),
    Float(u64),
    Timestamp(u64),
    Text(String),
}

impl From<&Value> for KeyPart {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Int(i) => Self::Int(*i),
            Value::Float(f) if *f == 0.0 => Self::Float(0.0f64.to_bits()),
            Value::Float(f) if f.is_nan() => Self::Float(f64::NAN.to_bits()),
            Value::Float(f) => Self::Float(f.to_bits()),
            Value::Timestamp(t) => Self::Timestamp(*t),
            Value::Varchar(s) => Self::Text(s.clone()),
        }
    }
}

/// Result type of `function` applied to a field of `source`.
pub fn result_type(function: AggregateFunction, source: ScalarType) -> Result<ScalarType, DatabaseError> {
    match function {
        AggregateFunction::Count => Ok(ScalarType::Int),
        AggregateFunction::Avg | AggregateFunction::Sum if source == ScalarType::Varchar => {
            Err(DatabaseError::TypeMismatch(format!(
                "{} is undefined over varchar values",
                function.keyword()
            )))
        }
        AggregateFunction::Avg => Ok(ScalarType::Float),
        AggregateFunction::Sum | AggregateFunction::Min | AggregateFunction::Max => Ok(source),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Sum {
    Int(i64),
    Float(f64),
    Timestamp(u64),
}

/// Running state of one aggregate over one group. NULL inputs are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    function: AggregateFunction,
    label: String,
    count: u64,
    sum: Sum,
    average: f64,
    best: Option<Value>,
}

impl Accumulator {
    /// `label` names the aggregate in error messages, e.g. `avg(score)`.
    #[must_use]
    pub fn new(function: AggregateFunction, source: ScalarType, label: impl Into<String>) -> Self {
        let sum = match source {
            ScalarType::Float => Sum::Float(0.0),
            ScalarType::Timestamp => Sum::Timestamp(0),
            ScalarType::Int | ScalarType::Varchar => Sum::Int(0),
        };
        Self {
            function,
            label: label.into(),
            count: 0,
            sum,
            average: 0.0,
            best: None,
        }
    }

    pub fn update(&mut self, value: &Value) -> Result<(), DatabaseError> {
        if value.is_null() {
            return Ok(());
        }
        self.count += 1;
        match self.function {
            AggregateFunction::Count => {}
            AggregateFunction::Sum => self.add(value)?,
            AggregateFunction::Avg => {
                let x = value.as_f64().ok_or_else(|| self.not_numeric(value))?;
                self.average += x;
            }
            AggregateFunction::Min => self.keep_if(value, Ordering::Less),
            AggregateFunction::Max => self.keep_if(value, Ordering::Greater),
        }
        Ok(())
    }

    fn add(&mut self, value: &Value) -> Result<(), DatabaseError> {
        let overflow = || DatabaseError::Overflow(self.label.clone());
        self.sum = match (&self.sum, value) {
            (Sum::Int(acc), Value::Int(i)) => Sum::Int(acc.checked_add(*i).ok_or_else(overflow)?),
            (Sum::Timestamp(acc), Value::Timestamp(t)) => {
                Sum::Timestamp(acc.checked_add(*t).ok_or_else(overflow)?)
            }
            (Sum::Float(acc), value) => {
                Sum::Float(acc + value.as_f64().ok_or_else(|| self.not_numeric(value))?)
            }
            (_, value) => return Err(self.not_numeric(value)),
        };
        Ok(())
    }

    fn keep_if(&mut self, value: &Value, wanted: Ordering) {
        let replace = self
            .best
            .as_ref()
            .is_none_or(|best| value.sort_cmp(best) == wanted);
        if replace {
            self.best = Some(value.clone());
        }
    }

    fn not_numeric(&self, value: &Value) -> DatabaseError {
        DatabaseError::TypeMismatch(format!("{} cannot use value {value}", self.label))
    }

    /// Final value. MIN, MAX and AVG with no non-NULL input are errors.
    pub fn finish(&self) -> Result<Value, DatabaseError> {
        match self.function {
            AggregateFunction::Count => i64::try_from(self.count)
                .map(Value::Int)
                .map_err(|_| DatabaseError::Overflow(self.label.clone())),
            // Zero is the timestamp NULL sentinel, so an empty sum has no value.
            AggregateFunction::Sum if self.count == 0 && matches!(self.sum, Sum::Timestamp(_)) => {
                Err(DatabaseError::EmptyAggregate(self.label.clone()))
            }
            AggregateFunction::Sum => Ok(match self.sum {
                Sum::Int(i) => Value::Int(i),
                Sum::Float(f) => Value::Float(f),
                Sum::Timestamp(t) => Value::Timestamp(t),
            }),
            AggregateFunction::Avg if self.count == 0 => {
                Err(DatabaseError::EmptyAggregate(self.label.clone()))
            }
            AggregateFunction::Avg => Ok(Value::Float(self.average / self.count as f64)),
            AggregateFunction::Min | AggregateFunction::Max => self
                .best
                .clone()
                .ok_or_else(|| DatabaseError::EmptyAggregate(self.label.clone())),
        }
    }
}

/// Condition evaluation for WHERE and HAVING clauses
///
/// A condition is checked once against the type of the value it tests, then
/// evaluated per row without further allocation.
use crate::parser::{CompareOp, Condition, Constant};
use crate::storage::codec::parse_timestamp;
use crate::types::{DatabaseError, ScalarType, Value};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
enum Target {
    Number(f64),
    Text(String),
    Timestamp(u64),
}

#[derive(Debug, Clone, PartialEq)]
enum Check {
    IsNull,
    NotNull,
    Never,
    Compare(CompareOp, Target),
}

/// A `field op constant` test bound to the field's type.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionEvaluator {
    check: Check,
}

impl ConditionEvaluator {
    /// Validates `condition` against a value of `scalar_type`.
    pub fn new(condition: &Condition, scalar_type: ScalarType) -> Result<Self, DatabaseError> {
        let check = match (&condition.constant, condition.op) {
            (Constant::Null, CompareOp::Eq | CompareOp::Is) => Check::IsNull,
            (Constant::Null, CompareOp::Ne | CompareOp::IsNot) => Check::NotNull,
            (Constant::Null, _) => Check::Never,
            (_, CompareOp::Is | CompareOp::IsNot) => {
                return Err(DatabaseError::TypeMismatch(format!(
                    "'{condition}': IS only compares with NULL"
                )));
            }
            (Constant::Number(n), op) if scalar_type.is_numeric() => {
                Check::Compare(op, Target::Number(*n))
            }
            (Constant::Text(s), op) if scalar_type == ScalarType::Varchar => {
                Check::Compare(op, Target::Text(s.clone()))
            }
            (Constant::Text(s), op) if scalar_type == ScalarType::Timestamp => {
                let seconds = parse_timestamp(s).ok_or_else(|| {
                    DatabaseError::TypeMismatch(format!(
                        "'{condition}': \"{s}\" is not a timestamp"
                    ))
                })?;
                Check::Compare(op, Target::Timestamp(seconds))
            }
            _ => {
                return Err(DatabaseError::TypeMismatch(format!(
                    "'{condition}' compares a {scalar_type} field with {}",
                    condition.constant
                )));
            }
        };
        Ok(Self { check })
    }

    /// NULL satisfies only the IS NULL forms.
    #[must_use]
    pub fn evaluate(&self, value: &Value) -> bool {
        match &self.check {
            Check::IsNull => value.is_null(),
            Check::NotNull => !value.is_null(),
            Check::Never => false,
            Check::Compare(op, target) => {
                Self::compare(value, target).is_some_and(|ordering| Self::holds(*op, ordering))
            }
        }
    }

    fn compare(value: &Value, target: &Target) -> Option<Ordering> {
        match (value, target) {
            (Value::Int(i), Target::Number(n)) => {
                if n.fract() == 0.0 && *n >= i64::MIN as f64 && *n < i64::MAX as f64 {
                    Some(i.cmp(&(*n as i64)))
                } else {
                    (*i as f64).partial_cmp(n)
                }
            }
            (Value::Timestamp(t), Target::Number(n)) => {
                if n.fract() == 0.0 && *n >= 0.0 && *n < u64::MAX as f64 {
                    Some(t.cmp(&(*n as u64)))
                } else {
                    (*t as f64).partial_cmp(n)
                }
            }
            (Value::Float(f), Target::Number(n)) => f.partial_cmp(n),
            (Value::Timestamp(t), Target::Timestamp(s)) => Some(t.cmp(s)),
            (Value::Varchar(a), Target::Text(b)) => Some(a.as_str().cmp(b.as_str())),
            _ => None,
        }
    }

    const fn holds(op: CompareOp, ordering: Ordering) -> bool {
        match op {
            CompareOp::Lt => ordering.is_lt(),
            CompareOp::Le => ordering.is_le(),
            CompareOp::Eq => ordering.is_eq(),
            CompareOp::Ge => ordering.is_ge(),
            CompareOp::Gt => ordering.is_gt(),
            CompareOp::Ne => ordering.is_ne(),
            CompareOp::Is | CompareOp::IsNot => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(op: CompareOp, constant: Constant) -> Condition {
        Condition {
            field: "f".to_string(),
            op,
            constant,
        }
    }

    fn evaluator(op: CompareOp, constant: Constant, scalar_type: ScalarType) -> ConditionEvaluator {
        ConditionEvaluator::new(&condition(op, constant), scalar_type).unwrap()
    }

    #[test]
    fn test_numeric_comparisons() {
        let gt = evaluator(CompareOp::Gt, Constant::Number(5.0), ScalarType::Int);
        assert!(gt.evaluate(&Value::Int(6)));
        assert!(!gt.evaluate(&Value::Int(5)));

        let le = evaluator(CompareOp::Le, Constant::Number(2.5), ScalarType::Int);
        assert!(le.evaluate(&Value::Int(2)));
        assert!(!le.evaluate(&Value::Int(3)));

        let ne = evaluator(CompareOp::Ne, Constant::Number(0.5), ScalarType::Float);
        assert!(ne.evaluate(&Value::Float(0.25)));
        assert!(!ne.evaluate(&Value::Float(0.5)));
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let eq = evaluator(CompareOp::Eq, Constant::Number(9_007_199_254_740_993.0), ScalarType::Int);
        // The literal rounds to 2^53 as a float; the stored value is compared as an integer.
        assert!(eq.evaluate(&Value::Int(9_007_199_254_740_992)));
        assert!(!eq.evaluate(&Value::Int(9_007_199_254_740_993)));
    }

    #[test]
    fn test_null_semantics() {
        let lt = evaluator(CompareOp::Lt, Constant::Number(10.0), ScalarType::Int);
        let ne = evaluator(CompareOp::Ne, Constant::Number(10.0), ScalarType::Int);
        assert!(!lt.evaluate(&Value::Null));
        assert!(!ne.evaluate(&Value::Null));

        let is_null = evaluator(CompareOp::Is, Constant::Null, ScalarType::Float);
        let is_not_null = evaluator(CompareOp::IsNot, Constant::Null, ScalarType::Float);
        assert!(is_null.evaluate(&Value::Null));
        assert!(!is_null.evaluate(&Value::Float(1.0)));
        assert!(is_not_null.evaluate(&Value::Float(1.0)));

        let eq_null = evaluator(CompareOp::Eq, Constant::Null, ScalarType::Int);
        assert!(eq_null.evaluate(&Value::Null));
        let gt_null = evaluator(CompareOp::Gt, Constant::Null, ScalarType::Int);
        assert!(!gt_null.evaluate(&Value::Null));
        assert!(!gt_null.evaluate(&Value::Int(1)));
    }

    #[test]
    fn test_text_comparisons() {
        let lt = evaluator(CompareOp::Lt, Constant::Text("M".to_string()), ScalarType::Varchar);
        assert!(lt.evaluate(&Value::Varchar("Alien".to_string())));
        assert!(!lt.evaluate(&Value::Varchar("Up".to_string())));
    }

    #[test]
    fn test_timestamp_accepts_dates() {
        let ge = evaluator(
            CompareOp::Ge,
            Constant::Text("1970-01-02".to_string()),
            ScalarType::Timestamp,
        );
        assert!(ge.evaluate(&Value::Timestamp(86_400)));
        assert!(!ge.evaluate(&Value::Timestamp(86_399)));

        let eq = evaluator(CompareOp::Eq, Constant::Number(10.0), ScalarType::Timestamp);
        assert!(eq.evaluate(&Value::Timestamp(10)));
    }

    #[test]
    fn test_type_mismatches() {
        let cases = [
            (CompareOp::Eq, Constant::Text("x".to_string()), ScalarType::Int),
            (CompareOp::Eq, Constant::Number(1.0), ScalarType::Varchar),
            (CompareOp::Eq, Constant::Text("soon".to_string()), ScalarType::Timestamp),
            (CompareOp::Is, Constant::Number(1.0), ScalarType::Int),
        ];
        for (op, constant, scalar_type) in cases {
            assert!(matches!(
                ConditionEvaluator::new(&condition(op, constant), scalar_type),
                Err(DatabaseError::TypeMismatch(_))
            ));
        }
    }
}

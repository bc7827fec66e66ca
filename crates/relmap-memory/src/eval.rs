//! Predicate evaluation over in-memory rows.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use relmap_core::{Expr, Operand, Operator, Value};

/// Evaluate a predicate tree against one row.
///
/// SQL NULL semantics, collapsed to two-valued logic: a comparison against
/// NULL is false (so its negation is true), and only `IS NULL` matches a
/// NULL cell. A column the row does not carry reads as NULL.
pub(crate) fn eval_predicate(expr: &Expr, row: &BTreeMap<String, Value>) -> bool {
    match expr {
        Expr::Compare { field, op, rhs } => {
            let cell = row.get(field.name()).unwrap_or(&Value::Null);
            match op {
                Operator::IsNull => cell.is_null(),
                Operator::IsNotNull => !cell.is_null(),
                Operator::In => match rhs {
                    Some(Operand::Values(values)) => values
                        .iter()
                        .any(|v| cell.compare(v) == Some(Ordering::Equal)),
                    _ => false,
                },
                _ => {
                    let other = match rhs {
                        Some(Operand::Value(value)) => value.clone(),
                        Some(Operand::Field(other)) => {
                            row.get(other.name()).cloned().unwrap_or(Value::Null)
                        }
                        _ => return false,
                    };
                    let Some(ordering) = cell.compare(&other) else {
                        return false;
                    };
                    match op {
                        Operator::Eq => ordering == Ordering::Equal,
                        Operator::Ne => ordering != Ordering::Equal,
                        Operator::Lt => ordering == Ordering::Less,
                        Operator::Le => ordering != Ordering::Greater,
                        Operator::Gt => ordering == Ordering::Greater,
                        Operator::Ge => ordering != Ordering::Less,
                        Operator::In | Operator::IsNull | Operator::IsNotNull => false,
                    }
                }
            }
        }
        Expr::And(operands) => operands.iter().all(|e| eval_predicate(e, row)),
        Expr::Or(operands) => operands.iter().any(|e| eval_predicate(e, row)),
        Expr::Not(inner) => !eval_predicate(inner, row),
    }
}

#[cfg(test)]
mod tests {
    use relmap_core::{FieldRef, SqlType};

    use super::*;

    fn row() -> BTreeMap<String, Value> {
        [
            ("id".to_string(), Value::Int(3)),
            ("title".to_string(), Value::Text("hello".to_string())),
            ("body".to_string(), Value::Null),
        ]
        .into_iter()
        .collect()
    }

    fn field(name: &'static str, sql_type: SqlType) -> FieldRef {
        FieldRef::new("post", name, sql_type)
    }

    #[test]
    fn test_comparisons() {
        let row = row();
        assert!(eval_predicate(&field("id", SqlType::BigInt).eq(3), &row));
        assert!(eval_predicate(&field("id", SqlType::BigInt).le(3), &row));
        assert!(!eval_predicate(&field("id", SqlType::BigInt).gt(3), &row));
        assert!(eval_predicate(
            &field("title", SqlType::Text).eq("hello"),
            &row
        ));
    }

    #[test]
    fn test_null_comparisons_are_false() {
        let row = row();
        assert!(!eval_predicate(&field("body", SqlType::Text).eq("x"), &row));
        assert!(!eval_predicate(&field("body", SqlType::Text).ne("x"), &row));
        assert!(eval_predicate(&field("body", SqlType::Text).is_null(), &row));
        assert!(!eval_predicate(
            &field("title", SqlType::Text).is_null(),
            &row
        ));
    }

    #[test]
    fn test_in_and_boolean_combinators() {
        let row = row();
        assert!(eval_predicate(
            &field("id", SqlType::BigInt).in_values([1i64, 3]),
            &row
        ));
        let expr = field("id", SqlType::BigInt)
            .eq(99)
            .or(field("title", SqlType::Text).eq("hello"));
        assert!(eval_predicate(&expr, &row));
        assert!(!eval_predicate(&expr.not(), &row));
    }
}

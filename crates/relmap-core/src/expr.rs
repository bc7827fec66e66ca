//! The expression AST: field references, comparisons, boolean combinators.
//!
//! Expression trees are immutable values. Building one describes intent; it
//! never touches storage. Evaluation happens inside a store connector.

use std::borrow::Cow;

use crate::order::{Direction, OrderTerm};
use crate::types::SqlType;
use crate::value::Value;

/// A reference to one column: owning table, field name, declared type,
/// nullability.
///
/// Entity types expose these through static accessors so predicates read as
/// `Post::id_field().eq(42)`. The `new` constructor is `const` for exactly
/// that use; `named` builds a reference from runtime strings (used
/// internally for relation foreign keys).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    table: Cow<'static, str>,
    name: Cow<'static, str>,
    sql_type: SqlType,
    nullable: bool,
}

impl FieldRef {
    /// Create a field reference from static metadata.
    #[must_use]
    pub const fn new(table: &'static str, name: &'static str, sql_type: SqlType) -> Self {
        Self {
            table: Cow::Borrowed(table),
            name: Cow::Borrowed(name),
            sql_type,
            nullable: false,
        }
    }

    /// Create a field reference from runtime strings.
    #[must_use]
    pub fn named(table: impl Into<String>, name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            table: Cow::Owned(table.into()),
            name: Cow::Owned(name.into()),
            sql_type,
            nullable: false,
        }
    }

    /// Mark the field as nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// The owning table's name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The field's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type.
    #[must_use]
    pub const fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    /// Whether the field is declared nullable.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// `table.name`, for diagnostics.
    #[must_use]
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.table, self.name)
    }

    /// `self = value`.
    #[must_use]
    pub fn eq(self, value: impl Into<Value>) -> Expr {
        Expr::compare(self, Operator::Eq, Operand::Value(value.into()))
    }

    /// `self <> value`.
    #[must_use]
    pub fn ne(self, value: impl Into<Value>) -> Expr {
        Expr::compare(self, Operator::Ne, Operand::Value(value.into()))
    }

    /// `self < value`.
    #[must_use]
    pub fn lt(self, value: impl Into<Value>) -> Expr {
        Expr::compare(self, Operator::Lt, Operand::Value(value.into()))
    }

    /// `self <= value`.
    #[must_use]
    pub fn le(self, value: impl Into<Value>) -> Expr {
        Expr::compare(self, Operator::Le, Operand::Value(value.into()))
    }

    /// `self > value`.
    #[must_use]
    pub fn gt(self, value: impl Into<Value>) -> Expr {
        Expr::compare(self, Operator::Gt, Operand::Value(value.into()))
    }

    /// `self >= value`.
    #[must_use]
    pub fn ge(self, value: impl Into<Value>) -> Expr {
        Expr::compare(self, Operator::Ge, Operand::Value(value.into()))
    }

    /// `self = other_field`.
    #[must_use]
    pub fn eq_field(self, other: FieldRef) -> Expr {
        Expr::compare(self, Operator::Eq, Operand::Field(other))
    }

    /// `self IS NULL`.
    #[must_use]
    pub fn is_null(self) -> Expr {
        Expr::Compare {
            field: self,
            op: Operator::IsNull,
            rhs: None,
        }
    }

    /// `self IS NOT NULL`.
    #[must_use]
    pub fn is_not_null(self) -> Expr {
        Expr::Compare {
            field: self,
            op: Operator::IsNotNull,
            rhs: None,
        }
    }

    /// `self IN (values...)`.
    #[must_use]
    pub fn in_values<I, V>(self, values: I) -> Expr
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expr::compare(
            self,
            Operator::In,
            Operand::Values(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Ascending sort key on this field.
    #[must_use]
    pub fn asc(self) -> OrderTerm {
        OrderTerm::new(self, Direction::Ascending)
    }

    /// Descending sort key on this field.
    #[must_use]
    pub fn desc(self) -> OrderTerm {
        OrderTerm::new(self, Direction::Descending)
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Member of a value list.
    In,
    /// NULL test.
    IsNull,
    /// Inverted NULL test.
    IsNotNull,
}

impl Operator {
    /// SQL spelling of the operator.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::In => "IN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        }
    }
}

/// The right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A literal value.
    Value(Value),
    /// A list of literal values (for `IN`).
    Values(Vec<Value>),
    /// Another field.
    Field(FieldRef),
}

/// An immutable predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `field op rhs`; `rhs` is absent for NULL tests.
    Compare {
        /// The compared field.
        field: FieldRef,
        /// The comparison operator.
        op: Operator,
        /// The right-hand side, absent for `IS NULL` / `IS NOT NULL`.
        rhs: Option<Operand>,
    },
    /// All operands must hold.
    And(Vec<Expr>),
    /// At least one operand must hold.
    Or(Vec<Expr>),
    /// Logical negation.
    Not(Box<Expr>),
}

impl Expr {
    fn compare(field: FieldRef, op: Operator, rhs: Operand) -> Self {
        Expr::Compare {
            field,
            op,
            rhs: Some(rhs),
        }
    }

    /// Combine with another predicate; both must hold.
    ///
    /// Adjacent conjunctions flatten into one node.
    #[must_use]
    pub fn and(self, other: Expr) -> Expr {
        match self {
            Expr::And(mut operands) => {
                operands.push(other);
                Expr::And(operands)
            }
            first => Expr::And(vec![first, other]),
        }
    }

    /// Combine with another predicate; either may hold.
    #[must_use]
    pub fn or(self, other: Expr) -> Expr {
        match self {
            Expr::Or(mut operands) => {
                operands.push(other);
                Expr::Or(operands)
            }
            first => Expr::Or(vec![first, other]),
        }
    }

    /// Negate the predicate.
    ///
    /// This is logical negation only; sort direction is expressed through
    /// `OrderTerm`, never through negation of an expression.
    #[must_use]
    pub fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }

    /// Every field the tree references, left to right.
    ///
    /// Used by the query builder to check field/table compatibility before
    /// execution.
    #[must_use]
    pub fn fields(&self) -> Vec<&FieldRef> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a FieldRef>) {
        match self {
            Expr::Compare { field, rhs, .. } => {
                out.push(field);
                if let Some(Operand::Field(other)) = rhs {
                    out.push(other);
                }
            }
            Expr::And(operands) | Expr::Or(operands) => {
                for op in operands {
                    op.collect_fields(out);
                }
            }
            Expr::Not(inner) => inner.collect_fields(out),
        }
    }

    /// Render as a human-readable SQL fragment. Diagnostics only.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Expr::Compare { field, op, rhs } => match (op, rhs) {
                (Operator::IsNull | Operator::IsNotNull, _) => {
                    format!("{} {}", field.qualified(), op.as_sql())
                }
                (Operator::In, Some(Operand::Values(values))) => {
                    let items: Vec<String> = values.iter().map(Value::to_sql_literal).collect();
                    format!("{} IN ({})", field.qualified(), items.join(", "))
                }
                (_, Some(Operand::Value(value))) => {
                    format!(
                        "{} {} {}",
                        field.qualified(),
                        op.as_sql(),
                        value.to_sql_literal()
                    )
                }
                (_, Some(Operand::Field(other))) => {
                    format!("{} {} {}", field.qualified(), op.as_sql(), other.qualified())
                }
                (_, _) => field.qualified(),
            },
            Expr::And(operands) => {
                let parts: Vec<String> = operands.iter().map(Expr::to_sql).collect();
                format!("({})", parts.join(" AND "))
            }
            Expr::Or(operands) => {
                let parts: Vec<String> = operands.iter().map(Expr::to_sql).collect();
                format!("({})", parts.join(" OR "))
            }
            Expr::Not(inner) => format!("NOT {}", inner.to_sql()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title() -> FieldRef {
        FieldRef::new("post", "title", SqlType::Text)
    }

    fn id() -> FieldRef {
        FieldRef::new("post", "id", SqlType::BigInt)
    }

    #[test]
    fn test_comparison_rendering() {
        assert_eq!(id().eq(42).to_sql(), "post.id = 42");
        assert_eq!(title().is_null().to_sql(), "post.title IS NULL");
        assert_eq!(
            id().in_values([1i64, 2, 3]).to_sql(),
            "post.id IN (1, 2, 3)"
        );
    }

    #[test]
    fn test_and_flattens() {
        let expr = id().gt(1).and(id().lt(10)).and(title().is_not_null());
        assert!(matches!(&expr, Expr::And(ops) if ops.len() == 3));
        assert_eq!(
            expr.to_sql(),
            "(post.id > 1 AND post.id < 10 AND post.title IS NOT NULL)"
        );
    }

    #[test]
    fn test_not_is_logical() {
        let expr = title().eq("x").not();
        assert_eq!(expr.to_sql(), "NOT post.title = 'x'");
    }

    #[test]
    fn test_fields_collects_both_sides() {
        let expr = id().eq_field(FieldRef::new("comment", "post_id", SqlType::BigInt));
        let fields = expr.fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].qualified(), "post.id");
        assert_eq!(fields[1].qualified(), "comment.post_id");
    }

    #[test]
    fn test_named_matches_static() {
        assert_eq!(
            FieldRef::named("post", "id", SqlType::BigInt),
            FieldRef::new("post", "id", SqlType::BigInt)
        );
    }
}

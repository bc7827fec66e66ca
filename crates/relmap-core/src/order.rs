//! Sort specifications.
//!
//! Ordering is expressed through explicit direction terms. There is no
//! shorthand that negates a field to flip direction; each key carries its
//! own `Direction`.

use crate::expr::FieldRef;

/// Sort direction for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl Direction {
    /// SQL spelling.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

/// One sort key: a field and a direction.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
    field: FieldRef,
    direction: Direction,
}

impl OrderTerm {
    /// Create a sort key.
    #[must_use]
    pub const fn new(field: FieldRef, direction: Direction) -> Self {
        Self { field, direction }
    }

    /// The sorted field.
    #[must_use]
    pub const fn field(&self) -> &FieldRef {
        &self.field
    }

    /// The sort direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }
}

/// An ordered list of sort keys. Earlier keys dominate; later keys break
/// ties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderSpec {
    terms: Vec<OrderTerm>,
}

impl OrderSpec {
    /// An empty specification (store order).
    #[must_use]
    pub const fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// Single ascending key.
    #[must_use]
    pub fn by(field: FieldRef) -> Self {
        Self {
            terms: vec![OrderTerm::new(field, Direction::Ascending)],
        }
    }

    /// Single descending key.
    #[must_use]
    pub fn descending(field: FieldRef) -> Self {
        Self {
            terms: vec![OrderTerm::new(field, Direction::Descending)],
        }
    }

    /// Append an ascending tie-break key.
    #[must_use]
    pub fn then_by(mut self, field: FieldRef) -> Self {
        self.terms.push(OrderTerm::new(field, Direction::Ascending));
        self
    }

    /// Append a descending tie-break key.
    #[must_use]
    pub fn then_by_descending(mut self, field: FieldRef) -> Self {
        self.terms
            .push(OrderTerm::new(field, Direction::Descending));
        self
    }

    /// Append a prepared term.
    #[must_use]
    pub fn then(mut self, term: OrderTerm) -> Self {
        self.terms.push(term);
        self
    }

    /// The keys, in priority order.
    #[must_use]
    pub fn terms(&self) -> &[OrderTerm] {
        &self.terms
    }

    /// True if no keys were given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Render as an `ORDER BY` fragment. Diagnostics only.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let parts: Vec<String> = self
            .terms
            .iter()
            .map(|t| format!("{} {}", t.field().qualified(), t.direction().as_sql()))
            .collect();
        parts.join(", ")
    }
}

impl From<OrderTerm> for OrderSpec {
    fn from(term: OrderTerm) -> Self {
        Self { terms: vec![term] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SqlType;

    fn field(name: &'static str) -> FieldRef {
        FieldRef::new("comment", name, SqlType::BigInt)
    }

    #[test]
    fn test_two_key_ordering() {
        let spec = OrderSpec::descending(field("points")).then_by(field("id"));
        assert_eq!(spec.terms().len(), 2);
        assert_eq!(spec.to_sql(), "comment.points DESC, comment.id ASC");
    }

    #[test]
    fn test_term_builders() {
        let spec: OrderSpec = field("id").desc().into();
        assert_eq!(spec.to_sql(), "comment.id DESC");
        assert!(!spec.is_empty());
        assert!(OrderSpec::new().is_empty());
    }
}

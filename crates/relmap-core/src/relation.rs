//! Relation collections embedded in entity types.
//!
//! A parent entity owns its children through [`RelationMany`]; appending a
//! child hands ownership to the collection and returns a shared handle. The
//! persistence engine discovers pending children by walking
//! [`Record::children`] and saves parents before the children that reference
//! them.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::entity::{Record, SharedRecord};

/// A parent's view of one child collection, type-erased for the persistence
/// engine: the foreign key column the children store, plus the children
/// themselves.
pub struct ChildAttachment {
    /// Column on the child table holding the parent's key.
    pub foreign_key: &'static str,
    /// The attached children.
    pub children: Vec<SharedRecord>,
}

/// An owning to-many collection.
///
/// The collection knows the foreign key column its children carry; the
/// engine fills that column from the parent's key at save time.
pub struct RelationMany<T> {
    foreign_key: &'static str,
    items: Vec<Rc<RefCell<T>>>,
}

impl<T> RelationMany<T> {
    /// An empty collection whose children store their parent's key in
    /// `foreign_key`.
    #[must_use]
    pub const fn new(foreign_key: &'static str) -> Self {
        Self {
            foreign_key,
            items: Vec::new(),
        }
    }

    /// The foreign key column on the child table.
    #[must_use]
    pub const fn foreign_key(&self) -> &'static str {
        self.foreign_key
    }

    /// Take ownership of a child and return a shared handle to it.
    pub fn append(&mut self, child: T) -> Rc<RefCell<T>> {
        let shared = Rc::new(RefCell::new(child));
        self.items.push(Rc::clone(&shared));
        shared
    }

    /// Attach an already-shared child. Attaching the same handle twice is a
    /// no-op.
    pub fn append_shared(&mut self, child: &Rc<RefCell<T>>) {
        if !self.items.iter().any(|item| Rc::ptr_eq(item, child)) {
            self.items.push(Rc::clone(child));
        }
    }

    /// Number of attached children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if no children are attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Shared handle to the child at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Rc<RefCell<T>>> {
        self.items.get(index).map(Rc::clone)
    }

    /// Iterate over the attached children.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<RefCell<T>>> {
        self.items.iter()
    }

    /// Discard the current children and own `children` instead. Used when a
    /// query eagerly loads the relation.
    pub fn replace(&mut self, children: Vec<T>) {
        self.items = children
            .into_iter()
            .map(|c| Rc::new(RefCell::new(c)))
            .collect();
    }
}

impl<T: Record + 'static> RelationMany<T> {
    /// The type-erased view the persistence engine walks.
    #[must_use]
    pub fn attachment(&self) -> ChildAttachment {
        ChildAttachment {
            foreign_key: self.foreign_key,
            children: self
                .items
                .iter()
                .map(|item| Rc::clone(item) as SharedRecord)
                .collect(),
        }
    }
}

impl<T> Clone for RelationMany<T> {
    fn clone(&self) -> Self {
        Self {
            foreign_key: self.foreign_key,
            items: self.items.clone(),
        }
    }
}

impl<T> fmt::Debug for RelationMany<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationMany")
            .field("foreign_key", &self.foreign_key)
            .field("len", &self.items.len())
            .finish()
    }
}

/// A child's reference to its parent.
///
/// Setting the parent does not save anything by itself; the parent must be
/// tracked on its own (or reachable through some other collection) for the
/// engine to see it.
pub struct RelationOne<T> {
    foreign_key: &'static str,
    target: Option<Rc<RefCell<T>>>,
}

impl<T> RelationOne<T> {
    /// An unset reference whose child stores the parent's key in
    /// `foreign_key`.
    #[must_use]
    pub const fn new(foreign_key: &'static str) -> Self {
        Self {
            foreign_key,
            target: None,
        }
    }

    /// The foreign key column on this child's table.
    #[must_use]
    pub const fn foreign_key(&self) -> &'static str {
        self.foreign_key
    }

    /// Point at a parent.
    pub fn set(&mut self, parent: &Rc<RefCell<T>>) {
        self.target = Some(Rc::clone(parent));
    }

    /// Drop the reference.
    pub fn clear(&mut self) {
        self.target = None;
    }

    /// Shared handle to the parent, if set.
    #[must_use]
    pub fn get(&self) -> Option<Rc<RefCell<T>>> {
        self.target.as_ref().map(Rc::clone)
    }

    /// True if a parent is set.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.target.is_some()
    }
}

impl<T> Clone for RelationOne<T> {
    fn clone(&self) -> Self {
        Self {
            foreign_key: self.foreign_key,
            target: self.target.clone(),
        }
    }
}

impl<T> fmt::Debug for RelationOne<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationOne")
            .field("foreign_key", &self.foreign_key)
            .field("set", &self.target.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_shares_ownership() {
        let mut rel: RelationMany<String> = RelationMany::new("post_id");
        let first = rel.append("a".to_string());
        assert_eq!(rel.len(), 1);
        *first.borrow_mut() = "b".to_string();
        assert_eq!(*rel.get(0).unwrap().borrow(), "b");
    }

    #[test]
    fn test_append_shared_is_idempotent() {
        let mut rel: RelationMany<i64> = RelationMany::new("post_id");
        let child = Rc::new(RefCell::new(1));
        rel.append_shared(&child);
        rel.append_shared(&child);
        assert_eq!(rel.len(), 1);
    }

    #[test]
    fn test_replace_discards_previous() {
        let mut rel: RelationMany<i64> = RelationMany::new("post_id");
        rel.append(1);
        rel.replace(vec![2, 3]);
        assert_eq!(rel.len(), 2);
        assert_eq!(*rel.get(0).unwrap().borrow(), 2);
    }

    #[test]
    fn test_relation_one() {
        let mut rel: RelationOne<i64> = RelationOne::new("post_id");
        assert!(!rel.is_set());
        let parent = Rc::new(RefCell::new(9));
        rel.set(&parent);
        assert_eq!(*rel.get().unwrap().borrow(), 9);
        rel.clear();
        assert!(rel.get().is_none());
    }
}

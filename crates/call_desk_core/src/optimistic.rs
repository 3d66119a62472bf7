//! crates/call_desk_core/src/optimistic.rs
//!
//! A keyed list that accepts local mutations ahead of the store's confirmation
//! and can be replaced wholesale when the store's copy has to win.

use uuid::Uuid;

use crate::domain::{Message, Task};

/// Anything with a stable identifier inside a list.
pub trait Keyed {
    type Key: PartialEq + Clone;

    fn key(&self) -> Self::Key;
}

impl Keyed for Task {
    type Key = Uuid;

    fn key(&self) -> Uuid {
        self.id
    }
}

impl Keyed for Message {
    type Key = Uuid;

    fn key(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimisticList<T> {
    items: Vec<T>,
}

impl<T> Default for OptimisticList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Keyed + Clone> OptimisticList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.items.iter().find(|item| item.key() == *key)
    }

    /// Replaces an item with the same key in place, or appends it.
    pub fn upsert(&mut self, item: T) {
        let key = item.key();
        match self.items.iter_mut().find(|existing| existing.key() == key) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    /// Applies `change` to the item with `key` and returns the updated copy.
    pub fn update<F>(&mut self, key: &T::Key, change: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        let item = self.items.iter_mut().find(|item| item.key() == *key)?;
        change(item);
        Some(item.clone())
    }

    pub fn remove(&mut self, key: &T::Key) -> Option<T> {
        let index = self.items.iter().position(|item| item.key() == *key)?;
        Some(self.items.remove(index))
    }

    /// Discards all local state in favour of the authoritative list.
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
    }
}

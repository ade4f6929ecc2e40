//! In-memory authoritative trail.
//!
//! Holds the ordered, deduplicated, size-capped list of visited dashboards.
//! Nothing here touches storage or the location; persistence is an explicit
//! step taken by the controller.

use crate::model::BreadcrumbItem;

/// Default cap on the number of trail entries.
pub const DEFAULT_MAX_LENGTH: usize = 25;

/// Result of `BreadcrumbStore::upsert_current`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Appended,
    Replaced { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreadcrumbStore {
    items: Vec<BreadcrumbItem>,
    max_length: usize,
}

impl Default for BreadcrumbStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LENGTH)
    }
}

impl BreadcrumbStore {
    /// A zero cap is clamped to one.
    pub fn new(max_length: usize) -> Self {
        Self {
            items: Vec::new(),
            max_length: max_length.max(1),
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn items(&self) -> &[BreadcrumbItem] {
        &self.items
    }

    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&BreadcrumbItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Append `item`, or replace the entry with the same id in place.
    pub fn upsert_current(&mut self, item: BreadcrumbItem) -> Upsert {
        match self.position(&item.id) {
            Some(index) => {
                self.items[index] = item;
                Upsert::Replaced { index }
            }
            None => {
                self.items.push(item);
                Upsert::Appended
            }
        }
    }

    /// Remove every item after `id`. Returns how many were removed; an
    /// unknown id removes nothing.
    pub fn truncate_after(&mut self, id: &str) -> usize {
        let Some(index) = self.position(id) else {
            return 0;
        };
        let removed = self.items.len() - index - 1;
        self.items.truncate(index + 1);
        removed
    }

    /// Drop oldest entries until the cap holds. Returns the evicted items,
    /// oldest first.
    pub fn evict_if_overflow(&mut self) -> Vec<BreadcrumbItem> {
        if self.items.len() <= self.max_length {
            return Vec::new();
        }
        let overflow = self.items.len() - self.max_length;
        self.items.drain(..overflow).collect()
    }

    /// Replace the whole trail. Later duplicates of an id are dropped and
    /// the cap is enforced, so the invariants hold afterwards.
    pub fn replace_all(&mut self, items: Vec<BreadcrumbItem>) {
        self.items.clear();
        for item in items {
            if self.position(&item.id).is_none() {
                self.items.push(item);
            }
        }
        self.evict_if_overflow();
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

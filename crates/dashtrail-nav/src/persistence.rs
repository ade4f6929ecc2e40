//! Session-storage persistence of the trail.
//!
//! The whole trail is stored as a JSON array under one key and is read or
//! written in full each time.

use std::sync::Arc;

use dashtrail_core::error::TrailError;
use dashtrail_core::model::BreadcrumbItem;

use crate::ports::StoragePort;

pub const STORAGE_KEY: &str = "dashlist";

pub struct PersistenceAdapter {
    storage: Arc<dyn StoragePort>,
}

impl PersistenceAdapter {
    pub fn new(storage: Arc<dyn StoragePort>) -> Self {
        Self { storage }
    }

    /// Create an empty trail slot if none exists yet.
    pub fn initialize(&self) -> Result<(), TrailError> {
        if self.storage.get_item(STORAGE_KEY)?.is_none() {
            self.storage.set_item(STORAGE_KEY, "[]")?;
        }
        Ok(())
    }

    /// Read the persisted trail. A missing slot is an empty trail; an
    /// inaccessible or corrupt slot is `StorageUnavailable`.
    pub fn load(&self) -> Result<Vec<BreadcrumbItem>, TrailError> {
        match self.storage.get_item(STORAGE_KEY)? {
            None => Ok(Vec::new()),
            Some(text) if text.trim().is_empty() => Ok(Vec::new()),
            Some(text) => serde_json::from_str(&text)
                .map_err(|e| TrailError::storage(format!("corrupt {STORAGE_KEY}: {e}"))),
        }
    }

    pub fn save(&self, items: &[BreadcrumbItem]) -> Result<(), TrailError> {
        let text = serde_json::to_string(items)
            .map_err(|e| TrailError::storage(format!("encode {STORAGE_KEY}: {e}")))?;
        self.storage.set_item(STORAGE_KEY, &text)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::memory::MemoryStorage;
    use dashtrail_core::error::TrailErrorKind;
    use dashtrail_core::params::QueryParams;

    fn item(id: &str) -> BreadcrumbItem {
        BreadcrumbItem::new(id, format!("/d/{id}/x"), id, QueryParams::new(), "http://h")
    }

    #[test]
    fn save_then_load_preserves_order() {
        let storage = Arc::new(MemoryStorage::new());
        let adapter = PersistenceAdapter::new(storage.clone());
        adapter.save(&[item("b"), item("a")]).unwrap();
        let loaded = adapter.load().unwrap();
        assert_eq!(loaded, vec![item("b"), item("a")]);
        assert!(storage.raw(STORAGE_KEY).unwrap().starts_with('['));
    }

    #[test]
    fn missing_slot_is_empty_and_initialize_creates_it() {
        let storage = Arc::new(MemoryStorage::new());
        let adapter = PersistenceAdapter::new(storage.clone());
        assert!(adapter.load().unwrap().is_empty());
        adapter.initialize().unwrap();
        assert_eq!(storage.raw(STORAGE_KEY).as_deref(), Some("[]"));
    }

    #[test]
    fn initialize_keeps_existing_trail() {
        let storage = Arc::new(MemoryStorage::new());
        let adapter = PersistenceAdapter::new(storage.clone());
        adapter.save(&[item("a")]).unwrap();
        adapter.initialize().unwrap();
        assert_eq!(adapter.load().unwrap().len(), 1);
    }

    #[test]
    fn corrupt_slot_is_storage_unavailable() {
        let storage = Arc::new(MemoryStorage::new().with_item(STORAGE_KEY, "{not json"));
        let adapter = PersistenceAdapter::new(storage);
        let err = adapter.load().unwrap_err();
        assert_eq!(err.kind(), TrailErrorKind::StorageUnavailable);
    }

    #[test]
    fn disabled_storage_is_storage_unavailable() {
        let adapter = PersistenceAdapter::new(Arc::new(MemoryStorage::unavailable()));
        assert_eq!(
            adapter.load().unwrap_err().kind(),
            TrailErrorKind::StorageUnavailable
        );
        assert_eq!(
            adapter.save(&[item("a")]).unwrap_err().kind(),
            TrailErrorKind::StorageUnavailable
        );
    }
}

//! Revision state storage.

use crate::error::StoreResult;
use crate::models::{ItemId, ReviewEvent, RevisionItem};
use std::collections::BTreeMap;

/// Durable per-item scheduling state plus the review log.
pub trait RevisionStore {
    fn get(&self, item_id: ItemId) -> StoreResult<Option<RevisionItem>>;

    fn get_all(&self) -> StoreResult<Vec<RevisionItem>>;

    /// Replace the stored item with this one.
    fn upsert(&mut self, item: &RevisionItem) -> StoreResult<()>;

    /// Write the reviewed item and append its event; both or neither.
    fn record_review(&mut self, item: &RevisionItem, event: &ReviewEvent) -> StoreResult<()>;

    fn events_for(&self, item_id: ItemId) -> StoreResult<Vec<ReviewEvent>>;

    fn all_events(&self) -> StoreResult<Vec<ReviewEvent>>;
}

/// Store kept entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: BTreeMap<ItemId, RevisionItem>,
    events: Vec<ReviewEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RevisionStore for MemoryStore {
    fn get(&self, item_id: ItemId) -> StoreResult<Option<RevisionItem>> {
        Ok(self.items.get(&item_id).cloned())
    }

    fn get_all(&self) -> StoreResult<Vec<RevisionItem>> {
        Ok(self.items.values().cloned().collect())
    }

    fn upsert(&mut self, item: &RevisionItem) -> StoreResult<()> {
        self.items.insert(item.item_id, item.clone());
        Ok(())
    }

    fn record_review(&mut self, item: &RevisionItem, event: &ReviewEvent) -> StoreResult<()> {
        self.items.insert(item.item_id, item.clone());
        self.events.push(event.clone());
        Ok(())
    }

    fn events_for(&self, item_id: ItemId) -> StoreResult<Vec<ReviewEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|e| e.item_id == item_id)
            .cloned()
            .collect())
    }

    fn all_events(&self) -> StoreResult<Vec<ReviewEvent>> {
        Ok(self.events.clone())
    }
}

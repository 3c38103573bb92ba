//! Persistence boundary for learning items.
use crate::error::{CorruptSchedulingState, StoreError};
use crate::models::{ItemRecord, LearningItem};
use chrono::{DateTime, Utc};
use tracing::warn;

/// Items read from a store, along with the repairs made while loading them.
#[derive(Debug, Default)]
pub struct Loaded {
    pub items: Vec<LearningItem>,
    pub repairs: Vec<CorruptSchedulingState>,
}

impl Loaded {
    /// Converts persisted records, logging every repaired field.
    pub fn from_records(records: impl IntoIterator<Item = ItemRecord>) -> Self {
        let mut loaded = Loaded::default();
        for record in records {
            let (item, repairs) = LearningItem::from_record(record);
            for repair in &repairs {
                warn!("{repair}");
            }
            loaded.items.push(item);
            loaded.repairs.extend(repairs);
        }
        loaded
    }
}

/// Get/put access to persisted items. Each store guarantees that a `put`
/// either lands completely or not at all.
pub trait ItemStore {
    fn load_all(&mut self) -> Result<Loaded, StoreError>;

    fn get(&mut self, id: &str) -> Result<Option<LearningItem>, StoreError> {
        Ok(self
            .load_all()?
            .items
            .into_iter()
            .find(|item| item.id() == id))
    }

    /// Inserts the item or replaces the stored item with the same id.
    fn put(&mut self, item: &LearningItem) -> Result<(), StoreError>;

    /// Returns false if no item had this id.
    fn remove(&mut self, id: &str) -> Result<bool, StoreError>;

    /// The instant sessions should treat as "now".
    fn current_time(&self) -> Result<DateTime<Utc>, StoreError> {
        Ok(Utc::now())
    }
}

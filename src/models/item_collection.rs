//! Container for all learning items of a user
use super::{CollectionStats, LearningItem, Policy, due};
use chrono::{DateTime, Utc};

#[derive(Clone, Debug, Default)]
pub struct ItemCollection {
    items: Vec<LearningItem>,
}

impl ItemCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection, keeping the first item of any repeated id.
    pub fn from_items(items: impl IntoIterator<Item = LearningItem>) -> Self {
        let mut collection = Self::new();
        for item in items {
            if collection.get(item.id()).is_none() {
                collection.items.push(item);
            }
        }
        collection
    }

    pub fn items(&self) -> &[LearningItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Creates a new item and returns it.
    pub fn add(
        &mut self,
        prompt: impl Into<String>,
        answer: impl Into<String>,
        policy: Policy,
        now: DateTime<Utc>,
    ) -> &LearningItem {
        self.items.push(LearningItem::new(prompt, answer, policy, now));
        &self.items[self.items.len() - 1]
    }

    pub fn get(&self, id: &str) -> Option<&LearningItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Stores `item`, replacing the item with the same id if present.
    pub fn put(&mut self, item: LearningItem) {
        match self.items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<LearningItem> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }

    /// Changes prompt and answer of an item. Returns false if the id is unknown.
    pub fn edit(&mut self, id: &str, prompt: &str, answer: &str) -> bool {
        match self.items.iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                item.set_content(prompt, answer);
                true
            }
            None => false,
        }
    }

    pub fn due_items(&self, now: DateTime<Utc>) -> Vec<&LearningItem> {
        due::due_items(&self.items, now)
    }

    pub fn stats(&self, now: DateTime<Utc>) -> CollectionStats {
        CollectionStats::from_items(&self.items, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_add_and_get() {
        let now = Utc::now();
        let mut collection = ItemCollection::new();
        let id = collection
            .add("hello", "cześć", Policy::Light, now)
            .id()
            .to_string();

        assert_eq!(collection.len(), 1);
        let item = collection.get(&id).unwrap();
        assert_eq!(item.prompt(), "hello");
        assert_eq!(item.answer(), "cześć");
        assert!(collection.get("missing").is_none());
    }

    #[test]
    fn test_put_replaces_by_id() {
        let now = Utc::now();
        let mut collection = ItemCollection::new();
        let item = collection.add("q", "a", Policy::Simple, now).clone();

        let mut rated = item.clone();
        rated.rate(3, now).unwrap();
        collection.put(rated);

        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get(item.id()).unwrap().interval_days(), 3);

        collection.put(LearningItem::new("other", "b", Policy::Simple, now));
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_remove_and_edit() {
        let now = Utc::now();
        let mut collection = ItemCollection::new();
        let id = collection.add("q", "a", Policy::Light, now).id().to_string();

        assert!(collection.edit(&id, "question", "answer"));
        assert_eq!(collection.get(&id).unwrap().prompt(), "question");
        assert!(!collection.edit("missing", "x", "y"));

        let removed = collection.remove(&id).unwrap();
        assert_eq!(removed.id(), id);
        assert!(collection.is_empty());
        assert!(collection.remove(&id).is_none());
    }

    #[test]
    fn test_from_items_drops_repeated_ids() {
        let item = LearningItem::new("q", "a", Policy::Light, Utc::now());
        let collection = ItemCollection::from_items(vec![item.clone(), item]);
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_due_items() {
        let now = Utc::now();
        let mut collection = ItemCollection::new();
        collection.add("new", "a", Policy::Simple, now);
        let mut reviewed = LearningItem::new("reviewed", "b", Policy::Simple, now);
        reviewed.rate(4, now).unwrap();
        collection.put(reviewed);

        assert_eq!(collection.due_items(now).len(), 1);
        assert_eq!(collection.due_items(now + Duration::days(3)).len(), 2);
        assert_eq!(collection.stats(now).due, 1);
    }
}

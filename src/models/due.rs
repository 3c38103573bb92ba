//! Due-set queries.
use super::LearningItem;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Never-reviewed items are always due; otherwise an item is due once
/// `interval_days` have passed since its last review.
pub fn is_due(item: &LearningItem, now: DateTime<Utc>) -> bool {
    match item.next_due_at() {
        None => true,
        Some(due_at) => now >= due_at,
    }
}

/// Returns the due items in their original order. An id appearing more than
/// once is only returned the first time.
pub fn due_items<'a, I>(items: I, now: DateTime<Utc>) -> Vec<&'a LearningItem>
where
    I: IntoIterator<Item = &'a LearningItem>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|&item| is_due(item, now))
        .filter(|&item| seen.insert(item.id()))
        .collect()
}

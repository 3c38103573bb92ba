//! Summary numbers over a collection of items.
use super::{LearningItem, LearningStage};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollectionStats {
    pub total: usize,
    pub due: usize,
    pub total_reviews: usize,
    pub new: usize,
    pub learning: usize,
    pub mature: usize,
    /// Number of items per current interval, keyed by days.
    pub interval_distribution: BTreeMap<u32, usize>,
}

impl CollectionStats {
    pub fn from_items<'a, I>(items: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a LearningItem>,
    {
        let mut stats = CollectionStats::default();
        for item in items {
            stats.total += 1;
            if item.is_due(now) {
                stats.due += 1;
            }
            stats.total_reviews += item.review_history().len();
            match item.stage() {
                LearningStage::New => stats.new += 1,
                LearningStage::Learning => stats.learning += 1,
                LearningStage::Mature => stats.mature += 1,
            }
            *stats
                .interval_distribution
                .entry(item.interval_days())
                .or_insert(0) += 1;
        }
        stats
    }

    pub fn average_reviews(&self) -> Option<f64> {
        (self.total > 0).then(|| self.total_reviews as f64 / self.total as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Policy;
    use chrono::TimeZone;

    #[test]
    fn test_empty_stats() {
        let items: Vec<LearningItem> = Vec::new();
        let stats = CollectionStats::from_items(&items, Utc::now());
        assert_eq!(stats, CollectionStats::default());
        assert_eq!(stats.average_reviews(), None);
    }

    #[test]
    fn test_counts() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let fresh = LearningItem::new("a", "1", Policy::Simple, now);
        let mut reviewed = LearningItem::new("b", "2", Policy::Simple, now);
        reviewed.rate(3, now).unwrap();
        let mut lapsed = LearningItem::new("c", "3", Policy::Light, now);
        lapsed.rate(3, now).unwrap();
        lapsed.rate(1, now).unwrap();

        let items = [fresh, reviewed, lapsed];
        let stats = CollectionStats::from_items(&items, now);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.due, 1);
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.new, 1);
        assert_eq!(stats.learning, 2);
        assert_eq!(stats.mature, 0);
        assert_eq!(stats.interval_distribution.get(&1), Some(&2));
        assert_eq!(stats.interval_distribution.get(&3), Some(&1));
        assert_eq!(stats.average_reviews(), Some(1.0));
    }
}

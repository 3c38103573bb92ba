//! Learning session management for active-recall practice.
//! Walks through the due items once: prompt, answer, then a single rating.

use super::{ItemCollection, LearningItem, Rating};
use crate::error::SessionError;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

/// Manages one pass over the items that were due when the session started.
/// Every presented item is rated exactly once.
pub struct LearningSession {
    items: Vec<LearningItem>,
    current_index: usize,
    show_answer: bool,
    rating_counts: [usize; 4],
}

impl LearningSession {
    pub fn new(items: Vec<LearningItem>) -> Self {
        Self {
            items,
            current_index: 0,
            show_answer: false,
            rating_counts: [0; 4],
        }
    }

    /// Creates a session from the items of `collection` that are due at `now`.
    pub fn new_from_due_items(collection: &ItemCollection, now: DateTime<Utc>) -> Self {
        let items = collection.due_items(now).into_iter().cloned().collect();
        Self::new(items)
    }

    /// Puts the not yet presented items into random order.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if let Some(remaining) = self.items.get_mut(self.current_index..) {
            remaining.shuffle(rng);
        }
    }

    pub fn current_item(&self) -> Option<&LearningItem> {
        self.items.get(self.current_index)
    }

    pub fn is_answer_shown(&self) -> bool {
        self.show_answer
    }

    /// All items of the session in presentation order.
    pub fn items(&self) -> &[LearningItem] {
        &self.items
    }

    pub fn reveal_answer(&mut self) -> Option<&str> {
        let item = self.items.get(self.current_index)?;
        self.show_answer = true;
        Some(item.answer())
    }

    /// Rates the current item and moves on to the next one.
    /// Returns the updated item so the caller can persist it.
    ///
    /// An invalid rating keeps the session on the same item.
    pub fn grade_current(
        &mut self,
        rating: u8,
        now: DateTime<Utc>,
    ) -> Result<&LearningItem, SessionError> {
        if self.is_completed() {
            return Err(SessionError::Completed);
        }
        if !self.show_answer {
            return Err(SessionError::AnswerNotRevealed);
        }
        let rating = Rating::try_from(rating)?;

        let index = self.current_index;
        let updated = self.items[index].rated(rating, now);
        self.items[index] = updated;
        self.rating_counts[usize::from(rating.value() - 1)] += 1;

        self.current_index += 1;
        self.show_answer = false;
        Ok(&self.items[index])
    }

    pub fn reviewed_count(&self) -> usize {
        self.current_index.min(self.items.len())
    }

    pub fn total_count(&self) -> usize {
        self.items.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.reviewed_count()
    }

    pub fn is_completed(&self) -> bool {
        self.current_index >= self.items.len()
    }

    pub fn count_for(&self, rating: Rating) -> usize {
        self.rating_counts[usize::from(rating.value() - 1)]
    }

    /// Items rated so far, in presentation order.
    pub fn reviewed_items(&self) -> &[LearningItem] {
        &self.items[..self.reviewed_count()]
    }

    pub fn progress_message(&self) -> String {
        if self.is_completed() {
            format!("Session finished: {} items reviewed", self.reviewed_count())
        } else {
            format!("Item {}/{}", self.current_index + 1, self.total_count())
        }
    }
}

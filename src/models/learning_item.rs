//! A prompt/answer pair together with its scheduling state and review history.
use super::policy::{self, Policy, Schedule};
use super::Rating;
use crate::error::{CorruptSchedulingState, SchedulerError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Consecutive successes after which an item counts as mature.
pub const MATURE_THRESHOLD: u32 = 3;

/// One entry of the append-only review log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub timestamp: DateTime<Utc>,
    pub rating: Rating,
    pub interval_before: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LearningStage {
    New,
    Learning,
    Mature,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LearningItem {
    id: String,
    prompt: String,
    answer: String,
    created_at: Option<DateTime<Utc>>,
    last_reviewed_at: Option<DateTime<Utc>>,
    interval_days: u32,
    repetition_count: u32,
    ease_factor: Option<f64>,
    review_history: Vec<ReviewRecord>,
}

impl LearningItem {
    /// Creates a never-reviewed item with a fresh id.
    pub fn new(
        prompt: impl Into<String>,
        answer: impl Into<String>,
        policy: Policy,
        now: DateTime<Utc>,
    ) -> Self {
        let schedule = policy.initial_schedule();
        Self {
            id: Uuid::new_v4().to_string(),
            prompt: prompt.into(),
            answer: answer.into(),
            created_at: Some(now),
            last_reviewed_at: None,
            interval_days: schedule.interval_days,
            repetition_count: schedule.repetition_count,
            ease_factor: schedule.ease_factor,
            review_history: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn last_reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.last_reviewed_at
    }

    pub fn interval_days(&self) -> u32 {
        self.interval_days
    }

    pub fn repetition_count(&self) -> u32 {
        self.repetition_count
    }

    pub fn ease_factor(&self) -> Option<f64> {
        self.ease_factor
    }

    pub fn review_history(&self) -> &[ReviewRecord] {
        &self.review_history
    }

    /// Items carrying an ease factor follow the Light policy.
    pub fn policy(&self) -> Policy {
        if self.ease_factor.is_some() {
            Policy::Light
        } else {
            Policy::Simple
        }
    }

    pub fn schedule(&self) -> Schedule {
        Schedule {
            interval_days: self.interval_days,
            repetition_count: self.repetition_count,
            ease_factor: self.ease_factor,
        }
    }

    pub fn stage(&self) -> LearningStage {
        if self.last_reviewed_at.is_none() {
            LearningStage::New
        } else if self.repetition_count >= MATURE_THRESHOLD {
            LearningStage::Mature
        } else {
            LearningStage::Learning
        }
    }

    /// When the item becomes due again, `None` if it was never reviewed.
    /// Due dates beyond the representable range become `DateTime::MAX_UTC`.
    pub fn next_due_at(&self) -> Option<DateTime<Utc>> {
        self.last_reviewed_at.map(|last| {
            Duration::try_days(i64::from(self.interval_days))
                .and_then(|interval| last.checked_add_signed(interval))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        })
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        super::due::is_due(self, now)
    }

    /// Replaces prompt and answer. Scheduling state is left as it is.
    pub fn set_content(&mut self, prompt: impl Into<String>, answer: impl Into<String>) {
        self.prompt = prompt.into();
        self.answer = answer.into();
    }

    /// Rates the item in place. On error the item is left unchanged.
    pub fn rate(&mut self, rating: u8, now: DateTime<Utc>) -> Result<(), SchedulerError> {
        *self = policy::apply_rating(self, rating, now)?;
        Ok(())
    }

    pub(crate) fn rated(&self, rating: Rating, now: DateTime<Utc>) -> LearningItem {
        let policy = self.policy();
        let next = policy.next_schedule(&self.schedule(), rating);

        let mut review_history = self.review_history.clone();
        review_history.push(ReviewRecord {
            timestamp: now,
            rating,
            interval_before: self.interval_days,
        });

        debug!(
            id = %self.id,
            %policy,
            rating = rating.value(),
            interval_before = self.interval_days,
            interval_after = next.interval_days,
            repetitions = next.repetition_count,
            "item rated"
        );

        LearningItem {
            id: self.id.clone(),
            prompt: self.prompt.clone(),
            answer: self.answer.clone(),
            created_at: self.created_at,
            last_reviewed_at: Some(now),
            interval_days: next.interval_days,
            repetition_count: next.repetition_count,
            ease_factor: next.ease_factor,
            review_history,
        }
    }

    /// Builds an item from its persisted form, clamping out-of-range
    /// scheduling fields. Every clamp is reported in the returned list.
    pub fn from_record(record: ItemRecord) -> (LearningItem, Vec<CorruptSchedulingState>) {
        let mut repairs = Vec::new();

        let interval_days = if record.interval_days < 1 {
            repairs.push(CorruptSchedulingState::IntervalBelowOne {
                id: record.id.clone(),
                found: record.interval_days,
            });
            1
        } else {
            clamp_to_u32(&record.id, "intervalDays", record.interval_days, &mut repairs)
        };

        let repetition_count = if record.repetition_count < 0 {
            repairs.push(CorruptSchedulingState::NegativeRepetitions {
                id: record.id.clone(),
                found: record.repetition_count,
            });
            0
        } else {
            clamp_to_u32(&record.id, "repetitionCount", record.repetition_count, &mut repairs)
        };

        let ease_factor = record.ease_factor.map(|ease| {
            if (policy::MIN_EASE..=policy::MAX_EASE).contains(&ease) {
                return ease;
            }
            let clamped = if ease.is_nan() {
                policy::INITIAL_EASE
            } else {
                ease.clamp(policy::MIN_EASE, policy::MAX_EASE)
            };
            repairs.push(CorruptSchedulingState::EaseOutOfRange {
                id: record.id.clone(),
                found: ease,
                clamped,
            });
            clamped
        });

        let item = LearningItem {
            id: record.id,
            prompt: record.prompt,
            answer: record.answer,
            created_at: record.created_at,
            last_reviewed_at: record.last_reviewed_at,
            interval_days,
            repetition_count,
            ease_factor,
            review_history: record.review_history,
        };
        (item, repairs)
    }

    pub fn to_record(&self) -> ItemRecord {
        ItemRecord {
            id: self.id.clone(),
            prompt: self.prompt.clone(),
            answer: self.answer.clone(),
            created_at: self.created_at,
            last_reviewed_at: self.last_reviewed_at,
            interval_days: i64::from(self.interval_days),
            repetition_count: i64::from(self.repetition_count),
            ease_factor: self.ease_factor,
            review_history: self.review_history.clone(),
        }
    }
}

/// Persisted shape of a [`LearningItem`].
///
/// Numeric fields are signed so that corrupt values survive parsing and can
/// be repaired by [`LearningItem::from_record`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub id: String,
    pub prompt: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    #[serde(default = "default_interval")]
    pub interval_days: i64,
    #[serde(default)]
    pub repetition_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ease_factor: Option<f64>,
    #[serde(default)]
    pub review_history: Vec<ReviewRecord>,
}

fn default_interval() -> i64 {
    1
}

fn clamp_to_u32(
    id: &str,
    field: &'static str,
    value: i64,
    repairs: &mut Vec<CorruptSchedulingState>,
) -> u32 {
    u32::try_from(value).unwrap_or_else(|_| {
        repairs.push(CorruptSchedulingState::ValueTooLarge {
            id: id.to_string(),
            field,
            found: value,
        });
        u32::MAX
    })
}

//! Interval scheduling policies.
//!
//! Two policies decide how an item's interval evolves after each rating:
//! - Light: 1 day → 6 days → interval × ease factor. The ease factor rises by
//!   0.1 on "Easy" and drops by 0.2 on "Hard", bounded to [1.3, 3.0].
//!   A failed recall shrinks the interval to 60% (at least 1 day).
//! - Simple: 3 days → 7 days → doubling. A failed recall resets to 1 day.
//!
//! Ratings of 3 and 4 count as success and extend the streak; ratings of 1
//! and 2 reset the repetition count to 0 under both policies.

use super::{LearningItem, Rating};
use crate::error::SchedulerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const INITIAL_EASE: f64 = 2.5;
pub const MIN_EASE: f64 = 1.3;
pub const MAX_EASE: f64 = 3.0;

const EASE_BONUS: f64 = 0.1;
const EASE_PENALTY: f64 = 0.2;
const LAPSE_FACTOR: f64 = 0.6;

// Absorbs binary float error so that e.g. 6 × 2.6 floors to 15, not 14.
const FLOOR_TOLERANCE: f64 = 1e-9;

/// Scheduling policy, chosen when an item is created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    #[default]
    Light,
    Simple,
}

/// The scheduling fields a policy reads and writes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Schedule {
    pub interval_days: u32,
    pub repetition_count: u32,
    pub ease_factor: Option<f64>,
}

impl Policy {
    /// Scheduling state of a never-reviewed item.
    pub fn initial_schedule(self) -> Schedule {
        Schedule {
            interval_days: 1,
            repetition_count: 0,
            ease_factor: self.uses_ease().then_some(INITIAL_EASE),
        }
    }

    pub fn uses_ease(self) -> bool {
        matches!(self, Policy::Light)
    }

    /// Intervals for the first and second consecutive success.
    fn opening_intervals(self) -> (u32, u32) {
        match self {
            Policy::Light => (1, 6),
            Policy::Simple => (3, 7),
        }
    }

    pub fn label(self, rating: Rating) -> &'static str {
        match (self, rating) {
            (_, Rating::Hard) => "Hard",
            (_, Rating::Medium) => "Medium",
            (_, Rating::Good) => "Good",
            (Policy::Light, Rating::Easy) => "Easy",
            (Policy::Simple, Rating::Easy) => "Perfect",
        }
    }

    /// Computes the schedule that follows `current` after `rating`.
    pub fn next_schedule(self, current: &Schedule, rating: Rating) -> Schedule {
        let ease = current.ease_factor.unwrap_or(INITIAL_EASE);

        if rating.is_success() {
            let repetition_count = current.repetition_count.saturating_add(1);
            let (first, second) = self.opening_intervals();
            let interval_days = match repetition_count {
                1 => first,
                2 => second,
                _ => match self {
                    Policy::Light => floor_product(current.interval_days, ease),
                    Policy::Simple => current.interval_days.saturating_mul(2),
                },
            };
            let ease_factor = match self {
                Policy::Light if rating == Rating::Easy => Some(adjust_ease(ease, EASE_BONUS)),
                Policy::Light => Some(ease),
                Policy::Simple => None,
            };
            Schedule {
                interval_days: interval_days.max(1),
                repetition_count,
                ease_factor,
            }
        } else {
            let (interval_days, ease_factor) = match self {
                Policy::Light => {
                    let ease = if rating == Rating::Hard {
                        adjust_ease(ease, -EASE_PENALTY)
                    } else {
                        ease
                    };
                    (floor_product(current.interval_days, LAPSE_FACTOR), Some(ease))
                }
                Policy::Simple => (1, None),
            };
            Schedule {
                interval_days: interval_days.max(1),
                repetition_count: 0,
                ease_factor,
            }
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Light => write!(f, "light"),
            Policy::Simple => write!(f, "simple"),
        }
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Policy::Light),
            "simple" => Ok(Policy::Simple),
            other => Err(format!("unknown policy '{other}', expected 'light' or 'simple'")),
        }
    }
}

/// Rates `item` and returns the updated item, leaving `item` untouched.
/// Ratings outside 1..=4 are rejected without any change.
pub fn apply_rating(
    item: &LearningItem,
    rating: u8,
    now: DateTime<Utc>,
) -> Result<LearningItem, SchedulerError> {
    let rating = Rating::try_from(rating)?;
    Ok(item.rated(rating, now))
}

/// Clamps an ease factor into the allowed range. Rounding to 1e-9 only
/// strips the float noise of the ±0.1/0.2 steps.
pub fn clamp_ease(ease: f64) -> f64 {
    ((ease * 1e9).round() / 1e9).clamp(MIN_EASE, MAX_EASE)
}

fn adjust_ease(ease: f64, delta: f64) -> f64 {
    clamp_ease(ease + delta)
}

fn floor_product(interval_days: u32, factor: f64) -> u32 {
    // float-to-int `as` saturates at u32::MAX
    (f64::from(interval_days) * factor + FLOOR_TOLERANCE).floor() as u32
}

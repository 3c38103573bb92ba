//! Self-reported recall difficulty on a four-point scale.
use crate::error::SchedulerError;
use serde::{Deserialize, Serialize};

/// Difficulty rating given after the answer was shown.
/// Values of 3 and above count as a successful recall.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Rating {
    Hard = 1,
    Medium = 2,
    Good = 3,
    Easy = 4,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Hard, Rating::Medium, Rating::Good, Rating::Easy];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn is_success(self) -> bool {
        self >= Rating::Good
    }
}

impl TryFrom<u8> for Rating {
    type Error = SchedulerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Rating::Hard),
            2 => Ok(Rating::Medium),
            3 => Ok(Rating::Good),
            4 => Ok(Rating::Easy),
            other => Err(SchedulerError::InvalidRating(other)),
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ratings() {
        for value in 1..=4u8 {
            let rating = Rating::try_from(value).unwrap();
            assert_eq!(rating.value(), value);
        }
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        assert_eq!(Rating::try_from(0), Err(SchedulerError::InvalidRating(0)));
        assert_eq!(Rating::try_from(5), Err(SchedulerError::InvalidRating(5)));
    }

    #[test]
    fn test_success_threshold() {
        assert!(!Rating::Hard.is_success());
        assert!(!Rating::Medium.is_success());
        assert!(Rating::Good.is_success());
        assert!(Rating::Easy.is_success());
    }

    #[test]
    fn test_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Rating::Good).unwrap(), "3");
        let parsed: Rating = serde_json::from_str("4").unwrap();
        assert_eq!(parsed, Rating::Easy);
        assert!(serde_json::from_str::<Rating>("7").is_err());
    }
}

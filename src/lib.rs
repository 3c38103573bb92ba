pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;
pub mod store;

pub use config::{Backend, Config};
pub use error::{CorruptSchedulingState, SchedulerError, SessionError, StoreError};
pub use models::{
    CollectionStats, ItemCollection, LearningItem, LearningSession, LearningStage, Policy, Rating,
    ReviewRecord, apply_rating,
};
pub use store::{ItemStore, Loaded};

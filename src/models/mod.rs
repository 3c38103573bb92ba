pub mod due;
pub mod item_collection;
pub mod learning_item;
pub mod learning_session;
pub mod policy;
pub mod rating;
pub mod stats;

pub use item_collection::ItemCollection;
pub use learning_item::{ItemRecord, LearningItem, LearningStage, ReviewRecord};
pub use learning_session::LearningSession;
pub use policy::{Policy, Schedule, apply_rating};
pub use rating::Rating;
pub use stats::CollectionStats;

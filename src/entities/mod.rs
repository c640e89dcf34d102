//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod celebration;
pub mod daily_entry;
pub mod friendship;
pub mod profile;

// Re-export specific types to avoid conflicts
pub use celebration::{
    Column as CelebrationColumn, Entity as Celebration, Model as CelebrationModel,
};
pub use daily_entry::{
    Choice, Column as DailyEntryColumn, Entity as DailyEntry, Model as DailyEntryModel,
};
pub use friendship::{
    Column as FriendshipColumn, Entity as Friendship, FriendshipStatus, Model as FriendshipModel,
};
pub use profile::{Column as ProfileColumn, Entity as Profile, Model as ProfileModel};

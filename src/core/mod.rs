//! Framework-agnostic business logic.
//!
//! Every operation takes a `SeaORM` connection (or a transaction handle) and
//! returns [`crate::errors::Result`]. Nothing here knows about Discord.

/// Friendship graph: requests, acceptance and the symmetric friend set
pub mod friendship;
/// Weekly leaderboard and the celebrate-once record
pub mod leaderboard;
/// Daily entry ledger and the points aggregate
pub mod ledger;
/// Friend-request notifications
pub mod notify;
/// Per-user profiles
pub mod profile;
/// Username sanitizing, uniqueness and suggestions
pub mod username;

//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Daily entry commands
pub mod entry;

/// Friend request and friend list commands
pub mod friend;

/// General utility commands
pub mod general;

/// Weekly leaderboard command
pub mod leaderboard;

/// Username commands
pub mod username;

// Export commands
pub use entry::*;
pub use friend::*;
pub use general::*;
pub use leaderboard::*;
pub use username::*;

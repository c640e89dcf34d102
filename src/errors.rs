//! Unified error type for `JunkPunk`.
//!
//! Every fallible operation in the crate returns [`Result`]. Variants are grouped
//! into coarse [`ErrorKind`]s so the bot layer can decide how to word a failure
//! and whether the user should simply try again.

use chrono::NaiveDate;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// How a failure should be surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input. Shown to the user, never retried.
    Validation,
    /// A uniqueness rule was violated. Shown with a specific message.
    Conflict,
    /// The referenced user, request or profile does not exist.
    NotFound,
    /// Network, timeout or storage hiccup. Safe to retry.
    Transient,
    /// Misconfiguration or framework failure.
    Internal,
}

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Entry date lies beyond the one-day look-ahead window.
    #[error("Cannot log {date}: entries are allowed up to {latest}")]
    InvalidEntryDate {
        /// Requested entry date
        date: NaiveDate,
        /// Latest date that would have been accepted
        latest: NaiveDate,
    },

    /// A date argument that is not `YYYY-MM-DD`.
    #[error("'{input}' is not a date, use YYYY-MM-DD")]
    UnparsableDate {
        /// Raw user input
        input: String,
    },

    /// Attempt to log a choice that only exists for historical rows.
    #[error("Choice '{choice}' cannot be logged")]
    ReadOnlyChoice {
        /// The rejected choice
        choice: String,
    },

    /// Sanitized username is shorter than three characters.
    #[error("Username '{candidate}' is too short (minimum 3 characters)")]
    UsernameTooShort {
        /// Sanitized candidate
        candidate: String,
    },

    /// Another profile already owns this username.
    #[error("Username '{username}' is already taken")]
    UsernameTaken {
        /// The contested username
        username: String,
    },

    /// An accepted friendship already links the two users.
    #[error("You are already friends with {username}")]
    AlreadyFriends {
        /// Username of the existing friend
        username: String,
    },

    /// A concurrent request created an edge for the same pair first.
    #[error("A friendship between these users already exists")]
    DuplicateFriendship,

    /// A user tried to befriend themselves.
    #[error("You cannot add yourself as a friend")]
    SelfReference,

    /// No profile carries the requested username.
    #[error("No user found with username '{username}'")]
    UserNotFound {
        /// Searched username
        username: String,
    },

    /// No pending request with that id is addressed to the caller.
    #[error("Friend request {id} not found")]
    RequestNotFound {
        /// Friendship edge id
        id: i64,
    },

    /// The user has no profile yet.
    #[error("No profile exists for user {user_id}")]
    ProfileNotFound {
        /// Opaque user identifier
        user_id: String,
    },

    /// Database failure from `SeaORM`.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Notification collaborator failure.
    #[error("Notification error: {message}")]
    Notification {
        /// Description of the failure
        message: String,
    },

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the failure
        message: String,
    },

    /// Environment variable missing or malformed.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Formatting a reply failed.
    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),

    /// Serenity/Poise framework error.
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Self::Notification {
            message: value.to_string(),
        }
    }
}

impl Error {
    /// Classifies the error for user-facing handling.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidEntryDate { .. }
            | Self::UnparsableDate { .. }
            | Self::ReadOnlyChoice { .. }
            | Self::UsernameTooShort { .. } => ErrorKind::Validation,
            Self::UsernameTaken { .. }
            | Self::AlreadyFriends { .. }
            | Self::DuplicateFriendship
            | Self::SelfReference => ErrorKind::Conflict,
            Self::UserNotFound { .. }
            | Self::RequestNotFound { .. }
            | Self::ProfileNotFound { .. } => ErrorKind::NotFound,
            Self::Database(_) | Self::Notification { .. } => ErrorKind::Transient,
            Self::Config { .. } | Self::EnvVar(_) | Self::Format(_) | Self::Framework(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Returns true when the database rejected a write because of a unique index.
#[must_use]
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap_or_default();
        assert_eq!(
            Error::InvalidEntryDate { date, latest: date }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            Error::UsernameTaken {
                username: "abc".to_string()
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(Error::SelfReference.kind(), ErrorKind::Conflict);
        assert_eq!(Error::RequestNotFound { id: 3 }.kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::Database(DbErr::Custom("timeout".to_string())).kind(),
            ErrorKind::Transient
        );
        assert_eq!(
            Error::Config {
                message: "bad".to_string()
            }
            .kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_custom_db_error_is_not_unique_violation() {
        assert!(!is_unique_violation(&DbErr::Custom("nope".to_string())));
    }
}

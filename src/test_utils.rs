//! Shared test utilities for `JunkPunk`.
//!
//! Helpers for setting up an in-memory database and creating profiles, entries
//! and friendships with sensible defaults.

use crate::{
    core::{friendship, profile, username},
    entities::{Choice, Profile, ProfileColumn, daily_entry},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{Set, prelude::*};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Shorthand for a calendar date. Panics on invalid input, tests only.
#[allow(clippy::unwrap_used)]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Creates a profile for `user_id` and gives it `name` as username.
pub async fn create_test_profile(
    db: &DatabaseConnection,
    user_id: &str,
    name: &str,
) -> Result<crate::entities::ProfileModel> {
    profile::ensure_profile(db, user_id, None).await?;
    username::set_username(db, user_id, name).await?;
    profile::require_profile(db, user_id).await
}

/// Sets up a test database with a single profile (`u1`, username `kim`).
pub async fn setup_with_profile() -> Result<(DatabaseConnection, crate::entities::ProfileModel)> {
    let db = setup_test_db().await?;
    let profile = create_test_profile(&db, "u1", "kim").await?;
    Ok((db, profile))
}

/// Reads the stored aggregate for a user.
pub async fn total_points_of(db: &DatabaseConnection, user_id: &str) -> Result<i64> {
    Profile::find()
        .filter(ProfileColumn::UserId.eq(user_id))
        .one(db)
        .await?
        .map(|p| p.total_points)
        .ok_or_else(|| Error::ProfileNotFound {
            user_id: user_id.to_string(),
        })
}

/// Inserts a historical penalty row directly, bypassing the ledger's validation.
pub async fn insert_legacy_penalty(
    db: &DatabaseConnection,
    user_id: &str,
    day: NaiveDate,
) -> Result<daily_entry::Model> {
    let now = Utc::now();
    daily_entry::ActiveModel {
        user_id: Set(user_id.to_string()),
        entry_date: Set(day),
        choice: Set(Choice::Penalty),
        points: Set(Choice::Penalty.points()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Sends a request from `requester_user_id` to `target_username` and accepts it.
pub async fn make_friends(
    db: &DatabaseConnection,
    requester_user_id: &str,
    target_username: &str,
) -> Result<()> {
    let request = friendship::request_friend(db, requester_user_id, target_username).await?;
    friendship::accept_request(db, &request.recipient.user_id, request.edge.id).await?;
    Ok(())
}

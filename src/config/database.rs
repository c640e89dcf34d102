//! Database configuration module for `JunkPunk`.
//!
//! This module handles `SQLite` connection setup and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`;
//! the composite unique indexes that the entities cannot express are added
//! explicitly afterwards. Every statement is `IF NOT EXISTS`, so start-up can run
//! it against an existing database.

use crate::entities::{
    Celebration, DailyEntry, Friendship, Profile, celebration, daily_entry,
};
use crate::errors::{Error, Result};
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, sea_query::Index,
};
use std::path::Path;
use tracing::{debug, info};

/// Local database used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/junkpunk.sqlite?mode=rwc";

/// Gets the database URL from the environment or returns the default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to [`DEFAULT_DATABASE_URL`] when no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {database_url}");
    ensure_sqlite_dir(&database_url)?;
    Database::connect(&database_url).await.map_err(Into::into)
}

/// File path of a `sqlite://` URL, without query parameters.
fn sqlite_file_path(database_url: &str) -> Option<&Path> {
    let rest = database_url.strip_prefix("sqlite://")?;
    let path = rest.split('?').next().unwrap_or(rest);
    (!path.is_empty() && path != ":memory:").then(|| Path::new(path))
}

/// `mode=rwc` creates the file but not its directory.
fn ensure_sqlite_dir(database_url: &str) -> Result<()> {
    let Some(parent) = sqlite_file_path(database_url).and_then(Path::parent) else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|e| Error::Config {
        message: format!("Failed to create database directory {}: {e}", parent.display()),
    })
}

async fn create_table_for<C, E>(db: &C, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables and unique indexes.
///
/// Profiles are created first because entries and friendships reference
/// `profiles.user_id`.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();

    create_table_for(db, Profile).await?;
    create_table_for(db, DailyEntry).await?;
    create_table_for(db, Friendship).await?;
    create_table_for(db, Celebration).await?;

    // One ledger row per user and calendar date
    let entry_index = Index::create()
        .name("idx_daily_entries_user_date")
        .table(DailyEntry)
        .col(daily_entry::Column::UserId)
        .col(daily_entry::Column::EntryDate)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&entry_index)).await?;

    // One celebration per user and week
    let celebration_index = Index::create()
        .name("idx_celebrations_user_week")
        .table(Celebration)
        .col(celebration::Column::UserId)
        .col(celebration::Column::WeekEnd)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&celebration_index)).await?;

    info!("Database tables ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{CelebrationModel, DailyEntryModel, FriendshipModel, ProfileModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<ProfileModel> = Profile::find().limit(1).all(&db).await?;
        let _: Vec<DailyEntryModel> = DailyEntry::find().limit(1).all(&db).await?;
        let _: Vec<FriendshipModel> = Friendship::find().limit(1).all(&db).await?;
        let _: Vec<CelebrationModel> = Celebration::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_repeatable() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[test]
    fn test_default_database_url_is_sqlite() {
        assert!(DEFAULT_DATABASE_URL.starts_with("sqlite://"));
    }

    #[test]
    fn test_sqlite_file_path() {
        assert_eq!(
            sqlite_file_path(DEFAULT_DATABASE_URL),
            Some(Path::new("data/junkpunk.sqlite"))
        );
        assert_eq!(sqlite_file_path("sqlite::memory:"), None);
        assert_eq!(sqlite_file_path("postgres://localhost/db"), None);
    }
}

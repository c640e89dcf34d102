//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for `JunkPunk`: slash commands,
//! autocomplete handlers, the framework setup and the shared bot context.
//! The Discord user id is used as the opaque `user_id` throughout the core.

/// Discord command implementations (entry, friend, leaderboard, username, general)
pub mod commands;
/// Poise framework construction and error reporting
pub mod framework;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    config::AppConfig,
    core::{notify::FriendNotifier, profile},
    entities::ProfileModel,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Shared data available to all bot commands.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Application settings loaded at startup
    pub config: Arc<AppConfig>,
    /// Where friend-request notices go
    pub notifier: Arc<dyn FriendNotifier>,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub fn new(
        database: DatabaseConnection,
        config: Arc<AppConfig>,
        notifier: Arc<dyn FriendNotifier>,
    ) -> Self {
        Self {
            database,
            config,
            notifier,
        }
    }
}

/// Poise context used by every command.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Returns the invoking user's profile, registering it on first contact.
///
/// New profiles try to claim the Discord handle as their username.
pub async fn caller_profile(ctx: Context<'_>) -> Result<ProfileModel> {
    let user_id = ctx.author().id.to_string();
    profile::register_profile(
        &ctx.data().database,
        &user_id,
        None,
        Some(ctx.author().name.as_str()),
    )
    .await
}

/// How a profile is shown to other users.
#[must_use]
pub fn display_name(username: Option<&str>, user_id: &str) -> String {
    username.map_or_else(|| format!("<@{user_id}>"), |name| format!("**{name}**"))
}

pub use commands::*;
pub use handlers::*;

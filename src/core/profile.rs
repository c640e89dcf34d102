//! Profile business logic - Get-or-create of the per-user profile.
//!
//! A profile is created the first time a user talks to the bot. The username
//! requested at that point is applied best-effort: if it is too short or taken,
//! the failure is logged and the user picks one later with `/username`.

use crate::{
    core::username,
    entities::{Profile, profile},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*, sea_query::OnConflict};
use tracing::{debug, info, warn};

/// Finds the profile for a user, if one exists.
pub async fn get_profile<C>(db: &C, user_id: &str) -> Result<Option<profile::Model>>
where
    C: ConnectionTrait,
{
    Profile::find()
        .filter(profile::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_profile`], but a missing profile is an error.
pub async fn require_profile<C>(db: &C, user_id: &str) -> Result<profile::Model>
where
    C: ConnectionTrait,
{
    get_profile(db, user_id)
        .await?
        .ok_or_else(|| Error::ProfileNotFound {
            user_id: user_id.to_string(),
        })
}

/// Returns the user's profile, creating an empty one on first contact.
///
/// The insert is keyed on the unique `user_id`, so two concurrent first
/// contacts still produce a single profile. A known email is filled in when the
/// stored profile has none.
pub async fn ensure_profile<C>(
    db: &C,
    user_id: &str,
    email: Option<String>,
) -> Result<profile::Model>
where
    C: ConnectionTrait,
{
    ensure_profile_created(db, user_id, email)
        .await
        .map(|(profile, _)| profile)
}

/// Like [`ensure_profile`], also reporting whether this call inserted the row.
pub async fn ensure_profile_created<C>(
    db: &C,
    user_id: &str,
    email: Option<String>,
) -> Result<(profile::Model, bool)>
where
    C: ConnectionTrait,
{
    let new_profile = profile::ActiveModel {
        user_id: Set(user_id.to_string()),
        username: Set(None),
        email: Set(email.clone()),
        total_points: Set(0),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let inserted = Profile::insert(new_profile)
        .on_conflict(
            OnConflict::column(profile::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    let created = inserted > 0;

    if created {
        info!("Created profile for user {user_id}");
    }

    let existing = require_profile(db, user_id).await?;
    match email {
        Some(email) if existing.email.is_none() => {
            debug!("Recording email for user {user_id}");
            let mut active: profile::ActiveModel = existing.into();
            active.email = Set(Some(email));
            Ok((active.update(db).await?, created))
        }
        _ => Ok((existing, created)),
    }
}

/// Ensures a profile exists and, when it was just created, tries to claim
/// `requested_username` for it.
///
/// Mirrors sign-up: the profile is the primary result, the username is a
/// side effect whose failure never fails the call. Later calls for an existing
/// profile never touch its username.
pub async fn register_profile<C>(
    db: &C,
    user_id: &str,
    email: Option<String>,
    requested_username: Option<&str>,
) -> Result<profile::Model>
where
    C: ConnectionTrait,
{
    let (profile, created) = ensure_profile_created(db, user_id, email).await?;

    let Some(requested) = requested_username else {
        return Ok(profile);
    };
    if !created || profile.username.is_some() {
        return Ok(profile);
    }

    match username::set_username(db, user_id, requested).await {
        Ok(name) => {
            info!("Assigned username '{name}' to user {user_id} at registration");
            require_profile(db, user_id).await
        }
        Err(e) => {
            warn!("Could not set username during registration for {user_id}: {e}");
            Ok(profile)
        }
    }
}

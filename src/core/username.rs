//! Username directory - Sanitizing, claiming and suggesting public handles.
//!
//! Usernames are the only way users find each other, so the directory never
//! hands out email addresses. Availability checks are advisory: the unique
//! index on `profiles.username` is what actually decides a race, and
//! [`set_username`] maps its violation to [`Error::UsernameTaken`].

use crate::{
    config::settings::UsernameConfig,
    entities::{Profile, profile},
    errors::{Error, Result, is_unique_violation},
};
use sea_orm::{QuerySelect, prelude::*, sea_query::Expr};
use std::collections::HashSet;
use tracing::{debug, info};

/// Shortest username that may be claimed.
pub const MIN_USERNAME_LEN: usize = 3;
/// Longest username produced by [`sanitize`].
pub const MAX_USERNAME_LEN: usize = 30;

/// Public identity of a user as returned by search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    /// Opaque user identifier
    pub user_id: String,
    /// Claimed username
    pub username: String,
}

/// Normalizes raw input into a username candidate.
///
/// Lowercases, replaces everything outside `[a-z0-9_]` with `_`, collapses
/// runs of `_`, strips `_` from both ends and truncates to
/// [`MAX_USERNAME_LEN`]. The result may be shorter than
/// [`MIN_USERNAME_LEN`]; callers decide whether that is acceptable.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len().min(MAX_USERNAME_LEN * 2));

    for c in raw.chars().flat_map(char::to_lowercase) {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '_'
        };
        // Skipping here both strips leading underscores and collapses runs
        if c == '_' && (out.is_empty() || out.ends_with('_')) {
            continue;
        }
        out.push(c);
    }

    // Only ASCII remains, so byte and char lengths agree
    out.truncate(MAX_USERNAME_LEN);
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Pads a short sanitized base to [`MIN_USERNAME_LEN`] with digits.
///
/// `"ab"` becomes `"ab1"`, an empty base becomes `"123"`.
#[must_use]
pub fn pad_short(base: &str) -> String {
    if base.len() >= MIN_USERNAME_LEN {
        return base.to_string();
    }
    format!("{base}123").chars().take(MIN_USERNAME_LEN).collect()
}

/// Whether no profile currently holds the sanitized form of `candidate`.
///
/// Advisory only; the result can be stale by the time a write happens.
pub async fn is_available<C>(db: &C, candidate: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    let candidate = sanitize(candidate);
    if candidate.is_empty() {
        return Ok(false);
    }

    let holders = Profile::find()
        .filter(profile::Column::Username.eq(candidate.as_str()))
        .count(db)
        .await?;
    debug!("Availability of '{candidate}': {}", holders == 0);
    Ok(holders == 0)
}

/// Claims a username for a user.
///
/// # Errors
/// * [`Error::UsernameTooShort`] when the sanitized candidate has fewer than 3 chars
/// * [`Error::UsernameTaken`] when another profile owns it
/// * [`Error::ProfileNotFound`] when the user has no profile
///
/// # Returns
/// The sanitized username that was stored
pub async fn set_username<C>(db: &C, user_id: &str, raw: &str) -> Result<String>
where
    C: ConnectionTrait,
{
    let candidate = sanitize(raw);
    if candidate.len() < MIN_USERNAME_LEN {
        return Err(Error::UsernameTooShort { candidate });
    }

    let result = Profile::update_many()
        .col_expr(profile::Column::Username, Expr::value(candidate.clone()))
        .filter(profile::Column::UserId.eq(user_id))
        .exec(db)
        .await;

    match result {
        Ok(res) if res.rows_affected == 0 => Err(Error::ProfileNotFound {
            user_id: user_id.to_string(),
        }),
        Ok(_) => {
            info!("User {user_id} is now '{candidate}'");
            Ok(candidate)
        }
        Err(e) if is_unique_violation(&e) => Err(Error::UsernameTaken {
            username: candidate,
        }),
        Err(e) => Err(e.into()),
    }
}

/// Finds users whose username matches `text` after sanitizing.
///
/// Matching is exact on the sanitized form, which makes it case-insensitive.
/// Only ids and usernames are selected, never emails.
pub async fn search_user_by_username<C>(db: &C, text: &str) -> Result<Vec<UserSummary>>
where
    C: ConnectionTrait,
{
    let candidate = sanitize(text);
    if candidate.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<(String, Option<String>)> = Profile::find()
        .select_only()
        .column(profile::Column::UserId)
        .column(profile::Column::Username)
        .filter(profile::Column::Username.eq(candidate.as_str()))
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(user_id, username)| username.map(|username| UserSummary { user_id, username }))
        .collect())
}

/// Resolves a username to exactly one user.
///
/// # Errors
/// [`Error::UserNotFound`] when nobody holds the username.
pub async fn resolve_username<C>(db: &C, text: &str) -> Result<UserSummary>
where
    C: ConnectionTrait,
{
    search_user_by_username(db, text)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::UserNotFound {
            username: text.to_string(),
        })
}

/// Base for suggestions: the local part of an email, sanitized and padded.
///
/// Identities without `@` (such as a chat handle) are used whole.
#[must_use]
pub fn suggestion_base(identity: &str) -> String {
    let local = identity.split('@').next().unwrap_or_default();
    let local = if local.is_empty() { "user" } else { local };
    pad_short(&sanitize(local))
}

/// Generates the ordered, de-duplicated candidate list for a base.
///
/// Order: `base`, every `adjective_base`, every `base` + number, then every
/// `adjective_base` + number. Each candidate is sanitized so long bases stay
/// within [`MAX_USERNAME_LEN`]; the list stops at `max_candidates`.
#[must_use]
pub fn candidate_usernames(base: &str, config: &UsernameConfig) -> Vec<String> {
    let mut raw = vec![base.to_string()];
    raw.extend(config.adjectives.iter().map(|adj| format!("{adj}_{base}")));
    raw.extend(config.numbers.iter().map(|n| format!("{base}{n}")));
    for adj in &config.adjectives {
        raw.extend(config.numbers.iter().map(|n| format!("{adj}_{base}{n}")));
    }

    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|c| sanitize(&c))
        .filter(|c| c.len() >= MIN_USERNAME_LEN)
        .filter(|c| seen.insert(c.clone()))
        .take(config.max_candidates)
        .collect()
}

/// Suggests up to `max_suggestions` available usernames derived from `identity`.
pub async fn suggest_usernames<C>(
    db: &C,
    identity: &str,
    config: &UsernameConfig,
) -> Result<Vec<String>>
where
    C: ConnectionTrait,
{
    let base = suggestion_base(identity);
    let candidates = candidate_usernames(&base, config);

    let taken: HashSet<String> = Profile::find()
        .select_only()
        .column(profile::Column::Username)
        .filter(profile::Column::Username.is_in(candidates.clone()))
        .into_tuple::<Option<String>>()
        .all(db)
        .await?
        .into_iter()
        .flatten()
        .collect();

    Ok(candidates
        .into_iter()
        .filter(|c| !taken.contains(c))
        .take(config.max_suggestions)
        .collect())
}

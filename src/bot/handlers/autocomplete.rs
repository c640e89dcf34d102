//! Autocomplete handlers for Discord slash command parameters.

use crate::{
    bot::{BotData, commands::friend::sender_label},
    core::friendship,
    errors::Error,
};

/// Discord caps autocomplete at 25 choices.
const MAX_CHOICES: usize = 25;

/// Suggests senders of friend requests waiting for the caller.
///
/// Senders without a username are offered by user id.
///
/// # Arguments
/// * `ctx` - The poise context containing the database connection
/// * `partial` - The partial string the user has typed so far
pub async fn autocomplete_pending_requester(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;
    let user_id = ctx.author().id.to_string();

    let Ok(pending) = friendship::list_pending_requests(db, &user_id).await else {
        return Vec::new();
    };

    matching_usernames(pending.iter().map(sender_label), partial)
}

/// Case-insensitive prefix filter, sorted and capped for Discord.
fn matching_usernames(names: impl Iterator<Item = String>, partial: &str) -> Vec<String> {
    let partial_lower = partial.trim().to_lowercase();
    let mut matching: Vec<String> = names
        .filter(|name| name.starts_with(&partial_lower))
        .collect();
    matching.sort();
    matching.truncate(MAX_CHOICES);
    matching
}

//! Friend Discord commands - sending, answering and listing friend requests.
//!
//! Requests and answers go through the core friendship graph; the reply is
//! built from a fresh read afterwards. Sending a request also fires the
//! notification collaborator in the background.

use crate::{
    bot::display_name,
    core::{friendship::PendingRequest, username},
};

/// Strips Discord mention syntax (`<@id>`, `<@!id>`, `@id`) down to the id.
fn mentioned_user_id(input: &str) -> &str {
    let trimmed = input.trim();
    let inner = trimmed
        .strip_prefix("<@")
        .and_then(|rest| rest.strip_suffix('>'))
        .map_or(trimmed, |id| id.strip_prefix('!').unwrap_or(id));
    inner.strip_prefix('@').unwrap_or(inner)
}

/// Finds the pending request whose sender matches `sender`.
///
/// `sender` is a username, or the sender's user id (plain or as a mention)
/// for senders who never claimed a username.
#[must_use]
pub fn find_pending_from<'a>(
    requests: &'a [PendingRequest],
    sender: &str,
) -> Option<&'a PendingRequest> {
    let wanted = username::sanitize(sender);
    let wanted_id = mentioned_user_id(sender);
    requests
        .iter()
        .find(|r| r.username.as_deref() == Some(wanted.as_str()))
        .or_else(|| requests.iter().find(|r| r.requester_user_id == wanted_id))
}

/// What a sender is called in autocomplete: the username, else the user id.
#[must_use]
pub fn sender_label(request: &PendingRequest) -> String {
    request
        .username
        .clone()
        .unwrap_or_else(|| request.requester_user_id.clone())
}

/// How a pending request is listed.
#[must_use]
pub fn format_pending_line(request: &PendingRequest) -> String {
    let answer_hint = if request.username.is_some() {
        String::new()
    } else {
        format!(", answer with `{}`", request.requester_user_id)
    };
    format!(
        "• {} (sent {}{answer_hint})",
        display_name(request.username.as_deref(), &request.requester_user_id),
        request.created_at.format("%Y-%m-%d")
    )
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{find_pending_from, format_pending_line};
    use crate::{
        bot::{BotData, caller_profile, display_name, handlers::autocomplete},
        core::{friendship, notify},
        errors::{Error, Result},
    };
    use std::{fmt::Write, sync::Arc};
    use tracing::warn;

    /// Parent command for friends. Friends see each other on the leaderboard.
    #[poise::command(
        slash_command,
        subcommands(
            "friend_add",
            "friend_accept",
            "friend_reject",
            "friend_requests",
            "friend_list"
        )
    )]
    pub async fn friend(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Friend commands. Available subcommands:\n\
            `/friend add` - Send a friend request by username\n\
            `/friend accept` - Accept a pending request\n\
            `/friend reject` - Reject a pending request\n\
            `/friend requests` - Show requests waiting for you\n\
            `/friend list` - Show your friends and their points";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Sends a friend request to another user by username.
    #[poise::command(slash_command, rename = "add")]
    pub async fn friend_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Username of the person to add"] username: String,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let profile = caller_profile(ctx).await?;

        let request = friendship::request_friend(db, &profile.user_id, &username).await?;

        match notify::notice_for_request(db, &request).await {
            Ok(notice) => {
                notify::dispatch_friend_request(Arc::clone(&ctx.data().notifier), notice);
            }
            Err(e) => warn!("Could not build friend request notice: {e}"),
        }

        ctx.say(format!(
            "✅ Friend request sent to **{}**!",
            request.recipient.username
        ))
        .await?;
        Ok(())
    }

    /// Accepts a friend request waiting for you.
    #[poise::command(slash_command, rename = "accept")]
    pub async fn friend_accept(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Username (or user id) of the person who sent the request"]
        #[autocomplete = "autocomplete::autocomplete_pending_requester"]
        from: String,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let profile = caller_profile(ctx).await?;

        let pending = friendship::list_pending_requests(db, &profile.user_id).await?;
        let Some(request) = find_pending_from(&pending, &from) else {
            ctx.say(format!("❌ No pending friend request from '{from}'."))
                .await?;
            return Ok(());
        };

        friendship::accept_request(db, &profile.user_id, request.id).await?;
        ctx.say(format!(
            "🤝 You and {} are now friends!",
            display_name(request.username.as_deref(), &request.requester_user_id)
        ))
        .await?;
        Ok(())
    }

    /// Rejects a friend request waiting for you.
    #[poise::command(slash_command, rename = "reject")]
    pub async fn friend_reject(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Username (or user id) of the person who sent the request"]
        #[autocomplete = "autocomplete::autocomplete_pending_requester"]
        from: String,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let profile = caller_profile(ctx).await?;

        let pending = friendship::list_pending_requests(db, &profile.user_id).await?;
        let Some(request) = find_pending_from(&pending, &from) else {
            ctx.say(format!("ℹ️ No pending friend request from '{from}'."))
                .await?;
            return Ok(());
        };

        friendship::reject_request(db, &profile.user_id, request.id).await?;
        ctx.say(format!(
            "🗑️ Rejected the request from {}.",
            display_name(request.username.as_deref(), &request.requester_user_id)
        ))
        .await?;
        Ok(())
    }

    /// Lists friend requests waiting for your answer.
    #[poise::command(slash_command, rename = "requests")]
    pub async fn friend_requests(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let profile = caller_profile(ctx).await?;

        let pending = friendship::list_pending_requests(db, &profile.user_id).await?;
        if pending.is_empty() {
            ctx.say("📭 No pending friend requests.").await?;
            return Ok(());
        }

        let mut reply = String::from("📬 **Pending friend requests**\n");
        for request in &pending {
            writeln!(reply, "{}", format_pending_line(request))?;
        }
        writeln!(reply, "\nAnswer with `/friend accept` or `/friend reject`.")?;

        ctx.say(reply).await?;
        Ok(())
    }

    /// Shows you and your friends ranked by total points.
    #[poise::command(slash_command, rename = "list")]
    pub async fn friend_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let profile = caller_profile(ctx).await?;

        let friends = friendship::list_friends(db, &profile.user_id).await?;
        if friends.len() <= 1 {
            ctx.say("👋 No friends yet. Add one with `/friend add <username>`.")
                .await?;
            return Ok(());
        }

        let mut reply = String::from("👥 **Friends by total points**\n");
        for (rank, friend) in friends.iter().enumerate() {
            let you = if friend.user_id == profile.user_id {
                " (you)"
            } else {
                ""
            };
            writeln!(
                reply,
                "{}. {}{you} - {} pts",
                rank + 1,
                display_name(friend.username.as_deref(), &friend.user_id),
                friend.total_points
            )?;
        }

        ctx.say(reply).await?;
        Ok(())
    }
}

pub use inner::*;

//! Username Discord commands - choosing, checking and getting suggestions.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, caller_profile},
        core::username,
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Parent command for your username. Friends find you by it.
    #[poise::command(
        slash_command,
        subcommands("username_set", "username_check", "username_suggest")
    )]
    pub async fn username(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let profile = caller_profile(ctx).await?;
        let current = profile
            .username
            .map_or_else(|| "not set".to_string(), |name| format!("**{name}**"));

        ctx.say(format!(
            "🪪 Your username is {current}.\n\
            `/username set` - Choose a new username\n\
            `/username check` - See if a username is free\n\
            `/username suggest` - Get a few ideas"
        ))
        .await?;
        Ok(())
    }

    /// Sets your username (3-30 characters: letters, digits and underscores).
    #[poise::command(slash_command, rename = "set")]
    pub async fn username_set(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "The username you want"] name: String,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let profile = caller_profile(ctx).await?;

        let stored = username::set_username(db, &profile.user_id, &name).await?;
        ctx.say(format!("✅ Your username is now **{stored}**.")).await?;
        Ok(())
    }

    /// Checks whether a username is still free.
    #[poise::command(slash_command, rename = "check")]
    pub async fn username_check(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Username to check"] name: String,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let candidate = username::sanitize(&name);

        let reply = if candidate.len() < username::MIN_USERNAME_LEN {
            format!("❌ '{candidate}' is too short (minimum 3 characters).")
        } else if username::is_available(db, &candidate).await? {
            format!("✅ **{candidate}** is available.")
        } else {
            format!("❌ **{candidate}** is already taken.")
        };

        ctx.say(reply).await?;
        Ok(())
    }

    /// Suggests a few available usernames based on your Discord name.
    #[poise::command(slash_command, rename = "suggest")]
    pub async fn username_suggest(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let profile = caller_profile(ctx).await?;
        let identity = profile
            .email
            .clone()
            .unwrap_or_else(|| ctx.author().name.clone());

        let suggestions =
            username::suggest_usernames(db, &identity, &ctx.data().config.usernames).await?;
        if suggestions.is_empty() {
            ctx.say("🤔 No free suggestions right now. Try `/username set` with your own idea.")
                .await?;
            return Ok(());
        }

        let mut reply = String::from("💡 **Available usernames**\n");
        for suggestion in &suggestions {
            writeln!(reply, "• `{suggestion}`")?;
        }
        ctx.say(reply).await?;
        Ok(())
    }
}

pub use inner::*;

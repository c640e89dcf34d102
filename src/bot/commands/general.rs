//! General Discord commands - ping and help.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    ///
    /// This is a simple health check command that doesn't require any database operations.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**JunkPunk Help**\n\
        Log what you eat every day and compete with your friends.\n\n\
        **Daily Commands**\n\
        • `/log <healthy|junk> [date]` - Logs a day (+10 healthy, -10 junk). Re-logging replaces it.\n\
        • `/points` - Shows your total, healthy streak and recent entries.\n\
        • `/leaderboard` - Shows last week's winners among your friends.\n\n\
        **Social Commands**\n\
        • `/friend <subcommand>` - Add friends and answer requests (add, accept, reject, requests, list).\n\
        • `/username <subcommand>` - Choose how friends find you (set, check, suggest).\n\n\
        **Utility Commands**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.\n\n\
        Weeks run Sunday to Saturday. You can log today, tomorrow or any past day.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;

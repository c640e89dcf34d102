//! Leaderboard Discord command - last week's winners among your friends.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, caller_profile, display_name},
        core::leaderboard,
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Shows who won the last completed Sunday-Saturday week among you and your friends.
    #[poise::command(slash_command, prefix_command)]
    pub async fn leaderboard(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let today = ctx.data().config.time.today();
        let profile = caller_profile(ctx).await?;

        let window = leaderboard::last_closed_week(today);
        let scores = leaderboard::weekly_scores(db, &profile.user_id, window).await?;
        let winners = leaderboard::weekly_winners(scores.clone());

        let mut reply = format!(
            "🏁 **Week of {} to {}**\n",
            window.start.format("%b %d"),
            window.end.format("%b %d")
        );

        if winners.is_empty() {
            writeln!(reply, "Nobody logged anything that week.")?;
            ctx.say(reply).await?;
            return Ok(());
        }

        let names: Vec<String> = winners
            .iter()
            .map(|w| display_name(w.username.as_deref(), &w.user_id))
            .collect();
        let title = if winners.len() == 1 { "Winner" } else { "Winners" };
        writeln!(
            reply,
            "👑 **{title}:** {} with {} pts\n",
            names.join(", "),
            winners[0].week_points
        )?;

        for score in &scores {
            writeln!(
                reply,
                "• {} - {} pts",
                display_name(score.username.as_deref(), &score.user_id),
                score.week_points
            )?;
        }

        if leaderboard::claim_celebration(db, &profile.user_id, window, today).await? {
            writeln!(reply, "\n🎉🎉🎉 Congratulations to this week's champions! 🎉🎉🎉")?;
        }

        ctx.say(reply).await?;
        Ok(())
    }
}

pub use inner::*;

//! Entry Discord commands - logging today's choice and viewing points.
//!
//! Both commands re-read the ledger after any write so the reply always shows
//! the stored state.

use crate::{
    entities::{Choice, DailyEntryModel},
    errors::{Error, Result},
};
use chrono::NaiveDate;

/// Choices a user may log. Historical penalties are not offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum LogChoice {
    /// Ate healthy (+10)
    #[name = "healthy"]
    Healthy,
    /// Ate junk (-10)
    #[name = "junk"]
    Junk,
}

impl From<LogChoice> for Choice {
    fn from(value: LogChoice) -> Self {
        match value {
            LogChoice::Healthy => Self::Healthy,
            LogChoice::Junk => Self::Junk,
        }
    }
}

/// Parses an optional `YYYY-MM-DD` argument, defaulting to `today`.
pub fn parse_entry_date(input: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    match input.map(str::trim) {
        None | Some("") => Ok(today),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            Error::UnparsableDate {
                input: raw.to_string(),
            }
        }),
    }
}

/// One line of the recent-entries list. Penalties are marked separately.
#[must_use]
pub fn format_entry_line(entry: &DailyEntryModel) -> String {
    let marker = match entry.choice {
        Choice::Healthy => "🥗",
        Choice::Junk => "🍔",
        Choice::Penalty => "⚠️",
    };
    format!(
        "{marker} {} - {} ({:+})",
        entry.entry_date.format("%a %Y-%m-%d"),
        entry.choice,
        entry.points
    )
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{LogChoice, format_entry_line, parse_entry_date};
    use crate::{
        bot::{BotData, caller_profile},
        core::{ledger, profile},
        entities::Choice,
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Number of entries shown by `/points`.
    const RECENT_ENTRIES: usize = 7;

    /// Logs whether you ate healthy or junk today (or tomorrow, or a past day).
    ///
    /// Logging the same day again replaces the earlier choice.
    #[poise::command(slash_command, prefix_command)]
    pub async fn log(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "What did you eat?"] choice: LogChoice,
        #[description = "Day to log as YYYY-MM-DD (defaults to today)"] date: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let today = ctx.data().config.time.today();
        let profile = caller_profile(ctx).await?;
        let entry_date = parse_entry_date(date.as_deref(), today)?;

        let entry =
            ledger::upsert_entry(db, &profile.user_id, entry_date, Choice::from(choice), today)
                .await?;
        let total = profile::require_profile(db, &profile.user_id)
            .await?
            .total_points;

        let emoji = if entry.choice == Choice::Healthy {
            "🥗"
        } else {
            "🍔"
        };
        ctx.say(format!(
            "{emoji} Logged **{}** for {} ({:+} points). Total: **{total}**",
            entry.choice, entry.entry_date, entry.points
        ))
        .await?;
        Ok(())
    }

    /// Shows your total points, healthy streak and recent entries.
    #[poise::command(slash_command, prefix_command)]
    pub async fn points(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let today = ctx.data().config.time.today();
        let profile = caller_profile(ctx).await?;

        let entries = ledger::entries_for_user(db, &profile.user_id).await?;
        let streak = ledger::healthy_streak(&entries, today);
        let logged_today = entries.iter().any(|e| e.entry_date == today);

        let mut reply = String::new();
        writeln!(reply, "🏆 **Total points:** {}", profile.total_points)?;
        writeln!(
            reply,
            "🔥 **Healthy streak:** {streak} day{}",
            if streak == 1 { "" } else { "s" }
        )?;
        if !logged_today {
            writeln!(reply, "📝 You haven't logged today yet. Try `/log`.")?;
        }

        if entries.is_empty() {
            writeln!(reply, "\nNo entries yet.")?;
        } else {
            writeln!(reply, "\n**Recent entries**")?;
            for entry in entries.iter().take(RECENT_ENTRIES) {
                writeln!(reply, "{}", format_entry_line(entry))?;
            }
        }

        ctx.say(reply).await?;
        Ok(())
    }
}

pub use inner::*;

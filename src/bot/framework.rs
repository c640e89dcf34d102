//! Poise framework setup and user-facing error reporting.

use crate::{
    bot::{BotData, commands},
    errors::{Error, ErrorKind, Result},
};
use poise::serenity_prelude as serenity;
use tracing::{error, info, warn};

/// Wording shown to the user for a failed command.
#[must_use]
pub fn user_message(error: &Error) -> String {
    match error.kind() {
        ErrorKind::Validation | ErrorKind::Conflict | ErrorKind::NotFound => {
            format!("❌ {error}")
        }
        ErrorKind::Transient => {
            "⚠️ Something went wrong on our side. Please try again in a moment.".to_string()
        }
        ErrorKind::Internal => "❌ The bot is misconfigured. Please tell an admin.".to_string(),
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error:?}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            match error.kind() {
                ErrorKind::Transient | ErrorKind::Internal => {
                    error!("Error in command `{}`: {error:?}", ctx.command().name);
                }
                _ => warn!("Command `{}` rejected: {error}", ctx.command().name),
            }
            if let Err(e) = ctx.say(user_message(&error)).await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Builds the framework and runs the Discord client until it stops.
pub async fn run_bot(token: String, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::ping(),
                commands::help(),
                commands::log(),
                commands::points(),
                commands::friend(),
                commands::leaderboard(),
                commands::username(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {e:?}"))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {e:?}"))?;
    Ok(())
}

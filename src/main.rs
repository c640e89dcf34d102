use junkpunk::{
    bot::{BotData, framework},
    config,
    core::{ledger, notify},
    errors::{Error, Result},
};
use dotenvy::dotenv;
use std::{env, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load application settings
    let app_config = config::settings::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;
    info!(
        "Configuration loaded (UTC offset {} minutes)",
        app_config.time.utc_offset_minutes
    );

    // 4. Connect to the database and create tables
    let db = config::database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    config::database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {e}"))?;

    // 5. Repair any aggregate drift before serving
    if app_config.ledger.reconcile_on_startup {
        let report = ledger::reconcile_all_totals(&db)
            .await
            .inspect_err(|e| error!("Failed to reconcile point totals: {e}"))?;
        info!(
            "Reconciled point totals: {} checked, {} corrected",
            report.profiles_checked, report.profiles_corrected
        );
    }

    let notifier = notify::notifier_from_config(&app_config.notifications);
    let data = BotData::new(db, Arc::new(app_config), notifier);

    // 6. Run the bot
    // DISCORD_BOT_TOKEN is read here, directly before use, not stored in AppConfig
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    framework::run_bot(token, data).await
}

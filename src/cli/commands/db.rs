use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::{self, PgDocumentStore};
use crate::services::Services;

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Create the document table and indexes")]
    Migrate,

    #[command(about = "Set role=student on users that have no role")]
    BackfillRoles,

    #[command(about = "Check that the configured store is reachable")]
    Health,
}

pub async fn handle(cmd: DbCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = AppConfig::from_env();

    match cmd {
        DbCommands::Migrate => {
            let url = config
                .database
                .url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set to run migrations"))?;
            let store = PgDocumentStore::connect(url, &config.database).await?;
            store.migrate().await?;
            store.close().await;
            output_success(&output_format, "Database schema is up to date", None)
        }
        DbCommands::BackfillRoles => {
            let store = database::connect(&config).await?;
            let services = Services::new(store, &config);
            let patched = services.migrations.backfill_roles().await?;
            output_success(
                &output_format,
                &format!("Backfilled role on {} user(s)", patched),
                Some(json!({ "patched": patched })),
            )
        }
        DbCommands::Health => {
            let store = database::connect(&config).await?;
            store.health_check().await?;
            output_success(
                &output_format,
                &format!("{} store is healthy", store.backend_name()),
                Some(json!({ "backend": store.backend_name() })),
            )
        }
    }
}

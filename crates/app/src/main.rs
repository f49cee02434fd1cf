use std::sync::Arc;

use engine::{
    DisabledVerifier, LocalDiskStorage, SlipOkConfig, SlipOkVerifier, SlipVerifier,
};
use migration::{Migrator, MigratorTrait};
use settings::{Database, SlipOk};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "spendwise={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server) = settings.server else {
        tracing::warn!("No server settings found, nothing to run");
        return Ok(());
    };

    tracing::info!("Found server settings...");
    let db = parse_database(&server.database).await?;

    let storage = LocalDiskStorage::new(
        settings.storage.upload_dir,
        settings.storage.public_prefix,
    );
    let verifier = build_verifier(settings.slipok.as_ref());

    let engine = engine::Engine::builder()
        .database(db.clone())
        .storage(Arc::new(storage))
        .verifier(verifier)
        .build()
        .await?;

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    server::run_with_listener(engine, db, listener).await?;

    Ok(())
}

fn build_verifier(config: Option<&SlipOk>) -> Arc<dyn SlipVerifier> {
    let Some(config) = config.filter(|c| c.enabled()) else {
        tracing::info!("Slip verification disabled");
        return Arc::new(DisabledVerifier);
    };

    let slipok = SlipOkConfig::new(&config.api_key, &config.branch_id)
        .base_url(&config.base_url)
        .timeout(config.timeout());
    match SlipOkVerifier::new(slipok) {
        Ok(verifier) => Arc::new(verifier),
        Err(err) => {
            tracing::warn!("failed to initialize slip verifier, verification disabled: {err}");
            Arc::new(DisabledVerifier)
        }
    }
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

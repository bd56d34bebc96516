use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_mirror::api::router;
use catalog_mirror::config::AppConfig;
use catalog_mirror::db;
use catalog_mirror::ebs::{EbsConfig, HttpEbsClient};
use catalog_mirror::repository::SqliteRepository;
use catalog_mirror::services::{SyncScheduler, SyncService, Throttle};
use catalog_mirror::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "catalog_mirror=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let pool = db::connect(&config.database_url, 5).await?;

    let repo = Arc::new(SqliteRepository::new(pool.clone()));
    let ebs = Arc::new(HttpEbsClient::new(EbsConfig::from(&config))?);
    let service = Arc::new(SyncService::new(repo, ebs, Throttle::default()));

    let mut scheduler = SyncScheduler::new(service);
    if config.sync_enabled {
        scheduler.start(config.sync_interval);
    } else {
        info!("auto-sync disabled, serving the existing mirror");
    }

    let app = router(AppState { db: pool });

    info!("listening on http://{}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;

    scheduler.stop().await;

    Ok(())
}

use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod auth;
mod cleanup;
mod config;
mod db;
mod errors;
mod ffmpeg;
mod handlers;
mod ingest;
mod media;
mod models;
mod object_store;
mod system_info;

use config::Config;
use db::SqliteVideoStore;
use ffmpeg::FfmpegToolkit;
use ingest::IngestPipeline;
use models::AppState;
use object_store::S3ObjectStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vodhost_backend=debug,tower_http=debug".into()),
        )
        .init();

    // Load configuration
    let config = Config::load()?;

    // Ensure directories exist
    tokio::fs::create_dir_all(&config.assets_dir).await?;
    tokio::fs::create_dir_all(&config.staging_dir).await?;

    // SQLite does not create a missing database file on connect; touch it first.
    if !config.database_path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(&config.database_path)?;
        info!("Created database file {:?}", config.database_path);
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url())
        .await?;
    db::run_migrations(&pool).await?;

    let object_store = S3ObjectStore::new(
        config.s3_bucket.clone(),
        config.s3_region.clone(),
        config.s3_endpoint.clone(),
    )
    .await;

    let ingest = IngestPipeline::new(
        Arc::new(SqliteVideoStore::new(pool)),
        Arc::new(object_store),
        Arc::new(FfmpegToolkit),
        &config,
    );

    // Print system info at startup
    system_info::print_startup_info(&config);

    // Build router
    let app = handlers::router(AppState { ingest }, &config);

    let _sweeper = cleanup::start_cleanup_task(&config);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    info!("🚀 Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("{}", "=".repeat(60));
    println!("✅ Server running on http://0.0.0.0:{}", config.port);
    println!("✅ Server accessible at http://localhost:{}", config.port);
    println!("{}", "=".repeat(60));

    info!("✅ Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

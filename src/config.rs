use anyhow::Context;
use std::path::{Path, PathBuf};

/// Runtime configuration, loaded once at startup from the environment
/// (`.env` is read by main before this runs) and passed into the components
/// that need it.
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_path: PathBuf,
    pub assets_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub jwt_secret: String,
    pub s3_bucket: String,
    pub s3_region: String,
    pub s3_endpoint: Option<String>,
    pub max_video_bytes: usize,
    pub max_thumbnail_bytes: usize,
    pub cleanup_interval_secs: u64,
    pub cleanup_max_age_secs: u64,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8091);

        let database_path = resolve_path(
            &base_dir,
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "vodhost.db".to_string()),
        );

        let assets_dir = resolve_path(
            &base_dir,
            std::env::var("ASSETS_DIR").unwrap_or_else(|_| "assets".to_string()),
        );

        let staging_dir = std::env::var("STAGING_DIR")
            .map(|dir| resolve_path(&base_dir, dir))
            .unwrap_or_else(|_| std::env::temp_dir());

        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let s3_bucket = std::env::var("S3_BUCKET").context("S3_BUCKET must be set")?;
        let s3_region = std::env::var("S3_REGION").context("S3_REGION must be set")?;
        let s3_endpoint = std::env::var("S3_ENDPOINT").ok().filter(|e| !e.is_empty());

        let max_video_bytes = std::env::var("MAX_VIDEO_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1 << 30);

        let max_thumbnail_bytes = std::env::var("MAX_THUMBNAIL_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10 << 20);

        let cleanup_interval_secs = std::env::var("CLEANUP_INTERVAL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(600);

        let cleanup_max_age_secs = std::env::var("CLEANUP_MAX_AGE_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        Ok(Self {
            port,
            database_path,
            assets_dir,
            staging_dir,
            jwt_secret,
            s3_bucket,
            s3_region,
            s3_endpoint,
            max_video_bytes,
            max_thumbnail_bytes,
            cleanup_interval_secs,
            cleanup_max_age_secs,
        })
    }

    pub fn database_url(&self) -> String {
        format!("sqlite://{}", self.database_path.display())
    }
}

fn resolve_path(base: &Path, value: String) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

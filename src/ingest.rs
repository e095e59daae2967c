use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{HeaderMap, StatusCode};
use chrono::Utc;
use rand::RngCore;
use tempfile::{Builder, NamedTempFile, TempPath};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth;
use crate::config::Config;
use crate::db::VideoStore;
use crate::errors::ApiError;
use crate::media::{derive_object_key, MediaToolkit};
use crate::models::{CreateVideoRequest, Video};
use crate::object_store::ObjectStore;

/// Staged uploads carry this file-name prefix so the sweeper can tell them
/// apart from anything else in the staging directory.
pub const STAGING_PREFIX: &str = "vodhost-upload-";

/// Orchestrates an upload from credential check to record update. Every
/// collaborator sits behind a trait so the pipeline can run against fakes.
#[derive(Clone)]
pub struct IngestPipeline {
    store: Arc<dyn VideoStore>,
    objects: Arc<dyn ObjectStore>,
    media: Arc<dyn MediaToolkit>,
    jwt_secret: String,
    staging_dir: PathBuf,
    assets_dir: PathBuf,
    port: u16,
}

impl IngestPipeline {
    pub fn new(
        store: Arc<dyn VideoStore>,
        objects: Arc<dyn ObjectStore>,
        media: Arc<dyn MediaToolkit>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            objects,
            media,
            jwt_secret: config.jwt_secret.clone(),
            staging_dir: config.staging_dir.clone(),
            assets_dir: config.assets_dir.clone(),
            port: config.port,
        }
    }

    /// Full video ingestion: authenticate, authorize, validate the multipart
    /// payload, stage it, remux for fast start, probe the aspect ratio,
    /// derive an object key, upload, and persist the new URL. Staged and
    /// processed files are scope-guarded, so every exit path removes them.
    pub async fn ingest_video(
        &self,
        raw_video_id: &str,
        request: Request,
    ) -> Result<Video, ApiError> {
        let principal = auth::authenticate(request.headers(), &self.jwt_secret)?;
        let video_id = parse_video_id(raw_video_id)?;

        let mut video = self.store.get_video(video_id).await?;
        if video.user_id != principal {
            return Err(ApiError::Forbidden(
                "You are not authorized to upload this video".to_string(),
            ));
        }

        info!(
            "[POST /videos/:video_id/video] ⬆️  upload for video {} by user {}",
            video.id, principal
        );

        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|_| ApiError::InvalidInput("Unable to parse form file".to_string()))?;

        let mut staged: Option<(NamedTempFile, u64)> = None;
        while let Some(mut field) = multipart.next_field().await.map_err(multipart_failure)? {
            if field.name() != Some("video") {
                continue;
            }

            let media_type = media_type_essence(field.content_type());
            if media_type != "video/mp4" {
                return Err(ApiError::UnsupportedMediaType);
            }

            let temp = Builder::new()
                .prefix(STAGING_PREFIX)
                .suffix(".mp4")
                .tempfile_in(&self.staging_dir)?;
            let mut sink = tokio::fs::File::from_std(temp.reopen()?);

            let mut bytes: u64 = 0;
            while let Some(chunk) = field.chunk().await.map_err(multipart_failure)? {
                bytes += chunk.len() as u64;
                sink.write_all(&chunk).await?;
            }
            sink.flush().await?;
            sink.sync_all().await?;

            staged = Some((temp, bytes));
            break;
        }
        let (staged, staged_bytes) = staged
            .ok_or_else(|| ApiError::InvalidInput("Unable to parse form file".to_string()))?;
        debug!(
            "[POST /videos/:video_id/video] staged {} bytes at {:?}",
            staged_bytes,
            staged.path()
        );

        // The guard takes over the remux output immediately, so a failure in
        // any later stage still deletes it.
        let processed = TempPath::from_path(self.media.remux_faststart(staged.path()).await?);

        let class = self.media.probe_aspect(&processed).await?;
        debug!(
            "[POST /videos/:video_id/video] classified video {} as {}",
            video.id,
            class.ratio_label()
        );

        let mut rand_block = [0u8; 32];
        rand::rng().fill_bytes(&mut rand_block);
        let key = derive_object_key(class, &rand_block);

        self.objects.put_file(&key, "video/mp4", &processed).await?;
        info!(
            "[POST /videos/:video_id/video] ☁️  uploaded {} bytes as {}",
            staged_bytes, key
        );

        video.video_url = Some(self.objects.object_url(&key));
        video.updated_at = Utc::now();
        self.store
            .update_video(&video)
            .await
            .map_err(|err| ApiError::Persist(err.to_string()))?;

        info!(
            "[POST /videos/:video_id/video] ✅ video {} now at {}",
            video.id,
            video.video_url.as_deref().unwrap_or_default()
        );
        Ok(video)
    }

    /// Thumbnail sibling of [`ingest_video`]: same credential and ownership
    /// gates, then the image lands directly in the public assets directory.
    /// No staging, processing, or probing.
    pub async fn ingest_thumbnail(
        &self,
        raw_video_id: &str,
        request: Request,
    ) -> Result<Video, ApiError> {
        let principal = auth::authenticate(request.headers(), &self.jwt_secret)?;
        let video_id = parse_video_id(raw_video_id)?;

        let mut video = self.store.get_video(video_id).await?;
        if video.user_id != principal {
            return Err(ApiError::Forbidden(
                "You are not authorized to upload this thumbnail".to_string(),
            ));
        }

        info!(
            "[POST /videos/:video_id/thumbnail] 🖼️  thumbnail for video {} by user {}",
            video.id, principal
        );

        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|_| ApiError::InvalidInput("Unable to parse form file".to_string()))?;

        let mut written: Option<(String, u64)> = None;
        while let Some(mut field) = multipart.next_field().await.map_err(multipart_failure)? {
            if field.name() != Some("thumbnail") {
                continue;
            }

            let media_type = media_type_essence(field.content_type());
            let ext = match media_type.as_str() {
                "image/jpeg" => "jpeg",
                "image/png" => "png",
                _ => return Err(ApiError::UnsupportedMediaType),
            };

            let file_name = format!("{}.{}", video.id, ext);
            let mut sink = tokio::fs::File::create(self.assets_dir.join(&file_name)).await?;

            let mut bytes: u64 = 0;
            while let Some(chunk) = field.chunk().await.map_err(multipart_failure)? {
                bytes += chunk.len() as u64;
                sink.write_all(&chunk).await?;
            }
            sink.flush().await?;
            sink.sync_all().await?;

            written = Some((file_name, bytes));
            break;
        }
        let (file_name, bytes) = written
            .ok_or_else(|| ApiError::InvalidInput("Unable to parse form file".to_string()))?;
        debug!(
            "[POST /videos/:video_id/thumbnail] wrote {} bytes to {}",
            bytes, file_name
        );

        video.thumbnail_url = Some(format!(
            "http://localhost:{}/assets/{}",
            self.port, file_name
        ));
        video.updated_at = Utc::now();
        self.store
            .update_video(&video)
            .await
            .map_err(|err| ApiError::Persist(err.to_string()))?;

        info!(
            "[POST /videos/:video_id/thumbnail] ✅ video {} thumbnail updated",
            video.id
        );
        Ok(video)
    }

    /// Creates a draft record owned by the caller. Uploads target an existing
    /// record, so this is the entry point of the whole flow.
    pub async fn create_video(
        &self,
        headers: &HeaderMap,
        body: CreateVideoRequest,
    ) -> Result<Video, ApiError> {
        let principal = auth::authenticate(headers, &self.jwt_secret)?;

        let title = body.title.trim().to_string();
        if title.is_empty() {
            return Err(ApiError::InvalidInput("Title is required".to_string()));
        }

        let video = self
            .store
            .create_video(principal, title, body.description)
            .await
            .map_err(|err| ApiError::Persist(err.to_string()))?;
        info!(
            "[POST /videos] 🆕 video {} created by user {}",
            video.id, principal
        );
        Ok(video)
    }

    /// Owner-only record fetch.
    pub async fn get_video(
        &self,
        headers: &HeaderMap,
        raw_video_id: &str,
    ) -> Result<Video, ApiError> {
        let principal = auth::authenticate(headers, &self.jwt_secret)?;
        let video_id = parse_video_id(raw_video_id)?;

        let video = self.store.get_video(video_id).await?;
        if video.user_id != principal {
            return Err(ApiError::Forbidden(
                "You are not authorized to view this video".to_string(),
            ));
        }
        Ok(video)
    }
}

fn parse_video_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidInput("Invalid ID".to_string()))
}

/// Strips parameters (`;codecs=...`) and normalizes case, so declared types
/// compare against the accepted set by essence only.
fn media_type_essence(raw: Option<&str>) -> String {
    raw.unwrap_or_default()
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn multipart_failure(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge;
    }
    debug!("multipart read failed: {}", err);
    ApiError::InvalidInput("Unable to parse form file".to_string())
}

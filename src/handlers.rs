use axum::extract::{DefaultBodyLimit, Path, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::errors::ApiError;
use crate::models::{AppState, CreateVideoRequest, Video};

/// Builds the application router. Upload routes carry their own body caps;
/// thumbnails are served straight from the assets directory.
pub fn router(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/videos", post(create_video))
        .route("/videos/:video_id", get(get_video))
        .route(
            "/videos/:video_id/video",
            post(upload_video).layer(DefaultBodyLimit::max(config.max_video_bytes)),
        )
        .route(
            "/videos/:video_id/thumbnail",
            post(upload_thumbnail).layer(DefaultBodyLimit::max(config.max_thumbnail_bytes)),
        )
        .nest_service("/assets", ServeDir::new(&config.assets_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn upload_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    request: Request,
) -> Result<(StatusCode, Json<Video>), ApiError> {
    let video = state.ingest.ingest_video(&video_id, request).await?;
    Ok((StatusCode::CREATED, Json(video)))
}

async fn upload_thumbnail(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    request: Request,
) -> Result<Json<Video>, ApiError> {
    let video = state.ingest.ingest_thumbnail(&video_id, request).await?;
    Ok(Json(video))
}

async fn create_video(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateVideoRequest>,
) -> Result<(StatusCode, Json<Video>), ApiError> {
    let video = state.ingest.create_video(&headers, body).await?;
    Ok((StatusCode::CREATED, Json(video)))
}

async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Video>, ApiError> {
    let video = state.ingest.get_video(&headers, &video_id).await?;
    Ok(Json(video))
}

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::Video;

const INIT_SQL: &str = include_str!("../migrations/0001_init.sql");

#[derive(Debug, Error)]
pub enum DbError {
    #[error("video `{0}` not found")]
    NotFound(Uuid),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Record-store contract the ingestion pipeline and handlers depend on.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn get_video(&self, id: Uuid) -> Result<Video, DbError>;
    async fn update_video(&self, video: &Video) -> Result<(), DbError>;
    async fn create_video(
        &self,
        user_id: Uuid,
        title: String,
        description: String,
    ) -> Result<Video, DbError>;
}

#[derive(Clone)]
pub struct SqliteVideoStore {
    pool: SqlitePool,
}

impl SqliteVideoStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoStore for SqliteVideoStore {
    async fn get_video(&self, id: Uuid) -> Result<Video, DbError> {
        sqlx::query_as::<_, Video>(
            "SELECT id, created_at, updated_at, title, description, thumbnail_url, video_url, user_id
             FROM videos WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => DbError::NotFound(id),
            other => DbError::Sqlx(other),
        })
    }

    async fn update_video(&self, video: &Video) -> Result<(), DbError> {
        let result = sqlx::query(
            "UPDATE videos
             SET title = ?, description = ?, thumbnail_url = ?, video_url = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.thumbnail_url)
        .bind(&video.video_url)
        .bind(video.updated_at)
        .bind(video.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(video.id));
        }
        Ok(())
    }

    async fn create_video(
        &self,
        user_id: Uuid,
        title: String,
        description: String,
    ) -> Result<Video, DbError> {
        let now = Utc::now();
        let video = Video {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            title,
            description,
            thumbnail_url: None,
            video_url: None,
            user_id,
        };

        sqlx::query(
            "INSERT INTO videos (id, created_at, updated_at, title, description, thumbnail_url, video_url, user_id)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(video.id)
        .bind(video.created_at)
        .bind(video.updated_at)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.thumbnail_url)
        .bind(&video.video_url)
        .bind(video.user_id)
        .execute(&self.pool)
        .await?;

        Ok(video)
    }
}

/// Apply the schema statement by statement. Statements are idempotent, so
/// this runs unconditionally at every boot.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
    let statements = INIT_SQL
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    debug!("applying {} migration statements", statements.len());

    for stmt in statements {
        sqlx::query(stmt).execute(pool).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_store() -> SqliteVideoStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteVideoStore::new(pool)
    }

    #[tokio::test]
    async fn create_then_get_roundtrips() {
        let store = memory_store().await;
        let owner = Uuid::new_v4();

        let created = store
            .create_video(owner, "boat tour".into(), "slow pan".into())
            .await
            .unwrap();
        let fetched = store.get_video(created.id).await.unwrap();

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.title, "boat tour");
        assert_eq!(fetched.description, "slow pan");
        assert_eq!(fetched.user_id, owner);
        assert_eq!(fetched.thumbnail_url, None);
        assert_eq!(fetched.video_url, None);
        assert_eq!(fetched.created_at, created.created_at);
    }

    #[tokio::test]
    async fn get_missing_video_is_not_found() {
        let store = memory_store().await;
        let id = Uuid::new_v4();
        assert!(matches!(
            store.get_video(id).await,
            Err(DbError::NotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn update_persists_url_fields() {
        let store = memory_store().await;
        let mut video = store
            .create_video(Uuid::new_v4(), "demo".into(), String::new())
            .await
            .unwrap();

        video.video_url = Some("https://bucket.s3.region.amazonaws.com/landscape/x.mp4".into());
        video.thumbnail_url = Some("http://localhost:8091/assets/thumb.png".into());
        video.updated_at = Utc::now();
        store.update_video(&video).await.unwrap();

        let fetched = store.get_video(video.id).await.unwrap();
        assert_eq!(fetched.video_url, video.video_url);
        assert_eq!(fetched.thumbnail_url, video.thumbnail_url);
        assert_eq!(fetched.updated_at, video.updated_at);
    }

    #[tokio::test]
    async fn update_missing_video_is_not_found() {
        let store = memory_store().await;
        let now = Utc::now();
        let video = Video {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            title: "ghost".into(),
            description: String::new(),
            thumbnail_url: None,
            video_url: None,
            user_id: Uuid::new_v4(),
        };
        assert!(matches!(
            store.update_video(&video).await,
            Err(DbError::NotFound(_))
        ));
    }
}

use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Manifest makes completion a verifiable, queryable state: the received
/// set lives in `upload_chunks`, never inferred from storage key names.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UploadManifest {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub total_chunks: i32,
    pub content_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

pub async fn insert_manifest(
    db: &PgPool,
    owner_id: Uuid,
    total_chunks: i32,
    content_type: &str,
) -> anyhow::Result<UploadManifest> {
    let row = sqlx::query_as::<_, UploadManifest>(
        r#"
        INSERT INTO upload_manifests (owner_id, total_chunks, content_type)
        VALUES ($1, $2, $3)
        RETURNING id, owner_id, total_chunks, content_type, created_at, completed_at
        "#,
    )
    .bind(owner_id)
    .bind(total_chunks)
    .bind(content_type)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn find_manifest(
    db: &PgPool,
    id: Uuid,
    owner_id: Uuid,
) -> anyhow::Result<Option<UploadManifest>> {
    let row = sqlx::query_as::<_, UploadManifest>(
        r#"
        SELECT id, owner_id, total_chunks, content_type, created_at, completed_at
        FROM upload_manifests
        WHERE id = $1 AND owner_id = $2
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Recording the same index twice is a no-op, so chunk retries are safe.
pub async fn record_chunk(
    db: &PgPool,
    upload_id: Uuid,
    chunk_index: i32,
    size_bytes: i64,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO upload_chunks (upload_id, chunk_index, size_bytes)
        VALUES ($1, $2, $3)
        ON CONFLICT (upload_id, chunk_index) DO NOTHING
        "#,
    )
    .bind(upload_id)
    .bind(chunk_index)
    .bind(size_bytes)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn count_received(db: &PgPool, upload_id: Uuid) -> anyhow::Result<i64> {
    let count: i64 =
        sqlx::query_scalar(r#"SELECT count(*) FROM upload_chunks WHERE upload_id = $1"#)
            .bind(upload_id)
            .fetch_one(db)
            .await?;
    Ok(count)
}

pub async fn received_indices(db: &PgPool, upload_id: Uuid) -> anyhow::Result<Vec<i32>> {
    let rows: Vec<i32> = sqlx::query_scalar(
        r#"
        SELECT chunk_index FROM upload_chunks
        WHERE upload_id = $1
        ORDER BY chunk_index ASC
        "#,
    )
    .bind(upload_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Idempotent stamp; completing an already-complete upload changes nothing.
pub async fn mark_completed(db: &PgPool, upload_id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE upload_manifests
        SET completed_at = now()
        WHERE id = $1 AND completed_at IS NULL
        "#,
    )
    .bind(upload_id)
    .execute(db)
    .await?;
    Ok(())
}

use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClientRecord {
    pub id: Uuid,
    pub photographer_id: Uuid,
    pub email: String,
    pub full_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub async fn list_by_photographer(
    db: &PgPool,
    photographer_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<ClientRecord>> {
    let rows = sqlx::query_as::<_, ClientRecord>(
        r#"
        SELECT id, photographer_id, email, full_name, created_at
        FROM clients
        WHERE photographer_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(photographer_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// `None` signals the (photographer, email) pair already exists.
pub async fn insert(
    db: &PgPool,
    photographer_id: Uuid,
    email: &str,
    full_name: &str,
) -> anyhow::Result<Option<ClientRecord>> {
    let row = sqlx::query_as::<_, ClientRecord>(
        r#"
        INSERT INTO clients (photographer_id, email, full_name)
        VALUES ($1, $2, $3)
        ON CONFLICT (photographer_id, email) DO NOTHING
        RETURNING id, photographer_id, email, full_name, created_at
        "#,
    )
    .bind(photographer_id)
    .bind(email)
    .bind(full_name)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

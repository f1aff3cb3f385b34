use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Gallery {
    pub id: Uuid,
    pub photographer_id: Uuid,
    pub title: String,
    pub client_email: Option<String>,
    #[serde(skip_serializing)]
    pub cover_key: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub async fn create(
    db: &PgPool,
    photographer_id: Uuid,
    title: &str,
    client_email: Option<&str>,
    cover_key: Option<&str>,
) -> anyhow::Result<Gallery> {
    let row = sqlx::query_as::<_, Gallery>(
        r#"
        INSERT INTO galleries (photographer_id, title, client_email, cover_key)
        VALUES ($1, $2, $3, $4)
        RETURNING id, photographer_id, title, client_email, cover_key, created_at
        "#,
    )
    .bind(photographer_id)
    .bind(title)
    .bind(client_email)
    .bind(cover_key)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn list_for_photographer(
    db: &PgPool,
    photographer_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Gallery>> {
    let rows = sqlx::query_as::<_, Gallery>(
        r#"
        SELECT id, photographer_id, title, client_email, cover_key, created_at
        FROM galleries
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

/// Galleries a client can see: those granted to their email, usually by
/// the checkout webhook.
pub async fn list_granted(
    db: &PgPool,
    client_email: &str,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Gallery>> {
    let rows = sqlx::query_as::<_, Gallery>(
        r#"
        SELECT g.id, g.photographer_id, g.title, g.client_email, g.cover_key, g.created_at
        FROM galleries g
        JOIN gallery_access_grants a ON a.gallery_id = g.id
        WHERE a.client_email = $1
        ORDER BY g.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(client_email.to_lowercase())
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_owned(
    db: &PgPool,
    id: Uuid,
    photographer_id: Uuid,
) -> anyhow::Result<Option<Gallery>> {
    let row = sqlx::query_as::<_, Gallery>(
        r#"
        SELECT id, photographer_id, title, client_email, cover_key, created_at
        FROM galleries
        WHERE id = $1 AND photographer_id = $2
        "#,
    )
    .bind(id)
    .bind(photographer_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn find_granted(
    db: &PgPool,
    id: Uuid,
    client_email: &str,
) -> anyhow::Result<Option<Gallery>> {
    let row = sqlx::query_as::<_, Gallery>(
        r#"
        SELECT g.id, g.photographer_id, g.title, g.client_email, g.cover_key, g.created_at
        FROM galleries g
        JOIN gallery_access_grants a ON a.gallery_id = g.id
        WHERE g.id = $1 AND a.client_email = $2
        "#,
    )
    .bind(id)
    .bind(client_email.to_lowercase())
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Gallery>> {
    let row = sqlx::query_as::<_, Gallery>(
        r#"
        SELECT id, photographer_id, title, client_email, cover_key, created_at
        FROM galleries
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

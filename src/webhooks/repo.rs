use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WebhookEventRow {
    pub id: Uuid,
    pub provider_id: String,
    pub event_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub received_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub processed_at: Option<OffsetDateTime>,
}

/// Claims the event under its provider id. `None` means another delivery
/// already holds it: the unique index serializes concurrent redeliveries,
/// and a rollback releases the claim for the provider's retry.
pub async fn claim_event(
    tx: &mut Transaction<'_, Postgres>,
    provider_id: &str,
    event_type: &str,
    payload: &serde_json::Value,
) -> anyhow::Result<Option<Uuid>> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO webhook_events (provider_id, event_type, payload)
        VALUES ($1, $2, $3)
        ON CONFLICT (provider_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(provider_id)
    .bind(event_type)
    .bind(payload)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(id)
}

pub async fn mark_processed(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
) -> anyhow::Result<()> {
    sqlx::query(r#"UPDATE webhook_events SET processed_at = now() WHERE id = $1"#)
        .bind(event_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Upsert keyed by the provider's subscription id. Events may arrive out
/// of order, so every transition writes against current state instead of
/// assuming a prior event ran.
pub async fn upsert_subscription_status(
    tx: &mut Transaction<'_, Postgres>,
    provider_subscription_id: &str,
    status: &str,
    customer_email: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO subscriptions (provider_subscription_id, status, customer_email)
        VALUES ($1, $2, $3)
        ON CONFLICT (provider_subscription_id) DO UPDATE
        SET status = EXCLUDED.status,
            customer_email = COALESCE(EXCLUDED.customer_email, subscriptions.customer_email),
            updated_at = now()
        "#,
    )
    .bind(provider_subscription_id)
    .bind(status)
    .bind(customer_email)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn grant_gallery_access(
    tx: &mut Transaction<'_, Postgres>,
    gallery_id: Uuid,
    client_email: &str,
    source_event_id: Uuid,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO gallery_access_grants (gallery_id, client_email, source_event_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (gallery_id, client_email) DO NOTHING
        "#,
    )
    .bind(gallery_id)
    .bind(client_email.to_lowercase())
    .bind(source_event_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn record_payout(
    tx: &mut Transaction<'_, Postgres>,
    provider_payout_id: &str,
    amount_cents: i64,
    currency: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO payouts (provider_payout_id, amount_cents, currency)
        VALUES ($1, $2, $3)
        ON CONFLICT (provider_payout_id) DO NOTHING
        "#,
    )
    .bind(provider_payout_id)
    .bind(amount_cents)
    .bind(currency)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn recent_events(db: &PgPool, limit: i64) -> anyhow::Result<Vec<WebhookEventRow>> {
    let rows = sqlx::query_as::<_, WebhookEventRow>(
        r#"
        SELECT id, provider_id, event_type, received_at, processed_at
        FROM webhook_events
        ORDER BY received_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

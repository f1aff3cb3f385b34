use serde::Serialize;
use sqlx::{FromRow, PgPool};

#[derive(Debug, Serialize, FromRow)]
pub struct ProfileCounts {
    pub photographers: i64,
    pub clients: i64,
    pub admins: i64,
    pub disabled: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct WebhookCounts {
    pub received: i64,
    pub processed: i64,
}

#[derive(Debug, Serialize)]
pub struct Overview {
    pub profiles: ProfileCounts,
    pub webhooks: WebhookCounts,
    pub active_subscriptions: i64,
}

pub async fn overview(db: &PgPool) -> anyhow::Result<Overview> {
    let profiles = sqlx::query_as::<_, ProfileCounts>(
        r#"
        SELECT
            count(*) FILTER (WHERE user_type = 'photographer') AS photographers,
            count(*) FILTER (WHERE user_type = 'client') AS clients,
            count(*) FILTER (WHERE user_type = 'admin') AS admins,
            count(*) FILTER (WHERE disabled_at IS NOT NULL) AS disabled
        FROM user_profiles
        "#,
    )
    .fetch_one(db)
    .await?;

    let webhooks = sqlx::query_as::<_, WebhookCounts>(
        r#"
        SELECT count(*) AS received, count(processed_at) AS processed
        FROM webhook_events
        "#,
    )
    .fetch_one(db)
    .await?;

    let active_subscriptions: i64 =
        sqlx::query_scalar(r#"SELECT count(*) FROM subscriptions WHERE status = 'active'"#)
            .fetch_one(db)
            .await?;

    Ok(Overview {
        profiles,
        webhooks,
        active_subscriptions,
    })
}

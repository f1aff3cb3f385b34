use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct DripEnrollment {
    pub id: Uuid,
    pub email: String,
    pub sequence: String,
    pub step: i32,
    pub next_run_at: OffsetDateTime,
    pub completed_at: Option<OffsetDateTime>,
}

/// Idempotent: re-enrolling an (email, sequence) pair is a no-op.
pub async fn enroll(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
    sequence: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO drip_enrollments (email, sequence)
        VALUES ($1, $2)
        ON CONFLICT (email, sequence) DO NOTHING
        "#,
    )
    .bind(email.to_lowercase())
    .bind(sequence)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn due_batch(db: &PgPool, limit: i64) -> anyhow::Result<Vec<DripEnrollment>> {
    let rows = sqlx::query_as::<_, DripEnrollment>(
        r#"
        SELECT id, email, sequence, step, next_run_at, completed_at
        FROM drip_enrollments
        WHERE completed_at IS NULL AND next_run_at <= now()
        ORDER BY next_run_at ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn advance(
    db: &PgPool,
    id: Uuid,
    next_step: i32,
    delay_days: i32,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE drip_enrollments
        SET step = $2, next_run_at = now() + make_interval(days => $3)
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(next_step)
    .bind(delay_days)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn complete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query(r#"UPDATE drip_enrollments SET completed_at = now() WHERE id = $1"#)
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

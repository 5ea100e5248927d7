use sqlx::PgPool;

use crate::db::models::Device;

const COLUMNS: &str = "id, user_id, title, created_at, updated_at";

/// Reuses the row for a known `(user, title)` pair instead of piling up duplicates.
pub(crate) async fn upsert(
    pool: &PgPool,
    id: &str,
    user_id: &str,
    title: &str,
    now: time::PrimitiveDateTime,
) -> Result<Device, sqlx::Error> {
    sqlx::query_as::<_, Device>(&format!(
        "INSERT INTO devices (id, user_id, title, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$4)
         ON CONFLICT (user_id, title) DO UPDATE SET updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(title)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn exists_for_user(
    pool: &PgPool,
    id: &str,
    user_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM devices WHERE id = $1 AND user_id = $2)",
    )
    .bind(id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_for_user(pool: &PgPool, user_id: &str) -> Result<Vec<Device>, sqlx::Error> {
    sqlx::query_as::<_, Device>(&format!(
        "SELECT {COLUMNS} FROM devices WHERE user_id = $1 ORDER BY updated_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn delete_for_user(
    pool: &PgPool,
    id: &str,
    user_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM devices WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

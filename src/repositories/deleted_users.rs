use sqlx::PgPool;

use crate::db::models::DeletedUser;

const COLUMNS: &str = "id, phone_number, username, created_at, updated_at";

pub(crate) async fn insert(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    phone_number: &str,
    username: Option<&str>,
    now: time::PrimitiveDateTime,
) -> Result<DeletedUser, sqlx::Error> {
    sqlx::query_as::<_, DeletedUser>(&format!(
        "INSERT INTO deleted_users (id, phone_number, username, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$4)
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(phone_number)
    .bind(username)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    skip: i64,
    limit: i64,
) -> Result<Vec<DeletedUser>, sqlx::Error> {
    sqlx::query_as::<_, DeletedUser>(&format!(
        "SELECT {COLUMNS} FROM deleted_users ORDER BY created_at DESC OFFSET $1 LIMIT $2"
    ))
    .bind(skip.max(0))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM deleted_users").fetch_one(pool).await
}

#[cfg(test)]
pub(crate) async fn count_by_phone(pool: &PgPool, phone_number: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM deleted_users WHERE phone_number = $1")
        .bind(phone_number)
        .fetch_one(pool)
        .await
}

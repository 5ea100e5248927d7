use sqlx::PgPool;

use crate::db::models::Certificate;

const COLUMNS: &str = "id, user_id, course_id, finished_at, qr_code, created_at, updated_at";

pub(crate) struct CreateCertificate<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) finished_at: time::Date,
    pub(crate) qr_code: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateCertificate<'_>,
) -> Result<Certificate, sqlx::Error> {
    sqlx::query_as::<_, Certificate>(&format!(
        "INSERT INTO certificates (id, user_id, course_id, finished_at, qr_code, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$6)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.course_id)
    .bind(params.finished_at)
    .bind(params.qr_code)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    user_id: Option<&str>,
) -> Result<Vec<Certificate>, sqlx::Error> {
    sqlx::query_as::<_, Certificate>(&format!(
        "SELECT {COLUMNS} FROM certificates
         WHERE ($1::varchar IS NULL OR user_id = $1)
         ORDER BY finished_at DESC, created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

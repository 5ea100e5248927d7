use sqlx::PgPool;

use crate::db::models::TaskChat;

const COLUMNS: &str = "id, task_id, user_id, text, file, voice, created_at, updated_at";

pub(crate) struct CreateMessage<'a> {
    pub(crate) id: &'a str,
    pub(crate) task_id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) text: &'a str,
    pub(crate) file: Option<&'a str>,
    pub(crate) voice: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateMessage<'_>) -> Result<TaskChat, sqlx::Error> {
    sqlx::query_as::<_, TaskChat>(&format!(
        "INSERT INTO task_chats (id, task_id, user_id, text, file, voice, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.task_id)
    .bind(params.user_id)
    .bind(params.text)
    .bind(params.file)
    .bind(params.voice)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_for_task(
    pool: &PgPool,
    task_id: &str,
    user_id: Option<&str>,
) -> Result<Vec<TaskChat>, sqlx::Error> {
    sqlx::query_as::<_, TaskChat>(&format!(
        "SELECT {COLUMNS} FROM task_chats
         WHERE task_id = $1 AND ($2::varchar IS NULL OR user_id = $2)
         ORDER BY created_at"
    ))
    .bind(task_id)
    .bind(user_id)
    .fetch_all(pool)
    .await
}

use sqlx::PgPool;

use crate::db::models::LessonQuestion;

const COLUMNS: &str = "id, lesson_id, user_id, text, file, voice_message, created_at, updated_at";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) lesson_id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) text: Option<&'a str>,
    pub(crate) file: Option<&'a str>,
    pub(crate) voice_message: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateQuestion<'_>,
) -> Result<LessonQuestion, sqlx::Error> {
    sqlx::query_as::<_, LessonQuestion>(&format!(
        "INSERT INTO lesson_questions (
            id, lesson_id, user_id, text, file, voice_message, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.lesson_id)
    .bind(params.user_id)
    .bind(params.text)
    .bind(params.file)
    .bind(params.voice_message)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

/// `user_id = None` lists every author's questions.
pub(crate) async fn list_for_lesson(
    pool: &PgPool,
    lesson_id: &str,
    user_id: Option<&str>,
) -> Result<Vec<LessonQuestion>, sqlx::Error> {
    sqlx::query_as::<_, LessonQuestion>(&format!(
        "SELECT {COLUMNS} FROM lesson_questions
         WHERE lesson_id = $1 AND ($2::varchar IS NULL OR user_id = $2)
         ORDER BY created_at"
    ))
    .bind(lesson_id)
    .bind(user_id)
    .fetch_all(pool)
    .await
}

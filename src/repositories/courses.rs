use sqlx::PgPool;

use crate::db::models::Course;

pub(crate) const COLUMNS: &str = "\
    id, title, \"order\", url, lesson_count, modul_count, task_count, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COLUMNS} FROM courses WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM courses WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COLUMNS} FROM courses ORDER BY \"order\", created_at"
    ))
    .fetch_all(pool)
    .await
}

/// Courses the user holds a `user_courses` row for.
pub(crate) async fn list_for_user(pool: &PgPool, user_id: &str) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {} FROM courses c
         JOIN user_courses uc ON uc.course_id = c.id
         WHERE uc.user_id = $1
         ORDER BY c.\"order\", c.created_at",
        prefixed("c")
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

fn prefixed(alias: &str) -> String {
    COLUMNS.split(',').map(|column| format!("{alias}.{}", column.trim())).collect::<Vec<_>>().join(", ")
}

pub(crate) struct CreateCourse<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) order: i32,
    pub(crate) url: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateCourse<'_>) -> Result<Course, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (id, title, \"order\", url, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$5)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.order)
    .bind(params.url)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

#[derive(Default)]
pub(crate) struct UpdateCourse {
    pub(crate) title: Option<String>,
    pub(crate) order: Option<i32>,
    pub(crate) url: Option<String>,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateCourse,
    updated_at: time::PrimitiveDateTime,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "UPDATE courses SET
            title = COALESCE($1, title),
            \"order\" = COALESCE($2, \"order\"),
            url = COALESCE($3, url),
            updated_at = $4
         WHERE id = $5
         RETURNING {COLUMNS}"
    ))
    .bind(params.title)
    .bind(params.order)
    .bind(params.url)
    .bind(updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM courses WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

use sqlx::PgPool;

use crate::db::models::Lesson;
use crate::repositories::counters;

pub(crate) const COLUMNS: &str = "\
    id, module_id, title, \"order\", url, materials, is_deleted, slug, video_count, \
    created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Lesson>, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(&format!("SELECT {COLUMNS} FROM lessons WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Course owning the lesson, used by enrollment checks.
pub(crate) async fn find_course_id(
    pool: &PgPool,
    lesson_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT m.course_id FROM lessons l JOIN modules m ON m.id = l.module_id WHERE l.id = $1",
    )
    .bind(lesson_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    module_id: Option<&str>,
) -> Result<Vec<Lesson>, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(&format!(
        "SELECT {COLUMNS} FROM lessons
         WHERE ($1::varchar IS NULL OR module_id = $1)
         ORDER BY module_id, \"order\", created_at"
    ))
    .bind(module_id)
    .fetch_all(pool)
    .await
}

/// Visible lessons of several modules at once, for nested module listings.
pub(crate) async fn list_visible_for_modules(
    pool: &PgPool,
    module_ids: &[String],
) -> Result<Vec<Lesson>, sqlx::Error> {
    if module_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, Lesson>(&format!(
        "SELECT {COLUMNS} FROM lessons
         WHERE module_id = ANY($1) AND NOT is_deleted
         ORDER BY \"order\", created_at"
    ))
    .bind(module_ids)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateLesson<'a> {
    pub(crate) id: &'a str,
    pub(crate) module_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) order: i32,
    pub(crate) url: &'a str,
    pub(crate) materials: Option<&'a str>,
    pub(crate) slug: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateLesson<'_>) -> Result<Lesson, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let course_id = counters::module_course(&mut tx, params.module_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

    let lesson = sqlx::query_as::<_, Lesson>(&format!(
        "INSERT INTO lessons (
            id, module_id, title, \"order\", url, materials, slug, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.module_id)
    .bind(params.title)
    .bind(params.order)
    .bind(params.url)
    .bind(params.materials)
    .bind(params.slug)
    .bind(params.created_at)
    .fetch_one(&mut *tx)
    .await?;

    counters::bump_module(&mut tx, params.module_id, 1, 0).await?;
    counters::bump_course(&mut tx, &course_id, 0, 1, 0).await?;

    tx.commit().await?;
    Ok(lesson)
}

#[derive(Default)]
pub(crate) struct UpdateLesson {
    pub(crate) module_id: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) order: Option<i32>,
    pub(crate) url: Option<String>,
    pub(crate) materials: Option<String>,
    pub(crate) is_deleted: Option<bool>,
    pub(crate) slug: Option<String>,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateLesson,
    updated_at: time::PrimitiveDateTime,
) -> Result<Option<Lesson>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some((current_module, current_course)) = lock_parents(&mut tx, id).await? else {
        tx.rollback().await?;
        return Ok(None);
    };

    if let Some(new_module) = params.module_id.as_deref().filter(|m| *m != current_module) {
        let new_course = counters::module_course(&mut tx, new_module)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        let tasks = task_count(&mut tx, id).await?;

        counters::bump_module(&mut tx, &current_module, -1, -tasks).await?;
        counters::bump_course(&mut tx, &current_course, 0, -1, -tasks).await?;
        counters::bump_module(&mut tx, new_module, 1, tasks).await?;
        counters::bump_course(&mut tx, &new_course, 0, 1, tasks).await?;
    }

    let lesson = sqlx::query_as::<_, Lesson>(&format!(
        "UPDATE lessons SET
            module_id = COALESCE($1, module_id),
            title = COALESCE($2, title),
            \"order\" = COALESCE($3, \"order\"),
            url = COALESCE($4, url),
            materials = COALESCE($5, materials),
            is_deleted = COALESCE($6, is_deleted),
            slug = COALESCE($7, slug),
            updated_at = $8
         WHERE id = $9
         RETURNING {COLUMNS}"
    ))
    .bind(params.module_id)
    .bind(params.title)
    .bind(params.order)
    .bind(params.url)
    .bind(params.materials)
    .bind(params.is_deleted)
    .bind(params.slug)
    .bind(updated_at)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(lesson)
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some((module_id, course_id)) = lock_parents(&mut tx, id).await? else {
        tx.rollback().await?;
        return Ok(false);
    };

    let tasks = task_count(&mut tx, id).await?;
    sqlx::query("DELETE FROM lessons WHERE id = $1").bind(id).execute(&mut *tx).await?;
    counters::bump_module(&mut tx, &module_id, -1, -tasks).await?;
    counters::bump_course(&mut tx, &course_id, 0, -1, -tasks).await?;

    tx.commit().await?;
    Ok(true)
}

async fn lock_parents(
    conn: &mut sqlx::PgConnection,
    lesson_id: &str,
) -> Result<Option<(String, String)>, sqlx::Error> {
    sqlx::query_as::<_, (String, String)>(
        "SELECT l.module_id, m.course_id
         FROM lessons l
         JOIN modules m ON m.id = l.module_id
         WHERE l.id = $1
         FOR UPDATE OF l
         FOR KEY SHARE OF m",
    )
    .bind(lesson_id)
    .fetch_optional(conn)
    .await
}

async fn task_count(conn: &mut sqlx::PgConnection, lesson_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks WHERE lesson_id = $1")
        .bind(lesson_id)
        .fetch_one(conn)
        .await
}

use sqlx::PgPool;

use crate::db::models::Task;
use crate::repositories::counters;

pub(crate) const COLUMNS: &str = "\
    id, lesson_id, title, description, status, user_task_list, task_number, last_time, \
    \"order\", priority, must_complete, files, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!("SELECT {COLUMNS} FROM tasks WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_course_id(
    pool: &PgPool,
    task_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT m.course_id
         FROM tasks t
         JOIN lessons l ON l.id = t.lesson_id
         JOIN modules m ON m.id = l.module_id
         WHERE t.id = $1",
    )
    .bind(task_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    lesson_id: Option<&str>,
    must_complete: Option<bool>,
) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "SELECT {COLUMNS} FROM tasks
         WHERE ($1::varchar IS NULL OR lesson_id = $1)
           AND ($2::boolean IS NULL OR must_complete = $2)
         ORDER BY \"order\", priority DESC, created_at"
    ))
    .bind(lesson_id)
    .bind(must_complete)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateTask<'a> {
    pub(crate) id: &'a str,
    pub(crate) lesson_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) status: &'a str,
    pub(crate) user_task_list: &'a str,
    pub(crate) task_number: i32,
    pub(crate) last_time: time::PrimitiveDateTime,
    pub(crate) order: i32,
    pub(crate) priority: i32,
    pub(crate) must_complete: bool,
    pub(crate) files: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateTask<'_>) -> Result<Task, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let (module_id, course_id) = counters::lesson_parents(&mut tx, params.lesson_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

    let task = sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (
            id, lesson_id, title, description, status, user_task_list, task_number,
            last_time, \"order\", priority, must_complete, files, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$13)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.lesson_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.status)
    .bind(params.user_task_list)
    .bind(params.task_number)
    .bind(params.last_time)
    .bind(params.order)
    .bind(params.priority)
    .bind(params.must_complete)
    .bind(params.files)
    .bind(params.created_at)
    .fetch_one(&mut *tx)
    .await?;

    counters::bump_module(&mut tx, &module_id, 0, 1).await?;
    counters::bump_course(&mut tx, &course_id, 0, 0, 1).await?;

    tx.commit().await?;
    Ok(task)
}

#[derive(Default)]
pub(crate) struct UpdateTask {
    pub(crate) lesson_id: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) status: Option<String>,
    pub(crate) user_task_list: Option<String>,
    pub(crate) task_number: Option<i32>,
    pub(crate) last_time: Option<time::PrimitiveDateTime>,
    pub(crate) order: Option<i32>,
    pub(crate) priority: Option<i32>,
    pub(crate) must_complete: Option<bool>,
    pub(crate) files: Option<String>,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateTask,
    updated_at: time::PrimitiveDateTime,
) -> Result<Option<Task>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_scalar::<_, String>("SELECT lesson_id FROM tasks WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(current_lesson) = current else {
        tx.rollback().await?;
        return Ok(None);
    };

    if let Some(new_lesson) = params.lesson_id.as_deref().filter(|l| *l != current_lesson) {
        let (old_module, old_course) = counters::lesson_parents(&mut tx, &current_lesson)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        let (new_module, new_course) = counters::lesson_parents(&mut tx, new_lesson)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        counters::bump_module(&mut tx, &old_module, 0, -1).await?;
        counters::bump_course(&mut tx, &old_course, 0, 0, -1).await?;
        counters::bump_module(&mut tx, &new_module, 0, 1).await?;
        counters::bump_course(&mut tx, &new_course, 0, 0, 1).await?;
    }

    let task = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks SET
            lesson_id = COALESCE($1, lesson_id),
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            status = COALESCE($4, status),
            user_task_list = COALESCE($5, user_task_list),
            task_number = COALESCE($6, task_number),
            last_time = COALESCE($7, last_time),
            \"order\" = COALESCE($8, \"order\"),
            priority = COALESCE($9, priority),
            must_complete = COALESCE($10, must_complete),
            files = COALESCE($11, files),
            updated_at = $12
         WHERE id = $13
         RETURNING {COLUMNS}"
    ))
    .bind(params.lesson_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.status)
    .bind(params.user_task_list)
    .bind(params.task_number)
    .bind(params.last_time)
    .bind(params.order)
    .bind(params.priority)
    .bind(params.must_complete)
    .bind(params.files)
    .bind(updated_at)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(task)
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let lesson_id = sqlx::query_scalar::<_, String>("SELECT lesson_id FROM tasks WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(lesson_id) = lesson_id else {
        tx.rollback().await?;
        return Ok(false);
    };

    let (module_id, course_id) = counters::lesson_parents(&mut tx, &lesson_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

    sqlx::query("DELETE FROM tasks WHERE id = $1").bind(id).execute(&mut *tx).await?;
    counters::bump_module(&mut tx, &module_id, 0, -1).await?;
    counters::bump_course(&mut tx, &course_id, 0, 0, -1).await?;

    tx.commit().await?;
    Ok(true)
}

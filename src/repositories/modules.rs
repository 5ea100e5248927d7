use sqlx::PgPool;

use crate::db::models::Module;
use crate::repositories::counters;

pub(crate) const COLUMNS: &str = "\
    id, course_id, title, learning_type, has_in_tg, \"order\", row_num, support_day, slug, \
    lesson_count, task_count, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Module>, sqlx::Error> {
    sqlx::query_as::<_, Module>(&format!("SELECT {COLUMNS} FROM modules WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(
    pool: &PgPool,
    course_id: Option<&str>,
) -> Result<Vec<Module>, sqlx::Error> {
    sqlx::query_as::<_, Module>(&format!(
        "SELECT {COLUMNS} FROM modules
         WHERE ($1::varchar IS NULL OR course_id = $1)
         ORDER BY course_id, \"order\", row_num, created_at"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateModule<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) learning_type: &'a str,
    pub(crate) has_in_tg: &'a str,
    pub(crate) order: i32,
    pub(crate) row_num: i32,
    pub(crate) support_day: time::Date,
    pub(crate) slug: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateModule<'_>) -> Result<Module, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let module = sqlx::query_as::<_, Module>(&format!(
        "INSERT INTO modules (
            id, course_id, title, learning_type, has_in_tg, \"order\", row_num,
            support_day, slug, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$10)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.title)
    .bind(params.learning_type)
    .bind(params.has_in_tg)
    .bind(params.order)
    .bind(params.row_num)
    .bind(params.support_day)
    .bind(params.slug)
    .bind(params.created_at)
    .fetch_one(&mut *tx)
    .await?;

    counters::bump_course(&mut tx, &module.course_id, 1, 0, 0).await?;

    tx.commit().await?;
    Ok(module)
}

#[derive(Default)]
pub(crate) struct UpdateModule {
    pub(crate) course_id: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) learning_type: Option<String>,
    pub(crate) has_in_tg: Option<String>,
    pub(crate) order: Option<i32>,
    pub(crate) row_num: Option<i32>,
    pub(crate) support_day: Option<time::Date>,
    pub(crate) slug: Option<String>,
}

/// Moving a module to another course carries its lessons and tasks with it.
pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateModule,
    updated_at: time::PrimitiveDateTime,
) -> Result<Option<Module>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_scalar::<_, String>(
        "SELECT course_id FROM modules WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some(current_course) = current else {
        tx.rollback().await?;
        return Ok(None);
    };

    if let Some(new_course) = params.course_id.as_deref().filter(|c| *c != current_course) {
        let (lessons, tasks) = child_counts(&mut tx, id).await?;
        counters::bump_course(&mut tx, &current_course, -1, -lessons, -tasks).await?;
        counters::bump_course(&mut tx, new_course, 1, lessons, tasks).await?;
    }

    let module = sqlx::query_as::<_, Module>(&format!(
        "UPDATE modules SET
            course_id = COALESCE($1, course_id),
            title = COALESCE($2, title),
            learning_type = COALESCE($3, learning_type),
            has_in_tg = COALESCE($4, has_in_tg),
            \"order\" = COALESCE($5, \"order\"),
            row_num = COALESCE($6, row_num),
            support_day = COALESCE($7, support_day),
            slug = COALESCE($8, slug),
            updated_at = $9
         WHERE id = $10
         RETURNING {COLUMNS}"
    ))
    .bind(params.course_id)
    .bind(params.title)
    .bind(params.learning_type)
    .bind(params.has_in_tg)
    .bind(params.order)
    .bind(params.row_num)
    .bind(params.support_day)
    .bind(params.slug)
    .bind(updated_at)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(module)
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let course_id = sqlx::query_scalar::<_, String>(
        "SELECT course_id FROM modules WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some(course_id) = course_id else {
        tx.rollback().await?;
        return Ok(false);
    };

    let (lessons, tasks) = child_counts(&mut tx, id).await?;
    sqlx::query("DELETE FROM modules WHERE id = $1").bind(id).execute(&mut *tx).await?;
    counters::bump_course(&mut tx, &course_id, -1, -lessons, -tasks).await?;

    tx.commit().await?;
    Ok(true)
}

async fn child_counts(
    conn: &mut sqlx::PgConnection,
    module_id: &str,
) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as::<_, (i64, i64)>(
        "SELECT
            (SELECT COUNT(*) FROM lessons WHERE module_id = $1),
            (SELECT COUNT(*) FROM tasks t JOIN lessons l ON l.id = t.lesson_id
             WHERE l.module_id = $1)",
    )
    .bind(module_id)
    .fetch_one(conn)
    .await
}

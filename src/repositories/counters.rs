//! Denormalised child counts on courses, modules and lessons.
//!
//! Every write that adds, removes or re-parents a module, lesson, task or video
//! calls into this module on the same transaction. `recount_course` rebuilds the
//! numbers from the rows themselves.

use sqlx::PgConnection;

use crate::db::models::Course;
use crate::repositories::courses;

pub(crate) async fn bump_course(
    conn: &mut PgConnection,
    course_id: &str,
    modules: i64,
    lessons: i64,
    tasks: i64,
) -> Result<(), sqlx::Error> {
    if modules == 0 && lessons == 0 && tasks == 0 {
        return Ok(());
    }

    sqlx::query(
        "UPDATE courses
         SET modul_count = GREATEST(modul_count + $2, 0),
             lesson_count = GREATEST(lesson_count + $3, 0),
             task_count = GREATEST(task_count + $4, 0)
         WHERE id = $1",
    )
    .bind(course_id)
    .bind(modules)
    .bind(lessons)
    .bind(tasks)
    .execute(conn)
    .await?;
    Ok(())
}

pub(crate) async fn bump_module(
    conn: &mut PgConnection,
    module_id: &str,
    lessons: i64,
    tasks: i64,
) -> Result<(), sqlx::Error> {
    if lessons == 0 && tasks == 0 {
        return Ok(());
    }

    sqlx::query(
        "UPDATE modules
         SET lesson_count = GREATEST(lesson_count + $2, 0),
             task_count = GREATEST(task_count + $3, 0)
         WHERE id = $1",
    )
    .bind(module_id)
    .bind(lessons)
    .bind(tasks)
    .execute(conn)
    .await?;
    Ok(())
}

pub(crate) async fn bump_lesson_videos(
    conn: &mut PgConnection,
    lesson_id: &str,
    videos: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE lessons SET video_count = GREATEST(video_count + $2, 0) WHERE id = $1")
        .bind(lesson_id)
        .bind(videos)
        .execute(conn)
        .await?;
    Ok(())
}

/// `(module_id, course_id)` owning the lesson. Both rows stay key-share locked
/// until commit, so re-parenting either one waits for this transaction.
pub(crate) async fn lesson_parents(
    conn: &mut PgConnection,
    lesson_id: &str,
) -> Result<Option<(String, String)>, sqlx::Error> {
    sqlx::query_as::<_, (String, String)>(
        "SELECT m.id, m.course_id
         FROM lessons l
         JOIN modules m ON m.id = l.module_id
         WHERE l.id = $1
         FOR KEY SHARE OF l, m",
    )
    .bind(lesson_id)
    .fetch_optional(conn)
    .await
}

/// Course owning the module, with the module row key-share locked until commit.
pub(crate) async fn module_course(
    conn: &mut PgConnection,
    module_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT course_id FROM modules WHERE id = $1 FOR KEY SHARE")
        .bind(module_id)
        .fetch_optional(conn)
        .await
}

pub(crate) async fn recount_course(
    pool: &sqlx::PgPool,
    course_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<Option<Course>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE lessons l
         SET video_count = (SELECT COUNT(*) FROM videos v WHERE v.lesson_id = l.id)
         WHERE l.module_id IN (SELECT id FROM modules WHERE course_id = $1)",
    )
    .bind(course_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE modules m
         SET lesson_count = (SELECT COUNT(*) FROM lessons l WHERE l.module_id = m.id),
             task_count = (
                SELECT COUNT(*) FROM tasks t
                JOIN lessons l ON l.id = t.lesson_id
                WHERE l.module_id = m.id
             )
         WHERE m.course_id = $1",
    )
    .bind(course_id)
    .execute(&mut *tx)
    .await?;

    let course = sqlx::query_as::<_, Course>(&format!(
        "UPDATE courses c
         SET modul_count = (SELECT COUNT(*) FROM modules m WHERE m.course_id = c.id),
             lesson_count = (
                SELECT COUNT(*) FROM lessons l
                JOIN modules m ON m.id = l.module_id
                WHERE m.course_id = c.id
             ),
             task_count = (
                SELECT COUNT(*) FROM tasks t
                JOIN lessons l ON l.id = t.lesson_id
                JOIN modules m ON m.id = l.module_id
                WHERE m.course_id = c.id
             ),
             updated_at = $2
         WHERE c.id = $1
         RETURNING {}",
        courses::COLUMNS
    ))
    .bind(course_id)
    .bind(now)
    .fetch_optional(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(course)
}

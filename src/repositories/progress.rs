use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use crate::db::models::{ProgressRecord, UserTask};
use crate::db::types::ProgressStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ProgressKind {
    #[serde(alias = "course")]
    Courses,
    #[serde(alias = "module")]
    Modules,
    #[serde(alias = "lesson")]
    Lessons,
}

impl ProgressKind {
    fn table(self) -> &'static str {
        match self {
            Self::Courses => "user_courses",
            Self::Modules => "user_modules",
            Self::Lessons => "user_lessons",
        }
    }

    pub(crate) fn entity_column(self) -> &'static str {
        match self {
            Self::Courses => "course_id",
            Self::Modules => "module_id",
            Self::Lessons => "lesson_id",
        }
    }

    fn columns(self) -> String {
        format!(
            "id, user_id, {} AS entity_id, status, created_at, updated_at",
            self.entity_column()
        )
    }
}

#[derive(Debug, Error)]
pub(crate) enum ProgressError {
    #[error("progress record not found")]
    NotFound,
    #[error("status cannot move from {from} back to {to}")]
    Backward { from: &'static str, to: &'static str },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub(crate) async fn create(
    pool: &PgPool,
    kind: ProgressKind,
    id: &str,
    user_id: &str,
    entity_id: &str,
    status: ProgressStatus,
    now: time::PrimitiveDateTime,
) -> Result<ProgressRecord, sqlx::Error> {
    sqlx::query_as::<_, ProgressRecord>(&format!(
        "INSERT INTO {table} (id, user_id, {entity}, status, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$5)
         RETURNING {columns}",
        table = kind.table(),
        entity = kind.entity_column(),
        columns = kind.columns(),
    ))
    .bind(id)
    .bind(user_id)
    .bind(entity_id)
    .bind(status)
    .bind(now)
    .fetch_one(pool)
    .await
}

#[cfg(test)]
pub(crate) async fn find(
    pool: &PgPool,
    kind: ProgressKind,
    id: &str,
) -> Result<Option<ProgressRecord>, sqlx::Error> {
    sqlx::query_as::<_, ProgressRecord>(&format!(
        "SELECT {} FROM {} WHERE id = $1",
        kind.columns(),
        kind.table()
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_for_user(
    pool: &PgPool,
    kind: ProgressKind,
    user_id: &str,
    entity_id: &str,
) -> Result<Option<ProgressRecord>, sqlx::Error> {
    sqlx::query_as::<_, ProgressRecord>(&format!(
        "SELECT {} FROM {} WHERE user_id = $1 AND {} = $2",
        kind.columns(),
        kind.table(),
        kind.entity_column()
    ))
    .bind(user_id)
    .bind(entity_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn exists_for_user(
    pool: &PgPool,
    kind: ProgressKind,
    user_id: &str,
    entity_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(&format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE user_id = $1 AND {} = $2)",
        kind.table(),
        kind.entity_column()
    ))
    .bind(user_id)
    .bind(entity_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_for_user(
    pool: &PgPool,
    kind: ProgressKind,
    user_id: &str,
) -> Result<Vec<ProgressRecord>, sqlx::Error> {
    sqlx::query_as::<_, ProgressRecord>(&format!(
        "SELECT {} FROM {} WHERE user_id = $1 ORDER BY created_at",
        kind.columns(),
        kind.table()
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_for_entities(
    pool: &PgPool,
    kind: ProgressKind,
    user_id: &str,
    entity_ids: &[String],
) -> Result<Vec<ProgressRecord>, sqlx::Error> {
    if entity_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, ProgressRecord>(&format!(
        "SELECT {} FROM {} WHERE user_id = $1 AND {} = ANY($2)",
        kind.columns(),
        kind.table(),
        kind.entity_column()
    ))
    .bind(user_id)
    .bind(entity_ids)
    .fetch_all(pool)
    .await
}

/// Moves the record forward. Rejects any step back without writing.
pub(crate) async fn advance(
    pool: &PgPool,
    kind: ProgressKind,
    id: &str,
    next: ProgressStatus,
    now: time::PrimitiveDateTime,
) -> Result<ProgressRecord, ProgressError> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_scalar::<_, ProgressStatus>(&format!(
        "SELECT status FROM {} WHERE id = $1 FOR UPDATE",
        kind.table()
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(ProgressError::NotFound)?;

    if !current.can_transition_to(next) {
        return Err(ProgressError::Backward { from: current.as_str(), to: next.as_str() });
    }

    let record = sqlx::query_as::<_, ProgressRecord>(&format!(
        "UPDATE {} SET status = $1, updated_at = $2 WHERE id = $3 RETURNING {}",
        kind.table(),
        kind.columns()
    ))
    .bind(next)
    .bind(now)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(record)
}

const TASK_COLUMNS: &str = "id, user_id, task_id, finished, created_at, updated_at";

pub(crate) async fn create_task(
    pool: &PgPool,
    id: &str,
    user_id: &str,
    task_id: &str,
    finished: bool,
    now: time::PrimitiveDateTime,
) -> Result<UserTask, sqlx::Error> {
    sqlx::query_as::<_, UserTask>(&format!(
        "INSERT INTO user_tasks (id, user_id, task_id, finished, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$5)
         RETURNING {TASK_COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(task_id)
    .bind(finished)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn set_task_finished(
    pool: &PgPool,
    id: &str,
    finished: bool,
    now: time::PrimitiveDateTime,
) -> Result<Option<UserTask>, sqlx::Error> {
    sqlx::query_as::<_, UserTask>(&format!(
        "UPDATE user_tasks SET finished = $1, updated_at = $2 WHERE id = $3 RETURNING {TASK_COLUMNS}"
    ))
    .bind(finished)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

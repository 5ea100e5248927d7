use sqlx::PgPool;

use crate::db::models::Video;
use crate::repositories::counters;

const COLUMNS: &str = "\
    id, lesson_id, title, description, media_code, file, is_youtube, media_url, \"order\", \
    created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Video>, sqlx::Error> {
    sqlx::query_as::<_, Video>(&format!("SELECT {COLUMNS} FROM videos WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(
    pool: &PgPool,
    lesson_id: Option<&str>,
) -> Result<Vec<Video>, sqlx::Error> {
    sqlx::query_as::<_, Video>(&format!(
        "SELECT {COLUMNS} FROM videos
         WHERE ($1::varchar IS NULL OR lesson_id = $1)
         ORDER BY lesson_id, \"order\", created_at"
    ))
    .bind(lesson_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateVideo<'a> {
    pub(crate) id: &'a str,
    pub(crate) lesson_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) media_code: &'a str,
    pub(crate) file: &'a str,
    pub(crate) is_youtube: bool,
    pub(crate) media_url: &'a str,
    pub(crate) order: i32,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateVideo<'_>) -> Result<Video, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let video = sqlx::query_as::<_, Video>(&format!(
        "INSERT INTO videos (
            id, lesson_id, title, description, media_code, file, is_youtube, media_url,
            \"order\", created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$10)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.lesson_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.media_code)
    .bind(params.file)
    .bind(params.is_youtube)
    .bind(params.media_url)
    .bind(params.order)
    .bind(params.created_at)
    .fetch_one(&mut *tx)
    .await?;

    counters::bump_lesson_videos(&mut tx, params.lesson_id, 1).await?;

    tx.commit().await?;
    Ok(video)
}

#[derive(Default)]
pub(crate) struct UpdateVideo {
    pub(crate) lesson_id: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) media_code: Option<String>,
    pub(crate) file: Option<String>,
    pub(crate) is_youtube: Option<bool>,
    pub(crate) media_url: Option<String>,
    pub(crate) order: Option<i32>,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateVideo,
    updated_at: time::PrimitiveDateTime,
) -> Result<Option<Video>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_scalar::<_, String>("SELECT lesson_id FROM videos WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(current_lesson) = current else {
        tx.rollback().await?;
        return Ok(None);
    };

    if let Some(new_lesson) = params.lesson_id.as_deref().filter(|l| *l != current_lesson) {
        counters::bump_lesson_videos(&mut tx, &current_lesson, -1).await?;
        counters::bump_lesson_videos(&mut tx, new_lesson, 1).await?;
    }

    let video = sqlx::query_as::<_, Video>(&format!(
        "UPDATE videos SET
            lesson_id = COALESCE($1, lesson_id),
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            media_code = COALESCE($4, media_code),
            file = COALESCE($5, file),
            is_youtube = COALESCE($6, is_youtube),
            media_url = COALESCE($7, media_url),
            \"order\" = COALESCE($8, \"order\"),
            updated_at = $9
         WHERE id = $10
         RETURNING {COLUMNS}"
    ))
    .bind(params.lesson_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.media_code)
    .bind(params.file)
    .bind(params.is_youtube)
    .bind(params.media_url)
    .bind(params.order)
    .bind(updated_at)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(video)
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let lesson_id = sqlx::query_scalar::<_, String>(
        "DELETE FROM videos WHERE id = $1 RETURNING lesson_id",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some(lesson_id) = lesson_id else {
        tx.rollback().await?;
        return Ok(false);
    };

    counters::bump_lesson_videos(&mut tx, &lesson_id, -1).await?;

    tx.commit().await?;
    Ok(true)
}

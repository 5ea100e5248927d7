use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::models::{DeletedUser, User};
use crate::db::types::UserType;
use crate::repositories::deleted_users;

pub(crate) const COLUMNS: &str = "\
    id, phone_number, username, first_name, last_name, hashed_password, user_type, \
    tg_id, balance, bot_options, has_registered_bot, not_read_message_count, \
    payme_balance, photo, is_active, created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn find_by_phone(
    pool: &PgPool,
    phone_number: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE phone_number = $1"))
        .bind(phone_number)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists_by_phone(pool: &PgPool, phone_number: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE phone_number = $1)")
        .bind(phone_number)
        .fetch_one(pool)
        .await
}

pub(crate) async fn exists_by_phone_or_tg_id(
    pool: &PgPool,
    phone_number: &str,
    tg_id: i64,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE phone_number = $1 OR tg_id = $2)",
    )
    .bind(phone_number)
    .bind(tg_id)
    .fetch_one(pool)
    .await
}

pub(crate) struct CreateUser<'a> {
    pub(crate) id: &'a str,
    pub(crate) phone_number: &'a str,
    pub(crate) username: &'a str,
    pub(crate) first_name: &'a str,
    pub(crate) last_name: &'a str,
    pub(crate) hashed_password: String,
    pub(crate) user_type: UserType,
    pub(crate) tg_id: Option<i64>,
    pub(crate) has_registered_bot: bool,
    pub(crate) is_active: bool,
    pub(crate) created_at: time::PrimitiveDateTime,
}

const INSERT_USER: &str = "INSERT INTO users (
        id, phone_number, username, first_name, last_name, hashed_password,
        user_type, tg_id, has_registered_bot, is_active, created_at, updated_at
    ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$11)";

pub(crate) async fn create(pool: &PgPool, params: CreateUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("{INSERT_USER} RETURNING {COLUMNS}"))
        .bind(params.id)
        .bind(params.phone_number)
        .bind(params.username)
        .bind(params.first_name)
        .bind(params.last_name)
        .bind(params.hashed_password)
        .bind(params.user_type)
        .bind(params.tg_id)
        .bind(params.has_registered_bot)
        .bind(params.is_active)
        .bind(params.created_at)
        .fetch_one(pool)
        .await
}

/// Inserts unless the phone number or Telegram id is already taken.
/// Returns `None` when a unique constraint swallowed the row.
pub(crate) async fn create_if_absent(
    pool: &PgPool,
    params: CreateUser<'_>,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("{INSERT_USER} ON CONFLICT DO NOTHING RETURNING {COLUMNS}"))
        .bind(params.id)
        .bind(params.phone_number)
        .bind(params.username)
        .bind(params.first_name)
        .bind(params.last_name)
        .bind(params.hashed_password)
        .bind(params.user_type)
        .bind(params.tg_id)
        .bind(params.has_registered_bot)
        .bind(params.is_active)
        .bind(params.created_at)
        .fetch_optional(pool)
        .await
}

#[derive(Default)]
pub(crate) struct UpdateUser {
    pub(crate) username: Option<String>,
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
    pub(crate) user_type: Option<UserType>,
    pub(crate) is_active: Option<bool>,
    pub(crate) hashed_password: Option<String>,
    pub(crate) photo: Option<String>,
    pub(crate) bot_options: Option<String>,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateUser,
    updated_at: time::PrimitiveDateTime,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET
            username = COALESCE($1, username),
            first_name = COALESCE($2, first_name),
            last_name = COALESCE($3, last_name),
            user_type = COALESCE($4, user_type),
            is_active = COALESCE($5, is_active),
            hashed_password = COALESCE($6, hashed_password),
            photo = COALESCE($7, photo),
            bot_options = COALESCE($8, bot_options),
            updated_at = $9
         WHERE id = $10
         RETURNING {COLUMNS}"
    ))
    .bind(params.username)
    .bind(params.first_name)
    .bind(params.last_name)
    .bind(params.user_type)
    .bind(params.is_active)
    .bind(params.hashed_password)
    .bind(params.photo)
    .bind(params.bot_options)
    .bind(updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

#[derive(Debug, Default, Clone)]
pub(crate) struct UserFilter {
    pub(crate) user_type: Option<UserType>,
    pub(crate) search: Option<String>,
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    builder.push(" WHERE TRUE");
    if let Some(user_type) = filter.user_type {
        builder.push(" AND user_type = ");
        builder.push_bind(user_type);
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        builder.push(" AND (phone_number ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR first_name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR last_name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR username ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &UserFilter,
    skip: i64,
    limit: i64,
) -> Result<Vec<User>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM users"));
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY created_at DESC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<User>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, filter: &UserFilter) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
    push_filter(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) async fn list_by_type(
    pool: &PgPool,
    user_type: UserType,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM users WHERE user_type = $1 AND is_active ORDER BY first_name, last_name"
    ))
    .bind(user_type)
    .fetch_all(pool)
    .await
}

/// Removes the account and leaves a tombstone with its phone number and username.
/// Both writes share one transaction; `None` means the user did not exist.
pub(crate) async fn delete_with_tombstone(
    pool: &PgPool,
    id: &str,
    now: time::PrimitiveDateTime,
) -> Result<Option<DeletedUser>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let removed = sqlx::query_as::<_, (String, String)>(
        "DELETE FROM users WHERE id = $1 RETURNING phone_number, username",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((phone_number, username)) = removed else {
        tx.rollback().await?;
        return Ok(None);
    };

    let username = Some(username).filter(|value| !value.is_empty());
    let tombstone = deleted_users::insert(
        &mut *tx,
        &Uuid::new_v4().to_string(),
        &phone_number,
        username.as_deref(),
        now,
    )
    .await?;

    tx.commit().await?;
    Ok(Some(tombstone))
}

use sqlx::PgPool;
use thiserror::Error;

use crate::db::models::Payment;

const COLUMNS: &str = "\
    id, user_id, reason, expend, amount, income, processed_date, created_at, updated_at";

#[derive(Debug, Error)]
pub(crate) enum LedgerError {
    #[error("user not found")]
    UserNotFound,
    #[error("balance {balance} is smaller than expense {amount}")]
    InsufficientBalance { balance: i64, amount: i64 },
    #[error("income {amount} would overflow balance {balance}")]
    BalanceOverflow { balance: i64, amount: i64 },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub(crate) struct RecordPayment<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) reason: &'a str,
    pub(crate) expend: &'a str,
    pub(crate) amount: i64,
    pub(crate) income: bool,
    pub(crate) processed_date: time::PrimitiveDateTime,
    pub(crate) created_at: time::PrimitiveDateTime,
}

/// Writes a ledger entry and applies it to `users.balance` in one transaction.
/// Returns the entry together with the resulting balance.
pub(crate) async fn record(
    pool: &PgPool,
    params: RecordPayment<'_>,
) -> Result<(Payment, i64), LedgerError> {
    let mut tx = pool.begin().await?;

    let balance = sqlx::query_scalar::<_, i64>("SELECT balance FROM users WHERE id = $1 FOR UPDATE")
        .bind(params.user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(LedgerError::UserNotFound)?;

    let next_balance = if params.income {
        balance
            .checked_add(params.amount)
            .ok_or(LedgerError::BalanceOverflow { balance, amount: params.amount })?
    } else if params.amount > balance {
        return Err(LedgerError::InsufficientBalance { balance, amount: params.amount });
    } else {
        balance - params.amount
    };

    sqlx::query("UPDATE users SET balance = $1, updated_at = $2 WHERE id = $3")
        .bind(next_balance)
        .bind(params.created_at)
        .bind(params.user_id)
        .execute(&mut *tx)
        .await?;

    let payment = sqlx::query_as::<_, Payment>(&format!(
        "INSERT INTO payments (
            id, user_id, reason, expend, amount, income, processed_date, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.reason)
    .bind(params.expend)
    .bind(params.amount)
    .bind(params.income)
    .bind(params.processed_date)
    .bind(params.created_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok((payment, next_balance))
}

pub(crate) async fn list(
    pool: &PgPool,
    user_id: Option<&str>,
    skip: i64,
    limit: i64,
) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>(&format!(
        "SELECT {COLUMNS} FROM payments
         WHERE ($1::varchar IS NULL OR user_id = $1)
         ORDER BY processed_date DESC
         OFFSET $2 LIMIT $3"
    ))
    .bind(user_id)
    .bind(skip.max(0))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count(pool: &PgPool, user_id: Option<&str>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE ($1::varchar IS NULL OR user_id = $1)")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

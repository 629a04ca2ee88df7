use chrono::NaiveDate;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;
use crate::models::Transaction;

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(
        "SELECT id, user_id, account_id, amount, category, description, transaction_date, created_at
         FROM transactions
         ORDER BY transaction_date, created_at"
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_for_user_since(
    pool: &PgPool,
    user_id: Uuid,
    since: NaiveDate,
) -> Result<Vec<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(
        "SELECT id, user_id, account_id, amount, category, description, transaction_date, created_at
         FROM transactions
         WHERE user_id = $1 AND transaction_date >= $2
         ORDER BY transaction_date DESC"
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(pool)
    .await
}

/// Returns false when a transaction with the same id already exists.
pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, tx: &Transaction) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO transactions (id, user_id, account_id, amount, category, description, transaction_date, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (id) DO NOTHING"
    )
    .bind(tx.id)
    .bind(tx.user_id)
    .bind(tx.account_id)
    .bind(&tx.amount)
    .bind(&tx.category)
    .bind(&tx.description)
    .bind(tx.transaction_date)
    .bind(tx.created_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

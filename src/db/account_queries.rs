use bigdecimal::BigDecimal;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;
use crate::models::Account;

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "SELECT id, user_id, name, account_type, balance, currency, is_active, created_at
         FROM accounts
         ORDER BY created_at"
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_active_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "SELECT id, user_id, name, account_type, balance, currency, is_active, created_at
         FROM accounts
         WHERE user_id = $1 AND is_active = TRUE
         ORDER BY created_at"
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_one(pool: &PgPool, id: Uuid) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "SELECT id, user_id, name, account_type, balance, currency, is_active, created_at
         FROM accounts
         WHERE id = $1"
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Returns false when an account with the same id already exists.
pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, account: &Account) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO accounts (id, user_id, name, account_type, balance, currency, is_active, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (id) DO NOTHING"
    )
    .bind(account.id)
    .bind(account.user_id)
    .bind(&account.name)
    .bind(&account.account_type)
    .bind(&account.balance)
    .bind(&account.currency)
    .bind(account.is_active)
    .bind(account.created_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_balance(
    pool: &PgPool,
    id: Uuid,
    balance: &BigDecimal,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "UPDATE accounts
         SET balance = $1
         WHERE id = $2
         RETURNING id, user_id, name, account_type, balance, currency, is_active, created_at"
    )
    .bind(balance)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts")
        .fetch_one(pool)
        .await
}

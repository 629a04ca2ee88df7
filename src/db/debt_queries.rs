use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;
use crate::models::Debt;

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<Debt>, sqlx::Error> {
    sqlx::query_as::<_, Debt>(
        "SELECT id, user_id, name, total_amount, remaining_balance, interest_rate, minimum_payment,
                is_paid_off, paid_off_at, is_active, created_at
         FROM debts
         ORDER BY created_at"
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_active_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Debt>, sqlx::Error> {
    sqlx::query_as::<_, Debt>(
        "SELECT id, user_id, name, total_amount, remaining_balance, interest_rate, minimum_payment,
                is_paid_off, paid_off_at, is_active, created_at
         FROM debts
         WHERE user_id = $1 AND is_active = TRUE
         ORDER BY created_at"
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_one(pool: &PgPool, id: Uuid) -> Result<Option<Debt>, sqlx::Error> {
    sqlx::query_as::<_, Debt>(
        "SELECT id, user_id, name, total_amount, remaining_balance, interest_rate, minimum_payment,
                is_paid_off, paid_off_at, is_active, created_at
         FROM debts
         WHERE id = $1"
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Returns false when a debt with the same id already exists.
pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, debt: &Debt) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO debts (id, user_id, name, total_amount, remaining_balance, interest_rate,
                            minimum_payment, is_paid_off, paid_off_at, is_active, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         ON CONFLICT (id) DO NOTHING"
    )
    .bind(debt.id)
    .bind(debt.user_id)
    .bind(&debt.name)
    .bind(&debt.total_amount)
    .bind(&debt.remaining_balance)
    .bind(&debt.interest_rate)
    .bind(&debt.minimum_payment)
    .bind(debt.is_paid_off)
    .bind(debt.paid_off_at)
    .bind(debt.is_active)
    .bind(debt.created_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Persist a debt that has already been normalized.
pub async fn save(pool: &PgPool, debt: &Debt) -> Result<Option<Debt>, sqlx::Error> {
    sqlx::query_as::<_, Debt>(
        "UPDATE debts
         SET remaining_balance = $1, interest_rate = $2, minimum_payment = $3,
             is_paid_off = $4, paid_off_at = $5, is_active = $6
         WHERE id = $7
         RETURNING id, user_id, name, total_amount, remaining_balance, interest_rate, minimum_payment,
                   is_paid_off, paid_off_at, is_active, created_at"
    )
    .bind(&debt.remaining_balance)
    .bind(&debt.interest_rate)
    .bind(&debt.minimum_payment)
    .bind(debt.is_paid_off)
    .bind(debt.paid_off_at)
    .bind(debt.is_active)
    .bind(debt.id)
    .fetch_optional(pool)
    .await
}

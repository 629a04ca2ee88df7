use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;
use crate::models::User;

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, email, name, created_at
         FROM users
         ORDER BY created_at"
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_one(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, email, name, created_at
         FROM users
         WHERE id = $1"
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Returns false when a user with the same id already exists.
pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, user: &User) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO users (id, email, name, created_at)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (id) DO NOTHING"
    )
    .bind(user.id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(user.created_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

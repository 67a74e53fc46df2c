//! User storage behind a trait; handlers never touch SQL directly.
//!
//! Production: `PgUserStore` over the shared Postgres pool.
//! `AppState` holds an `Arc<dyn UserStore>`.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::user::{NewUser, User};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user. A duplicate email is `AppError::Conflict`.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;

    /// Looks up a user by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// True when the backing datastore answers.
    async fn ping(&self) -> bool;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, password_hash
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
                format!("An account for {} already exists", user.email),
            )),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
pub use memory::MemoryUserStore;

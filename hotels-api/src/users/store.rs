//! User persistence.

use rocket_db_pools::sqlx::{self, PgPool};
use thiserror::Error;

use crate::models::User;

const UNIQUE_VIOLATION: &str = "23505";
const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash";

pub type UserStoreResult<T> = Result<T, UserStoreError>;

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("email already exists")]
    DuplicateEmail,
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for UserStoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                UserStoreError::DuplicateEmail
            }
            _ => UserStoreError::Storage(err.to_string()),
        }
    }
}

/// Fields written on insert and update. `password_hash` is already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: Option<String>,
}

impl From<User> for UserRecord {
    fn from(user: User) -> Self {
        Self {
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
        }
    }
}

#[rocket::async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &UserRecord) -> UserStoreResult<User>;

    async fn find_by_id(&self, id: i32) -> UserStoreResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> UserStoreResult<Option<User>>;

    async fn update(&self, id: i32, user: &UserRecord) -> UserStoreResult<Option<User>>;
}

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[rocket::async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: &UserRecord) -> UserStoreResult<User> {
        let sql = format!(
            "INSERT INTO users (first_name, last_name, email, password_hash) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: i32) -> UserStoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> UserStoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update(&self, id: i32, user: &UserRecord) -> UserStoreResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET first_name = $2, last_name = $3, email = $4, password_hash = $5, \
             updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_optional(&self.pool)
            .await?)
    }
}

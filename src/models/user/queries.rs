use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::errors::AppError;
use super::types::{NewUser, Role, User};

const SELECT_USER: &str =
    "SELECT id, username, email, role, password_hash, created_at FROM users";

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    username: String,
    email: String,
    role: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<Row> for User {
    type Error = AppError;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e: String| AppError::Db(sqlx::Error::Decode(e.into())))?;
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            role,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

/// Insert a user. A taken username yields `AppError::DuplicateUser`.
pub async fn create(pool: &PgPool, new_user: &NewUser) -> Result<User, AppError> {
    let sql = "INSERT INTO users (username, email, role, password_hash) \
               VALUES ($1, $2, $3, $4) \
               RETURNING id, username, email, role, password_hash, created_at";
    let result = sqlx::query_as::<_, Row>(sql)
        .bind(new_user.username.trim())
        .bind(new_user.email.trim())
        .bind(new_user.role.as_str())
        .bind(&new_user.password_hash)
        .fetch_one(pool)
        .await;

    match result {
        Ok(row) => row.try_into(),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(AppError::DuplicateUser(new_user.username.trim().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, AppError> {
    let row = sqlx::query_as::<_, Row>(&format!("{SELECT_USER} WHERE username = $1"))
        .bind(username.trim())
        .fetch_optional(pool)
        .await?;
    row.map(User::try_from).transpose()
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, AppError> {
    let row = sqlx::query_as::<_, Row>(&format!("{SELECT_USER} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(User::try_from).transpose()
}

/// Look up the owner of an API token.
pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<User>, AppError> {
    let row = sqlx::query_as::<_, Row>(
        "SELECT u.id, u.username, u.email, u.role, u.password_hash, u.created_at \
         FROM users u JOIN auth_tokens t ON t.user_id = u.id \
         WHERE t.key = $1",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;
    row.map(User::try_from).transpose()
}

/// Whether any account holds the given username.
pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool, AppError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
        .bind(username.trim())
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::auth::password;
use crate::errors::AppError;
use crate::models::user::{self, NewUser, Role};

pub async fn init_pool(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}

/// Create the bootstrap admin account if it does not exist yet.
/// Returns true when a new account was created.
pub async fn seed_admin(pool: &PgPool, username: &str, plain_password: &str) -> Result<bool, AppError> {
    if user::username_exists(pool, username).await? {
        log::info!("Admin account '{username}' already present, skipping seed");
        return Ok(false);
    }

    let password_hash = password::hash_password(plain_password).map_err(AppError::Hash)?;
    let admin = NewUser {
        username: username.to_string(),
        email: String::new(),
        role: Role::Admin,
        password_hash,
    };
    user::create(pool, &admin).await?;
    log::info!("Seeded admin account '{username}'");
    Ok(true)
}

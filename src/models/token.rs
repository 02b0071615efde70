use rand::Rng;
use sqlx::PgPool;

use crate::errors::AppError;

/// Generate a random 20-byte hex API token.
pub fn generate() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 20] = rng.random();
    hex::encode(bytes)
}

/// Return the user's token, creating one on first login.
/// Repeated logins hand back the same key until logout.
pub async fn get_or_create(pool: &PgPool, user_id: i64) -> Result<String, AppError> {
    let key = generate();
    sqlx::query(
        "INSERT INTO auth_tokens (key, user_id) VALUES ($1, $2) \
         ON CONFLICT (user_id) DO NOTHING",
    )
    .bind(&key)
    .bind(user_id)
    .execute(pool)
    .await?;

    let stored: String = sqlx::query_scalar("SELECT key FROM auth_tokens WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(stored)
}

/// Revoke the user's token. Missing tokens are not an error.
pub async fn delete_for_user(pool: &PgPool, user_id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_forty_hex_chars_and_unique() {
        let a = generate();
        let b = generate();
        assert_eq!(a.len(), 40);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}

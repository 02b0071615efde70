use actix_session::Session;
use actix_web::{HttpResponse, web};
use sqlx::PgPool;

use crate::auth::{password, validate};
use crate::auth::rate_limit::RateLimiter;
use crate::auth::session::{self as auth_session, CurrentUser};
use crate::config::Config;
use crate::errors::{self, AppError};
use crate::models::token;
use crate::models::user::{self, LoginRequest, LoginResponse, NewUser, RegisterRequest, Role, UserDisplay};

/// POST /api/users/register/
/// Creates an account. Returns 201 with the public user record.
pub async fn register(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let errors: Vec<String> = [
        validate::validate_username(&body.username),
        validate::validate_email(&body.email),
        validate::validate_password(&body.password),
    ]
    .into_iter()
    .flatten()
    .collect();
    errors::check(errors)?;

    if body.role == Role::Admin && !config.allow_admin_registration {
        return Err(AppError::PermissionDenied(
            "Admin accounts cannot be self-registered".to_string(),
        ));
    }

    let password_hash = password::hash_password(&body.password).map_err(AppError::Hash)?;
    let created = user::create(
        &pool,
        &NewUser {
            username: body.username.trim().to_string(),
            email: body.email.trim().to_string(),
            role: body.role,
            password_hash,
        },
    )
    .await?;

    log::info!("Registered user '{}' as {}", created.username, created.role);
    Ok(HttpResponse::Created().json(UserDisplay::from(created)))
}

/// POST /api/users/login/
/// Verifies credentials, starts a cookie session and returns the user's API token.
pub async fn login(
    pool: web::Data<PgPool>,
    limiter: web::Data<RateLimiter>,
    session: Session,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let LoginRequest { username, password: plain } = body.into_inner();
    let username = username.trim().to_string();

    if username.is_empty() || plain.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    if limiter.is_blocked(&username) {
        log::warn!("Login blocked for '{username}': too many failed attempts");
        return Err(AppError::TooManyAttempts);
    }

    let found = user::find_by_username(&pool, &username).await?;
    let verified = match &found {
        Some(u) => password::verify_password(&plain, &u.password_hash).map_err(AppError::Hash)?,
        None => {
            password::verify_against_dummy(&plain);
            false
        }
    };

    let account = match found {
        Some(u) if verified => u,
        _ => {
            limiter.record_failure(&username);
            log::warn!("Failed login attempt for '{username}'");
            return Err(AppError::InvalidCredentials);
        }
    };

    limiter.clear(&username);
    let key = token::get_or_create(&pool, account.id).await?;
    auth_session::start(&session, account.id)?;

    log::info!("User '{}' logged in", account.username);
    Ok(HttpResponse::Ok().json(LoginResponse {
        token: key,
        id: account.id,
        username: account.username,
        email: account.email,
        role: account.role,
    }))
}

/// POST /api/users/logout/
/// Revokes the API token and clears the session.
pub async fn logout(
    pool: web::Data<PgPool>,
    session: Session,
    current: CurrentUser,
) -> Result<HttpResponse, AppError> {
    token::delete_for_user(&pool, current.id).await?;
    session.purge();
    log::info!("User '{}' logged out", current.username);
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/users/me/
pub async fn me(current: CurrentUser) -> HttpResponse {
    HttpResponse::Ok().json(UserDisplay::from(current.0))
}

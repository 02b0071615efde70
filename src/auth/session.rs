use std::future::Future;
use std::ops::Deref;
use std::pin::Pin;

use actix_session::{Session, SessionExt};
use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::proposal::Proposal;
use crate::models::user::{self, Role, User};
use crate::models::workflow::Caller;

const SESSION_USER_ID: &str = "user_id";

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>(SESSION_USER_ID).unwrap_or(None)
}

/// Start a cookie session for `user_id`, replacing any previous session id.
pub fn start(session: &Session, user_id: i64) -> Result<(), AppError> {
    session.renew();
    session
        .insert(SESSION_USER_ID, user_id)
        .map_err(|e| AppError::Session(e.to_string()))
}

/// Extract the key from `Authorization: Token <key>` (or `Bearer <key>`).
fn token_from_header(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, key) = value.trim().split_once(' ')?;
    let key = key.trim();
    if (scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer")) && !key.is_empty() {
        Some(key.to_string())
    } else {
        None
    }
}

/// The authenticated caller of a request.
///
/// Resolved from an API token header first, then from the cookie session.
/// A request carrying an unknown token is rejected even if it also has a session.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Require a specific role; returns Err(AppError) if the caller has another.
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(format!(
                "This action requires the {role} role"
            )))
        }
    }

    /// Admins see every proposal, participants only their own.
    pub fn ensure_can_view(&self, proposal: &Proposal) -> Result<(), AppError> {
        if self.is_admin() || proposal.owner_id == self.id {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(
                "You do not have access to this proposal".to_string(),
            ))
        }
    }

    pub fn caller_for(&self, proposal: &Proposal) -> Caller {
        Caller {
            role: self.role,
            is_owner: proposal.owner_id == self.id,
        }
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let pool = req.app_data::<web::Data<PgPool>>().cloned();
        let token = token_from_header(req);
        let session_user = get_user_id(&req.get_session());

        Box::pin(async move {
            let pool = pool.ok_or_else(|| AppError::Session("Database pool not configured".to_string()))?;

            let found = match (token, session_user) {
                (Some(token), _) => user::find_by_token(&pool, &token).await?,
                (None, Some(user_id)) => user::find_by_id(&pool, user_id).await?,
                (None, None) => None,
            };

            found.map(CurrentUser).ok_or(AppError::Unauthenticated)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use chrono::Utc;

    fn current(id: i64, role: Role) -> CurrentUser {
        CurrentUser(User {
            id,
            username: format!("user{id}"),
            email: String::new(),
            role,
            password_hash: String::new(),
            created_at: Utc::now(),
        })
    }

    #[test]
    fn token_header_schemes() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Token abc123"))
            .to_http_request();
        assert_eq!(token_from_header(&req).as_deref(), Some("abc123"));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "bearer abc123"))
            .to_http_request();
        assert_eq!(token_from_header(&req).as_deref(), Some("abc123"));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert_eq!(token_from_header(&req), None);

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Token "))
            .to_http_request();
        assert_eq!(token_from_header(&req), None);
    }

    #[test]
    fn role_checks() {
        let admin = current(1, Role::Admin);
        let participant = current(2, Role::Participant);
        assert!(admin.require_role(Role::Admin).is_ok());
        assert!(matches!(
            participant.require_role(Role::Admin),
            Err(AppError::PermissionDenied(_))
        ));
    }
}

mod crud;
mod files;
mod workflow;

pub use crud::*;
pub use files::*;
pub use workflow::*;

use sqlx::PgPool;

use crate::auth::session::CurrentUser;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::proposal::{self, Changes, Proposal};
use crate::models::workflow::{self as engine, Action};

/// Load a proposal, let the workflow engine decide the action and persist the result.
async fn advance(
    pool: &PgPool,
    config: &Config,
    current: &CurrentUser,
    proposal_id: i64,
    action: Action,
    changes: Changes<'_>,
) -> Result<Proposal, AppError> {
    let existing = proposal::find_by_id(pool, proposal_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let decision = engine::decide(
        existing.snapshot(),
        current.caller_for(&existing),
        &action,
        &config.limits(),
    )?;
    proposal::apply(pool, proposal_id, &decision, &changes, current.id).await
}

use actix_web::{HttpResponse, web};
use sqlx::PgPool;

use crate::auth::session::CurrentUser;
use crate::auth::validate;
use crate::config::Config;
use crate::errors::{self, AppError};
use crate::models::proposal::{self, Changes, ProposalDetail, ProposalListQuery, ProposalRequest};
use crate::models::timeline;
use crate::models::user::Role;
use crate::models::workflow::{Action, ProposalStatus};
use crate::storage::FileStore;

const TITLE_MAX: usize = 255;
const DESCRIPTION_MAX: usize = 10_000;

fn validate_request(body: &ProposalRequest) -> Result<(), AppError> {
    let errors: Vec<String> = [
        validate::validate_required(&body.title, "Title", TITLE_MAX),
        validate::validate_max_len(&body.description, "Description", DESCRIPTION_MAX),
    ]
    .into_iter()
    .flatten()
    .collect();
    errors::check(errors)
}

/// GET /api/proposals/
/// Admins see every proposal, participants only their own.
/// Query params: status (filter), page (default 1), per_page (default 25, max 100).
pub async fn list(
    pool: web::Data<PgPool>,
    current: CurrentUser,
    query: web::Query<ProposalListQuery>,
) -> Result<HttpResponse, AppError> {
    let status = match query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Some(
            s.parse::<ProposalStatus>()
                .map_err(AppError::Validation)?,
        ),
        None => None,
    };
    let owner = if current.is_admin() { None } else { Some(current.id) };

    let page = proposal::find_page(
        &pool,
        owner,
        status,
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(25),
    )
    .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// POST /api/proposals/
/// Participants submit a new proposal; it starts in `Submitted`.
pub async fn create(
    pool: web::Data<PgPool>,
    current: CurrentUser,
    body: web::Json<ProposalRequest>,
) -> Result<HttpResponse, AppError> {
    current.require_role(Role::Participant)?;
    validate_request(&body)?;

    let created = proposal::create(
        &pool,
        current.id,
        &current.username,
        &body.title,
        &body.description,
    )
    .await?;

    log::info!("User '{}' submitted proposal {}", current.username, created.id);
    Ok(HttpResponse::Created().json(created))
}

/// GET /api/proposals/{id}/
/// The proposal with its timeline.
pub async fn read(
    pool: web::Data<PgPool>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let found = proposal::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;
    current.ensure_can_view(&found)?;

    let timeline = timeline::find_for_proposal(&pool, id).await?;
    Ok(HttpResponse::Ok().json(ProposalDetail { proposal: found, timeline }))
}

/// PUT /api/proposals/{id}/
/// The owner edits title and description while the proposal awaits a stage decision.
pub async fn update(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    current: CurrentUser,
    path: web::Path<i64>,
    body: web::Json<ProposalRequest>,
) -> Result<HttpResponse, AppError> {
    validate_request(&body)?;

    let changes = Changes {
        title: Some(body.title.as_str()),
        description: Some(body.description.as_str()),
        ..Changes::default()
    };
    let updated = super::advance(&pool, &config, &current, path.into_inner(), Action::EditContent, changes).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /api/proposals/{id}/
/// Admin only. Removes the proposal, its timeline and its stored files.
pub async fn delete(
    pool: web::Data<PgPool>,
    files: web::Data<FileStore>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    current.require_role(Role::Admin)?;
    let id = path.into_inner();

    let attachments = proposal::delete(&pool, id).await?.ok_or(AppError::NotFound)?;
    for reference in &attachments {
        files.remove(reference).await;
    }

    log::info!("Admin '{}' deleted proposal {id}", current.username);
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/proposals/{id}/timeline/
pub async fn timeline(
    pool: web::Data<PgPool>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let found = proposal::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;
    current.ensure_can_view(&found)?;

    Ok(HttpResponse::Ok().json(timeline::find_for_proposal(&pool, id).await?))
}

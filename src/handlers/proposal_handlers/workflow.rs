use actix_web::{HttpResponse, web};
use sqlx::PgPool;

use crate::auth::session::CurrentUser;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::proposal::{
    Changes, CommitteeRequest, EvaluationRequest, FormatCheckRequest, PlagiarismCheckRequest,
    RectorRequest, SeminarRequest,
};
use crate::models::workflow::Action;

use super::advance;

async fn respond(
    pool: &PgPool,
    config: &Config,
    current: &CurrentUser,
    proposal_id: i64,
    action: Action,
) -> Result<HttpResponse, AppError> {
    let updated = advance(pool, config, current, proposal_id, action, Changes::default()).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// POST /api/proposals/{id}/format-check/
pub async fn format_check(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    current: CurrentUser,
    path: web::Path<i64>,
    body: web::Json<FormatCheckRequest>,
) -> Result<HttpResponse, AppError> {
    let FormatCheckRequest { accepted, reason } = body.into_inner();
    respond(&pool, &config, &current, path.into_inner(), Action::FormatCheck { accepted, reason }).await
}

/// POST /api/proposals/{id}/plagiarism-check/
/// Above 20% the proposal is rejected.
pub async fn plagiarism_check(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    current: CurrentUser,
    path: web::Path<i64>,
    body: web::Json<PlagiarismCheckRequest>,
) -> Result<HttpResponse, AppError> {
    let action = Action::PlagiarismCheck { percent: body.percent };
    respond(&pool, &config, &current, path.into_inner(), action).await
}

/// POST /api/proposals/{id}/evaluation/
/// Two integer marks; a total below 65 rejects.
pub async fn evaluation(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    current: CurrentUser,
    path: web::Path<i64>,
    body: web::Json<EvaluationRequest>,
) -> Result<HttpResponse, AppError> {
    let action = Action::Evaluate { mark1: body.mark1, mark2: body.mark2 };
    respond(&pool, &config, &current, path.into_inner(), action).await
}

/// POST /api/proposals/{id}/seminar/
pub async fn seminar(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    current: CurrentUser,
    path: web::Path<i64>,
    body: web::Json<SeminarRequest>,
) -> Result<HttpResponse, AppError> {
    let action = Action::SeminarDecision { attended: body.attendance, passed: body.result };
    respond(&pool, &config, &current, path.into_inner(), action).await
}

/// POST /api/proposals/{id}/committee/
/// Approval requires the owner's budget document.
pub async fn committee(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    current: CurrentUser,
    path: web::Path<i64>,
    body: web::Json<CommitteeRequest>,
) -> Result<HttpResponse, AppError> {
    let action = Action::CommitteeDecision { approved: body.approved };
    respond(&pool, &config, &current, path.into_inner(), action).await
}

/// POST /api/proposals/{id}/rector/
pub async fn rector(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    current: CurrentUser,
    path: web::Path<i64>,
    body: web::Json<RectorRequest>,
) -> Result<HttpResponse, AppError> {
    let RectorRequest { accepted, reason } = body.into_inner();
    respond(&pool, &config, &current, path.into_inner(), Action::RectorDecision { accepted, reason }).await
}

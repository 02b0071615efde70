pub mod account_handlers;
pub mod proposal_handlers;

use actix_web::{
    HttpResponse, ResponseError,
    dev::ServiceResponse,
    http::{StatusCode, header},
    middleware::{self, ErrorHandlerResponse, ErrorHandlers},
    web,
};

use crate::auth::middleware::require_json_content_type;
use crate::errors::AppError;

async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound)
}

/// Bodies over the `PayloadConfig` limit are refused by actix before a
/// handler runs; answer them with the usual JSON error body.
fn payload_too_large<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let (req, _) = res.into_parts();
    let body = AppError::Validation("Request body exceeds the upload size limit".to_string()).error_response();
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, body).map_into_right_body(),
    ))
}

/// Configure the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(web::PathConfig::default().error_handler(|_err, _req| AppError::NotFound.into()));

    cfg.service(
        web::scope("/api")
            .wrap(ErrorHandlers::new().handler(StatusCode::PAYLOAD_TOO_LARGE, payload_too_large))
            .wrap(middleware::from_fn(require_json_content_type))
            .wrap(
                middleware::DefaultHeaders::new()
                    .add((header::CACHE_CONTROL, "no-cache, no-store, must-revalidate, max-age=0"))
                    .add((header::PRAGMA, "no-cache"))
                    .add((header::EXPIRES, "0")),
            )
            // Accounts
            .route("/users/register/", web::post().to(account_handlers::register))
            .route("/users/login/", web::post().to(account_handlers::login))
            .route("/users/logout/", web::post().to(account_handlers::logout))
            .route("/users/me/", web::get().to(account_handlers::me))
            // Proposals
            .route("/proposals/", web::get().to(proposal_handlers::list))
            .route("/proposals/", web::post().to(proposal_handlers::create))
            .route("/proposals/{id}/", web::get().to(proposal_handlers::read))
            .route("/proposals/{id}/", web::put().to(proposal_handlers::update))
            .route("/proposals/{id}/", web::delete().to(proposal_handlers::delete))
            .route("/proposals/{id}/timeline/", web::get().to(proposal_handlers::timeline))
            // Stage decisions
            .route("/proposals/{id}/format-check/", web::post().to(proposal_handlers::format_check))
            .route("/proposals/{id}/plagiarism-check/", web::post().to(proposal_handlers::plagiarism_check))
            .route("/proposals/{id}/evaluation/", web::post().to(proposal_handlers::evaluation))
            .route("/proposals/{id}/seminar/", web::post().to(proposal_handlers::seminar))
            .route("/proposals/{id}/committee/", web::post().to(proposal_handlers::committee))
            .route("/proposals/{id}/rector/", web::post().to(proposal_handlers::rector))
            // Attachments
            .route("/proposals/{id}/files/{kind}/", web::put().to(proposal_handlers::upload))
            .route("/proposals/{id}/files/{kind}/", web::get().to(proposal_handlers::download))
            .default_service(web::to(not_found)),
    );
}

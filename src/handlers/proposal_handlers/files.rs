use actix_web::{HttpResponse, http::header, web};
use sqlx::PgPool;

use crate::auth::session::CurrentUser;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::proposal::{self, Attachment, Changes, FileKind, UploadQuery};
use crate::storage::{self, FileStore};

/// PUT /api/proposals/{id}/files/{kind}/?filename=...
/// Body is the raw file. `kind` is one of document, revised, budget.
///
/// The workflow check runs before anything is written to disk. The row update
/// only lands if the slot still holds the file seen at load time; a request
/// that loses that race removes its own file and leaves the winner's alone.
pub async fn upload(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    files: web::Data<FileStore>,
    current: CurrentUser,
    path: web::Path<(i64, String)>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let (id, segment) = path.into_inner();
    let kind = FileKind::from_segment(&segment).ok_or(AppError::NotFound)?;

    let existing = proposal::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;
    crate::models::workflow::decide(
        existing.snapshot(),
        current.caller_for(&existing),
        &kind.upload_action(),
        &config.limits(),
    )?;

    let reference = files.save(kind, &query.filename, &body).await?;
    let previous = existing.attachment(kind);
    let changes = Changes {
        attachment: Some(Attachment {
            kind,
            reference: reference.as_str(),
            replaces: previous,
        }),
        ..Changes::default()
    };

    match super::advance(&pool, &config, &current, id, kind.upload_action(), changes).await {
        Ok(updated) => {
            if let Some(previous) = previous {
                files.remove(previous).await;
            }
            Ok(HttpResponse::Ok().json(updated))
        }
        Err(e) => {
            files.remove(&reference).await;
            Err(e)
        }
    }
}

/// GET /api/proposals/{id}/files/{kind}/
pub async fn download(
    pool: web::Data<PgPool>,
    files: web::Data<FileStore>,
    current: CurrentUser,
    path: web::Path<(i64, String)>,
) -> Result<HttpResponse, AppError> {
    let (id, segment) = path.into_inner();
    let kind = FileKind::from_segment(&segment).ok_or(AppError::NotFound)?;

    let found = proposal::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;
    current.ensure_can_view(&found)?;

    let reference = found.attachment(kind).ok_or(AppError::NotFound)?;
    let bytes = files.open(reference).await?;

    Ok(HttpResponse::Ok()
        .content_type("application/octet-stream")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", storage::display_name(reference)),
        ))
        .body(bytes))
}

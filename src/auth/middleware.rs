use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, header},
    middleware::Next,
};

use crate::errors::ApiErrorResponse;

/// CSRF guard for the JSON API.
///
/// POST and PUT requests must declare `Content-Type: application/json`;
/// a cross-site HTML form cannot send that with the session cookie attached.
/// File uploads under `/files/` carry raw bytes and are exempt.
pub async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let guarded = (req.method() == Method::POST || req.method() == Method::PUT)
        && !req.path().contains("/files/");

    if guarded {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let response = HttpResponse::BadRequest().json(ApiErrorResponse {
                error: "ValidationError",
                message: "Content-Type must be application/json".to_string(),
            });
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

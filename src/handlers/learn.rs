use crate::error::AppError;
use crate::middlewares::current_user_id;
use crate::models::{ApiResponse, LearnCheckResponse};
use crate::services::AccessService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;

#[utoipa::path(
    post,
    path = "/learn/check",
    tag = "learn",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Whether a new learning session may start now", body = LearnCheckResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Lookup failed")
    )
)]
pub async fn check_can_start(
    access_service: web::Data<AccessService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let Some(user_id) = current_user_id(&req) else {
        return Ok(AppError::AuthError("Missing access token".to_string()).error_response());
    };

    match access_service.load_access_summary(user_id, Utc::now()).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            LearnCheckResponse::from(&summary),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn learn_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/learn").route("/check", web::post().to(check_can_start)));
}

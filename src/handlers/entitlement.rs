use crate::error::AppError;
use crate::middlewares::current_user_id;
use crate::models::ApiResponse;
use crate::services::AccessService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;

#[utoipa::path(
    get,
    path = "/entitlements/me",
    tag = "access",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current access summary", body = crate::access::AccessSummary),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Lookup failed")
    )
)]
pub async fn get_my_entitlement(
    access_service: web::Data<AccessService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let Some(user_id) = current_user_id(&req) else {
        return Ok(AppError::AuthError("Missing access token".to_string()).error_response());
    };

    match access_service.load_access_summary(user_id, Utc::now()).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiResponse::success(summary))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn entitlement_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/entitlements").route("/me", web::get().to(get_my_entitlement)));
}

use crate::access::compose_dashboard;
use crate::error::AppError;
use crate::middlewares::current_user_id;
use crate::models::ApiResponse;
use crate::services::{AccessService, DashboardService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;

#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard summary; each section falls back to its defaults on failure", body = crate::access::DashboardPayload),
        (status = 401, description = "Unauthorized, body still carries the fallback dashboard", body = crate::access::DashboardPayload)
    )
)]
pub async fn get_dashboard(
    access_service: web::Data<AccessService>,
    dashboard_service: web::Data<DashboardService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let Some(user_id) = current_user_id(&req) else {
        return Ok(AppError::AccessAuthError("Missing access token".to_string()).error_response());
    };

    let now = Utc::now();
    let (access, facts) = tokio::join!(
        access_service.load_access_summary(user_id, now),
        dashboard_service.load_facts(user_id, now),
    );

    let payload = compose_dashboard(facts, access);

    Ok(HttpResponse::Ok().json(ApiResponse::success(payload)))
}

pub fn dashboard_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/dashboard", web::get().to(get_dashboard));
}

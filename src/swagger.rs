use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::access::{
    AccessNotices, AccessSection, AccessStatus, AccessSummary, Badge, BadgeVariant,
    DashboardPayload,
};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::dashboard::get_dashboard,
        handlers::entitlement::get_my_entitlement,
        handlers::learn::check_can_start,
    ),
    components(
        schemas(
            AccessStatus,
            AccessSummary,
            AccessSection,
            AccessNotices,
            Badge,
            BadgeVariant,
            DashboardPayload,
            DashboardFacts,
            DashboardGates,
            CalendarMonth,
            PriorityConcept,
            PriorityReason,
            Trend,
            LevelMeta,
            LevelEntry,
            LevelStats,
            LevelUpPolicy,
            Difficulty,
            LearnCheckResponse,
            HealthResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness check"),
        (name = "dashboard", description = "Learner dashboard API"),
        (name = "access", description = "Entitlement and quota API"),
        (name = "learn", description = "Learning session gate API"),
    ),
    info(
        title = "Learn Access API",
        version = "1.0.0",
        description = "Entitlement resolution and dashboard REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

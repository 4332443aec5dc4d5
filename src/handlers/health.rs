use actix_web::HttpResponse;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status_code: u16,
    pub message: String,
}

/// GET /api/healthcheck
#[utoipa::path(
    get,
    path = "/api/healthcheck",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn healthcheck() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status_code: 200,
        message: "Server is running".to_string(),
    })
}

/// GET /
pub async fn welcome() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Welcome to EcoFinds API")
}

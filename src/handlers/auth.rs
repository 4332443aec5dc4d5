use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::extractors::AuthenticatedUser;
use crate::domain::user::{ProfileChanges, Registration, User};
use crate::errors::AppError;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

/// Missing fields deserialize as empty strings and are reported by validation.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub full_name: Option<String>,
}

/// Public view of a user; the password hash never leaves the service.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email,
            username: user.username,
            full_name: user.full_name,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserMessageResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/v1/auth/register
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserMessageResponse),
        (status = 400, description = "Missing or malformed fields"),
        (status = 409, description = "Email or username already taken"),
    ),
    tag = "auth"
)]
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let registration = Registration {
        email: body.email,
        username: body.username,
        password: body.password,
        full_name: body.full_name,
    };

    let user = web::block(move || state.auth.register(registration)).await??;

    Ok(HttpResponse::Created().json(UserMessageResponse {
        message: "User registered".to_string(),
        user: user.into(),
    }))
}

/// POST /api/v1/auth/login
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let session = web::block(move || state.auth.login(&body.email, &body.password)).await??;

    Ok(HttpResponse::Ok().json(LoginResponse {
        message: "Login successful".to_string(),
        token: session.token,
        user: session.user.into(),
    }))
}

/// GET /api/v1/auth/me
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserEnvelope),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn get_profile(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(UserEnvelope {
        user: user.0.into(),
    })
}

/// PUT /api/v1/auth/me
#[utoipa::path(
    put,
    path = "/api/v1/auth/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserMessageResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 409, description = "Username already taken"),
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn update_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let changes = ProfileChanges {
        username: body.username,
        full_name: body.full_name,
    };
    let user_id = user.id();

    let updated = web::block(move || state.auth.update_profile(user_id, changes)).await??;

    Ok(HttpResponse::Ok().json(UserMessageResponse {
        message: "Profile updated".to_string(),
        user: updated.into(),
    }))
}

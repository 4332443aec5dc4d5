use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use uuid::Uuid;

use crate::domain::user::User;
use crate::errors::AppError;
use crate::state::AppState;

/// The user behind a valid `Authorization: Bearer <token>` header.
///
/// Extracting it runs the token check and the user lookup; any failure
/// rejects the request with 401 before the handler runs.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }
}

fn bearer_token(req: &HttpRequest) -> Result<String, AppError> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Unauthorized("No token provided".into()))
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let token = token?;
            let state =
                state.ok_or_else(|| AppError::Internal("AppState is not registered".into()))?;
            let user = web::block(move || state.auth.authenticate(&token))
                .await?
                .map_err(|e| {
                    log::warn!("rejected bearer token: {e}");
                    AppError::from(e)
                })?;
            Ok(AuthenticatedUser(user))
        })
    }
}

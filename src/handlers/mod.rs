pub mod auth;
pub mod extractors;
pub mod health;
pub mod products;
pub mod purchases;

use actix_web::{error, web, HttpRequest};

use crate::errors::AppError;

/// Request bodies above this size are rejected.
pub const JSON_LIMIT: usize = 32 * 1024;

// ── Extractor configuration ──────────────────────────────────────────────────
//
// Malformed bodies, query strings and path segments get the same `{message}`
// envelope as every other failure.

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err: error::JsonPayloadError, _: &HttpRequest| {
            AppError::InvalidArgument(format!("Invalid JSON body: {err}")).into()
        })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: error::QueryPayloadError, _: &HttpRequest| {
        AppError::InvalidArgument(format!("Invalid query string: {err}")).into()
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err: error::PathError, _: &HttpRequest| {
        AppError::InvalidArgument(format!("Invalid path parameter: {err}")).into()
    })
}

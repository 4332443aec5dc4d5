pub mod auth_service;
pub mod product_service;
pub mod purchase_service;
pub mod tokens;

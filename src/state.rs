use std::sync::Arc;

use chrono::Duration;

use crate::application::auth_service::AuthService;
use crate::application::product_service::ProductService;
use crate::application::purchase_service::PurchaseService;
use crate::application::tokens::TokenIssuer;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::domain::ports::{ProductRepository, PurchaseRepository, UserRepository};
use crate::infrastructure::memory::InMemoryStore;
use crate::infrastructure::product_repo::DieselProductRepository;
use crate::infrastructure::purchase_repo::DieselPurchaseRepository;
use crate::infrastructure::user_repo::DieselUserRepository;

/// Services shared by every worker; cloned cheaply into `web::block` closures
/// through `web::Data`.
pub struct AppState {
    pub auth: AuthService,
    pub products: ProductService,
    pub purchases: PurchaseService,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        products: Arc<dyn ProductRepository>,
        purchases: Arc<dyn PurchaseRepository>,
        tokens: TokenIssuer,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            auth: AuthService::new(users, tokens, bcrypt_cost),
            products: ProductService::new(products.clone()),
            purchases: PurchaseService::new(purchases, products),
        }
    }

    pub fn postgres(pool: DbPool, tokens: TokenIssuer, bcrypt_cost: u32) -> Self {
        Self::new(
            Arc::new(DieselUserRepository::new(pool.clone())),
            Arc::new(DieselProductRepository::new(pool.clone())),
            Arc::new(DieselPurchaseRepository::new(pool)),
            tokens,
            bcrypt_cost,
        )
    }

    pub fn in_memory(tokens: TokenIssuer, bcrypt_cost: u32) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::new(store.clone(), store.clone(), store, tokens, bcrypt_cost)
    }

    pub fn token_issuer(config: &AppConfig) -> TokenIssuer {
        TokenIssuer::new(
            config.jwt_secret.as_bytes(),
            Duration::hours(config.token_ttl_hours),
        )
    }
}

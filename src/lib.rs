pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;
pub mod seed;
pub mod state;

use std::error::Error;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

pub use config::AppConfig;
pub use db::{create_pool, DbPool};
pub use state::AppState;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    log::info!("applied {} pending migration(s)", applied.len());
    Ok(())
}

#[derive(OpenApi)]
#[openapi(
    info(title = "EcoFinds API", description = "Second-hand marketplace"),
    paths(
        handlers::health::healthcheck,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_profile,
        handlers::auth::update_profile,
        handlers::products::list_products,
        handlers::products::create_product,
        handlers::products::get_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::purchases::add_to_cart,
        handlers::purchases::view_cart,
        handlers::purchases::checkout,
        handlers::purchases::list_purchases,
    ),
    components(schemas(
        handlers::health::HealthResponse,
        handlers::auth::RegisterRequest,
        handlers::auth::LoginRequest,
        handlers::auth::UpdateProfileRequest,
        handlers::auth::UserResponse,
        handlers::auth::UserEnvelope,
        handlers::auth::UserMessageResponse,
        handlers::auth::LoginResponse,
        handlers::products::CreateProductRequest,
        handlers::products::UpdateProductRequest,
        handlers::products::OwnerResponse,
        handlers::products::ProductResponse,
        handlers::products::ProductEnvelope,
        handlers::products::ProductMessageResponse,
        handlers::products::MessageResponse,
        handlers::products::ListProductsResponse,
        handlers::purchases::AddToCartRequest,
        handlers::purchases::LineItemResponse,
        handlers::purchases::PurchaseResponse,
        handlers::purchases::CartEnvelope,
        handlers::purchases::CartMessageResponse,
        handlers::purchases::CheckoutResponse,
        handlers::purchases::PurchaseListResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth"),
        (name = "products"),
        (name = "purchases"),
        (name = "health"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Registers extractor configs, every API route and the Swagger UI.
///
/// `AppState` must be added to the app separately as `web::Data`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    use handlers::{auth, health, products, purchases};

    cfg.app_data(handlers::json_config())
        .app_data(handlers::query_config())
        .app_data(handlers::path_config())
        .route("/", web::get().to(health::welcome))
        .route("/api/healthcheck", web::get().to(health::healthcheck))
        .service(
            web::scope("/api/v1/auth")
                .route("/register", web::post().to(auth::register))
                .route("/login", web::post().to(auth::login))
                .route("/me", web::get().to(auth::get_profile))
                .route("/me", web::put().to(auth::update_profile)),
        )
        .service(
            web::scope("/api/v1/products")
                .route("", web::get().to(products::list_products))
                .route("", web::post().to(products::create_product))
                .route("/{id}", web::get().to(products::get_product))
                .route("/{id}", web::put().to(products::update_product))
                .route("/{id}", web::delete().to(products::delete_product)),
        )
        .service(
            web::scope("/api/v1/purchases")
                .route("", web::get().to(purchases::list_purchases))
                .route("/cart", web::get().to(purchases::view_cart))
                .route("/cart/add", web::post().to(purchases::add_to_cart))
                .route("/cart/checkout", web::post().to(purchases::checkout)),
        )
        .service(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: web::Data<AppState>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind((host.to_string(), port))?
    .run())
}

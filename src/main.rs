use std::error::Error;

use actix_web::web;
use dotenvy::dotenv;
use ecofinds::{build_server, create_pool, run_migrations, AppConfig, AppState};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env()?;
    let tokens = AppState::token_issuer(&config);

    let state = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = create_pool(database_url)?;
            run_migrations(&pool)?;
            AppState::postgres(pool, tokens, config.bcrypt_cost)
        }
        None => {
            log::warn!("DATABASE_URL is not set; using the in-memory store, data will not persist");
            AppState::in_memory(tokens, config.bcrypt_cost)
        }
    };

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(web::Data::new(state), &config.host, config.port)?.await?;
    Ok(())
}

//! Loads the demo seller and sample products into the configured database.
//!
//!   DATABASE_URL=postgres://... cargo run --bin seed

use std::env;
use std::error::Error;

use dotenvy::dotenv;
use ecofinds::config::ConfigError;
use ecofinds::seed::{seed_catalog, DEFAULT_SEED_PASSWORD, SEED_EMAIL};
use ecofinds::{create_pool, run_migrations, AppConfig, AppState};

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env()?;
    let database_url = config
        .database_url
        .as_deref()
        .ok_or(ConfigError::Missing("DATABASE_URL"))?;
    let password = env::var("SEED_PASSWORD").unwrap_or_else(|_| DEFAULT_SEED_PASSWORD.to_string());

    let pool = create_pool(database_url)?;
    run_migrations(&pool)?;
    let state = AppState::postgres(pool, AppState::token_issuer(&config), config.bcrypt_cost);

    let report = seed_catalog(&state, &password)?;
    log::info!(
        "seeded {} product(s), {} already present; seller login is {SEED_EMAIL}",
        report.created,
        report.skipped
    );
    Ok(())
}

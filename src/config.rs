//! Runtime configuration read from the environment (and `.env`, via dotenvy).

use std::env;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 8;
pub const DEFAULT_BCRYPT_COST: u32 = 10;
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let bcrypt_cost = parse_or("BCRYPT_COST", get("BCRYPT_COST"), DEFAULT_BCRYPT_COST)?;
        if !BCRYPT_COST_RANGE.contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                name: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }
        let token_ttl_hours =
            parse_or("JWT_TTL_HOURS", get("JWT_TTL_HOURS"), DEFAULT_TOKEN_TTL_HOURS)?;
        if token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                name: "JWT_TTL_HOURS",
                value: token_ttl_hours.to_string(),
            });
        }

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or("PORT", get("PORT"), 8080)?,
            database_url: get("DATABASE_URL"),
            jwt_secret,
            token_ttl_hours,
            bcrypt_cost,
        })
    }
}

fn parse_or<T: FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let cfg = config(&[("JWT_SECRET", "s")]).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.token_ttl_hours, DEFAULT_TOKEN_TTL_HOURS);
        assert_eq!(cfg.bcrypt_cost, DEFAULT_BCRYPT_COST);
    }

    #[test]
    fn secret_is_required() {
        assert!(matches!(
            config(&[]),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));
    }

    #[test]
    fn malformed_port_is_reported() {
        let err = config(&[("JWT_SECRET", "s"), ("PORT", "eighty")]).unwrap_err();
        assert_eq!(err.to_string(), "PORT has an invalid value 'eighty'");
    }

    #[test]
    fn bcrypt_cost_out_of_range_is_rejected() {
        assert!(config(&[("JWT_SECRET", "s"), ("BCRYPT_COST", "2")]).is_err());
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        let cfg = config(&[("JWT_SECRET", "s"), ("DATABASE_URL", " ")]).unwrap();
        assert!(cfg.database_url.is_none());
    }
}

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_DATASET_PATH: &str = "./Historical SNAP Retailer Locator Data 2005-2025.csv";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing is decoupled from the process environment so tests can feed a
/// plain `HashMap` instead of mutating global state.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("SNAPLOC_ENV", "development"));
    let bind_addr = parse_addr("SNAPLOC_BIND_ADDR", "0.0.0.0:8000")?;
    let log_level = or_default("SNAPLOC_LOG_LEVEL", "info");
    let dataset_path = PathBuf::from(or_default("SNAPLOC_DATASET_PATH", DEFAULT_DATASET_PATH));

    let max_k = parse_usize("SNAPLOC_MAX_K", "100")?;
    if max_k == 0 {
        return Err(invalid("SNAPLOC_MAX_K", "must be at least 1".to_string()));
    }

    let default_k = parse_usize("SNAPLOC_DEFAULT_K", "10")?;
    if default_k == 0 || default_k > max_k {
        return Err(invalid(
            "SNAPLOC_DEFAULT_K",
            format!("must be between 1 and {max_k}"),
        ));
    }

    let rate_limit_per_minute = parse_usize("SNAPLOC_RATE_LIMIT_PER_MINUTE", "120")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        dataset_path,
        default_k,
        max_k,
        rate_limit_per_minute,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

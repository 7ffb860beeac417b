use std::collections::BTreeMap;

use crate::app_config::{AppConfig, Environment, StepTimeouts};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
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
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        let value = lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))?;
        if value.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar(var.to_string()));
        }
        Ok(value)
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let grab_food_url = require("GRAB_FOOD_URL")?;
    let request_url = require("REQUEST_URL")?;
    let headless = parse_bool("HEADLESS", &or_default("HEADLESS", "false"))?;

    let env = parse_environment(&or_default("GRABFOOD_ENV", "development"))?;
    let log_level = or_default("GRABFOOD_LOG_LEVEL", "info");

    let proxy_server = optional("GRABFOOD_PROXY_SERVER");
    let chrome_path = optional("GRABFOOD_CHROME_PATH").map(PathBuf::from);
    let output_path = PathBuf::from(or_default("GRABFOOD_OUTPUT_PATH", "data.ndjson.gz"));
    let selectors_path = optional("GRABFOOD_SELECTORS_PATH").map(PathBuf::from);

    let defaults = StepTimeouts::default();
    let timeouts = StepTimeouts {
        navigation_ms: parse_u64(
            "GRABFOOD_NAVIGATION_TIMEOUT_MS",
            &defaults.navigation_ms.to_string(),
        )?,
        input_ms: parse_u64("GRABFOOD_INPUT_TIMEOUT_MS", &defaults.input_ms.to_string())?,
        submit_ms: parse_u64("GRABFOOD_SUBMIT_TIMEOUT_MS", &defaults.submit_ms.to_string())?,
        listing_ms: parse_u64(
            "GRABFOOD_LISTING_TIMEOUT_MS",
            &defaults.listing_ms.to_string(),
        )?,
    };
    let typing_delay_ms = parse_u64("GRABFOOD_TYPING_DELAY_MS", "100")?;
    let request_headers = optional("GRABFOOD_REQUEST_HEADERS")
        .map(|raw| parse_headers(&raw))
        .transpose()?
        .unwrap_or_default();

    Ok(AppConfig {
        env,
        log_level,
        grab_food_url,
        request_url,
        headless,
        proxy_server,
        chrome_path,
        output_path,
        selectors_path,
        timeouts,
        typing_delay_ms,
        request_headers,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "GRABFOOD_ENV".to_string(),
            reason: format!(
                "unknown environment '{other}'; expected development, test, or production"
            ),
        }),
    }
}

/// Strict boolean parsing: only `true` and `false` are accepted.
fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected 'true' or 'false', got '{other}'"),
        }),
    }
}

/// Parse a flat header map given as JSON or YAML, e.g.
/// `{"x-country-code": "SG"}`. Names must be non-empty and values strings.
fn parse_headers(raw: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: "GRABFOOD_REQUEST_HEADERS".to_string(),
        reason,
    };

    let headers: BTreeMap<String, String> =
        serde_yaml::from_str(raw).map_err(|e| invalid(e.to_string()))?;
    if let Some(name) = headers.keys().find(|name| name.trim().is_empty()) {
        return Err(invalid(format!("header name '{name}' must be non-empty")));
    }
    Ok(headers)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use crate::app_config::{default_user_agent, AppConfig};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let batch_concurrency = parse_usize("TRADESCOUT_BATCH_CONCURRENCY", "5")?;
    if batch_concurrency == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "TRADESCOUT_BATCH_CONCURRENCY".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        log_level: or_default("TRADESCOUT_LOG_LEVEL", "info"),
        fetch_timeout_secs: parse_u64("TRADESCOUT_FETCH_TIMEOUT_SECS", "8")?,
        user_agent: or_default("TRADESCOUT_USER_AGENT", default_user_agent()),
        memo_ttl_secs: parse_u64("TRADESCOUT_MEMO_TTL_SECS", "600")?,
        freshness_window_secs: parse_u64("TRADESCOUT_FRESHNESS_WINDOW_SECS", "86400")?,
        batch_concurrency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env::VarError;

    fn lookup_from<'a>(
        map: &'a HashMap<&str, &str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| map.get(key).map(|v| (*v).to_string()).ok_or(VarError::NotPresent)
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let map = HashMap::new();
        let config = build_app_config(lookup_from(&map)).unwrap();
        assert_eq!(config.fetch_timeout_secs, 8);
        assert_eq!(config.memo_ttl_secs, 600);
        assert_eq!(config.freshness_window_secs, 86_400);
        assert_eq!(config.batch_concurrency, 5);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn overrides_are_honored() {
        let mut map = HashMap::new();
        map.insert("TRADESCOUT_FETCH_TIMEOUT_SECS", "3");
        map.insert("TRADESCOUT_BATCH_CONCURRENCY", "2");
        let config = build_app_config(lookup_from(&map)).unwrap();
        assert_eq!(config.fetch_timeout_secs, 3);
        assert_eq!(config.batch_concurrency, 2);
    }

    #[test]
    fn invalid_number_is_an_error() {
        let mut map = HashMap::new();
        map.insert("TRADESCOUT_MEMO_TTL_SECS", "soon");
        let err = build_app_config(lookup_from(&map)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnvVar { ref var, .. } if var == "TRADESCOUT_MEMO_TTL_SECS"
        ));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut map = HashMap::new();
        map.insert("TRADESCOUT_BATCH_CONCURRENCY", "0");
        assert!(build_app_config(lookup_from(&map)).is_err());
    }
}

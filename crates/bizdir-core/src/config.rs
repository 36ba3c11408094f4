use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load engine configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a set variable has an invalid value. All
/// variables have defaults; none are required.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load engine configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a set variable has an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build configuration using the provided env-var lookup function.
///
/// The parsing/validation logic is decoupled from the real environment so it
/// can be tested with a plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
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

    let base_url = or_default("BIZDIR_BASE_URL", "https://www.yellowpages.com");
    let log_level = or_default("BIZDIR_LOG_LEVEL", "info");
    let user_agent = or_default("BIZDIR_USER_AGENT", "bizdir/0.1 (directory-extractor)");
    let accept_language = or_default("BIZDIR_ACCEPT_LANGUAGE", "en-US,en;q=0.9");

    let request_timeout_secs = parse_u64("BIZDIR_REQUEST_TIMEOUT_SECS", "15")?;
    let fetch_max_attempts = parse_u32("BIZDIR_FETCH_MAX_ATTEMPTS", "3")?;
    let fetch_backoff_base_ms = parse_u64("BIZDIR_FETCH_BACKOFF_BASE_MS", "1000")?;
    let inter_request_delay_ms = parse_u64("BIZDIR_INTER_REQUEST_DELAY_MS", "500")?;
    let max_in_flight_requests = parse_usize("BIZDIR_MAX_IN_FLIGHT_REQUESTS", "5")?;

    if fetch_max_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "BIZDIR_FETCH_MAX_ATTEMPTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        base_url,
        log_level,
        user_agent,
        accept_language,
        request_timeout_secs,
        fetch_max_attempts,
        fetch_backoff_base_ms,
        inter_request_delay_ms,
        max_in_flight_requests,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn build_app_config_succeeds_with_empty_env() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.base_url, "https://www.yellowpages.com");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.user_agent, "bizdir/0.1 (directory-extractor)");
        assert_eq!(cfg.accept_language, "en-US,en;q=0.9");
        assert_eq!(cfg.request_timeout_secs, 15);
        assert_eq!(cfg.fetch_max_attempts, 3);
        assert_eq!(cfg.fetch_backoff_base_ms, 1000);
        assert_eq!(cfg.inter_request_delay_ms, 500);
        assert_eq!(cfg.max_in_flight_requests, 5);
    }

    #[test]
    fn build_app_config_base_url_override() {
        let mut map = HashMap::new();
        map.insert("BIZDIR_BASE_URL", "http://127.0.0.1:8080");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.base_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn build_app_config_max_attempts_override() {
        let mut map = HashMap::new();
        map.insert("BIZDIR_FETCH_MAX_ATTEMPTS", "5");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.fetch_max_attempts, 5);
    }

    #[test]
    fn build_app_config_rejects_zero_max_attempts() {
        let mut map = HashMap::new();
        map.insert("BIZDIR_FETCH_MAX_ATTEMPTS", "0");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "BIZDIR_FETCH_MAX_ATTEMPTS"),
            "expected InvalidEnvVar(BIZDIR_FETCH_MAX_ATTEMPTS), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_rejects_non_numeric_delay() {
        let mut map = HashMap::new();
        map.insert("BIZDIR_INTER_REQUEST_DELAY_MS", "not-a-number");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "BIZDIR_INTER_REQUEST_DELAY_MS"),
            "expected InvalidEnvVar(BIZDIR_INTER_REQUEST_DELAY_MS), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_rejects_non_numeric_in_flight_cap() {
        let mut map = HashMap::new();
        map.insert("BIZDIR_MAX_IN_FLIGHT_REQUESTS", "many");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "BIZDIR_MAX_IN_FLIGHT_REQUESTS"),
            "expected InvalidEnvVar(BIZDIR_MAX_IN_FLIGHT_REQUESTS), got: {result:?}"
        );
    }
}

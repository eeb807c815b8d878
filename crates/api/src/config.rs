use std::fmt::Display;
use std::str::FromStr;

use crate::auth::cookies::CookieConfig;
use crate::auth::jwt::JwtConfig;

/// Failure to assemble [`ServerConfig`] from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Output format of the tracing fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Server configuration loaded from environment variables.
///
/// All non-secret fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Access/refresh token secrets and lifetimes.
    pub jwt: JwtConfig,
    /// Redis connection string for the revocation cache. `None` selects the
    /// in-process cache.
    pub redis_url: Option<String>,
    /// Lifetime of a revocation entry, in seconds.
    pub revocation_ttl_secs: u64,
    pub cookie: CookieConfig,
    pub log_format: LogFormat,
}

const DEFAULT_COOKIE_MAX_AGE_DAYS: i64 = 7;
const MAX_COOKIE_MAX_AGE_DAYS: i64 = 365;
/// Upper bound on a revocation entry's lifetime (seven days).
const MAX_REVOCATION_TTL_SECS: u64 = 7 * 24 * 60 * 60;

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `REDIS_URL`            | unset (in-process cache)   |
    /// | `REVOCATION_TTL_SECS`  | access-token lifetime      |
    /// | `COOKIE_MAX_AGE_DAYS`  | `7` (at most 365)          |
    /// | `COOKIE_SECURE`        | `false`                    |
    /// | `LOG_FORMAT`           | `text`                     |
    ///
    /// `REVOCATION_TTL_SECS` may not be shorter than the access-token
    /// lifetime, otherwise a revoked token could outlive its entry.
    ///
    /// Token variables are documented on [`JwtConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?;

        let jwt = JwtConfig::from_lookup(&lookup)?;

        let redis_url = lookup("REDIS_URL").filter(|url| !url.trim().is_empty());

        let access_lifetime_secs = jwt.access_lifetime().as_secs();
        let revocation_ttl_secs = bounded(
            "REVOCATION_TTL_SECS",
            parse_or(&lookup, "REVOCATION_TTL_SECS", access_lifetime_secs)?,
            access_lifetime_secs,
            MAX_REVOCATION_TTL_SECS,
        )?;

        let cookie = CookieConfig {
            max_age_days: bounded(
                "COOKIE_MAX_AGE_DAYS",
                parse_or(&lookup, "COOKIE_MAX_AGE_DAYS", DEFAULT_COOKIE_MAX_AGE_DAYS)?,
                1,
                MAX_COOKIE_MAX_AGE_DAYS,
            )?,
            secure: parse_or(&lookup, "COOKIE_SECURE", false)?,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    reason: format!("expected `text` or `json`, got `{other}`"),
                })
            }
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt,
            redis_url,
            revocation_ttl_secs,
            cookie,
            log_format,
        })
    }
}

/// Parse `name` if present, otherwise return `default`.
pub(crate) fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Reject `value` unless `min <= value <= max`.
pub(crate) fn bounded<T>(name: &'static str, value: T, min: T, max: T) -> Result<T, ConfigError>
where
    T: PartialOrd + Display,
{
    if value < min || value > max {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("must be between {min} and {max}, got {value}"),
        });
    }
    Ok(value)
}

/// Read a variable that has no default. Blank values count as missing.
pub(crate) fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        let mut map: HashMap<String, String> = [
            ("ACCESS_TOKEN_SECRET", "access-secret"),
            ("REFRESH_TOKEN_SECRET", "refresh-secret"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.to_string());
        }
        map
    }

    fn load(map: &HashMap<String, String>) -> Result<ServerConfig, ConfigError> {
        ServerConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&vars(&[])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.jwt.access_token_expiry_mins, 15);
        assert_eq!(config.jwt.refresh_token_expiry_days, 7);
        assert_eq!(config.revocation_ttl_secs, 15 * 60);
        assert_eq!(config.cookie.max_age_days, 7);
        assert!(!config.cookie.secure);
        assert!(config.redis_url.is_none());
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_revocation_ttl_follows_access_lifetime() {
        let config = load(&vars(&[("ACCESS_TOKEN_EXPIRY_MINS", "5")])).unwrap();
        assert_eq!(config.revocation_ttl_secs, 300);

        let config = load(&vars(&[("REVOCATION_TTL_SECS", "1200")])).unwrap();
        assert_eq!(config.revocation_ttl_secs, 1200);
    }

    #[test]
    fn test_revocation_ttl_shorter_than_access_lifetime_is_rejected() {
        let result = load(&vars(&[("REVOCATION_TTL_SECS", "42")]));
        assert_matches!(result, Err(ConfigError::Invalid { name: "REVOCATION_TTL_SECS", .. }));

        let result = load(&vars(&[
            ("ACCESS_TOKEN_EXPIRY_MINS", "30"),
            ("REVOCATION_TTL_SECS", "900"),
        ]));
        assert_matches!(result, Err(ConfigError::Invalid { name: "REVOCATION_TTL_SECS", .. }));
    }

    #[test]
    fn test_out_of_range_lifetimes_are_rejected() {
        let max = i64::MAX.to_string();
        for (name, value) in [
            ("ACCESS_TOKEN_EXPIRY_MINS", max.as_str()),
            ("ACCESS_TOKEN_EXPIRY_MINS", "0"),
            ("REFRESH_TOKEN_EXPIRY_DAYS", max.as_str()),
            ("REFRESH_TOKEN_EXPIRY_DAYS", "-1"),
            ("REVOCATION_TTL_SECS", "18446744073709551615"),
            ("COOKIE_MAX_AGE_DAYS", max.as_str()),
            ("COOKIE_MAX_AGE_DAYS", "-3"),
            ("COOKIE_MAX_AGE_DAYS", "0"),
        ] {
            let result = load(&vars(&[(name, value)]));
            assert_matches!(
                result,
                Err(ConfigError::Invalid { name: n, .. }) if n == name,
                "{name}={value} should be rejected"
            );
        }
    }

    #[test]
    fn test_upper_bounds_are_inclusive() {
        let config = load(&vars(&[
            ("ACCESS_TOKEN_EXPIRY_MINS", "1440"),
            ("REFRESH_TOKEN_EXPIRY_DAYS", "365"),
            ("REVOCATION_TTL_SECS", "604800"),
            ("COOKIE_MAX_AGE_DAYS", "365"),
        ]))
        .unwrap();
        assert_eq!(config.jwt.access_token_expiry_mins, 1440);
        assert_eq!(config.revocation_ttl_secs, 604_800);
        assert_eq!(config.cookie.max_age_days, 365);
    }

    #[test]
    fn test_missing_secret_is_reported() {
        let mut map = vars(&[]);
        map.remove("ACCESS_TOKEN_SECRET");
        assert_matches!(load(&map), Err(ConfigError::Missing("ACCESS_TOKEN_SECRET")));
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let result = load(&vars(&[("PORT", "eighty")]));
        assert_matches!(result, Err(ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn test_unknown_log_format_is_rejected() {
        let result = load(&vars(&[("LOG_FORMAT", "xml")]));
        assert_matches!(result, Err(ConfigError::Invalid { name: "LOG_FORMAT", .. }));
    }

    #[test]
    fn test_blank_redis_url_means_unset() {
        let config = load(&vars(&[("REDIS_URL", "  ")])).unwrap();
        assert!(config.redis_url.is_none());
    }
}

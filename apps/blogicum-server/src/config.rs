//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use blogicum_core::query::DEFAULT_PAGE_SIZE;
use blogicum_infra::{DatabaseConfig, JwtConfig};

#[cfg(feature = "rate-limit")]
use blogicum_infra::RateLimitConfig;
#[cfg(feature = "rate-limit")]
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the server on the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub site: SiteConfig,
    pub jwt: JwtConfig,
    #[cfg(feature = "rate-limit")]
    pub auth_rate_limit: RateLimitConfig,
}

/// Settings the request handlers read.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub posts_per_page: u64,
    pub media_root: PathBuf,
    pub login_url: String,
    pub session_cookie_name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            posts_per_page: DEFAULT_PAGE_SIZE,
            media_root: PathBuf::from("media"),
            login_url: "/auth/login/".to_string(),
            session_cookie_name: "blogicum_session".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: None,
            site: SiteConfig::default(),
            jwt: JwtConfig::default(),
            #[cfg(feature = "rate-limit")]
            auth_rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Parse an environment variable, falling back to `default` when unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let database = env::var("DATABASE_URL").ok().map(|url| {
            let base = DatabaseConfig::new(url);
            DatabaseConfig {
                max_connections: env_or("DB_MAX_CONNECTIONS", base.max_connections),
                min_connections: env_or("DB_MIN_CONNECTIONS", base.min_connections),
                ..base
            }
        });

        let site = SiteConfig {
            posts_per_page: env_or("POSTS_PER_PAGE", defaults.site.posts_per_page).max(1),
            media_root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.site.media_root),
            login_url: env::var("LOGIN_URL").unwrap_or(defaults.site.login_url),
            session_cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or(defaults.site.session_cookie_name),
        };

        let jwt = JwtConfig {
            secret: env::var("JWT_SECRET").unwrap_or(defaults.jwt.secret),
            expiration_hours: env_or("JWT_EXPIRATION_HOURS", defaults.jwt.expiration_hours),
            issuer: env::var("JWT_ISSUER").unwrap_or(defaults.jwt.issuer),
        };

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            database,
            site,
            jwt,
            #[cfg(feature = "rate-limit")]
            auth_rate_limit: RateLimitConfig {
                max_requests: env_or(
                    "AUTH_RATE_LIMIT_MAX_REQUESTS",
                    defaults.auth_rate_limit.max_requests,
                ),
                window: Duration::from_secs(env_or(
                    "AUTH_RATE_LIMIT_WINDOW_SECS",
                    defaults.auth_rate_limit.window.as_secs(),
                )),
            },
        }
    }
}

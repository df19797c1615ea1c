//! Application state - shared across all handlers.

use std::sync::Arc;

use blogicum_core::ports::{
    CategoryRepository, CommentRepository, ImageStorage, LocationRepository, PasswordService,
    PostRepository, RateLimiter, Renderer, TokenService, UserRepository,
};
use blogicum_infra::memory::InMemoryStore;
use blogicum_infra::{Argon2PasswordService, JsonRenderer, JwtTokenService, LocalImageStorage};

#[cfg(feature = "postgres")]
use blogicum_infra::database::{
    self, PostgresCategoryRepository, PostgresCommentRepository, PostgresLocationRepository,
    PostgresPostRepository, PostgresUserRepository,
};
#[cfg(feature = "rate-limit")]
use blogicum_infra::InMemoryRateLimiter;

use crate::config::{AppConfig, SiteConfig};

/// One repository per table, all backed by the same store.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    /// Reported by the health endpoint.
    pub backend: &'static str,
}

impl Repositories {
    pub fn in_memory(store: &InMemoryStore) -> Self {
        Self {
            users: Arc::new(store.users()),
            categories: Arc::new(store.categories()),
            locations: Arc::new(store.locations()),
            posts: Arc::new(store.posts()),
            comments: Arc::new(store.comments()),
            backend: "memory",
        }
    }

    #[cfg(feature = "postgres")]
    pub fn postgres(db: database::DbConn) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(db.clone())),
            categories: Arc::new(PostgresCategoryRepository::new(db.clone())),
            locations: Arc::new(PostgresLocationRepository::new(db.clone())),
            posts: Arc::new(PostgresPostRepository::new(db.clone())),
            comments: Arc::new(PostgresCommentRepository::new(db)),
            backend: "postgres",
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub images: Arc<dyn ImageStorage>,
    pub renderer: Arc<dyn Renderer>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    /// Budget for the session endpoints; `None` disables limiting.
    pub auth_limiter: Option<Arc<dyn RateLimiter>>,
    pub site: Arc<SiteConfig>,
    pub backend: &'static str,
}

impl AppState {
    /// Wire the state around an already chosen set of repositories.
    pub fn new(repos: Repositories, config: &AppConfig) -> Self {
        #[cfg(feature = "rate-limit")]
        let auth_limiter: Option<Arc<dyn RateLimiter>> = Some(Arc::new(
            InMemoryRateLimiter::new(config.auth_rate_limit.clone()),
        ));
        #[cfg(not(feature = "rate-limit"))]
        let auth_limiter: Option<Arc<dyn RateLimiter>> = None;

        Self {
            users: repos.users,
            categories: repos.categories,
            locations: repos.locations,
            posts: repos.posts,
            comments: repos.comments,
            images: Arc::new(LocalImageStorage::new(config.site.media_root.clone())),
            renderer: Arc::new(JsonRenderer::default()),
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            passwords: Arc::new(Argon2PasswordService::new()),
            auth_limiter,
            site: Arc::new(config.site.clone()),
            backend: repos.backend,
        }
    }

    /// Build the application state, falling back to the in-memory store
    /// when no database is configured or reachable.
    pub async fn from_config(config: &AppConfig) -> Self {
        let repos = Self::repositories(config).await;
        tracing::info!(backend = repos.backend, "Application state initialized");
        Self::new(repos, config)
    }

    #[cfg(feature = "postgres")]
    async fn repositories(config: &AppConfig) -> Repositories {
        let Some(db_config) = &config.database else {
            tracing::warn!("DATABASE_URL not set. Running on the in-memory store.");
            return Repositories::in_memory(&InMemoryStore::new());
        };

        match database::connect(db_config).await {
            Ok(db) => Repositories::postgres(db),
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to database. Using in-memory fallback.");
                Repositories::in_memory(&InMemoryStore::new())
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn repositories(_config: &AppConfig) -> Repositories {
        tracing::info!("Running without postgres feature - using the in-memory store");
        Repositories::in_memory(&InMemoryStore::new())
    }
}

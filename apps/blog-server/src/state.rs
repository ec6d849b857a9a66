//! Application state - shared across all handlers.

use std::sync::Arc;

use serde::Serialize;

use blogicum_core::ports::{PasswordService, TokenService, UserRepository};
use blogicum_core::{BlogService, Repositories};
use blogicum_infra::{Argon2PasswordService, InMemoryStore, JwtConfig, JwtTokenService};

#[cfg(feature = "postgres")]
use blogicum_infra::{DatabaseConnections, postgres_repositories};

use crate::config::AppConfig;

/// Which store backs the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Storage {
    Postgres,
    Memory,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: BlogService,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub storage: Storage,
}

impl AppState {
    /// Build the state, falling back to the in-memory store when the
    /// database is not configured or unreachable.
    pub async fn new(config: &AppConfig) -> Self {
        let (repos, storage) = Self::repositories(config).await;

        tracing::info!(storage = ?storage, "Application state initialized");

        Self::assemble(
            repos,
            storage,
            config.jwt.clone(),
            Argon2PasswordService::new(),
        )
    }

    #[cfg(feature = "postgres")]
    async fn repositories(config: &AppConfig) -> (Repositories, Storage) {
        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Self::memory_repositories();
        };

        match DatabaseConnections::init(db_config).await {
            Ok(connections) => (postgres_repositories(connections.main), Storage::Postgres),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                Self::memory_repositories()
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn repositories(_config: &AppConfig) -> (Repositories, Storage) {
        tracing::info!("Running without postgres feature - using in-memory store");
        Self::memory_repositories()
    }

    fn memory_repositories() -> (Repositories, Storage) {
        let store = Arc::new(InMemoryStore::new());
        (Repositories::from_store(store), Storage::Memory)
    }

    /// State over an existing in-memory store, with cheap password hashing.
    #[cfg(test)]
    pub fn in_memory(store: Arc<InMemoryStore>, jwt: JwtConfig) -> Self {
        let passwords = Argon2PasswordService::with_costs(8 * 1024, 1, 1).unwrap();
        Self::assemble(
            Repositories::from_store(store),
            Storage::Memory,
            jwt,
            passwords,
        )
    }

    fn assemble(
        repos: Repositories,
        storage: Storage,
        jwt: JwtConfig,
        passwords: Argon2PasswordService,
    ) -> Self {
        Self {
            blog: BlogService::new(repos),
            tokens: Arc::new(JwtTokenService::new(jwt)),
            passwords: Arc::new(passwords),
            storage,
        }
    }

    pub fn users(&self) -> &Arc<dyn UserRepository> {
        &self.blog.repositories().users
    }
}

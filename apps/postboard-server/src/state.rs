//! Application state - shared across all handlers.

use std::sync::Arc;

use postboard_core::ports::{GroupRepository, PostRepository, UserRepository};
use postboard_core::services::{FeedService, PostSubmission};
use postboard_infra::InMemoryDatabase;

#[cfg(feature = "postgres")]
use postboard_infra::database::{
    DatabaseConnections, PostgresGroupRepository, PostgresPostRepository, PostgresUserRepository,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<FeedService>,
    pub submission: Arc<PostSubmission>,
    pub login_url: String,
    /// Name of the storage backend in use, reported by the health check.
    pub storage: &'static str,
}

impl AppState {
    /// Wire the services over one set of repositories.
    pub fn from_repositories(
        users: Arc<dyn UserRepository>,
        groups: Arc<dyn GroupRepository>,
        posts: Arc<dyn PostRepository>,
        login_url: impl Into<String>,
        storage: &'static str,
    ) -> Self {
        Self {
            feed: Arc::new(FeedService::new(
                users.clone(),
                groups.clone(),
                posts.clone(),
            )),
            submission: Arc::new(PostSubmission::new(users, groups, posts)),
            login_url: login_url.into(),
            storage,
        }
    }

    /// State backed by the in-memory store.
    pub fn in_memory(db: &InMemoryDatabase, login_url: impl Into<String>) -> Self {
        Self::from_repositories(
            Arc::new(db.users()),
            Arc::new(db.groups()),
            Arc::new(db.posts()),
            login_url,
            "memory",
        )
    }

    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "postgres")]
        {
            if let Some(db_config) = &config.database {
                match DatabaseConnections::init(db_config).await {
                    Ok(connections) => {
                        let conn = connections.main;
                        tracing::info!("Application state initialized (postgres)");
                        return Self::from_repositories(
                            Arc::new(PostgresUserRepository::new(conn.clone())),
                            Arc::new(PostgresGroupRepository::new(conn.clone())),
                            Arc::new(PostgresPostRepository::new(conn)),
                            config.login_url.clone(),
                            "postgres",
                        );
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                    }
                }
            } else {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            }
        }

        #[cfg(not(feature = "postgres"))]
        tracing::info!("Running without postgres feature - using in-memory repositories");

        tracing::info!("Application state initialized (memory)");
        Self::in_memory(&InMemoryDatabase::new(), config.login_url.clone())
    }
}

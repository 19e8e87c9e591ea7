//! Application state - shared across all handlers.

use std::sync::Arc;

use yatube_core::Paginator;
use yatube_core::ports::{
    CommentRepository, FollowRepository, GroupRepository, MediaStorage, PostRepository,
    UserRepository,
};
use yatube_infra::{LocalMediaStorage, MemoryStore};

#[cfg(feature = "postgres")]
use yatube_infra::database::{
    DatabaseConnections, PostgresCommentRepository, PostgresFollowRepository,
    PostgresGroupRepository, PostgresPostRepository, PostgresUserRepository,
};

use crate::config::AppConfig;
use crate::render::{MiniJinjaRenderer, Renderer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub media: Arc<dyn MediaStorage>,
    pub renderer: Arc<dyn Renderer>,
    pub paginator: Paginator,
    #[cfg(feature = "postgres")]
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let media: Arc<dyn MediaStorage> = Arc::new(LocalMediaStorage::new(&config.media_root));
        let renderer: Arc<dyn Renderer> = Arc::new(MiniJinjaRenderer);
        let paginator = Paginator::new(config.posts_per_page);

        #[cfg(feature = "postgres")]
        let connected = Self::connect(config, media.clone(), renderer.clone(), paginator).await;

        #[cfg(not(feature = "postgres"))]
        let connected: Option<Self> = {
            tracing::info!("Running without postgres feature - using in-memory store");
            None
        };

        if let Some(state) = connected {
            tracing::info!("Application state initialized (postgres)");
            return state;
        }

        tracing::info!("Application state initialized (in-memory)");
        Self::in_memory(&MemoryStore::new(), media, renderer, paginator)
    }

    #[cfg(feature = "postgres")]
    async fn connect(
        config: &AppConfig,
        media: Arc<dyn MediaStorage>,
        renderer: Arc<dyn Renderer>,
        paginator: Paginator,
    ) -> Option<Self> {
        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return None;
        };

        match DatabaseConnections::init(db_config).await {
            Ok(connections) => {
                let conn = Arc::new(connections);
                Some(Self {
                    users: Arc::new(PostgresUserRepository::new(conn.main.clone())),
                    groups: Arc::new(PostgresGroupRepository::new(conn.main.clone())),
                    posts: Arc::new(PostgresPostRepository::new(conn.main.clone())),
                    comments: Arc::new(PostgresCommentRepository::new(conn.main.clone())),
                    follows: Arc::new(PostgresFollowRepository::new(conn.main.clone())),
                    media,
                    renderer,
                    paginator,
                    db: Some(conn),
                })
            }
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                None
            }
        }
    }

    /// State backed by an in-memory store.
    pub fn in_memory(
        store: &MemoryStore,
        media: Arc<dyn MediaStorage>,
        renderer: Arc<dyn Renderer>,
        paginator: Paginator,
    ) -> Self {
        Self {
            users: Arc::new(store.users()),
            groups: Arc::new(store.groups()),
            posts: Arc::new(store.posts()),
            comments: Arc::new(store.comments()),
            follows: Arc::new(store.follows()),
            media,
            renderer,
            paginator,
            #[cfg(feature = "postgres")]
            db: None,
        }
    }
}

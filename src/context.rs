//! Application context providing dependency injection root.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::config::{Config, StoreBackend};
use crate::di::{Context as ContextDerive, FromRef};
use crate::error::AppError;
use crate::graph::backends::postgres::PostgresClient;
use crate::graph::CypherExecutor;
use crate::repositories::{
    AgeSchemaRepository, CatalogRepository, CypherCatalogRepository, CypherRelationRepository,
    CypherUserRepository, MemoryStore, RelationRepository, SchemaRepository, UserRepository,
};
use crate::services::TokenService;

/// The graph backend Cypher repositories run against.
pub type AppGraph = Arc<dyn CypherExecutor>;
pub type AppCatalog = Arc<dyn CatalogRepository>;
pub type AppRelations = Arc<dyn RelationRepository>;
pub type AppUsers = Arc<dyn UserRepository>;
pub type AppSchema = Arc<dyn SchemaRepository>;

/// Process-wide lock serializing catalog seeding.
#[derive(Clone, Default)]
pub struct SeedLock(Arc<Mutex<()>>);

impl SeedLock {
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.0.lock().await
    }
}

/// Root application context for dependency injection.
///
/// `#[derive(Context)]` generates a `FromRef` implementation per field, so
/// services declare the pieces they need and are built with
/// [`Context::resolve`].
#[derive(ContextDerive, Clone)]
pub struct Context {
    pub catalog: AppCatalog,
    pub relations: AppRelations,
    pub users: AppUsers,
    pub schema: AppSchema,
    pub tokens: TokenService,
    pub seed_lock: SeedLock,
    pub config: Arc<Config>,
}

impl Context {
    /// Builds the context for the configured store backend.
    pub async fn connect(config: Config) -> Result<Self, AppError> {
        if config.auth.uses_dev_secret() {
            tracing::warn!("auth.secret is not set; tokens are signed with the development secret");
        }

        match config.store.backend {
            StoreBackend::Postgres => {
                tracing::info!("Connecting to PostgreSQL at {}", config.postgres.uri);
                let client = PostgresClient::connect(&config.postgres).await?;
                let graph: AppGraph = Arc::new(client.clone());

                Ok(Self {
                    catalog: Arc::new(CypherCatalogRepository::new(graph.clone())),
                    relations: Arc::new(CypherRelationRepository::new(graph.clone())),
                    users: Arc::new(CypherUserRepository::new(graph)),
                    schema: Arc::new(AgeSchemaRepository::new(client)),
                    tokens: TokenService::new(&config.auth),
                    seed_lock: SeedLock::default(),
                    config: Arc::new(config),
                })
            }
            StoreBackend::Memory => {
                tracing::info!("Using in-memory store; data is lost on exit");
                Ok(Self::in_memory(config))
            }
        }
    }

    /// A context backed by a fresh [`MemoryStore`].
    pub fn in_memory(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            catalog: store.clone(),
            relations: store.clone(),
            users: store.clone(),
            schema: store,
            tokens: TokenService::new(&config.auth),
            seed_lock: SeedLock::default(),
            config: Arc::new(config),
        }
    }

    /// Builds any type that can be resolved from the context.
    pub fn resolve<T: FromRef<Self>>(&self) -> T {
        T::from_ref(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::AuthService;

    #[tokio::test]
    async fn test_in_memory_context_shares_one_store() {
        let ctx = Context::in_memory(Config::default());
        let auth: AuthService = ctx.resolve();

        let session = auth
            .register("Asha", "asha@example.com", "hunter22")
            .await
            .unwrap();

        let stored = ctx.users.find_by_id(&session.user.id).await.unwrap();
        assert!(stored.is_some());
        assert!(ctx.catalog.list_all(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_backend_selected_by_config() {
        let mut config = Config::default();
        config.store.backend = StoreBackend::Memory;

        let ctx = Context::connect(config).await.unwrap();
        ctx.schema.ensure_schema().await.unwrap();
    }
}

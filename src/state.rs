use crate::config::{AppConfig, StorageBackend};
use crate::db;
use crate::users::{
    memory::MemoryUserCollection,
    repo::{PgUserCollection, UserCollection},
    services::UserService,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: UserService,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let collection: Arc<dyn UserCollection> = match config.storage {
            StorageBackend::Postgres => {
                let pool = db::connect(&config).await?;
                db::migrate(&pool).await;
                Arc::new(PgUserCollection::new(pool))
            }
            StorageBackend::Memory => {
                tracing::warn!("using in-memory user collection; data is lost on restart");
                Arc::new(MemoryUserCollection::new())
            }
        };
        tracing::info!(storage = ?config.storage, "user collection ready");
        Ok(Self::from_parts(Arc::new(config), collection))
    }

    pub fn from_parts(config: Arc<AppConfig>, collection: Arc<dyn UserCollection>) -> Self {
        Self {
            config,
            users: UserService::new(collection),
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with(crate::error::ErrorStatusMode::Conventional)
    }

    #[cfg(test)]
    pub fn fake_with(error_status: crate::error::ErrorStatusMode) -> Self {
        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            storage: StorageBackend::Memory,
            database_url: None,
            db_max_connections: 1,
            error_status,
        });
        Self::from_parts(config, Arc::new(MemoryUserCollection::new()))
    }
}

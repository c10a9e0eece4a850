use std::sync::Arc;

use crate::config::{Config, StoreKind};
use crate::store::{CatalogStore, MemoryStore, MongoStore, StoreError};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn CatalogStore>, config: Config) -> Self{
        Self { store, config: Arc::new(config) }
    }

    /// Opens the store selected by `CATALOG_STORE`.
    pub async fn connect(config: Config) -> Result<Self, StoreError>{
        let store: Arc<dyn CatalogStore> = match config.store {
            StoreKind::Mongo => Arc::new(MongoStore::connect(&config.mongodb_uri, &config.mongodb_db).await?),
            StoreKind::Memory => Arc::new(MemoryStore::new()),
        };
        Ok(Self::new(store, config))
    }
}

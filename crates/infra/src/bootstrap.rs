//! Service wiring: config → store → use cases.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use fulfilment_core::{Clock, SystemClock};
use fulfilment_warehouses::{
    ArchiveWarehouseUseCase, RegisterWarehouseUseCase, UpdateStockUseCase, WarehouseStore,
};

use crate::config::{StoreBackend, StoreConfig};
use crate::warehouse_store::{InMemoryWarehouseStore, PostgresWarehouseStore};

pub type SharedStore = Arc<dyn WarehouseStore>;
pub type SharedClock = Arc<dyn Clock>;

/// Warehouse operations sharing one store and one clock.
pub struct WarehouseServices {
    pub store: SharedStore,
    pub register: RegisterWarehouseUseCase<SharedStore, SharedClock>,
    pub archive: ArchiveWarehouseUseCase<SharedStore, SharedClock>,
    pub stock: UpdateStockUseCase<SharedStore>,
}

impl WarehouseServices {
    pub fn new(store: SharedStore, clock: SharedClock) -> Self {
        Self {
            register: RegisterWarehouseUseCase::new(store.clone(), clock.clone()),
            archive: ArchiveWarehouseUseCase::new(store.clone(), clock),
            stock: UpdateStockUseCase::new(store.clone()),
            store,
        }
    }

    /// In-memory wiring with the system clock (dev/test).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryWarehouseStore::new()), Arc::new(SystemClock))
    }
}

pub async fn build_services(config: &StoreConfig) -> anyhow::Result<WarehouseServices> {
    match &config.backend {
        StoreBackend::InMemory => {
            tracing::info!("using in-memory warehouse store");
            Ok(WarehouseServices::in_memory())
        }
        StoreBackend::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = PgPoolOptions::new()
                .max_connections(*max_connections)
                .connect(database_url)
                .await
                .context("failed to connect to Postgres")?;

            tracing::info!(max_connections, "using Postgres warehouse store");
            Ok(WarehouseServices::new(
                Arc::new(PostgresWarehouseStore::new(pool)),
                Arc::new(SystemClock),
            ))
        }
    }
}

/// Process entry point: logging, environment config, services.
pub async fn bootstrap() -> anyhow::Result<WarehouseServices> {
    fulfilment_observability::init();
    let config = StoreConfig::from_env().context("invalid store configuration")?;
    build_services(&config).await
}

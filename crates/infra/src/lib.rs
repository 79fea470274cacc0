//! Infrastructure layer: warehouse stores, configuration and service wiring.

pub mod bootstrap;
pub mod config;
pub mod warehouse_store;


pub use bootstrap::{WarehouseServices, bootstrap, build_services};
pub use config::{ConfigError, StoreBackend, StoreConfig};
pub use warehouse_store::{InMemoryWarehouseStore, PostgresWarehouseStore};

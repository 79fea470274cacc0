//! Warehouse lifecycle module.
//!
//! Business rules for warehouses (record invariants, archival, stock updates)
//! plus the store contract the use cases persist through. No IO lives here;
//! store implementations are provided by `fulfilment-infra`.

pub mod concurrency;
pub mod error;
pub mod store;
pub mod usecases;
pub mod warehouse;

pub use concurrency::{ConflictDetails, WriteOutcome, admit_write};
pub use error::{StoreError, WarehouseError};
pub use store::WarehouseStore;
pub use usecases::{ArchiveWarehouseUseCase, RegisterWarehouseUseCase, UpdateStockUseCase};
pub use warehouse::{NewWarehouse, Warehouse, WarehouseSnapshot, WarehouseStatus};

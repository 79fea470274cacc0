//! Warehouse store implementations.
//!
//! Both backends enforce the same contract: exact-match lookup, unique codes on
//! create, and token-conditional updates that advance the token on success.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryWarehouseStore;
pub use postgres::PostgresWarehouseStore;

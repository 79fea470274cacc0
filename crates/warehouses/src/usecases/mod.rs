//! Application-level operations over the warehouse store.
//!
//! Each use case follows the same shape:
//!
//! ```text
//! find_by_code (fresh copy)
//!   ↓
//! precondition checks (NotFound, AlreadyArchived)
//!   ↓
//! mutate the copy (domain rules)
//!   ↓
//! store.update (conditional on the copy's version)
//! ```
//!
//! No use case locks, retries, or mutates shared state in place.

pub mod archive;
pub mod register;
pub mod stock;

pub use archive::ArchiveWarehouseUseCase;
pub use register::RegisterWarehouseUseCase;
pub use stock::UpdateStockUseCase;

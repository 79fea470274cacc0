//! Warehouse store boundary.
//!
//! The store is the single point of truth for warehouse state. Readers receive
//! value copies; the only way to change stored state is `update`, which is
//! conditional on the caller's concurrency token.

use std::sync::Arc;

use fulfilment_core::BusinessUnitCode;

use crate::error::StoreError;
use crate::warehouse::Warehouse;

/// Persistence contract consumed by the warehouse use cases.
///
/// ## Semantics
///
/// - `find_by_code`: exact match; a missing record is `Ok(None)`, never an error
/// - `create`: inserts at the record's version; existing code → `DuplicateKey`
///   (archived records still occupy their code)
/// - `update`: writes every field of `record` only if `record.version()` equals
///   the stored token; otherwise `Conflict`. An archived stored row rejects
///   every write (`Terminal`) and `created_at` never changes (`ImmutableField`);
///   both rules are `admit_write`'s. On success the stored token is advanced by
///   one and the committed record is returned
///
/// Implementations never perform partial writes and run inside whatever
/// transaction the caller has open; they do not retry.
pub trait WarehouseStore: Send + Sync {
    fn find_by_code(&self, code: &BusinessUnitCode) -> Result<Option<Warehouse>, StoreError>;

    fn create(&self, record: &Warehouse) -> Result<Warehouse, StoreError>;

    fn update(&self, record: &Warehouse) -> Result<Warehouse, StoreError>;
}

impl<S> WarehouseStore for Arc<S>
where
    S: WarehouseStore + ?Sized,
{
    fn find_by_code(&self, code: &BusinessUnitCode) -> Result<Option<Warehouse>, StoreError> {
        (**self).find_by_code(code)
    }

    fn create(&self, record: &Warehouse) -> Result<Warehouse, StoreError> {
        (**self).create(record)
    }

    fn update(&self, record: &Warehouse) -> Result<Warehouse, StoreError> {
        (**self).update(record)
    }
}

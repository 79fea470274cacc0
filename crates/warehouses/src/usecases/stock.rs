use tracing::{debug, instrument, warn};

use fulfilment_core::{AggregateRoot, BusinessUnitCode, DomainResult};

use crate::concurrency::WriteOutcome;
use crate::error::WarehouseError;
use crate::store::WarehouseStore;
use crate::warehouse::Warehouse;

/// Stock updates on an active warehouse.
///
/// Same read-validate-write cycle as archival, so a stock update racing an
/// archive is resolved by the store's token check.
pub struct UpdateStockUseCase<S> {
    store: S,
}

impl<S> UpdateStockUseCase<S>
where
    S: WarehouseStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Replace the stock level.
    #[instrument(skip(self), fields(business_unit_code = %code), err)]
    pub fn set_stock(&self, code: &BusinessUnitCode, stock: u32) -> Result<Warehouse, WarehouseError> {
        self.mutate(code, |w| w.set_stock(stock))
    }

    /// Move the stock level by `delta`.
    #[instrument(skip(self), fields(business_unit_code = %code), err)]
    pub fn adjust_stock(&self, code: &BusinessUnitCode, delta: i64) -> Result<Warehouse, WarehouseError> {
        self.mutate(code, |w| w.adjust_stock(delta))
    }

    /// Like `set_stock`, with a lost race reported as `WriteOutcome::Conflicted`.
    pub fn try_set_stock(&self, code: &BusinessUnitCode, stock: u32) -> Result<WriteOutcome, WarehouseError> {
        WriteOutcome::from_result(self.set_stock(code, stock))
    }

    fn mutate<F>(&self, code: &BusinessUnitCode, change: F) -> Result<Warehouse, WarehouseError>
    where
        F: FnOnce(&mut Warehouse) -> DomainResult<()>,
    {
        let mut current = self
            .store
            .find_by_code(code)?
            .ok_or_else(|| WarehouseError::NotFound(code.clone()))?;

        if current.is_archived() {
            return Err(WarehouseError::AlreadyArchived(code.clone()));
        }

        change(&mut current).map_err(|e| WarehouseError::from_domain(code, e))?;

        let committed = self.store.update(&current).map_err(|e| {
            let err = WarehouseError::from(e);
            if err.is_conflict() {
                warn!(read_version = %current.version(), "stock update lost a concurrent write race");
            }
            err
        })?;

        debug!(stock = committed.stock(), version = %committed.version(), "stock updated");
        Ok(committed)
    }
}

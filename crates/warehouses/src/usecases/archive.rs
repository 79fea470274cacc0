use tracing::{info, instrument, warn};

use fulfilment_core::{AggregateRoot, BusinessUnitCode, Clock};

use crate::concurrency::WriteOutcome;
use crate::error::WarehouseError;
use crate::store::WarehouseStore;
use crate::warehouse::Warehouse;

/// Archives a warehouse: `Active -> Archived`, irreversibly.
///
/// ## Preconditions (checked in order)
///
/// 1. A record exists under the code → otherwise `NotFound`
/// 2. The stored record is not archived → otherwise `AlreadyArchived`
///
/// The caller's copy is only used for its code. The use case re-reads the
/// stored record, stamps `archived_at` from the clock on that fresh copy and
/// writes it back through the store's conditional update. A concurrent writer
/// that commits between the read and the write makes the store reject this
/// write with `Conflict`, which is returned as-is.
pub struct ArchiveWarehouseUseCase<S, C> {
    store: S,
    clock: C,
}

impl<S, C> ArchiveWarehouseUseCase<S, C>
where
    S: WarehouseStore,
    C: Clock,
{
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Archive the warehouse stored under `code`.
    #[instrument(skip(self), fields(business_unit_code = %code), err)]
    pub fn archive(&self, code: &BusinessUnitCode) -> Result<Warehouse, WarehouseError> {
        let mut current = self
            .store
            .find_by_code(code)?
            .ok_or_else(|| WarehouseError::NotFound(code.clone()))?;

        if current.is_archived() {
            return Err(WarehouseError::AlreadyArchived(code.clone()));
        }

        current
            .archive(self.clock.now())
            .map_err(|e| WarehouseError::from_domain(code, e))?;

        match self.store.update(&current) {
            Ok(committed) => {
                info!(version = %committed.version(), "warehouse archived");
                Ok(committed)
            }
            Err(err) => {
                let err = WarehouseError::from(err);
                if err.is_conflict() {
                    warn!(read_version = %current.version(), "archive lost a concurrent write race");
                }
                Err(err)
            }
        }
    }

    /// Archive the warehouse a caller already holds a copy of.
    pub fn archive_record(&self, record: &Warehouse) -> Result<Warehouse, WarehouseError> {
        self.archive(record.code())
    }

    /// Like `archive`, with a lost race reported as `WriteOutcome::Conflicted`.
    pub fn try_archive(&self, code: &BusinessUnitCode) -> Result<WriteOutcome, WarehouseError> {
        WriteOutcome::from_result(self.archive(code))
    }
}

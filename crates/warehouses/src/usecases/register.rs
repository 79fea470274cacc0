use tracing::{info, instrument};

use fulfilment_core::Clock;

use crate::error::WarehouseError;
use crate::store::WarehouseStore;
use crate::warehouse::{NewWarehouse, Warehouse};

/// Registers a new warehouse, stamping `created_at` from the clock.
pub struct RegisterWarehouseUseCase<S, C> {
    store: S,
    clock: C,
}

impl<S, C> RegisterWarehouseUseCase<S, C>
where
    S: WarehouseStore,
    C: Clock,
{
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    #[instrument(skip(self, new), fields(business_unit_code = %new.code), err)]
    pub fn register(&self, new: NewWarehouse) -> Result<Warehouse, WarehouseError> {
        let warehouse = Warehouse::register(new, self.clock.now()).map_err(WarehouseError::Domain)?;
        let created = self.store.create(&warehouse)?;
        info!(location = %created.location(), capacity = created.capacity(), "warehouse registered");
        Ok(created)
    }
}

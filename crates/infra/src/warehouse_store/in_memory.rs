use std::collections::HashMap;
use std::sync::RwLock;

use fulfilment_core::BusinessUnitCode;
use fulfilment_warehouses::{StoreError, Warehouse, WarehouseSnapshot, WarehouseStore, admit_write};

/// In-memory warehouse store.
///
/// Intended for tests/dev. The token comparison and the write happen under one
/// write-lock acquisition, which makes `update` a compare-and-swap.
#[derive(Debug, Default)]
pub struct InMemoryWarehouseStore {
    records: RwLock<HashMap<BusinessUnitCode, Warehouse>>,
}

impl InMemoryWarehouseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Administrative reset: drop every record, archived ones included.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        records.clear();
        Ok(())
    }

    pub fn len(&self) -> usize {
        match self.records.read() {
            Ok(records) => records.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WarehouseStore for InMemoryWarehouseStore {
    fn find_by_code(&self, code: &BusinessUnitCode) -> Result<Option<Warehouse>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        Ok(records.get(code).cloned())
    }

    fn create(&self, record: &Warehouse) -> Result<Warehouse, StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        if records.contains_key(record.code()) {
            return Err(StoreError::DuplicateKey(record.code().clone()));
        }

        records.insert(record.code().clone(), record.clone());
        Ok(record.clone())
    }

    fn update(&self, record: &Warehouse) -> Result<Warehouse, StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        let stored = records
            .get(record.code())
            .ok_or_else(|| StoreError::Missing(record.code().clone()))?;

        let next = admit_write(record, stored)?;

        let committed = Warehouse::restore(WarehouseSnapshot {
            version: next,
            ..record.to_snapshot()
        })
        .map_err(|e| StoreError::InvalidData(e.to_string()))?;

        records.insert(committed.code().clone(), committed.clone());
        Ok(committed)
    }
}

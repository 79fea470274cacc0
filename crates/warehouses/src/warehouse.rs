use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fulfilment_core::{
    AggregateRoot, BusinessUnitCode, DomainError, DomainResult, Location, Version,
};

/// Archival dimension of a warehouse's lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarehouseStatus {
    Active,
    /// Terminal. No transition leaves this state.
    Archived,
}

/// Input for registering a new warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWarehouse {
    pub code: BusinessUnitCode,
    pub location: Location,
    pub capacity: u32,
    pub stock: u32,
}

/// Persisted shape of a warehouse, as stores read and write it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseSnapshot {
    pub code: BusinessUnitCode,
    pub location: Location,
    pub capacity: u32,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
    pub version: Version,
}

/// Aggregate root: Warehouse.
///
/// Instances are value copies of a stored row. Mutating one never affects the
/// store or any other reader; changes land only through `WarehouseStore::update`,
/// which compares `version` against the stored token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warehouse {
    code: BusinessUnitCode,
    location: Location,
    capacity: u32,
    stock: u32,
    created_at: DateTime<Utc>,
    archived_at: Option<DateTime<Utc>>,
    version: Version,
}

impl Warehouse {
    /// Build a new active warehouse at the initial version.
    pub fn register(new: NewWarehouse, created_at: DateTime<Utc>) -> DomainResult<Self> {
        let warehouse = Self {
            code: new.code,
            location: new.location,
            capacity: new.capacity,
            stock: new.stock,
            created_at,
            archived_at: None,
            version: Version::INITIAL,
        };
        warehouse.validate()?;
        Ok(warehouse)
    }

    /// Rebuild a warehouse from persisted state.
    ///
    /// Rejects rows that violate record invariants instead of masking them.
    pub fn restore(snapshot: WarehouseSnapshot) -> DomainResult<Self> {
        let warehouse = Self {
            code: snapshot.code,
            location: snapshot.location,
            capacity: snapshot.capacity,
            stock: snapshot.stock,
            created_at: snapshot.created_at,
            archived_at: snapshot.archived_at,
            version: snapshot.version,
        };
        warehouse.validate()?;
        Ok(warehouse)
    }

    pub fn to_snapshot(&self) -> WarehouseSnapshot {
        WarehouseSnapshot {
            code: self.code.clone(),
            location: self.location.clone(),
            capacity: self.capacity,
            stock: self.stock,
            created_at: self.created_at,
            archived_at: self.archived_at,
            version: self.version,
        }
    }

    pub fn code(&self) -> &BusinessUnitCode {
        &self.code
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn archived_at(&self) -> Option<DateTime<Utc>> {
        self.archived_at
    }

    pub fn status(&self) -> WarehouseStatus {
        if self.archived_at.is_some() {
            WarehouseStatus::Archived
        } else {
            WarehouseStatus::Active
        }
    }

    pub fn is_archived(&self) -> bool {
        self.status() == WarehouseStatus::Archived
    }

    /// Transition `Active -> Archived`, stamping `at`.
    ///
    /// Stock, capacity and location are left untouched.
    pub fn archive(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_active()?;
        self.archived_at = Some(at);
        Ok(())
    }

    /// Replace the held quantity.
    pub fn set_stock(&mut self, stock: u32) -> DomainResult<()> {
        self.ensure_active()?;
        if stock > self.capacity {
            return Err(DomainError::invariant(format!(
                "stock {stock} exceeds capacity {}",
                self.capacity
            )));
        }
        self.stock = stock;
        Ok(())
    }

    /// Move the held quantity by `delta` (positive = inbound, negative = outbound).
    pub fn adjust_stock(&mut self, delta: i64) -> DomainResult<()> {
        self.ensure_active()?;
        if delta == 0 {
            return Err(DomainError::validation("delta cannot be zero"));
        }

        let new_stock = i64::from(self.stock) + delta;
        if new_stock < 0 {
            return Err(DomainError::invariant("stock cannot go negative"));
        }
        let new_stock = u32::try_from(new_stock)
            .map_err(|_| DomainError::invariant("stock exceeds representable range"))?;

        self.set_stock(new_stock)
    }

    pub fn change_capacity(&mut self, capacity: u32) -> DomainResult<()> {
        self.ensure_active()?;
        if capacity == 0 {
            return Err(DomainError::validation("capacity must be positive"));
        }
        if capacity < self.stock {
            return Err(DomainError::invariant(format!(
                "capacity {capacity} is below current stock {}",
                self.stock
            )));
        }
        self.capacity = capacity;
        Ok(())
    }

    fn ensure_active(&self) -> DomainResult<()> {
        if self.is_archived() {
            return Err(DomainError::terminal(format!(
                "warehouse {} already archived",
                self.code
            )));
        }
        Ok(())
    }

    fn validate(&self) -> DomainResult<()> {
        if self.capacity == 0 {
            return Err(DomainError::validation("capacity must be positive"));
        }
        // Archived rows are frozen history; the stock bound applies to active ones.
        if !self.is_archived() && self.stock > self.capacity {
            return Err(DomainError::invariant(format!(
                "stock {} exceeds capacity {}",
                self.stock, self.capacity
            )));
        }
        if let Some(archived_at) = self.archived_at
            && archived_at < self.created_at
        {
            return Err(DomainError::invariant("archived_at precedes created_at"));
        }
        Ok(())
    }
}

impl AggregateRoot for Warehouse {
    type Id = BusinessUnitCode;

    fn id(&self) -> &Self::Id {
        &self.code
    }

    fn version(&self) -> Version {
        self.version
    }
}

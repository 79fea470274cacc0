//! Conflict resolution for racing writers on one warehouse.
//!
//! The policy is whole-record optimistic concurrency: a write is admitted only
//! when the writer's token equals the stored token, and every admitted write
//! advances the token by one. Writes touching disjoint fields are not merged;
//! of two writers that read the same version, the first to commit wins and the
//! second receives a conflict. Nothing in this module retries.
//!
//! A matching token is not sufficient on its own: an archived row admits no
//! write at all, and `created_at` is fixed at creation.

use fulfilment_core::{AggregateRoot, BusinessUnitCode, Version};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, WarehouseError};
use crate::warehouse::Warehouse;

/// Details of a rejected stale write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictDetails {
    pub code: BusinessUnitCode,
    /// Token the writer read.
    pub expected: Version,
    /// Token currently stored.
    pub actual: Version,
}

impl core::fmt::Display for ConflictDetails {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "warehouse {} was modified concurrently (expected {}, found {})",
            self.code, self.expected, self.actual
        )
    }
}

/// Decide whether `incoming` may replace `stored`.
///
/// Checks run in order: token, terminal state, immutable fields. Returns the
/// token the committed row must carry.
pub fn admit_write(incoming: &Warehouse, stored: &Warehouse) -> Result<Version, StoreError> {
    if incoming.version() != stored.version() {
        return Err(StoreError::Conflict(ConflictDetails {
            code: stored.code().clone(),
            expected: incoming.version(),
            actual: stored.version(),
        }));
    }
    if stored.is_archived() {
        return Err(StoreError::Terminal(stored.code().clone()));
    }
    if incoming.created_at() != stored.created_at() {
        return Err(StoreError::ImmutableField {
            code: stored.code().clone(),
            field: "created_at",
        });
    }
    stored.version().next().ok_or_else(|| {
        StoreError::InvalidData(format!(
            "version {} of warehouse {} cannot advance",
            stored.version(),
            stored.code()
        ))
    })
}

/// Tagged result of a write that may lose a race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write committed; holds the record as stored.
    Applied(Warehouse),
    /// Another writer committed first.
    Conflicted(ConflictDetails),
}

impl WriteOutcome {
    /// Split a use-case result into a race outcome.
    ///
    /// Only conflicts become `Conflicted`; validation failures such as
    /// `NotFound` or `AlreadyArchived` stay errors.
    pub fn from_result(result: Result<Warehouse, WarehouseError>) -> Result<Self, WarehouseError> {
        match result {
            Ok(warehouse) => Ok(WriteOutcome::Applied(warehouse)),
            Err(WarehouseError::Conflict(details)) => Ok(WriteOutcome::Conflicted(details)),
            Err(other) => Err(other),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, WriteOutcome::Applied(_))
    }

    pub fn applied(&self) -> Option<&Warehouse> {
        match self {
            WriteOutcome::Applied(w) => Some(w),
            WriteOutcome::Conflicted(_) => None,
        }
    }
}

//! Error types for warehouse persistence and use cases.
//!
//! `StoreError` is what a `WarehouseStore` reports; `WarehouseError` is what
//! callers of the use cases see. Conflicts stay distinguishable at both layers.

use fulfilment_core::{BusinessUnitCode, DomainError};
use thiserror::Error;

use crate::concurrency::ConflictDetails;

/// Store operation error.
///
/// ## Error Categories
///
/// - **DuplicateKey**: `create` hit an existing business-unit code
/// - **Conflict**: `update` carried a stale concurrency token
/// - **Missing**: `update` targeted a code that is not stored
/// - **Terminal**: `update` targeted an archived row
/// - **ImmutableField**: `update` tried to rewrite a field fixed at creation
/// - **InvalidData**: a persisted row violates record invariants
/// - **Backend**: transport/driver failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("duplicate business unit code: {0}")]
    DuplicateKey(BusinessUnitCode),

    #[error("{0}")]
    Conflict(ConflictDetails),

    #[error("no stored warehouse for code {0}")]
    Missing(BusinessUnitCode),

    #[error("stored warehouse {0} is archived and read-only")]
    Terminal(BusinessUnitCode),

    #[error("{field} of warehouse {code} cannot change after creation")]
    ImmutableField {
        code: BusinessUnitCode,
        field: &'static str,
    },

    #[error("invalid persisted warehouse data: {0}")]
    InvalidData(String),

    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Use-case error returned to the caller of archive / stock / register.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WarehouseError {
    /// No record under the code. Not retried.
    #[error("warehouse {0} does not exist")]
    NotFound(BusinessUnitCode),

    /// The record is in its terminal state. Not retried.
    #[error("warehouse {0} already archived")]
    AlreadyArchived(BusinessUnitCode),

    #[error("warehouse {0} already exists")]
    DuplicateKey(BusinessUnitCode),

    /// Lost an optimistic-concurrency race. The caller may re-read and retry.
    #[error("{0}")]
    Conflict(ConflictDetails),

    #[error(transparent)]
    Domain(DomainError),

    #[error("{0}")]
    Store(String),
}

impl WarehouseError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, WarehouseError::Conflict(_))
    }

    /// Map a domain rejection for the record under `code`.
    pub(crate) fn from_domain(code: &BusinessUnitCode, err: DomainError) -> Self {
        match err {
            DomainError::Terminal(_) => WarehouseError::AlreadyArchived(code.clone()),
            other => WarehouseError::Domain(other),
        }
    }
}

impl From<StoreError> for WarehouseError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateKey(code) => WarehouseError::DuplicateKey(code),
            StoreError::Conflict(details) => WarehouseError::Conflict(details),
            StoreError::Missing(code) => WarehouseError::NotFound(code),
            StoreError::Terminal(code) => WarehouseError::AlreadyArchived(code),
            err @ StoreError::ImmutableField { .. } => {
                WarehouseError::Domain(DomainError::invariant(err.to_string()))
            }
            other => WarehouseError::Store(other.to_string()),
        }
    }
}

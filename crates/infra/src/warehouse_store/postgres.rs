//! Postgres-backed warehouse store.
//!
//! Expects a `warehouses` table shaped as:
//!
//! ```text
//! business_unit_code TEXT        PRIMARY KEY
//! location           TEXT        NOT NULL
//! capacity           INTEGER     NOT NULL CHECK (capacity > 0)
//! stock              INTEGER     NOT NULL CHECK (stock >= 0)
//! created_at         TIMESTAMPTZ NOT NULL
//! archived_at        TIMESTAMPTZ NULL
//! version            BIGINT      NOT NULL
//! ```
//!
//! Creating and migrating the table is owned elsewhere.
//!
//! ## Optimistic Concurrency
//!
//! `update` is a single statement:
//!
//! ```text
//! UPDATE ... SET ..., version = version + 1
//! WHERE business_unit_code = $1 AND version = $n
//!   AND archived_at IS NULL AND created_at = $m
//! ```
//!
//! `created_at` is never written. Zero affected rows means the code is unknown
//! (`Missing`), another writer advanced the token first (`Conflict`), the row is
//! archived (`Terminal`) or the caller changed `created_at` (`ImmutableField`).
//! A follow-up read classifies the failure with `admit_write`, the same rule the
//! in-memory store applies.
//!
//! The `WarehouseStore` impl blocks on the async methods and therefore needs a
//! multi-threaded tokio runtime; anything else is reported as `Backend`.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) on insert | `23505` | `DuplicateKey` |
//! | Database (check constraint violation) | `23514` | `InvalidData` |
//! | Database (other) / PoolClosed / other | any | `Backend` |

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use std::sync::Arc;
use tracing::{Span, instrument};

use fulfilment_core::{AggregateRoot, BusinessUnitCode, Location, Version};
use fulfilment_warehouses::{
    ConflictDetails, StoreError, Warehouse, WarehouseSnapshot, WarehouseStore, admit_write,
};

/// Postgres-backed warehouse store.
///
/// `Send + Sync`; shares a SQLx connection pool across threads.
#[derive(Debug, Clone)]
pub struct PostgresWarehouseStore {
    pool: Arc<PgPool>,
}

impl PostgresWarehouseStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    #[instrument(skip(self), fields(business_unit_code = %code), err)]
    pub async fn fetch(&self, code: &BusinessUnitCode) -> Result<Option<Warehouse>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                business_unit_code,
                location,
                capacity,
                stock,
                created_at,
                archived_at,
                version
            FROM warehouses
            WHERE business_unit_code = $1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_code", e))?;

        match row {
            Some(row) => {
                let row = WarehouseRow::from_row(&row)
                    .map_err(|e| StoreError::InvalidData(format!("failed to decode warehouse row: {e}")))?;
                Ok(Some(row.into_warehouse()?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, record), fields(business_unit_code = %record.code()), err)]
    pub async fn insert(&self, record: &Warehouse) -> Result<Warehouse, StoreError> {
        let created_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            INSERT INTO warehouses (
                business_unit_code,
                location,
                capacity,
                stock,
                created_at,
                archived_at,
                version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING created_at
            "#,
        )
        .bind(record.code().as_str())
        .bind(record.location().as_str())
        .bind(to_db_int("capacity", record.capacity())?)
        .bind(to_db_int("stock", record.stock())?)
        .bind(record.created_at())
        .bind(record.archived_at())
        .bind(to_db_version(record.version())?)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateKey(record.code().clone())
            } else {
                map_sqlx_error("create", e)
            }
        })?;

        // TIMESTAMPTZ keeps microseconds; hand back what later reads will see.
        Warehouse::restore(WarehouseSnapshot {
            created_at,
            ..record.to_snapshot()
        })
        .map_err(|e| StoreError::InvalidData(e.to_string()))
    }

    #[instrument(
        skip(self, record),
        fields(
            business_unit_code = %record.code(),
            expected_version = %record.version(),
            committed_version = tracing::field::Empty
        ),
        err
    )]
    pub async fn conditional_update(&self, record: &Warehouse) -> Result<Warehouse, StoreError> {
        let committed = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            r#"
            UPDATE warehouses
            SET
                location = $2,
                capacity = $3,
                stock = $4,
                archived_at = $5,
                version = version + 1
            WHERE business_unit_code = $1
              AND version = $6
              AND archived_at IS NULL
              AND created_at = $7
            RETURNING version, created_at
            "#,
        )
        .bind(record.code().as_str())
        .bind(record.location().as_str())
        .bind(to_db_int("capacity", record.capacity())?)
        .bind(to_db_int("stock", record.stock())?)
        .bind(record.archived_at())
        .bind(to_db_version(record.version())?)
        .bind(record.created_at())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        if let Some((version, created_at)) = committed {
            Span::current().record("committed_version", version);
            return Warehouse::restore(WarehouseSnapshot {
                created_at,
                version: from_db_version(version)?,
                ..record.to_snapshot()
            })
            .map_err(|e| StoreError::InvalidData(e.to_string()));
        }

        let stored = self
            .fetch(record.code())
            .await?
            .ok_or_else(|| StoreError::Missing(record.code().clone()))?;
        admit_write(record, &stored)?;

        // The row admits the write now, so it moved between the two statements.
        Err(StoreError::Conflict(ConflictDetails {
            code: record.code().clone(),
            expected: record.version(),
            actual: stored.version(),
        }))
    }
}

impl WarehouseStore for PostgresWarehouseStore {
    // The store trait is synchronous; Postgres access is async.
    fn find_by_code(&self, code: &BusinessUnitCode) -> Result<Option<Warehouse>, StoreError> {
        let handle = runtime_handle()?;
        tokio::task::block_in_place(|| handle.block_on(self.fetch(code)))
    }

    fn create(&self, record: &Warehouse) -> Result<Warehouse, StoreError> {
        let handle = runtime_handle()?;
        tokio::task::block_in_place(|| handle.block_on(self.insert(record)))
    }

    fn update(&self, record: &Warehouse) -> Result<Warehouse, StoreError> {
        let handle = runtime_handle()?;
        tokio::task::block_in_place(|| handle.block_on(self.conditional_update(record)))
    }
}

fn runtime_handle() -> Result<tokio::runtime::Handle, StoreError> {
    let handle = tokio::runtime::Handle::try_current().map_err(|_| {
        StoreError::Backend(
            "PostgresWarehouseStore requires a tokio runtime; call it from within one".to_string(),
        )
    })?;

    // block_in_place panics on a current-thread runtime.
    if handle.runtime_flavor() != tokio::runtime::RuntimeFlavor::MultiThread {
        return Err(StoreError::Backend(
            "PostgresWarehouseStore requires a multi-threaded tokio runtime".to_string(),
        ));
    }

    Ok(handle)
}

#[derive(Debug)]
struct WarehouseRow {
    business_unit_code: String,
    location: String,
    capacity: i32,
    stock: i32,
    created_at: DateTime<Utc>,
    archived_at: Option<DateTime<Utc>>,
    version: i64,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for WarehouseRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(WarehouseRow {
            business_unit_code: row.try_get("business_unit_code")?,
            location: row.try_get("location")?,
            capacity: row.try_get("capacity")?,
            stock: row.try_get("stock")?,
            created_at: row.try_get("created_at")?,
            archived_at: row.try_get("archived_at")?,
            version: row.try_get("version")?,
        })
    }
}

impl WarehouseRow {
    fn into_warehouse(self) -> Result<Warehouse, StoreError> {
        let invalid = |e: fulfilment_core::DomainError| StoreError::InvalidData(e.to_string());

        let snapshot = WarehouseSnapshot {
            code: BusinessUnitCode::parse(&self.business_unit_code).map_err(invalid)?,
            location: Location::parse(&self.location).map_err(invalid)?,
            capacity: from_db_int("capacity", self.capacity)?,
            stock: from_db_int("stock", self.stock)?,
            created_at: self.created_at,
            archived_at: self.archived_at,
            version: from_db_version(self.version)?,
        };
        Warehouse::restore(snapshot).map_err(invalid)
    }
}

fn to_db_int(column: &str, value: u32) -> Result<i32, StoreError> {
    i32::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("{column} {value} does not fit an INTEGER column")))
}

fn from_db_int(column: &str, value: i32) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("negative {column} `{value}` in warehouses.{column}")))
}

fn to_db_version(version: Version) -> Result<i64, StoreError> {
    i64::try_from(version.value())
        .map_err(|_| StoreError::InvalidData(format!("version {version} does not fit a BIGINT column")))
}

fn from_db_version(value: i64) -> Result<Version, StoreError> {
    u64::try_from(value)
        .map(Version::new)
        .map_err(|_| StoreError::InvalidData(format!("negative version `{value}` in warehouses.version")))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23514") => StoreError::InvalidData(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

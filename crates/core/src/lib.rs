//! `fulfilment-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod clock;
pub mod code;
pub mod error;
pub mod value_object;

pub use aggregate::{AggregateRoot, Version};
pub use clock::{Clock, FixedClock, SystemClock};
pub use code::{BusinessUnitCode, Location};
pub use error::{DomainError, DomainResult};
pub use value_object::ValueObject;

//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. A
/// `Location` of `"AMSTERDAM-001"` is the same location wherever it appears,
/// whereas two warehouses with equal fields but different business-unit codes
/// are different entities.
///
/// To "modify" a value object, build a new one (e.g. `Location::parse`).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

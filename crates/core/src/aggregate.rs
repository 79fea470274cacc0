//! Aggregate root trait and the optimistic concurrency token.

use serde::{Deserialize, Serialize};

/// Concurrency token carried by every persisted aggregate.
///
/// Stores advance it by exactly one on every successful write. Domain code never
/// bumps it; a record read at version `n` is written back expecting `n`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// Token assigned to a freshly created record.
    pub const INITIAL: Version = Version(1);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// The token a store assigns after committing a write at `self`.
    ///
    /// `None` once the token space is exhausted.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl core::fmt::Display for Version {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Aggregate root marker + minimal interface.
///
/// This is intentionally small: an identity plus the concurrency token the
/// store compares on write.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Version of the aggregate's persisted state as last read.
    fn version(&self) -> Version;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_strictly_advances() {
        let v = Version::INITIAL;
        assert!(v.next().unwrap() > v);
        assert_eq!(v.next().unwrap().value(), 2);
    }

    #[test]
    fn next_stops_at_the_end_of_the_token_space() {
        assert_eq!(Version::new(u64::MAX).next(), None);
    }
}

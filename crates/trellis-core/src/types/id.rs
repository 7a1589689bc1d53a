//! Newtype wrappers for registry-assigned identifiers.
//!
//! Identifiers are plain sequence numbers handed out by the registry that
//! owns them. Distinct types keep a `RouteId` from being passed where a
//! `RegistrationId` is expected.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Macro to define a newtype ID wrapper around a `u64` sequence number.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Return the inner sequence number.
            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Registration index of a route. Strictly increasing per table.
    RouteId
);

define_id!(
    /// Registration index of a hook callback. Used as the priority tiebreaker.
    RegistrationId
);

/// Monotonic sequence used by registries to assign identifiers.
#[derive(Debug, Default)]
pub struct Sequence {
    next: AtomicU64,
}

impl Sequence {
    /// Creates a sequence starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next value. Values never repeat.
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns how many values were handed out.
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_strictly_increases() {
        let seq = Sequence::new();
        let a = seq.next();
        let b = seq.next();
        let c = seq.next();
        assert!(a < b && b < c);
        assert_eq!(seq.issued(), 3);
    }

    #[test]
    fn test_id_ordering_and_display() {
        assert!(RouteId(1) < RouteId(2));
        assert_eq!(RegistrationId(7).to_string(), "7");
        assert_eq!(serde_json::to_string(&RouteId(4)).unwrap(), "4");
    }
}

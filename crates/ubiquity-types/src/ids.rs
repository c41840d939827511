//! Type-safe identifier wrappers.
//!
//! Engine-minted entities (wavefronts, signals, warrants) carry a numeric
//! id drawn from an [`IdSequence`] owned by the engine that creates them.
//! The sequence is injected rather than global so that two engines built
//! from the same seed produce identical ids.
//!
//! Host-supplied entities (nodes, world objects) are keyed by the string
//! the host chose, wrapped in a newtype so the two namespaces never mix.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Monotonic id generator.
///
/// Each call to [`IdSequence::next_raw`] returns a value strictly greater
/// than the previous one. The typed `next_*` helpers on the id types wrap
/// the raw value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdSequence {
    next: u64,
}

impl IdSequence {
    /// Create a sequence starting at zero.
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Create a sequence whose first value is `start`.
    pub const fn starting_at(start: u64) -> Self {
        Self { next: start }
    }

    /// Return the next raw value and advance the sequence.
    pub const fn next_raw(&mut self) -> u64 {
        let value = self.next;
        self.next = self.next.saturating_add(1);
        value
    }

    /// Peek at the value the next call will return.
    pub const fn peek(&self) -> u64 {
        self.next
    }
}

/// Generates a newtype wrapper around a sequence-assigned `u64`.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub u64);

        impl $name {
            /// Draw the next identifier from the given sequence.
            pub const fn next(seq: &mut IdSequence) -> Self {
                Self(seq.next_raw())
            }

            /// Return the inner numeric value.
            pub const fn into_inner(self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

/// Generates a newtype wrapper around a host-chosen string key.
macro_rules! define_key {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Wrap a host-chosen key.
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Borrow the key as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_owned())
            }
        }
    };
}

define_id! {
    /// Unique identifier for a propagating wavefront.
    WavefrontId, "wf"
}

define_id! {
    /// Unique identifier for a semantic signal.
    SignalId, "signal"
}

define_id! {
    /// Unique identifier for a minted warrant.
    WarrantId, "warrant"
}

define_key! {
    /// Identifier of a scene node (the orchestrator or an agent).
    NodeId
}

define_key! {
    /// Identifier of a world obstacle (wall, lens, mirror, mass).
    ObjectId
}

//! Strongly typed record identifiers.
//!
//! Every identifier wraps the `u64` sequence value handed out by the store
//! for the record's bucket. Zero is reserved for "not yet assigned" so that
//! freshly built drafts and relationship-index sentinels share one encoding.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Identifier value used before the store assigns one.
            pub const UNASSIGNED: Self = Self(0);

            /// Wrap a raw sequence value.
            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Raw sequence value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }

            /// Whether the store has assigned this identifier.
            #[must_use]
            pub const fn is_assigned(self) -> bool {
                self.0 != 0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id! {
    /// Identifier of a [`crate::domain::User`].
    UserId
}

define_id! {
    /// Identifier of a [`crate::domain::Playlist`].
    PlaylistId
}

define_id! {
    /// Identifier of a [`crate::domain::Track`].
    TrackId
}

define_id! {
    /// Identifier of a [`crate::domain::Job`].
    JobId
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn unassigned_is_zero() {
        assert_eq!(UserId::UNASSIGNED.get(), 0);
        assert!(!JobId::default().is_assigned());
        assert!(PlaylistId::new(7).is_assigned());
    }

    #[rstest]
    fn ordering_follows_sequence_value() {
        assert!(TrackId::new(2) < TrackId::new(10));
        assert_eq!(JobId::from(3).to_string(), "3");
    }
}

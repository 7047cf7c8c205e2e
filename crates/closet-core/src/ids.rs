//! Typed ID wrappers providing compile-time safety for entity identifiers.
//!
//! Each ID type is a newtype over `Uuid`, so an [`ImageKey`] can never be
//! passed where a [`ClothingId`] is expected even though both are UUIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Declare a UUID-backed id. `$what` names the id in parse errors.
macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// A fresh random (v4) id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| Error::Validation(format!("invalid {} '{s}': {e}", $what)))
            }
        }
    };
}

typed_id!(
    /// Unique identifier for a catalogued clothing item.
    ClothingId,
    "clothing id"
);

typed_id!(
    /// Unique identifier for a style (outfit).
    StyleId,
    "style id"
);

typed_id!(
    /// Key tying a record to its image payload in the cache and on disk.
    ///
    /// Generated once when the record is created and never reused.
    ImageKey,
    "image key"
);

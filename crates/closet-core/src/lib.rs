//! closet-core: shared ids, errors, configuration, and the wardrobe domain.
//!
//! This crate is the foundational dependency for the other closet crates,
//! providing type-safe identifiers, a unified error type, application
//! configuration, and the headless/hydrated record types that flow through
//! the image hydration layer.

pub mod config;
pub mod error;
pub mod ids;
pub mod wardrobe;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::*;
pub use wardrobe::*;

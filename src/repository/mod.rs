//! Repository façade over the database and the image layer.
//!
//! Callers only ever see hydrated [`Clothing`](closet_core::Clothing) and
//! [`Style`](closet_core::Style) values; headless records and image keys stay
//! behind this boundary.

mod clothing;
mod error;
mod style;

#[cfg(test)]
pub(crate) mod testing;

pub use clothing::ClothingRepository;
pub use error::RepositoryError;
pub use style::StyleRepository;

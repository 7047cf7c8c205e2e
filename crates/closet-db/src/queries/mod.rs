//! Query modules, one per table family.

pub mod clothing;
pub mod styles;

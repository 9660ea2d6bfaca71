//! Algorithm flags and the global constants registry.

pub mod constants;
pub mod flags;

// Re-export key items
pub use constants::{constants, Constants};
pub use flags::*;

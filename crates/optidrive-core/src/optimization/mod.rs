//! Task protocol, status codes and the backend interface.

pub mod backend;
pub mod status;
pub mod task;

// Re-export optimization components
pub use backend::*;
pub use status::*;
pub use task::*;

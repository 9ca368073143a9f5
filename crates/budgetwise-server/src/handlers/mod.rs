//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod ai;
pub mod audit;
pub mod auth;
pub mod budget;
pub mod expenses;

// Re-export all handlers for use in router
pub use ai::*;
pub use audit::*;
pub use auth::*;
pub use budget::*;
pub use expenses::*;

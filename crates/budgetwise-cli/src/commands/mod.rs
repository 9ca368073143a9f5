//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Database setup (init) and shared utilities (open_db)
//! - `engine` - Forecast and analysis commands (train, predict, analyze)
//! - `import` - Expense CSV import
//! - `serve` - Web server command
//! - `status` - Database and model status

pub mod core;
pub mod engine;
pub mod import;
pub mod serve;
pub mod status;

// Re-export command functions for main.rs
pub use core::*;
pub use engine::*;
pub use import::*;
pub use serve::*;
pub use status::*;

//! Bookshelf application library
//!
//! Book catalogue modules plus the bootstrap that wires them to MongoDB and
//! the HTTP server.

pub mod app;
pub mod modules;

/// Re-export commonly used types
pub use modules::*;

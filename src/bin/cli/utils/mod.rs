//! CLI utilities module
//!
//! Shared helpers for CLI commands: validation, display formatting, and
//! error handling.

pub mod display;
pub mod error;
pub mod validation;

pub use display::*;
pub use error::*;
pub use validation::*;

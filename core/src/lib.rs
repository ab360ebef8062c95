//! QSTATE Core Library
//!
//! Core types, traits, and errors for read-only views over queried keyed state.
//! This crate provides the foundation the view implementations build on.

pub mod types;
pub mod traits;
pub mod error;
pub mod config;

pub use types::*;
pub use traits::*;
pub use error::*;
pub use config::*;

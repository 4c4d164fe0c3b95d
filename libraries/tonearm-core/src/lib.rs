//! Tonearm Core
//!
//! Shared domain types for the Tonearm library indexing engine.
//!
//! This crate defines the normalized data model (tracks, albums, artists),
//! scan configuration and progress types, and the core error type used
//! across the workspace. It carries no I/O of its own.

pub mod error;
pub mod types;

pub use error::{CoreError, Result};
pub use types::*;

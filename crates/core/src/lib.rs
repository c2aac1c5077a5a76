//! `tienda-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod schema;

pub use error::{DomainError, DomainResult};
pub use schema::{ColumnSpec, TableSchema};

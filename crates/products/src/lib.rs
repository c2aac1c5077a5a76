//! Products domain module.
//!
//! This crate contains the product entity and its attribute sets, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod product;

pub use product::{NewProduct, Product, ProductChanges, PRODUCTS_SCHEMA};

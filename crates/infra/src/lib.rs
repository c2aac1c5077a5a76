//! Infrastructure layer: persistence gateway implementations.

pub mod store;

pub use store::{InMemoryStore, PostgresStore, ProductStore, StoreError, UserFilter, UserStore};

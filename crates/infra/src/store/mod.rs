//! Persistence gateway: table-level CRUD contracts over `products` and
//! `users`.
//!
//! Each call is atomic with respect to its single entity: an operation either
//! returns the fully-applied entity or a [`StoreError`], never a partially
//! written row. Implementations validate the schema-as-data constraints
//! declared by the entity crates (required, max length, the `price > 0`
//! check) and enforce the unique indexes on `users.username` / `users.email`.

use async_trait::async_trait;
use thiserror::Error;

use tienda_core::DomainError;
use tienda_products::{NewProduct, Product, ProductChanges};
use tienda_users::{NewUser, User, UserChanges};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Persistence failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index rejected the write (names the column).
    #[error("unique constraint violated on {0}")]
    UniqueViolation(String),

    /// A declared schema constraint rejected the write.
    #[error("schema constraint violated on {field}: {message}")]
    Constraint { field: String, message: String },

    /// Underlying storage failure (connection, lock, corrupt row).
    #[error("storage failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Wrap a schema-check failure for a given column.
    pub(crate) fn constraint(field: &str, err: DomainError) -> Self {
        StoreError::Constraint {
            field: field.to_string(),
            message: err.to_string(),
        }
    }
}

/// Gateway over the `products` table.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All rows, ordered by `price` descending.
    async fn find_all(&self) -> Result<Vec<Product>, StoreError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Product>, StoreError>;

    async fn create(&self, attrs: NewProduct) -> Result<Product, StoreError>;

    /// Full-row overwrite of the mutable fields.
    async fn update(
        &self,
        product: &Product,
        changes: ProductChanges,
    ) -> Result<Product, StoreError>;

    /// Hard delete: the row is removed and later lookups miss.
    async fn destroy(&self, product: &Product) -> Result<(), StoreError>;
}

/// Row filter for user listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub role: Option<String>,
}

/// Gateway over the `users` table.
///
/// There is no destroy: users are only ever soft-deleted by updating
/// `isActive`, the row stays retrievable.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Rows matching the filter, ordered by `id` ascending.
    async fn find_all(&self, filter: UserFilter) -> Result<Vec<User>, StoreError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError>;

    /// Advisory pre-check: any row already holding this username OR email.
    async fn find_conflicting(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, StoreError>;

    async fn create(&self, attrs: NewUser) -> Result<User, StoreError>;

    /// Apply the present fields of the change set, leaving the rest intact.
    async fn update(&self, user: &User, changes: UserChanges) -> Result<User, StoreError>;
}

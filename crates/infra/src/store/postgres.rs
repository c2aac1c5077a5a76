//! Postgres-backed persistence gateway (sqlx).
//!
//! The declared schema constraints live in the DDL: `VARCHAR` lengths and
//! `NOT NULL` mirror the entity crates' table schemas, `CHECK (price > 0)`
//! keeps the price invariant, and the unique indexes on `users.username` /
//! `users.email` are the source of truth for uniqueness.
//!
//! ## Error mapping
//!
//! | PostgreSQL error code | `StoreError` | Scenario |
//! |-----------------------|--------------|----------|
//! | `23505` | `UniqueViolation` | duplicate username/email (TOCTOU loser) |
//! | `23514` | `Constraint` | CHECK violation (e.g. `price <= 0`) |
//! | other | `Backend` | connection failures, corrupt rows, ... |

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use tienda_products::{NewProduct, Product, ProductChanges};
use tienda_users::{NewUser, Role, User, UserChanges};

use super::{ProductStore, StoreError, UserFilter, UserStore};
use async_trait::async_trait;

/// Postgres gateway over both tables.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the two tables if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id SERIAL PRIMARY KEY,
                name VARCHAR(100) NOT NULL,
                price NUMERIC(10,2) NOT NULL CHECK (price > 0),
                availability BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id SERIAL PRIMARY KEY,
                username VARCHAR(100) NOT NULL UNIQUE,
                email VARCHAR(100) NOT NULL UNIQUE,
                password VARCHAR(255) NOT NULL,
                role VARCHAR(10) NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            Some("23505") => {
                // Constraint names look like users_username_key.
                let constraint = db.constraint().unwrap_or("unique index");
                let column = if constraint.contains("email") {
                    "email"
                } else if constraint.contains("username") {
                    "username"
                } else {
                    constraint
                };
                return StoreError::UniqueViolation(column.to_string());
            }
            Some("23514") => {
                return StoreError::Constraint {
                    field: db.constraint().unwrap_or("check").to_string(),
                    message: db.message().to_string(),
                };
            }
            _ => {}
        }
    }
    StoreError::Backend(err.to_string())
}

fn row_to_product(row: &PgRow) -> Result<Product, StoreError> {
    Ok(Product {
        id: row.try_get("id").map_err(map_sqlx_error)?,
        name: row.try_get("name").map_err(map_sqlx_error)?,
        price: row.try_get("price").map_err(map_sqlx_error)?,
        availability: row.try_get("availability").map_err(map_sqlx_error)?,
        created_at: row.try_get("created_at").map_err(map_sqlx_error)?,
        updated_at: row.try_get("updated_at").map_err(map_sqlx_error)?,
    })
}

fn row_to_user(row: &PgRow) -> Result<User, StoreError> {
    let role: String = row.try_get("role").map_err(map_sqlx_error)?;
    let role: Role = role
        .parse()
        .map_err(|_| StoreError::Backend(format!("corrupt role value: {role}")))?;

    Ok(User {
        id: row.try_get("id").map_err(map_sqlx_error)?,
        username: row.try_get("username").map_err(map_sqlx_error)?,
        email: row.try_get("email").map_err(map_sqlx_error)?,
        password: row.try_get("password").map_err(map_sqlx_error)?,
        role,
        is_active: row.try_get("is_active").map_err(map_sqlx_error)?,
        created_at: row.try_get("created_at").map_err(map_sqlx_error)?,
        updated_at: row.try_get("updated_at").map_err(map_sqlx_error)?,
    })
}

const PRODUCT_COLUMNS: &str = "id, name, price, availability, created_at, updated_at";
const USER_COLUMNS: &str = "id, username, email, password, role, is_active, created_at, updated_at";

#[async_trait]
impl ProductStore for PostgresStore {
    async fn find_all(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY price DESC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(row_to_product).collect()
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn create(&self, attrs: NewProduct) -> Result<Product, StoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO products (name, price, availability) \
             VALUES ($1, $2, $3) RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&attrs.name)
        .bind(attrs.price)
        .bind(attrs.availability)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row_to_product(&row)
    }

    async fn update(
        &self,
        product: &Product,
        changes: ProductChanges,
    ) -> Result<Product, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE products SET name = $2, price = $3, availability = $4, updated_at = now() \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(product.id)
        .bind(&changes.name)
        .bind(changes.price)
        .bind(changes.availability)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row_to_product(&row)
    }

    async fn destroy(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product.id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn find_all(&self, filter: UserFilter) -> Result<Vec<User>, StoreError> {
        let rows = match filter.role {
            Some(role) => {
                sqlx::query(&format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY id ASC"
                ))
                .bind(role)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(map_sqlx_error)?;

        rows.iter().map(row_to_user).collect()
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_conflicting(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $2 LIMIT 1"
        ))
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn create(&self, attrs: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (username, email, password, role) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(&attrs.username)
        .bind(&attrs.email)
        .bind(&attrs.password)
        .bind(attrs.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row_to_user(&row)
    }

    async fn update(&self, user: &User, changes: UserChanges) -> Result<User, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE users SET \
                username = COALESCE($2, username), \
                email = COALESCE($3, email), \
                role = COALESCE($4, role), \
                is_active = COALESCE($5, is_active), \
                updated_at = now() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(changes.username)
        .bind(changes.email)
        .bind(changes.role.map(|r| r.as_str()))
        .bind(changes.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row_to_user(&row)
    }
}

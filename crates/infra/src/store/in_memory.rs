//! In-memory persistence gateway.
//!
//! Intended for tests/dev. Rows live in `RwLock`-guarded tables with
//! store-assigned auto-increment ids; the schema constraints and unique
//! indexes are checked the same way the Postgres backend enforces them.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use tienda_products::{NewProduct, Product, ProductChanges, PRODUCTS_SCHEMA};
use tienda_users::{NewUser, User, UserChanges, USERS_SCHEMA};

use super::{ProductStore, StoreError, UserFilter, UserStore};

#[derive(Debug)]
struct Table<E> {
    rows: BTreeMap<i32, E>,
    next_id: i32,
}

impl<E> Table<E> {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn assign_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// In-memory gateway over both tables.
#[derive(Debug)]
pub struct InMemoryStore {
    products: RwLock<Table<Product>>,
    users: RwLock<Table<User>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            products: RwLock::new(Table::new()),
            users: RwLock::new(Table::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

/// `CHECK (price > 0)` plus the declared text constraints.
fn check_product_attrs(name: &str, price: Decimal) -> Result<(), StoreError> {
    if let Some(col) = PRODUCTS_SCHEMA.column("name") {
        col.check_text(Some(name))
            .map_err(|e| StoreError::constraint("name", e))?;
    }
    if price <= Decimal::ZERO {
        return Err(StoreError::Constraint {
            field: "price".to_string(),
            message: "el precio debe ser mayor a 0".to_string(),
        });
    }
    Ok(())
}

fn check_user_attrs(username: &str, email: &str, password: &str) -> Result<(), StoreError> {
    for (field, value) in [
        ("username", username),
        ("email", email),
        ("password", password),
    ] {
        if let Some(col) = USERS_SCHEMA.column(field) {
            col.check_text(Some(value))
                .map_err(|e| StoreError::constraint(field, e))?;
        }
    }
    Ok(())
}

/// Unique-index check for `users.username` / `users.email`, ignoring the row
/// being updated.
fn check_user_unique(
    table: &Table<User>,
    username: &str,
    email: &str,
    own_id: Option<i32>,
) -> Result<(), StoreError> {
    for user in table.rows.values() {
        if Some(user.id) == own_id {
            continue;
        }
        if user.username == username {
            return Err(StoreError::UniqueViolation("username".to_string()));
        }
        if user.email == email {
            return Err(StoreError::UniqueViolation("email".to_string()));
        }
    }
    Ok(())
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn find_all(&self) -> Result<Vec<Product>, StoreError> {
        let table = self.products.read().map_err(|_| poisoned())?;
        let mut rows: Vec<Product> = table.rows.values().cloned().collect();
        // Stable sort: ties keep ascending id order.
        rows.sort_by(|a, b| b.price.cmp(&a.price));
        Ok(rows)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Product>, StoreError> {
        let table = self.products.read().map_err(|_| poisoned())?;
        Ok(table.rows.get(&id).cloned())
    }

    async fn create(&self, attrs: NewProduct) -> Result<Product, StoreError> {
        check_product_attrs(&attrs.name, attrs.price)?;

        let mut table = self.products.write().map_err(|_| poisoned())?;
        let now = Utc::now();
        let product = Product {
            id: table.assign_id(),
            name: attrs.name,
            price: attrs.price,
            availability: attrs.availability,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update(
        &self,
        product: &Product,
        changes: ProductChanges,
    ) -> Result<Product, StoreError> {
        check_product_attrs(&changes.name, changes.price)?;

        let mut table = self.products.write().map_err(|_| poisoned())?;
        let row = table
            .rows
            .get_mut(&product.id)
            .ok_or_else(|| StoreError::Backend(format!("product {} vanished", product.id)))?;
        row.apply(&changes);
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn destroy(&self, product: &Product) -> Result<(), StoreError> {
        let mut table = self.products.write().map_err(|_| poisoned())?;
        table.rows.remove(&product.id);
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_all(&self, filter: UserFilter) -> Result<Vec<User>, StoreError> {
        let table = self.users.read().map_err(|_| poisoned())?;
        // BTreeMap iteration already yields ascending ids.
        Ok(table
            .rows
            .values()
            .filter(|u| match &filter.role {
                Some(role) => u.role.as_str() == role,
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        let table = self.users.read().map_err(|_| poisoned())?;
        Ok(table.rows.get(&id).cloned())
    }

    async fn find_conflicting(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, StoreError> {
        let table = self.users.read().map_err(|_| poisoned())?;
        Ok(table
            .rows
            .values()
            .find(|u| u.username == username || u.email == email)
            .cloned())
    }

    async fn create(&self, attrs: NewUser) -> Result<User, StoreError> {
        check_user_attrs(&attrs.username, &attrs.email, &attrs.password)?;

        let mut table = self.users.write().map_err(|_| poisoned())?;
        check_user_unique(&table, &attrs.username, &attrs.email, None)?;

        let now = Utc::now();
        let user = User {
            id: table.assign_id(),
            username: attrs.username,
            email: attrs.email,
            password: attrs.password,
            role: attrs.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User, changes: UserChanges) -> Result<User, StoreError> {
        let mut table = self.users.write().map_err(|_| poisoned())?;

        let mut updated = table
            .rows
            .get(&user.id)
            .cloned()
            .ok_or_else(|| StoreError::Backend(format!("user {} vanished", user.id)))?;
        updated.apply(&changes);
        updated.updated_at = Utc::now();

        check_user_attrs(&updated.username, &updated.email, &updated.password)?;
        check_user_unique(&table, &updated.username, &updated.email, Some(user.id))?;

        table.rows.insert(user.id, updated.clone());
        Ok(updated)
    }
}

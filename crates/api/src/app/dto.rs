use serde::Deserialize;
use serde_json::{json, Value};

use tienda_products::Product;
use tienda_users::User;

/// Query string accepted by `GET /user`.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<String>,
}

pub fn product_to_json(product: &Product) -> Value {
    json!({
        "id": product.id,
        "name": product.name,
        "price": product.price,
        "availability": product.availability,
        "createdAt": product.created_at.to_rfc3339(),
        "updatedAt": product.updated_at.to_rfc3339(),
    })
}

pub fn user_to_json(user: &User) -> Value {
    json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
        "password": user.password,
        "role": user.role.as_str(),
        "isActive": user.is_active,
        "createdAt": user.created_at.to_rfc3339(),
        "updatedAt": user.updated_at.to_rfc3339(),
    })
}

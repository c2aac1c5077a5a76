use std::sync::Arc;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::{json, Value};

use tienda_products::{NewProduct, ProductChanges};

use crate::app::dto;
use crate::app::errors::{ApiError, PRODUCT_DELETED, PRODUCT_NOT_FOUND};
use crate::app::services::AppServices;
use crate::app::validation::{self, body, param, Chain};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route(
            "/:id",
            get(get_product)
                .put(update)
                .patch(toggle_availability)
                .delete(delete_product),
        )
}

fn id_chain() -> Chain {
    param("id").integer("ID no válido")
}

/// Validate and coerce the raw `:id` path segment. Anything that is not a
/// well-formed id is a validation failure, same as a bad body field.
fn parse_id(raw: &str) -> Result<i32, ApiError> {
    validation::run(&[id_chain()], &Value::Null, &[("id", raw)])
        .map_err(ApiError::Validation)?;
    validation::int_param(raw).ok_or_else(|| {
        ApiError::Validation(vec![validation::Violation {
            field: "id".to_string(),
            message: "ID no válido".to_string(),
        }])
    })
}

fn create_chains() -> Vec<Chain> {
    vec![
        body("name")
            .required("El nombre de Producto no puede ir vacio")
            .max_len(100, "El nombre no puede exceder 100 caracteres"),
        body("price")
            .required("El precio de Producto no puede ir vacio")
            .numeric("Valor no válido")
            .gt_zero("Precio no válido"),
        body("availability")
            .optional()
            .boolean("Valor para disponibilidad no válido"),
    ]
}

fn update_chains() -> Vec<Chain> {
    vec![
        body("name")
            .required("El nombre de Producto no puede ir vacio")
            .max_len(100, "El nombre no puede exceder 100 caracteres"),
        body("price")
            .required("El precio de Producto no puede ir vacio")
            .numeric("Valor no válido")
            .gt_zero("Precio no válido"),
        body("availability").boolean("Valor para disponibilidad no válido"),
    ]
}

async fn list(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Value>, ApiError> {
    let products = services.products.find_all().await?;
    let data: Vec<Value> = products.iter().map(dto::product_to_json).collect();
    Ok(Json(json!({ "data": data })))
}

async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let payload = payload.map(|Json(v)| v).unwrap_or(Value::Null);
    validation::run(&create_chains(), &payload, &[]).map_err(ApiError::Validation)?;

    let new_product = NewProduct {
        // validated above: name present and non-blank, price numeric
        name: validation::string_field(&payload, "name").unwrap_or_default(),
        price: validation::decimal_field(&payload, "price").unwrap_or_default(),
        availability: validation::bool_field(&payload, "availability").unwrap_or(true),
    };

    let product = services.products.create(new_product).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": dto::product_to_json(&product) })),
    ))
}

async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&raw_id)?;
    let product = services
        .products
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound(PRODUCT_NOT_FOUND))?;

    Ok(Json(json!({ "data": dto::product_to_json(&product) })))
}

async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Path(raw_id): Path<String>,
    payload: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&raw_id)?;
    let payload = payload.map(|Json(v)| v).unwrap_or(Value::Null);
    validation::run(&update_chains(), &payload, &[]).map_err(ApiError::Validation)?;

    let product = services
        .products
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound(PRODUCT_NOT_FOUND))?;

    // validated above: all three fields present and well-typed
    let changes = ProductChanges {
        name: validation::string_field(&payload, "name").unwrap_or_default(),
        price: validation::decimal_field(&payload, "price").unwrap_or_default(),
        availability: validation::bool_field(&payload, "availability").unwrap_or_default(),
    };

    let updated = services.products.update(&product, changes).await?;
    Ok(Json(json!({ "data": dto::product_to_json(&updated) })))
}

async fn toggle_availability(
    Extension(services): Extension<Arc<AppServices>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&raw_id)?;
    let product = services
        .products
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound(PRODUCT_NOT_FOUND))?;

    let updated = services.products.update(&product, product.toggled()).await?;
    Ok(Json(json!({ "data": dto::product_to_json(&updated) })))
}

async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&raw_id)?;
    let product = services
        .products
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound(PRODUCT_NOT_FOUND))?;

    services.products.destroy(&product).await?;
    Ok(Json(json!({ "message": PRODUCT_DELETED })))
}

use std::sync::Arc;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::{json, Value};

use tienda_infra::UserFilter;
use tienda_users::{NewUser, Role, UserChanges};

use crate::app::dto::{self, ListUsersQuery};
use crate::app::errors::{
    ApiError, IMMUTABLE_FIELDS, USER_CONFLICT, USER_DELETED, USER_NOT_FOUND,
};
use crate::app::services::AppServices;
use crate::app::validation::{self, body, Chain};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_user).put(update).delete(delete_user))
}

/// Non-numeric ids cannot match any row, so they read as "not found"
/// rather than a validation failure.
fn parse_id(raw: &str) -> Result<i32, ApiError> {
    validation::int_param(raw).ok_or(ApiError::NotFound(USER_NOT_FOUND))
}

fn create_chains() -> Vec<Chain> {
    vec![
        body("username")
            .required("El username es obligatorio")
            .max_len(100, "El username no puede exceder 100 caracteres"),
        body("email")
            .required("El email es obligatorio")
            .is_email("El email no es válido")
            .max_len(100, "El email no puede exceder 100 caracteres"),
        body("password")
            .required("El password es obligatorio")
            .max_len(255, "El password no puede exceder 255 caracteres"),
        body("role").optional().one_of(Role::ALL, "Rol no válido"),
    ]
}

fn update_chains() -> Vec<Chain> {
    vec![
        body("username")
            .optional()
            .required("El username no puede ir vacio")
            .max_len(100, "El username no puede exceder 100 caracteres"),
        body("email")
            .optional()
            .is_email("El email no es válido")
            .max_len(100, "El email no puede exceder 100 caracteres"),
        body("role").optional().one_of(Role::ALL, "Rol no válido"),
        body("isActive")
            .optional()
            .boolean("Valor para isActive no válido"),
    ]
}

async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Value>, ApiError> {
    let users = services
        .users
        .find_all(UserFilter { role: query.role })
        .await?;
    let data: Vec<Value> = users.iter().map(dto::user_to_json).collect();
    Ok(Json(json!({ "data": data })))
}

async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let payload = payload.map(|Json(v)| v).unwrap_or(Value::Null);
    validation::run(&create_chains(), &payload, &[]).map_err(ApiError::Validation)?;

    // validated above: username/email/password present, role one of the
    // accepted values when given
    let username = validation::string_field(&payload, "username").unwrap_or_default();
    let email = validation::string_field(&payload, "email").unwrap_or_default();
    let password = validation::string_field(&payload, "password").unwrap_or_default();
    let role = match validation::string_field(&payload, "role") {
        Some(raw) => raw.parse::<Role>().map_err(|_| {
            ApiError::Validation(vec![validation::Violation {
                field: "role".to_string(),
                message: "Rol no válido".to_string(),
            }])
        })?,
        None => Role::default(),
    };

    // Advisory fast path; the unique index remains the source of truth and
    // a concurrent duplicate still maps to the same response.
    if services
        .users
        .find_conflicting(&username, &email)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(USER_CONFLICT));
    }

    let user = services
        .users
        .create(NewUser {
            username,
            email,
            password,
            role,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": dto::user_to_json(&user) })),
    ))
}

async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&raw_id)?;
    let user = services
        .users
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;

    Ok(Json(json!({ "data": dto::user_to_json(&user) })))
}

async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Path(raw_id): Path<String>,
    payload: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&raw_id)?;
    let payload = payload.map(|Json(v)| v).unwrap_or(Value::Null);
    validation::run(&update_chains(), &payload, &[]).map_err(ApiError::Validation)?;

    // Immutable fields are rejected before the row is even looked up.
    if payload.get("id").is_some() || payload.get("password").is_some() {
        return Err(ApiError::ImmutableField(IMMUTABLE_FIELDS));
    }

    let user = services
        .users
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;

    let role = match validation::string_field(&payload, "role") {
        // validated above by the one_of rule
        Some(raw) => Some(raw.parse::<Role>().map_err(|_| {
            ApiError::Validation(vec![validation::Violation {
                field: "role".to_string(),
                message: "Rol no válido".to_string(),
            }])
        })?),
        None => None,
    };

    let changes = UserChanges {
        username: validation::string_field(&payload, "username"),
        email: validation::string_field(&payload, "email"),
        role,
        is_active: validation::bool_field(&payload, "isActive"),
    };

    let updated = services.users.update(&user, changes).await?;
    Ok(Json(json!({ "data": dto::user_to_json(&updated) })))
}

async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&raw_id)?;
    let user = services
        .users
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;

    services
        .users
        .update(&user, UserChanges::deactivated())
        .await?;

    Ok(Json(json!({ "message": USER_DELETED })))
}

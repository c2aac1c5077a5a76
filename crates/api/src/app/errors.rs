use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use tienda_infra::StoreError;

use super::validation::Violation;

pub const PRODUCT_NOT_FOUND: &str = "Producto no encontrado";
pub const PRODUCT_DELETED: &str = "Producto eliminado";
pub const USER_NOT_FOUND: &str = "Usuario no encontrado";
pub const USER_DELETED: &str = "Usuario eliminado";
pub const USER_CONFLICT: &str = "El email o username, ya se encuentran registrados";
pub const IMMUTABLE_FIELDS: &str = "No puedes modificar los campos de id o password";
pub const INTERNAL: &str = "Error inesperado en el servidor";

/// Handler-level error. Every variant maps to exactly one HTTP response,
/// so a handler returning `Result<_, ApiError>` always replies once.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<Violation>),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("{0}")]
    ImmutableField(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(violations) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": violations }))).into_response()
            }
            ApiError::Conflict(message) | ApiError::ImmutableField(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            // Unique violations surface here when the index fires before the
            // advisory lookup saw the duplicate; only the users table carries
            // unique indexes, so the conflict message is the users one.
            ApiError::Store(StoreError::UniqueViolation(_)) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": USER_CONFLICT }))).into_response()
            }
            ApiError::Store(err) => {
                tracing::error!(error = %err, "store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": INTERNAL })),
                )
                    .into_response()
            }
        }
    }
}

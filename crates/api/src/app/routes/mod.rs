use axum::Router;

pub mod products;
pub mod system;
pub mod users;

pub fn router() -> Router {
    Router::new()
        .nest("/products", products::router())
        .nest("/user", users::router())
}

use std::sync::Arc;

use sqlx::PgPool;

use tienda_infra::{InMemoryStore, PostgresStore, ProductStore, UserStore};

/// Shared handler state: one gateway handle per table.
pub struct AppServices {
    pub products: Arc<dyn ProductStore>,
    pub users: Arc<dyn UserStore>,
}

/// Select the persistence backend from the environment.
///
/// `USE_POSTGRES=true` requires `DATABASE_URL`; anything else wires the
/// in-memory gateway (dev/test).
pub async fn build_services() -> AppServices {
    let use_postgres = std::env::var("USE_POSTGRES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_postgres {
        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set when USE_POSTGRES=true");
        let pool = PgPool::connect(&database_url)
            .await
            .expect("failed to connect to Postgres");

        let store = Arc::new(PostgresStore::new(pool));
        store
            .ensure_schema()
            .await
            .expect("failed to prepare database schema");

        tracing::info!("persistence backend: postgres");
        return AppServices {
            products: store.clone(),
            users: store,
        };
    }

    tracing::info!("persistence backend: in-memory");
    let store = Arc::new(InMemoryStore::new());
    AppServices {
        products: store.clone(),
        users: store,
    }
}

// timetrack/backend-api/src/db.rs
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{pooled_connection::bb8::Pool, AsyncPgConnection, SimpleAsyncConnection};

use crate::error_handler::ServiceError;

// Type alias pour le pool de connexions
pub type DbPool = Pool<AsyncPgConnection>;

const SCHEMA_SQL: &str =
    include_str!("../migrations/2024-01-01-000000_create_timetrack_tables/up.sql");

pub async fn create_pool(
    database_url: &str,
    max_size: u32,
) -> Result<DbPool, Box<dyn std::error::Error>> {
    let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    let pool = Pool::builder().max_size(max_size).build(config).await?;

    Ok(pool)
}

/// Applies the bundled migration. Every statement is `IF NOT EXISTS`, so this is safe on every boot.
pub async fn ensure_schema(pool: &DbPool) -> Result<(), ServiceError> {
    let mut conn = pool.get().await?;
    conn.batch_execute(SCHEMA_SQL).await?;
    log::info!("Database schema is up to date");
    Ok(())
}

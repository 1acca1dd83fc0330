use crate::auth_utils::TokenKeys;
use crate::config::AppConfig;
use crate::db::DbPool;

/// Everything a handler needs, built once in `main` and shared through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub tokens: TokenKeys,
}

impl AppState {
    pub fn new(pool: DbPool, config: &AppConfig) -> Self {
        Self {
            pool,
            tokens: TokenKeys::new(&config.jwt.secret, config.jwt.ttl_minutes),
        }
    }
}

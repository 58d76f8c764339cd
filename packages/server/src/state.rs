use std::sync::Arc;

use oaipmh_provider::Repository;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<Repository>,
    /// Database checked by `/health`; absent for in-memory repositories.
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(repository: Repository) -> Self {
        Self {
            repository: Arc::new(repository),
            pool: None,
        }
    }

    #[must_use]
    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }
}

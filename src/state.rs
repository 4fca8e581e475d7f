use std::sync::Arc;

use chemstore_auth::TokenManager;
use chemstore_config::AppConfig;
use chemstore_core::Sanitizer;
use chemstore_db::{BatchExecutor, PgPool, init_db_pool};

use crate::validator::FormValidator;

/// Handles shared by every request. Cloning is cheap; nothing in here is
/// mutated after startup.
#[derive(Clone, Debug)]
pub struct AppState {
    pub batch: BatchExecutor,
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenManager>,
    pub sanitizer: Sanitizer,
    pub validator: FormValidator,
}

impl AppState {
    pub fn new(db: PgPool, config: AppConfig) -> Self {
        let tokens = TokenManager::new(&config.secret_key, &config.jwt);
        Self {
            batch: BatchExecutor::new(db, config.db_timeout),
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            sanitizer: Sanitizer::new(),
            validator: FormValidator,
        }
    }
}

pub async fn init_app_state(config: AppConfig) -> Result<AppState, sqlx::Error> {
    let db = init_db_pool(&config.database_url, config.db_timeout).await?;
    Ok(AppState::new(db, config))
}

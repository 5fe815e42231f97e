use std::{num::NonZeroU32, sync::Arc};

use axum::extract::FromRef;
use lingo_auth::token::TokenManager;
use lingo_dal::Pool;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(app_config: AppConfig, pool: Pool, tokens: TokenManager) -> Self {
        AppState {
            state: Arc::new(AppStateInner {
                pool,
                tokens,
                app_config,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn pool(&self) -> &Pool {
        &self.state.pool
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.state.tokens
    }
}

// validation context of axum-valid extractors
impl FromRef<AppState> for () {
    fn from_ref(_input: &AppState) -> Self {}
}

struct AppStateInner {
    pool: Pool,
    tokens: TokenManager,
    app_config: AppConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub default_page_size: NonZeroU32,
}

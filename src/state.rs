//! Shared application state.

use std::sync::Arc;

use crate::{config::Config, db::DbPool};

/// State shared with every handler via `State` extraction.
///
/// The configuration is loaded once at startup and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }
}

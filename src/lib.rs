pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod storage;

use actix_web::web;
use sqlx::PgPool;

use crate::auth::rate_limit::RateLimiter;
use crate::config::Config;
use crate::storage::FileStore;

/// Shared state handed to every worker.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub files: FileStore,
    pub limiter: RateLimiter,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let files = FileStore::new(&config.media_root, config.max_upload_bytes);
        AppState { pool, config, files, limiter: RateLimiter::default() }
    }

    /// Register app data and routes on an `App`.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.pool.clone()))
            .app_data(web::Data::new(self.config.clone()))
            .app_data(web::Data::new(self.files.clone()))
            .app_data(web::Data::new(self.limiter.clone()))
            .app_data(web::PayloadConfig::new(self.config.max_upload_bytes));
        handlers::configure(cfg);
    }
}

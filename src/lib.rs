//! Book Inventory administration client
//!
//! Signs an admin in against the book inventory REST API and keeps a local
//! copy of the catalog in step with the server while books are created,
//! edited and deleted.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared by every command
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let services = services::Services::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            services: Arc::new(services),
        })
    }
}

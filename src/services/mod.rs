//! Session and collection services

pub mod books;
pub mod navigation;
pub mod session;
pub mod token_store;

use std::sync::Arc;

use crate::{
    api::{ApiClient, AuthApi, BooksApi},
    config::AppConfig,
    error::AppResult,
};

use books::BookSynchronizer;
use navigation::PendingRoute;
use session::SessionManager;
use token_store::{FileTokenStore, TokenStore};

/// Container for all services
pub struct Services {
    pub session: SessionManager,
    pub books: BookSynchronizer,
    pub navigation: Arc<PendingRoute>,
}

impl Services {
    /// Wire the services against the configured API and token file
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let client = Arc::new(ApiClient::new(&config.api)?);
        let tokens = Arc::new(FileTokenStore::new(config.session.resolved_token_path()));
        tracing::debug!("Session file: {}", tokens.path().display());

        Ok(Self::with_parts(
            client.clone(),
            client,
            tokens,
            config.session.keep_token_on_network_error,
        ))
    }

    pub fn with_parts(
        auth: Arc<dyn AuthApi>,
        books: Arc<dyn BooksApi>,
        tokens: Arc<dyn TokenStore>,
        keep_token_on_network_error: bool,
    ) -> Self {
        let navigation = Arc::new(PendingRoute::new());
        let session = SessionManager::new(auth, tokens, navigation.clone())
            .keep_token_on_network_error(keep_token_on_network_error);
        let books = BookSynchronizer::new(books, session.subscribe());
        Self {
            session,
            books,
            navigation,
        }
    }
}

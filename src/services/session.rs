//! Session lifecycle: startup validation, login, registration and logout

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::{
    api::AuthApi,
    error::ApiError,
    models::{AuthResponse, Session},
};

use super::navigation::{Navigator, Route};
use super::token_store::TokenStore;

/// Owns the authentication state of the admin client.
///
/// Failures are never returned to the caller: they end up in
/// [`Session::error`] or, during [`initialize`](Self::initialize), silently
/// reset the session to logged out.
pub struct SessionManager {
    api: Arc<dyn AuthApi>,
    tokens: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    keep_token_on_network_error: bool,
    initialized: AtomicBool,
    state: watch::Sender<Session>,
}

impl SessionManager {
    pub fn new(api: Arc<dyn AuthApi>, tokens: Arc<dyn TokenStore>, navigator: Arc<dyn Navigator>) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            api,
            tokens,
            navigator,
            keep_token_on_network_error: false,
            initialized: AtomicBool::new(false),
            state,
        }
    }

    /// When set, an unreachable API during [`initialize`](Self::initialize)
    /// leaves the stored token in place instead of discarding it.
    pub fn keep_token_on_network_error(mut self, keep: bool) -> Self {
        self.keep_token_on_network_error = keep;
        self
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    /// Validate the persisted token against `/me/`.
    ///
    /// Only the first call does any work; later calls return the current
    /// session unchanged.
    pub async fn initialize(&self) -> Session {
        if self.initialized.swap(true, Ordering::SeqCst) {
            tracing::warn!("Session already initialized, ignoring");
            return self.snapshot();
        }

        let stored = self.tokens.load().unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable session storage: {}", e);
            None
        });

        let Some(token) = stored else {
            tracing::debug!("No stored session");
            self.state.send_modify(|s| {
                s.user = None;
                s.token = None;
                s.loading = false;
            });
            return self.snapshot();
        };

        match self.api.me(&token).await {
            Ok(user) => {
                tracing::info!("Restored session for {}", user.username);
                self.state.send_modify(|s| {
                    s.user = Some(user);
                    s.token = Some(token);
                    s.loading = false;
                });
            }
            Err(e) if e.is_transport() && self.keep_token_on_network_error => {
                tracing::warn!("API unreachable, keeping stored token: {}", e);
                self.state.send_modify(|s| {
                    s.user = None;
                    s.token = None;
                    s.loading = false;
                });
            }
            Err(e) => {
                tracing::info!("Stored session rejected, signing out: {}", e);
                self.forget_token();
                self.state.send_modify(|s| {
                    s.user = None;
                    s.token = None;
                    s.loading = false;
                });
            }
        }

        self.snapshot()
    }

    /// Exchange credentials for a token. On failure `error` holds the
    /// server's `detail` or "Login failed".
    pub async fn login(&self, username: &str, password: &str) {
        self.state.send_modify(|s| s.error = None);

        match self.api.login(username, password).await {
            Ok(auth) => self.establish(auth),
            Err(e) => {
                tracing::warn!("Login failed for {}: {}", username, e);
                let message = e.detail().unwrap_or("Login failed").to_string();
                self.state.send_modify(|s| s.error = Some(message));
            }
        }
    }

    /// Create an account and sign in with it
    pub async fn register(&self, username: &str, password: &str) {
        self.state.send_modify(|s| s.error = None);

        match self.api.register(username, password).await {
            Ok(auth) => self.establish(auth),
            Err(e) => {
                tracing::warn!("Registration failed for {}: {}", username, e);
                let message = match &e {
                    ApiError::Validation { errors, .. } => errors.to_string(),
                    other => other.detail().unwrap_or("Registration failed").to_string(),
                };
                self.state.send_modify(|s| s.error = Some(message));
            }
        }
    }

    pub fn logout(&self) {
        self.forget_token();
        self.state.send_modify(|s| {
            s.user = None;
            s.token = None;
        });
        tracing::info!("Signed out");
        self.navigator.navigate(Route::Login);
    }

    fn establish(&self, auth: AuthResponse) {
        if let Err(e) = self.tokens.save(&auth.access) {
            tracing::warn!("Could not persist session token: {}", e);
        }
        tracing::info!("Signed in as {}", auth.user.username);
        self.state.send_modify(|s| {
            s.user = Some(auth.user);
            s.token = Some(auth.access);
            s.loading = false;
            s.error = None;
        });
        self.navigator.navigate(Route::Books);
    }

    fn forget_token(&self) {
        if let Err(e) = self.tokens.clear() {
            tracing::warn!("Could not remove stored session token: {}", e);
        }
    }
}

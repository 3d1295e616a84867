//! Navigation triggers emitted by the session lifecycle

use std::sync::Mutex;

/// Views the session can send the admin to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Books,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Books => "/books",
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Remembers the last requested route until the front end renders it
#[derive(Debug, Default)]
pub struct PendingRoute {
    route: Mutex<Option<Route>>,
}

impl PendingRoute {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the pending route, leaving none
    pub fn take(&self) -> Option<Route> {
        self.route.lock().unwrap_or_else(|p| p.into_inner()).take()
    }
}

impl Navigator for PendingRoute {
    fn navigate(&self, route: Route) {
        tracing::debug!("Navigating to {}", route.path());
        *self.route.lock().unwrap_or_else(|p| p.into_inner()) = Some(route);
    }
}

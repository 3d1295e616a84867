//! Client-side authentication state

use super::user::UserProfile;

/// Authentication state observed by views.
///
/// `user` is only ever set alongside a `token` that the API accepted during
/// this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: Option<UserProfile>,
    pub token: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }
}

impl Default for Session {
    /// Empty session, still loading until the stored token has been checked
    fn default() -> Self {
        Self {
            user: None,
            token: None,
            loading: true,
            error: None,
        }
    }
}

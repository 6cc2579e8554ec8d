use super::user::User;
use secrecy::{ExposeSecret, Secret};

/// Current signed-in identity: token, profile, permission tags.
///
/// `token` and `user` are set and cleared together. `permissions` may be
/// `None` while the user is known but permissions have not been fetched.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub token: Option<Secret<String>>,
    pub user: Option<User>,
    pub permissions: Option<Vec<String>>,
}

impl Session {
    pub fn new(token: String, user: User, permissions: Option<Vec<String>>) -> Self {
        Self {
            token: Some(Secret::new(token)),
            user: Some(user),
            permissions,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.expose_secret().as_str())
    }

    /// Both halves of the credential are present.
    pub fn is_complete(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub fn has_permission(&self, tag: &str) -> bool {
        self.permissions
            .as_deref()
            .map(|perms| perms.iter().any(|p| p == tag))
            .unwrap_or(false)
    }
}

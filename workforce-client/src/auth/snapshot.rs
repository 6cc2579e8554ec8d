use crate::config::AccessSettings;
use crate::models::{Session, User};

/// Immutable view of the authentication state handed to consumers.
#[derive(Debug, Clone)]
pub struct AuthSnapshot {
    pub session: Session,
    /// A sign-in, sign-up or server refresh is running.
    pub busy: bool,
    /// Startup has not finished reconciling the cached session.
    pub initializing: bool,
    /// Message from the last failed user-facing operation.
    pub error: Option<String>,
    // Operations currently holding `busy`.
    pub(crate) in_flight: usize,
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self {
            session: Session::default(),
            busy: false,
            initializing: true,
            error: None,
            in_flight: 0,
        }
    }
}

impl AuthSnapshot {
    pub fn token(&self) -> Option<&str> {
        self.session.token()
    }

    pub fn user(&self) -> Option<&User> {
        self.session.user.as_ref()
    }

    pub fn permissions(&self) -> Option<&[String]> {
        self.session.permissions.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_complete()
    }

    pub fn has_permission(&self, tag: &str) -> bool {
        self.session.has_permission(tag)
    }

    /// Privileged role AND the baseline permission tag. Either one alone is
    /// not enough.
    pub fn is_elevated(&self, policy: &ElevationPolicy) -> bool {
        let role_ok = self
            .user()
            .map(|user| policy.roles.iter().any(|role| user.has_role(role)))
            .unwrap_or(false);

        role_ok && self.has_permission(&policy.baseline_permission)
    }
}

/// Roles treated as privileged plus the permission tag they must also hold.
#[derive(Debug, Clone)]
pub struct ElevationPolicy {
    pub roles: Vec<String>,
    pub baseline_permission: String,
}

impl From<&AccessSettings> for ElevationPolicy {
    fn from(settings: &AccessSettings) -> Self {
        Self {
            roles: settings.elevated_roles.clone(),
            baseline_permission: settings.baseline_permission.clone(),
        }
    }
}

impl Default for ElevationPolicy {
    fn default() -> Self {
        Self::from(&AccessSettings::default())
    }
}

//! Authentication state container shared by every screen.
//!
//! State lives in a `watch` channel: consumers read immutable
//! [`AuthSnapshot`]s and change them only through the provider's
//! operations. Each update is applied in one `send_modify`, so no reader
//! sees a half-applied transition.

use super::error::AuthError;
use super::snapshot::{AuthSnapshot, ElevationPolicy};
use crate::models::{Session, User};
use crate::services::{
    AuthApi, LoginResponse, SecureStore, SessionStore, SignUpRequest, StoreError,
};
use client_core::error::ApiError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct AuthProvider {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn AuthApi>,
    sessions: SessionStore,
    policy: ElevationPolicy,
    state: watch::Sender<AuthSnapshot>,
    initialized: AtomicBool,
    // Held for the duration of a sign-in or sign-up.
    sign_in: Mutex<()>,
}

/// Releases one in-flight operation (and optionally `initializing`) when
/// dropped, on every exit path including cancellation. `busy` stays set
/// while any other operation is still running.
struct BusyGuard<'a> {
    state: &'a watch::Sender<AuthSnapshot>,
    finishes_init: bool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let finishes_init = self.finishes_init;
        self.state.send_modify(|s| {
            s.in_flight = s.in_flight.saturating_sub(1);
            s.busy = s.in_flight > 0;
            if finishes_init {
                s.initializing = false;
            }
        });
    }
}

fn enter_busy(s: &mut AuthSnapshot) {
    s.in_flight += 1;
    s.busy = true;
}

impl AuthProvider {
    pub fn new(
        api: Arc<dyn AuthApi>,
        store: Arc<dyn SecureStore>,
        policy: ElevationPolicy,
    ) -> Self {
        let (state, _) = watch::channel(AuthSnapshot::default());

        Self {
            inner: Arc::new(Inner {
                api,
                sessions: SessionStore::new(store),
                policy,
                state,
                initialized: AtomicBool::new(false),
                sign_in: Mutex::new(()),
            }),
        }
    }

    /// Current state.
    pub fn snapshot(&self) -> AuthSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.inner.state.subscribe()
    }

    pub fn policy(&self) -> &ElevationPolicy {
        &self.inner.policy
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    pub fn is_elevated(&self) -> bool {
        self.inner.state.borrow().is_elevated(&self.inner.policy)
    }

    fn update(&self, f: impl FnOnce(&mut AuthSnapshot)) {
        self.inner.state.send_modify(f);
    }

    fn busy(&self, finishes_init: bool) -> BusyGuard<'_> {
        self.update(enter_busy);
        BusyGuard {
            state: &self.inner.state,
            finishes_init,
        }
    }

    /// The session still carries `token`, i.e. nobody signed out or in
    /// while a request using it was outstanding.
    fn holds_token(&self, token: &str) -> bool {
        self.inner.state.borrow().token() == Some(token)
    }

    /// Load the persisted session and reconcile it with the server.
    ///
    /// Only the first call does anything. A cached token and user are
    /// published immediately; profile and permissions are then refreshed
    /// on a background task whose handle is returned.
    pub async fn initialize(&self) -> Option<JoinHandle<()>> {
        if self.inner.initialized.swap(true, Ordering::SeqCst) {
            tracing::debug!("Auth provider already initialized");
            return None;
        }

        let cached = match self.inner.sessions.load().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted session; starting signed out");
                if matches!(e, StoreError::Corrupt { .. }) {
                    report_store_error(self.inner.sessions.clear().await);
                }
                Session::default()
            }
        };

        let token = match cached.token() {
            Some(token) if cached.user.is_some() => token.to_string(),
            _ => {
                self.update(|s| {
                    s.session = Session::default();
                    s.initializing = false;
                });
                return None;
            }
        };

        // Seed from cache and mark busy in the same update.
        self.update(|s| {
            s.session = cached;
            enter_busy(s);
        });
        tracing::info!("Restored cached session; refreshing from server");

        let provider = self.clone();
        Some(tokio::spawn(async move {
            let _busy = BusyGuard {
                state: &provider.inner.state,
                finishes_init: true,
            };
            provider.reconcile(&token).await;
        }))
    }

    /// Re-fetch profile and permissions for the current session. Does
    /// nothing when signed out.
    pub async fn refresh(&self) {
        let token = match self.snapshot().token() {
            Some(token) => token.to_string(),
            None => return,
        };

        let _busy = self.busy(false);
        self.reconcile(&token).await;
    }

    /// Fail-open on transient errors, fail-closed on 401/403.
    async fn reconcile(&self, token: &str) {
        let api = &self.inner.api;

        let result = async {
            let user = api.fetch_profile(token).await?;
            if !self.holds_token(token) {
                return Ok(());
            }
            self.update(|s| s.session.user = Some(user.clone()));
            report_store_error(self.inner.sessions.save_user(&user).await);

            let permissions = api.fetch_permissions(token).await?;
            if !self.holds_token(token) {
                return Ok(());
            }
            self.update(|s| s.session.permissions = Some(permissions.clone()));
            report_store_error(self.inner.sessions.save_permissions(&permissions).await);

            Ok::<(), ApiError>(())
        }
        .await;

        match result {
            Ok(()) => tracing::debug!("Session refreshed from server"),
            Err(e) if e.is_auth_rejection() => {
                if self.holds_token(token) {
                    tracing::info!("Server rejected cached session; signing out");
                    self.clear_session().await;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session refresh failed; keeping cached session")
            }
        }
    }

    /// Authenticate with email and password.
    ///
    /// Permission lookup failures after a successful login leave the user
    /// signed in with no permissions. A failed login signs out, records the
    /// message in `error` and returns the error.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let _exclusive = self
            .inner
            .sign_in
            .try_lock()
            .map_err(|_| AuthError::SignInInProgress)?;

        self.update(|s| s.error = None);
        let _busy = self.busy(false);

        match self.inner.api.login(email, password).await {
            Ok(LoginResponse { token, user }) => {
                self.establish(token, user).await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sign-in failed");
                let message = e.user_message();
                self.clear_session().await;
                self.update(|s| s.error = Some(message));
                Err(e.into())
            }
        }
    }

    /// Register a new account and sign in with the returned session.
    ///
    /// A failure records `error` but leaves any existing session alone.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<(), AuthError> {
        let _exclusive = self
            .inner
            .sign_in
            .try_lock()
            .map_err(|_| AuthError::SignInInProgress)?;

        self.update(|s| s.error = None);
        let _busy = self.busy(false);

        match self.inner.api.sign_up(&request).await {
            Ok(response) => {
                self.establish(response.token, response.user).await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sign-up failed");
                let message = e.user_message();
                self.update(|s| s.error = Some(message));
                Err(e.into())
            }
        }
    }

    /// Ask the server to send a reset link. Returns the server's message.
    pub async fn forgot_password(&self, email: &str) -> Result<String, AuthError> {
        self.update(|s| s.error = None);
        let _busy = self.busy(false);

        self.inner.api.forgot_password(email).await.map_err(|e| {
            let message = e.user_message();
            self.update(|s| s.error = Some(message));
            e.into()
        })
    }

    /// Drop the session locally and from storage. No server call.
    pub async fn sign_out(&self) {
        self.clear_session().await;
        self.update(|s| s.error = None);
        tracing::info!("User signed out");
    }

    async fn establish(&self, token: String, user: User) {
        tracing::info!(user_id = %user.id, "User signed in");

        self.update(|s| {
            s.session = Session::new(token.clone(), user.clone(), None);
        });
        report_store_error(self.inner.sessions.save_token(&token).await);
        report_store_error(self.inner.sessions.save_user(&user).await);

        let token = self.snapshot().token().map(str::to_string);
        let Some(token) = token else { return };

        let permissions = match self.inner.api.fetch_permissions(&token).await {
            Ok(permissions) => permissions,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch permissions; continuing without");
                Vec::new()
            }
        };

        if self.holds_token(&token) {
            self.update(|s| s.session.permissions = Some(permissions.clone()));
            report_store_error(self.inner.sessions.save_permissions(&permissions).await);
        }
    }

    async fn clear_session(&self) {
        self.update(|s| s.session = Session::default());
        if let Err(e) = self.inner.sessions.clear().await {
            tracing::error!(error = %e, "Failed to clear persisted session");
        }
    }
}

/// Storage writes are best effort: the in-memory session stays
/// authoritative for this run.
fn report_store_error(result: Result<(), StoreError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Failed to persist session");
    }
}

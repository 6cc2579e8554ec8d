#![allow(dead_code)]

use async_trait::async_trait;
use client_core::error::ApiError;
use client_core::reqwest::StatusCode;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use workforce_client::auth::{AuthProvider, ElevationPolicy};
use workforce_client::models::{Session, User};
use workforce_client::services::{
    AuthApi, LoginResponse, MemoryStore, SecureStore, SessionStore, SignUpRequest, SignUpResponse,
    StoreError,
};

pub const CACHED_TOKEN: &str = "cached-token";
pub const FRESH_TOKEN: &str = "fresh-token";

pub fn user(id: i64, email: &str, role: &str) -> User {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "email": email,
        "name": "Test User",
        "role": role,
    }))
    .expect("valid user")
}

pub fn tags(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

/// Scripted outcome of one fake backend call.
#[derive(Clone)]
pub enum Reply<T> {
    Ok(T),
    Status(u16, Option<&'static str>),
    /// Response body that does not decode.
    Garbled,
}

impl<T: Clone> Reply<T> {
    fn result(&self) -> Result<T, ApiError> {
        match self {
            Reply::Ok(value) => Ok(value.clone()),
            Reply::Status(code, message) => Err(ApiError::from_status(
                StatusCode::from_u16(*code).expect("valid status"),
                message.map(str::to_string),
            )),
            Reply::Garbled => Err(ApiError::Decode(
                serde_json::from_str::<serde_json::Value>("{oops").unwrap_err(),
            )),
        }
    }
}

/// In-process stand-in for the backend.
pub struct FakeAuthApi {
    pub login: Mutex<Reply<(String, User)>>,
    pub profile: Mutex<Reply<User>>,
    pub permissions: Mutex<Reply<Vec<String>>>,
    pub sign_up: Mutex<Reply<(String, User)>>,
    pub forgot_password: Mutex<Reply<String>>,
    pub calls: Mutex<Vec<&'static str>>,
    holds: Mutex<HashMap<&'static str, Arc<Notify>>>,
}

impl Default for FakeAuthApi {
    fn default() -> Self {
        Self {
            login: Mutex::new(Reply::Status(500, None)),
            profile: Mutex::new(Reply::Status(500, None)),
            permissions: Mutex::new(Reply::Status(500, None)),
            sign_up: Mutex::new(Reply::Status(500, None)),
            forgot_password: Mutex::new(Reply::Status(500, None)),
            calls: Mutex::new(Vec::new()),
            holds: Mutex::new(HashMap::new()),
        }
    }
}

impl FakeAuthApi {
    pub fn set_login(&self, reply: Reply<(String, User)>) {
        *self.login.lock().unwrap() = reply;
    }

    pub fn set_profile(&self, reply: Reply<User>) {
        *self.profile.lock().unwrap() = reply;
    }

    pub fn set_permissions(&self, reply: Reply<Vec<String>>) {
        *self.permissions.lock().unwrap() = reply;
    }

    pub fn set_sign_up(&self, reply: Reply<(String, User)>) {
        *self.sign_up.lock().unwrap() = reply;
    }

    pub fn set_forgot_password(&self, reply: Reply<String>) {
        *self.forgot_password.lock().unwrap() = reply;
    }

    /// Make `login` and `fetch_profile` wait until the returned handle is
    /// notified (one permit per held call).
    pub fn hold_requests(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        let mut holds = self.holds.lock().unwrap();
        holds.insert("login", gate.clone());
        holds.insert("profile", gate.clone());
        gate
    }

    /// Gate a single kind of call on its own handle.
    pub fn hold(&self, call: &'static str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.holds.lock().unwrap().insert(call, gate.clone());
        gate
    }

    /// Resolves once `call` has been issued at least once.
    pub async fn called(&self, call: &'static str) {
        while !self.calls().contains(&call) {
            tokio::task::yield_now().await;
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    async fn enter(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
        let gate = self.holds.lock().unwrap().get(call).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn login(&self, _email: &str, _password: &str) -> Result<LoginResponse, ApiError> {
        self.enter("login").await;
        let (token, user) = self.login.lock().unwrap().result()?;
        Ok(LoginResponse { token, user })
    }

    async fn fetch_profile(&self, _token: &str) -> Result<User, ApiError> {
        self.enter("profile").await;
        self.profile.lock().unwrap().result()
    }

    async fn fetch_permissions(&self, _token: &str) -> Result<Vec<String>, ApiError> {
        self.enter("permissions").await;
        self.permissions.lock().unwrap().result()
    }

    async fn sign_up(&self, _request: &SignUpRequest) -> Result<SignUpResponse, ApiError> {
        self.enter("sign_up").await;
        let (token, user) = self.sign_up.lock().unwrap().result()?;
        Ok(SignUpResponse { user, token })
    }

    async fn forgot_password(&self, _email: &str) -> Result<String, ApiError> {
        self.enter("forgot_password").await;
        self.forgot_password.lock().unwrap().result()
    }
}

/// Memory store whose writes and deletes can be switched to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io {
                path: PathBuf::from("flaky-store"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SecureStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.check()?;
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.inner.delete(key).await
    }
}

/// Provider over an arbitrary store, with a fresh fake backend.
pub fn provider_over(store: Arc<dyn SecureStore>) -> (Arc<FakeAuthApi>, AuthProvider) {
    let api = Arc::new(FakeAuthApi::default());
    let provider = AuthProvider::new(api.clone(), store, ElevationPolicy::default());
    (api, provider)
}

pub struct TestHarness {
    pub api: Arc<FakeAuthApi>,
    pub store: Arc<MemoryStore>,
    pub provider: AuthProvider,
}

impl TestHarness {
    pub fn new() -> Self {
        let api = Arc::new(FakeAuthApi::default());
        let store = Arc::new(MemoryStore::new());
        let provider = AuthProvider::new(api.clone(), store.clone(), ElevationPolicy::default());

        Self {
            api,
            store,
            provider,
        }
    }

    /// Harness whose store already holds a signed-in session.
    pub async fn with_cached_session(user: User, permissions: Vec<String>) -> Self {
        let harness = Self::new();
        harness
            .sessions()
            .save(&Session::new(CACHED_TOKEN.to_string(), user, Some(permissions)))
            .await
            .expect("seed store");
        harness
    }

    pub fn sessions(&self) -> SessionStore {
        SessionStore::new(self.store.clone())
    }

    pub async fn persisted(&self) -> Session {
        self.sessions().load().await.expect("readable store")
    }

    pub async fn stored_keys(&self) -> usize {
        let mut count = 0;
        for key in ["token", "user", "permissions"] {
            if self.store.get(key).await.unwrap().is_some() {
                count += 1;
            }
        }
        count
    }
}

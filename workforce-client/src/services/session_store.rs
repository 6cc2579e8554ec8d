use super::store::{SecureStore, StoreError};
use crate::models::{Session, User};
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const PERMISSIONS_KEY: &str = "permissions";

/// Persists the session triple under fixed keys in a [`SecureStore`].
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn SecureStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn SecureStore>) -> Self {
        Self { store }
    }

    /// Read whatever was persisted. Missing keys come back as `None`.
    pub async fn load(&self) -> Result<Session, StoreError> {
        let token = self.store.get(TOKEN_KEY).await?;
        let user = self
            .store
            .get(USER_KEY)
            .await?
            .map(|raw| decode::<User>(USER_KEY, &raw))
            .transpose()?;
        let permissions = self
            .store
            .get(PERMISSIONS_KEY)
            .await?
            .map(|raw| decode::<Option<Vec<String>>>(PERMISSIONS_KEY, &raw))
            .transpose()?
            .flatten();

        Ok(Session {
            token: token.map(Secret::new),
            user,
            permissions,
        })
    }

    pub async fn save_token(&self, token: &str) -> Result<(), StoreError> {
        self.store.set(TOKEN_KEY, token.to_string()).await
    }

    pub async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        self.store.set(USER_KEY, encode(USER_KEY, user)?).await
    }

    pub async fn save_permissions(&self, permissions: &[String]) -> Result<(), StoreError> {
        self.store
            .set(PERMISSIONS_KEY, encode(PERMISSIONS_KEY, permissions)?)
            .await
    }

    /// Write every populated part of `session`.
    pub async fn save(&self, session: &Session) -> Result<(), StoreError> {
        if let Some(token) = &session.token {
            self.save_token(token.expose_secret()).await?;
        }
        if let Some(user) = &session.user {
            self.save_user(user).await?;
        }
        if let Some(permissions) = &session.permissions {
            self.save_permissions(permissions).await?;
        }
        Ok(())
    }

    /// Remove all three keys. Every delete is attempted; the first failure
    /// is reported.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let mut first_error = None;
        for key in [TOKEN_KEY, USER_KEY, PERMISSIONS_KEY] {
            if let Err(e) = self.store.delete(key).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

fn decode<T: serde::de::DeserializeOwned>(key: &str, raw: &str) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|source| StoreError::Corrupt {
        what: key.to_string(),
        source,
    })
}

fn encode<T: serde::Serialize + ?Sized>(key: &str, value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|source| StoreError::Corrupt {
        what: key.to_string(),
        source,
    })
}

use crate::services::StoreError;
use client_core::error::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("A sign-in is already in progress")]
    SignInInProgress,
}

impl AuthError {
    /// Message to show the user: the server's own text when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }

    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, AuthError::Api(err) if err.is_auth_rejection())
    }
}

//! Client SDK for the workforce scheduling backend: authentication state,
//! persisted sessions and headless selection dialogs.
pub mod auth;
pub mod config;
pub mod models;
pub mod select;
pub mod services;

use auth::{AuthProvider, ElevationPolicy};
use config::Settings;
use services::{AuthClient, FileStore};
use std::sync::Arc;

/// Build a provider talking to the configured backend and persisting the
/// session in the configured file.
pub fn build_auth_provider(settings: &Settings) -> anyhow::Result<AuthProvider> {
    let api = AuthClient::new(settings.api.clone())
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;
    let store = FileStore::new(settings.session.store_path.clone());

    Ok(AuthProvider::new(
        Arc::new(api),
        Arc::new(store),
        ElevationPolicy::from(&settings.access),
    ))
}

mod common;

use common::{provider_over, tags, user, Reply, FRESH_TOKEN};
use std::sync::Arc;
use tempfile::TempDir;
use workforce_client::models::Session;
use workforce_client::services::{FileStore, SecureStore, SessionStore, StoreError};

fn store_in(dir: &TempDir) -> FileStore {
    FileStore::new(dir.path().join("state").join("session.json"))
}

#[tokio::test]
async fn session_survives_a_new_store_instance() {
    let dir = TempDir::new().unwrap();
    let session = Session::new(
        "tok".into(),
        user(7, "ana@example.com", "manager"),
        Some(tags(&["users", "events"])),
    );
    SessionStore::new(Arc::new(store_in(&dir)))
        .save(&session)
        .await
        .unwrap();

    let restored = SessionStore::new(Arc::new(store_in(&dir)))
        .load()
        .await
        .unwrap();

    assert_eq!(restored.token(), Some("tok"));
    assert_eq!(restored.user.unwrap().email, "ana@example.com");
    assert_eq!(restored.permissions, Some(tags(&["users", "events"])));
}

#[tokio::test]
async fn clearing_every_key_removes_the_file() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(store_in(&dir));
    let sessions = SessionStore::new(store.clone());
    sessions
        .save(&Session::new("tok".into(), user(1, "a@b.c", "staff"), None))
        .await
        .unwrap();
    assert!(store.path().exists());

    sessions.clear().await.unwrap();

    assert!(!store.path().exists());
    assert!(sessions.load().await.unwrap().token.is_none());
}

#[cfg(unix)]
#[tokio::test]
async fn file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.set("token", "tok".into()).await.unwrap();

    let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[tokio::test]
async fn corrupt_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(store.path(), b"not json").unwrap();

    let err = store.get("token").await.unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));
}

#[tokio::test]
async fn deleting_a_missing_key_is_fine() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    store.delete("token").await.unwrap();
    assert!(!store.path().exists());
}

#[tokio::test]
async fn writing_over_a_corrupt_file_replaces_it() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(store.path(), b"not json").unwrap();

    store.set("token", "tok".into()).await.unwrap();

    assert_eq!(store.get("token").await.unwrap().as_deref(), Some("tok"));
}

#[tokio::test]
async fn sign_in_recovers_from_a_corrupt_session_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state").join("session.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"not json").unwrap();

    let (api, provider) = provider_over(Arc::new(FileStore::new(&path)));
    api.set_login(Reply::Ok((FRESH_TOKEN.to_string(), user(4, "fix@example.com", "staff"))));
    api.set_permissions(Reply::Ok(tags(&["events"])));

    assert!(provider.initialize().await.is_none());
    assert!(!provider.is_authenticated());
    provider.sign_in("fix@example.com", "pw").await.unwrap();

    let restored = SessionStore::new(Arc::new(FileStore::new(&path)))
        .load()
        .await
        .unwrap();
    assert_eq!(restored.token(), Some(FRESH_TOKEN));
    assert_eq!(restored.user.unwrap().email, "fix@example.com");
    assert_eq!(restored.permissions, Some(tags(&["events"])));

    provider.sign_out().await;
    assert!(!path.exists());
}

#[tokio::test]
async fn sign_out_removes_a_corrupt_session_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, b"{truncated").unwrap();

    let (_api, provider) = provider_over(Arc::new(FileStore::new(&path)));
    provider.sign_out().await;

    assert!(!path.exists());
}

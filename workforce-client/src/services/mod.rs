pub mod auth_client;
pub mod session_store;
pub mod store;

pub use auth_client::{AuthApi, AuthClient, LoginResponse, SignUpRequest, SignUpResponse};
pub use session_store::SessionStore;
pub use store::{FileStore, MemoryStore, SecureStore, StoreError};

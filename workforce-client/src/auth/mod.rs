pub mod error;
pub mod provider;
pub mod snapshot;

pub use error::AuthError;
pub use provider::AuthProvider;
pub use snapshot::{AuthSnapshot, ElevationPolicy};

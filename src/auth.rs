//! Credentials, redacted secrets, and the bearer-token store.

pub mod credentials;
pub mod id;
pub mod secret;
pub mod store;

pub use credentials::*;
pub use id::*;
pub use secret::*;
pub use store::*;

pub mod credential;
pub mod store;

pub use credential::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use store::{Session, SessionStatus, SessionStore};

//! `offerdesk-auth`: session state and its storage backends.
//!
//! This crate is intentionally decoupled from HTTP: the client core reads and
//! writes sessions exclusively through the [`SessionStore`] trait.

pub mod file;
pub mod memory;
pub mod remembering;
pub mod session;
pub mod store;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
pub use remembering::RememberingSessionStore;
pub use session::{Session, TokenRefresh, UserRecord};
pub use store::{SessionStore, SessionStoreError};

mod client_store;
mod error;
mod session_store;

pub use client_store::{ClientStore, InMemoryClientStore};
pub use error::{StoreError, StoreResult};
pub use session_store::{InMemorySessionStore, MarkCodeOutcome, SessionStore};

//! # gateway-session
//!
//! session lifecycle: unverified creation, nonce-signature verification,
//! refresh, invalidation, and background expiry cleanup.

pub mod error;
pub mod manager;
pub mod session;

pub use error::{Error, Result};
pub use manager::{spawn_cleanup_task, SessionManager, SessionManagerConfig};
pub use session::Session;

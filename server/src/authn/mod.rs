//! Session authentication

pub mod session;

pub use session::{AuthOptions, Session, SessionClaims};

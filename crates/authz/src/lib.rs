//! Access control for libris.
//!
//! Authentication turns a bearer token into an [`Identity`]; authorization is
//! a set-membership check of the identity's [`Role`] against the allow-list
//! each [`Operation`] declares. Tokens are self-contained: there is no session
//! store and no revocation.

mod error;
mod operation;
mod password;
mod role;
mod token;

pub use error::AuthError;
pub use operation::{authorize, Operation};
pub use password::PasswordHasher;
pub use role::{Identity, Role};
pub use token::{Claims, IssuedToken, TokenCodec};

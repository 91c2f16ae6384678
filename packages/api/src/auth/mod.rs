//! Authentication: identity providers and the session context.
//!
//! Credentials live in the managed identity service behind
//! [`IdentityProvider`]; everything the application knows about a member lives
//! in their `users/{uid}` profile. [`SessionContext`] ties the two together for
//! one signed-in client.

mod config;
mod identity;
mod memory;
mod password;
mod session;
#[cfg(feature = "remote")]
mod toolkit;

pub use config::IdentityConfig;
pub use identity::{AuthUser, IdentityProvider};
pub use memory::MemoryIdentity;
pub use password::{Credential, MIN_PASSWORD_LEN};
pub use session::{AuthState, CurrentUser, Registration, SessionContext};
#[cfg(feature = "remote")]
pub use toolkit::IdentityToolkit;

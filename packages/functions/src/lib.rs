//! Serverless functions for the neighborhood app.
//!
//! - [`callable`]: the `deleteUser` HTTPS callable and a health probe.
//! - [`trigger`]: cleanup when a `users` document is deleted.
//! - [`bootstrap`]: first-admin provisioning.
//! - [`settings`]: `functions.toml` plus `FUNCTIONS_*` environment overrides.
//! - [`local`]: everything above on one in-memory identity service and store.
//!
//! The binary is a local runner only; it does not talk to the managed database.

pub mod bootstrap;
pub mod callable;
pub mod local;
pub mod settings;
pub mod trigger;

pub use callable::{router, AppState, CallableError};
pub use local::Local;
pub use settings::Settings;

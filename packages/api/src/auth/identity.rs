use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A signed-in identity as returned by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    /// Bearer token proving the identity to other services.
    pub id_token: String,
}

/// Email/password identity service.
pub trait IdentityProvider: Send + Sync {
    /// Create an account and sign it in.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthUser>> + Send;

    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthUser>> + Send;

    fn sign_out(&self, user: &AuthUser) -> impl Future<Output = Result<()>> + Send;

    /// Resolve an id token to the uid it was issued for.
    fn verify_token(&self, id_token: &str) -> impl Future<Output = Result<String>> + Send;

    /// Remove an account. Requires administrative access to the service.
    fn delete_account(&self, uid: &str) -> impl Future<Output = Result<()>> + Send;
}

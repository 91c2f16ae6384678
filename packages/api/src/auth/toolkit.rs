//! # REST client for the managed identity service
//!
//! [`IdentityToolkit`] speaks the Identity Toolkit v1 REST API (or its local
//! emulator) for email/password accounts:
//!
//! | Operation | Endpoint |
//! |-----------|----------|
//! | `sign_up` | `POST accounts:signUp?key=…` |
//! | `sign_in` | `POST accounts:signInWithPassword?key=…` |
//! | `verify_token` | `POST accounts:lookup?key=…` |
//! | `delete_account` | `POST projects/{project}/accounts:delete` with the admin bearer token |
//!
//! Id tokens are stateless on the service side, so signing out only drops the
//! token locally.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::config::IdentityConfig;
use super::identity::{AuthUser, IdentityProvider};
use crate::error::{Error, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    email: String,
    id_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest<'a> {
    local_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Map the service's error codes to user-facing messages.
fn friendly_message(code: &str) -> String {
    // Codes may carry a suffix: "WEAK_PASSWORD : Password should be ..."
    let head = code.split(" : ").next().unwrap_or(code).trim();
    match head {
        "EMAIL_EXISTS" => "An account with this email already exists".to_string(),
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Invalid email or password".to_string()
        }
        "USER_DISABLED" => "This account has been disabled".to_string(),
        "WEAK_PASSWORD" => "Password should be at least 6 characters".to_string(),
        "INVALID_EMAIL" => "Invalid email address".to_string(),
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" => "Invalid or expired token".to_string(),
        "USER_NOT_FOUND" => "Account not found".to_string(),
        other => other.to_string(),
    }
}

/// Identity service client.
#[derive(Debug, Clone)]
pub struct IdentityToolkit {
    client: Client,
    config: IdentityConfig,
}

impl IdentityToolkit {
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Create a client from `IDENTITY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let config = IdentityConfig::from_env().map_err(Error::Identity)?;
        Ok(Self::new(config))
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
        body: &B,
    ) -> Result<R> {
        let response = request
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Identity(e.to_string()))?;

        if response.status().is_success() {
            return response
                .json()
                .await
                .map_err(|e| Error::Identity(e.to_string()));
        }

        let status = response.status();
        let envelope: ErrorEnvelope = response
            .json()
            .await
            .map_err(|_| Error::Identity(format!("identity service returned {}", status)))?;
        let message = friendly_message(&envelope.error.message);
        tracing::warn!(%status, code = %envelope.error.message, "identity call rejected");
        if status.is_client_error() {
            Err(Error::Authentication(message))
        } else {
            Err(Error::Identity(message))
        }
    }

    async fn password_call(&self, method: &str, email: &str, password: &str) -> Result<AuthUser> {
        let request = self.client.post(self.config.account_url(method));
        let response: PasswordResponse = self
            .post(
                request,
                &PasswordRequest {
                    email: email.trim(),
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        Ok(AuthUser {
            uid: response.local_id,
            email: response.email,
            id_token: response.id_token,
        })
    }
}

impl IdentityProvider for IdentityToolkit {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        self.password_call("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        self.password_call("signInWithPassword", email, password)
            .await
    }

    async fn sign_out(&self, _user: &AuthUser) -> Result<()> {
        Ok(())
    }

    async fn verify_token(&self, id_token: &str) -> Result<String> {
        let request = self.client.post(self.config.account_url("lookup"));
        let response: LookupResponse = self.post(request, &LookupRequest { id_token }).await?;
        response
            .users
            .into_iter()
            .next()
            .map(|u| u.local_id)
            .ok_or_else(|| Error::Authentication("Invalid or expired token".to_string()))
    }

    async fn delete_account(&self, uid: &str) -> Result<()> {
        let Some(token) = self.config.admin_token.as_deref() else {
            return Err(Error::Identity(
                "account deletion requires IDENTITY_ADMIN_TOKEN".to_string(),
            ));
        };
        let request = self
            .client
            .post(self.config.admin_url("delete"))
            .bearer_auth(token);
        let _: serde_json::Value = self.post(request, &DeleteRequest { local_id: uid }).await?;
        Ok(())
    }
}

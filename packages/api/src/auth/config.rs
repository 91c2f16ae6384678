//! Identity service configuration from environment variables.

use serde::Deserialize;

/// Default REST root of the managed identity service.
pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Connection settings for the managed identity service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityConfig {
    /// Public web API key, sent as `?key=` on client calls.
    pub api_key: String,
    /// REST root; point at an emulator for local development.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub project_id: String,
    /// Bearer token for administrative calls (account deletion).
    #[serde(default)]
    pub admin_token: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_IDENTITY_URL.to_string()
}

impl IdentityConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            project_id: String::new(),
            admin_token: None,
        }
    }

    /// Create identity config from environment variables.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var("IDENTITY_API_KEY").map_err(|_| "IDENTITY_API_KEY not set")?;
        let base_url = std::env::var("IDENTITY_BASE_URL").unwrap_or_else(|_| default_base_url());
        let project_id = std::env::var("IDENTITY_PROJECT_ID").unwrap_or_default();
        let admin_token = std::env::var("IDENTITY_ADMIN_TOKEN").ok();

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id,
            admin_token,
        })
    }

    /// URL of a client-side `accounts:<method>` call.
    pub fn account_url(&self, method: &str) -> String {
        format!(
            "{}/accounts:{}?key={}",
            self.base_url.trim_end_matches('/'),
            method,
            self.api_key
        )
    }

    /// URL of a project-scoped administrative `accounts:<method>` call.
    pub fn admin_url(&self, method: &str) -> String {
        format!(
            "{}/projects/{}/accounts:{}",
            self.base_url.trim_end_matches('/'),
            self.project_id,
            method
        )
    }
}

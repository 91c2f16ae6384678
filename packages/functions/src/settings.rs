use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[allow(unused)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

impl Server {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5001,
        }
    }
}

/// First admin account, created on startup when both email and password are set.
#[derive(Debug, Deserialize, Default)]
#[allow(unused)]
pub struct Admin {
    pub email: Option<String>,
    pub password: Option<String>,
    pub username: String,
    pub name: String,
}

#[derive(Debug, Deserialize, Default)]
#[allow(unused)]
pub struct Settings {
    pub server: Server,
    pub admin: Admin,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5001)?
            .set_default("admin.username", "admin")?
            .set_default("admin.name", "Admin")?
            .add_source(
                File::with_name("functions.toml")
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("FUNCTIONS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }
}

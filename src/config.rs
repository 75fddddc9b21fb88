use serde::Deserialize;

use std::{env, fs, path::Path};

pub const DEFAULT_API_KEY: &str = "default-api-key";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Provider identifier (`gmail`, `yandex`, ...) or a bare SMTP host.
    pub email_service: String,
    pub email_user: String,
    pub email_password: String,
    #[serde(default)]
    pub email_from: Option<String>,
    #[serde(default)]
    pub email_port: Option<u16>,
    /// Skips certificate validation on the SMTP connection. Meant for local
    /// development only, nothing stops it from being set in production.
    #[serde(default = "default_accept_invalid_certs")]
    pub email_tls_accept_invalid_certs: bool,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_api_key")]
    pub api_key: String,
}

/// Environment variables that take precedence over values from a config file.
#[derive(Debug, Default, Deserialize)]
struct EnvOverrides {
    email_service: Option<String>,
    email_user: Option<String>,
    email_password: Option<String>,
    email_from: Option<String>,
    email_port: Option<u16>,
    email_tls_accept_invalid_certs: Option<bool>,
    port: Option<u16>,
    api_key: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Config file not found and environment variables are incomplete: {0}")]
    Env(#[from] envy::Error),
}

const fn default_accept_invalid_certs() -> bool {
    true
}

const fn default_port() -> u16 {
    3000
}

fn default_api_key() -> String {
    DEFAULT_API_KEY.to_string()
}

impl Config {
    /// Address used in the `From` header, the account user unless overridden.
    pub fn sender(&self) -> &str {
        self.email_from.as_deref().unwrap_or(&self.email_user)
    }

    pub fn uses_default_api_key(&self) -> bool {
        self.api_key == DEFAULT_API_KEY
    }

    /// Applies environment overrides, returning the names of replaced keys.
    fn apply(&mut self, env: EnvOverrides) -> Vec<&'static str> {
        fn set<T>(
            slot: &mut T,
            value: Option<T>,
            name: &'static str,
            applied: &mut Vec<&'static str>,
        ) {
            if let Some(value) = value {
                *slot = value;
                applied.push(name);
            }
        }

        let mut applied = Vec::new();
        set(&mut self.email_service, env.email_service, "email_service", &mut applied);
        set(&mut self.email_user, env.email_user, "email_user", &mut applied);
        set(&mut self.email_password, env.email_password, "email_password", &mut applied);
        set(&mut self.email_from, env.email_from.map(Some), "email_from", &mut applied);
        set(&mut self.email_port, env.email_port.map(Some), "email_port", &mut applied);
        set(
            &mut self.email_tls_accept_invalid_certs,
            env.email_tls_accept_invalid_certs,
            "email_tls_accept_invalid_certs",
            &mut applied,
        );
        set(&mut self.port, env.port, "port", &mut applied);
        set(&mut self.api_key, env.api_key, "api_key", &mut applied);
        applied
    }
}

fn load_from_file(path: &str) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let mut config: Config = serde_yaml::from_str(&contents)?;

    let applied = config.apply(envy::from_env::<EnvOverrides>()?);
    if !applied.is_empty() {
        tracing::info!(
            "Environment overrides applied on top of '{}': {}",
            path,
            applied.join(", ")
        );
    }

    Ok(config)
}

fn load_from_env() -> Result<Config, ConfigError> {
    Ok(envy::from_env::<Config>()?)
}

pub fn load_config() -> Result<Config, ConfigError> {
    // Pick up a local .env if there is one
    if dotenv::dotenv().is_ok() {
        tracing::info!("Loaded environment overrides from .env");
    }

    // Retrieve env variable
    let config_path =
        env::var("EMAIL_SERVICE_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());

    // Try env path
    if Path::new(&config_path).exists() {
        return load_from_file(&config_path);
    }

    // Fallback to config.yaml
    if Path::new("config.yaml").exists() {
        tracing::warn!(
            "Config file '{}' not found, falling back to 'config.yaml'",
            config_path
        );
        return load_from_file("config.yaml");
    }

    // Fallback to environment variables
    tracing::info!(
        "No config file found, attempting to load configuration from environment variables"
    );
    let config = load_from_env()?;
    tracing::info!("Successfully loaded configuration from environment variables");
    Ok(config)
}

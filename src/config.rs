//! Configuration loader and validator for the batch admin console.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub api: Api,
    pub auth: Auth,
}

/// Console server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub listen: String,
}

/// Remote batch API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Api {
    pub base_url: String,
    pub collection_path: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Token validation service settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Auth {
    pub base_url: String,
    pub validate_path: String,
    #[serde(default)]
    pub method: TokenMethod,
    #[serde(default)]
    pub on_unreachable: UnreachablePolicy,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// How the token is presented to the validation service.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenMethod {
    /// POST with a JSON body `{ "token": ... }`.
    #[default]
    Post,
    /// GET with a `token` query parameter.
    Get,
}

/// Decision taken when the validation service cannot be reached.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnreachablePolicy {
    #[default]
    Deny,
    Allow,
}

fn default_timeout_seconds() -> u64 {
    10
}

/// Endpoint URLs resolved once from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub collection: Url,
    pub validate_token: Url,
}

impl Endpoints {
    /// URL of a single record under the collection.
    pub fn item(&self, id: i64) -> Url {
        let mut url = self.collection.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&id.to_string());
        }
        url
    }
}

impl Config {
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.app
            .listen
            .parse()
            .map_err(|_| ConfigError::Invalid("app.listen must be a socket address"))
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth.timeout_seconds)
    }

    /// Resolve the collection and token-validation URLs.
    pub fn endpoints(&self) -> Result<Endpoints, ConfigError> {
        let collection = join_base(&self.api.base_url, &self.api.collection_path)
            .ok_or(ConfigError::Invalid("api.base_url/collection_path do not form a URL"))?;
        let validate_token = join_base(&self.auth.base_url, &self.auth.validate_path)
            .ok_or(ConfigError::Invalid("auth.base_url/validate_path do not form a URL"))?;
        Ok(Endpoints {
            collection,
            validate_token,
        })
    }
}

/// Join a relative route onto a base URL, keeping the base path.
fn join_base(base: &str, route: &str) -> Option<Url> {
    let mut base = Url::parse(base.trim()).ok()?;
    if base.cannot_be_a_base() {
        return None;
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let route = route.trim().trim_matches('/');
    base.join(route).ok()
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.listen.trim().is_empty() {
        return Err(ConfigError::Invalid("app.listen must be non-empty"));
    }
    cfg.listen_addr()?;

    if cfg.api.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("api.base_url must be non-empty"));
    }
    if cfg.api.collection_path.trim().trim_matches('/').is_empty() {
        return Err(ConfigError::Invalid("api.collection_path must be non-empty"));
    }
    if cfg.api.timeout_seconds == 0 {
        return Err(ConfigError::Invalid("api.timeout_seconds must be > 0"));
    }

    if cfg.auth.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("auth.base_url must be non-empty"));
    }
    if cfg.auth.validate_path.trim().trim_matches('/').is_empty() {
        return Err(ConfigError::Invalid("auth.validate_path must be non-empty"));
    }
    if cfg.auth.timeout_seconds == 0 {
        return Err(ConfigError::Invalid("auth.timeout_seconds must be > 0"));
    }

    cfg.endpoints()?;
    Ok(())
}

/// Returns a reference configuration file.
pub fn example() -> &'static str {
    r#"app:
  listen: "0.0.0.0:3000"

api:
  base_url: "https://api.yourdomain.com/"
  collection_path: "schedules"
  timeout_seconds: 10

auth:
  base_url: "https://auth.yourdomain.com/"
  validate_path: "permission"
  # post: JSON body {"token": ...}; get: ?token=...
  method: post
  # deny (default) or allow when the auth service cannot be reached
  on_unreachable: deny
"#
}

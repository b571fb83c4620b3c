//! # Configuration Module
//!
//! Process-wide settings bundle for a Nasse application.
//!
//! ## Sources
//!
//! Settings are layered:
//!
//! 1. [`Config::default()`]
//! 2. a YAML document ([`Config::from_yaml_str`] / [`Config::from_yaml_file`])
//! 3. environment overrides ([`Config::apply_env`])
//! 4. [`Config::normalize`], which derives the identifier and applies the
//!    debug rules
//!
//! ## Environment Variables
//!
//! | Variable | Field |
//! |---|---|
//! | `NASSE_DEBUG` | `debug` (`1`/`true`/`yes`) |
//! | `NASSE_HOST` | `host` |
//! | `NASSE_PORT` | `port` |
//! | `NASSE_LOG_LEVEL` | `log_level` |
//! | `NASSE_MAX_REQUEST_SIZE` | `max_request_size` (bytes) |
//!
//! ## CORS input
//!
//! The `cors` field accepts a boolean (`true` → `["*"]`, `false` → `[]`), a
//! single origin or a list of origins. Origins without a scheme default to
//! `https`, so `example.com` becomes `https://example.com`.
//!
//! ## Debug rules
//!
//! With `debug` set, a log level left at its default is raised to `DEBUG` and
//! a missing log file becomes `<base_dir>/nasse.debug.log`.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::NasseError;
use crate::models::naming::identifier;
use crate::security::AccountManagement;

pub const DEFAULT_NAME: &str = "Nasse";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5005;
pub const DEFAULT_MAX_REQUEST_SIZE: u64 = 1_000_000_000;
pub const DEFAULT_LOG_LEVEL: &str = "INFO";
pub const DEFAULT_SERVER_HEADER: &str = "{{ name }}/{{ version }} (nasse)";
pub const DEBUG_LOG_FILE: &str = "nasse.debug.log";
pub const WILDCARD_ORIGIN: &str = "*";

/// Where log lines go when no file is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSink {
    #[default]
    Stdout,
    Stderr,
}

/// Shared handle to the user's account-management capability.
#[derive(Clone)]
pub struct AccountManagementHandle(pub Arc<dyn AccountManagement>);

impl fmt::Debug for AccountManagementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccountManagement(..)")
    }
}

impl std::ops::Deref for AccountManagementHandle {
    type Target = dyn AccountManagement;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

/// Raw CORS input before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CorsInput {
    Bool(bool),
    One(String),
    Many(Vec<String>),
}

impl CorsInput {
    /// Normalized origin list.
    pub fn normalize(&self) -> Result<Vec<String>, NasseError> {
        match self {
            CorsInput::Bool(true) => Ok(vec![WILDCARD_ORIGIN.to_string()]),
            CorsInput::Bool(false) => Ok(Vec::new()),
            CorsInput::One(origin) => Ok(vec![normalize_origin(origin)?]),
            CorsInput::Many(origins) => {
                let mut out: Vec<String> = Vec::with_capacity(origins.len());
                for origin in origins {
                    let normalized = normalize_origin(origin)?;
                    if !out.contains(&normalized) {
                        out.push(normalized);
                    }
                }
                Ok(out)
            }
        }
    }
}

/// Parse an origin entry: `*`, or `scheme://host[:port]` with `https` as the
/// default scheme.
pub fn normalize_origin(raw: &str) -> Result<String, NasseError> {
    let trimmed = raw.trim();
    if trimmed == WILDCARD_ORIGIN {
        return Ok(WILDCARD_ORIGIN.to_string());
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let url = Url::parse(&with_scheme)
        .map_err(|e| NasseError::conversion("CORS origin", format!("'{raw}': {e}")))?;
    if url.host_str().is_none() {
        return Err(NasseError::conversion(
            "CORS origin",
            format!("'{raw}' has no host"),
        ));
    }
    Ok(url.origin().ascii_serialization())
}

fn deserialize_cors<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    CorsInput::deserialize(deserializer)?
        .normalize()
        .map_err(de::Error::custom)
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_cors() -> Vec<String> {
    vec![WILDCARD_ORIGIN.to_string()]
}

fn default_max_request_size() -> u64 {
    DEFAULT_MAX_REQUEST_SIZE
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_server_header() -> String {
    DEFAULT_SERVER_HEADER.to_string()
}

fn default_base_dir() -> PathBuf {
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Application settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Display name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Stable identifier; derived from `name` when empty.
    pub id: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub debug: bool,
    #[serde(skip)]
    pub account_management: Option<AccountManagementHandle>,
    /// Normalized allowed origins.
    #[serde(default = "default_cors", deserialize_with = "deserialize_cors")]
    pub cors: Vec<String>,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_request_size")]
    pub max_request_size: u64,
    #[serde(default = "default_true")]
    pub compress: bool,
    pub log_file: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub log_sink: LogSink,
    /// `minijinja` template with `name`, `id`, `version` and `debug`.
    #[serde(default = "default_server_header")]
    pub server_header: String,
    #[serde(default = "default_true")]
    pub sanitize: bool,
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_name(),
            id: String::new(),
            host: default_host(),
            port: default_port(),
            debug: false,
            account_management: None,
            cors: default_cors(),
            max_request_size: default_max_request_size(),
            compress: true,
            log_file: None,
            log_level: default_log_level(),
            log_sink: LogSink::default(),
            server_header: default_server_header(),
            sanitize: true,
            base_dir: default_base_dir(),
        }
    }
}

impl Config {
    /// Default settings for an application called `name`, normalized.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
        .normalize()
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self.normalize()
    }

    #[must_use]
    pub fn with_account_management<A: AccountManagement + 'static>(mut self, manager: A) -> Self {
        self.account_management = Some(AccountManagementHandle(Arc::new(manager)));
        self
    }

    pub fn with_cors(mut self, cors: CorsInput) -> Result<Self, NasseError> {
        self.cors = cors.normalize()?;
        Ok(self)
    }

    /// Parse a YAML document and normalize it.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml).context("Failed to parse configuration")?;
        Ok(config.normalize())
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        Self::from_yaml_str(&raw)
    }

    /// Override fields from `NASSE_*` environment variables, then normalize.
    #[must_use]
    pub fn apply_env(mut self) -> Self {
        if let Ok(val) = env::var("NASSE_DEBUG") {
            self.debug = matches!(val.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if let Ok(val) = env::var("NASSE_HOST") {
            self.host = val;
        }
        if let Ok(val) = env::var("NASSE_PORT") {
            match val.trim().parse() {
                Ok(port) => self.port = port,
                Err(_) => warn!(value = %val, "Ignoring invalid NASSE_PORT"),
            }
        }
        if let Ok(val) = env::var("NASSE_LOG_LEVEL") {
            self.log_level = val.to_uppercase();
        }
        if let Ok(val) = env::var("NASSE_MAX_REQUEST_SIZE") {
            match val.trim().parse() {
                Ok(size) => self.max_request_size = size,
                Err(_) => warn!(value = %val, "Ignoring invalid NASSE_MAX_REQUEST_SIZE"),
            }
        }
        self.normalize()
    }

    /// Derive the identifier and apply the debug rules. Idempotent.
    #[must_use]
    pub fn normalize(mut self) -> Self {
        if self.id.is_empty() {
            self.id = identifier(&self.name);
        }
        if self.debug {
            if self.log_level.eq_ignore_ascii_case(DEFAULT_LOG_LEVEL) {
                self.log_level = "DEBUG".to_string();
            }
            if self.log_file.is_none() {
                self.log_file = Some(self.base_dir.join(DEBUG_LOG_FILE));
            }
        }
        debug!(
            name = %self.name,
            id = %self.id,
            debug = self.debug,
            cors = ?self.cors,
            log_level = %self.log_level,
            "Configuration normalized"
        );
        self
    }

    /// Render the `Server` header value from the template.
    pub fn render_server_header(&self) -> Result<String, NasseError> {
        let env = minijinja::Environment::new();
        env.render_str(
            &self.server_header,
            minijinja::context! {
                name => self.name.as_str(),
                id => self.id.as_str(),
                version => env!("CARGO_PKG_VERSION"),
                debug => self.debug,
            },
        )
        .map_err(|e| NasseError::conversion("Server header", e.to_string()))
    }

    /// `true` when every origin is allowed.
    #[must_use]
    pub fn cors_wildcard(&self) -> bool {
        self.cors.iter().any(|o| o == WILDCARD_ORIGIN)
    }
}

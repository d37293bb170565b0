//! Configuration: an optional TOML file, then environment overrides.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{RealtimeError, RealtimeResult};
use crate::permission::{StaticPermissions, UserPermissions};

/// Broker the delivery server listens on.
pub const DEFAULT_REDIS_SOCKETIO: &str = "redis://localhost:12311";

/// Redis holding session data.
pub const DEFAULT_REDIS_CACHE: &str = "redis://localhost:13000";

pub const DEFAULT_SITE: &str = "localhost";

pub const DEFAULT_DB_PATH: &str = "roomcast.db";

/// Runtime configuration for the publisher and its HTTP surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    pub site_name: String,
    pub redis_socketio: String,
    pub redis_cache: String,
    pub db_path: PathBuf,
    /// Skip document subscription permission checks.
    pub ci_bypass: bool,
    /// User -> doctypes they may access.
    pub permissions: HashMap<String, UserPermissions>,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            site_name: DEFAULT_SITE.to_string(),
            redis_socketio: DEFAULT_REDIS_SOCKETIO.to_string(),
            redis_cache: DEFAULT_REDIS_CACHE.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            ci_bypass: false,
            permissions: HashMap::new(),
        }
    }
}

impl RealtimeConfig {
    /// Load from `path` (if given) and apply environment overrides.
    pub fn load(path: Option<&Path>) -> RealtimeResult<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                debug!(path = %path.display(), "Loaded configuration file");
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> RealtimeResult<Self> {
        toml::from_str(raw).map_err(|e| RealtimeError::config(e.to_string()))
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(site) = lookup("ROOMCAST_SITE") {
            self.site_name = site;
        }
        if let Some(url) = lookup("REDIS_SOCKETIO") {
            self.redis_socketio = url;
        }
        if let Some(url) = lookup("REDIS_CACHE") {
            self.redis_cache = url;
        }
        if let Some(path) = lookup("ROOMCAST_DB") {
            self.db_path = PathBuf::from(path);
        }
        if lookup("CI").is_some() {
            self.ci_bypass = true;
        }
    }

    pub fn static_permissions(&self) -> StaticPermissions {
        StaticPermissions::new(self.permissions.clone())
    }
}

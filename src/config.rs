//! Configuration file.
//!
//! ```toml
//! bind = "0.0.0.0:3000"
//! namespace = "zombies"          # application/vnd.zombies.<version>+json
//! default_locale = "en"
//! host = "api.example.com"       # optional, no port
//! body_limit = 1048576           # bytes; larger request bodies get 413
//!
//! # Tried in this order; the first match wins.
//! [[versions]]
//! identifier = "v1"
//!
//! [[versions]]
//! identifier = "v2"
//! default = true
//!
//! [translations.pt-BR]
//! required = "obrigatório"
//! not_found = "não encontrado"
//! ```
//!
//! Every key is optional; a missing file section keeps the built-in default.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::i18n::Translations;
use crate::request::DEFAULT_BODY_LIMIT;
use crate::router::strip_port;
use crate::version::ApiVersion;

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub bind: SocketAddr,
    /// Vendor segment of the versioned media type.
    pub namespace: String,
    /// Locale used when a request sends no `Accept-Language`.
    pub default_locale: String,
    /// Optional `Host` constraint for versioned routes.
    pub host: Option<String>,
    /// Largest request body the server buffers, in bytes.
    pub body_limit: usize,
    /// Declared API versions, in dispatch order.
    pub versions: Vec<ApiVersion>,
    /// Locale → message key → text.
    pub translations: BTreeMap<String, BTreeMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            namespace: "zombies".to_owned(),
            default_locale: "en".to_owned(),
            host: None,
            body_limit: DEFAULT_BODY_LIMIT,
            versions: vec![ApiVersion::new("v1").as_default()],
            translations: BTreeMap::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl Config {
    /// Reads, parses, and validates a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reports every problem at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if !is_token(&self.namespace) {
            problems.push(format!("namespace `{}` must be a non-empty media-type token", self.namespace));
        }
        if self.default_locale.trim().is_empty() {
            problems.push("default_locale must not be empty".to_owned());
        }
        if let Some(host) = &self.host {
            if host.trim().is_empty() {
                problems.push("host must not be empty when set".to_owned());
            } else if strip_port(host) != host.as_str() {
                // Requests are compared with their port stripped.
                problems.push(format!("host `{host}` must not carry a port"));
            }
        }
        if self.body_limit == 0 {
            problems.push("body_limit must be at least 1 byte".to_owned());
        }

        let mut seen = HashSet::new();
        for version in &self.versions {
            let id = version.identifier();
            if !is_token(id) {
                problems.push(format!("version identifier `{id}` must be a non-empty media-type token"));
            }
            if !seen.insert(id) {
                problems.push(format!("version `{id}` declared twice"));
            }
        }
        let defaults: Vec<_> = self
            .versions
            .iter()
            .filter(|v| v.is_default())
            .map(ApiVersion::identifier)
            .collect();
        if defaults.len() > 1 {
            problems.push(format!("only one default version allowed, found {}", defaults.join(", ")));
        }

        if problems.is_empty() { Ok(()) } else { Err(ConfigError::Invalid(problems)) }
    }

    /// Built-in English plus the configured catalogs.
    pub fn translations(&self) -> Translations {
        let mut translations = Translations::new(self.default_locale.clone());
        for (locale, messages) in &self.translations {
            translations.extend(locale, messages.clone());
        }
        translations
    }
}

/// Letters, digits, `-`, `_`: safe inside `application/vnd.<ns>.<id>+json`.
fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

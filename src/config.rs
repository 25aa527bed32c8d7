//! Configuration Module
//!
//! Handles loading server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::collection::CollectionConfig;
use crate::standardize::FieldRules;
use crate::store::ConnectionOptions;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// TTL in seconds of cached collection reads on the server
    pub cache_ttl: u64,
    /// Store connection string
    pub database_url: String,
    /// Collections exposed under `/api`
    pub collections: Vec<String>,
    /// Apply the content field fallbacks to every read
    pub standardize: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_TTL_SECS` - Server cache TTL in seconds (default: 3600)
    /// - `DATABASE_URL` - Store connection string (default: `memory://default`)
    /// - `COLLECTIONS` - Comma separated collection names (default: `items`)
    /// - `STANDARDIZE` - `true`/`1`/`yes` enables field fallbacks (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    /// Unparseable values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            server_port: parse_var(&lookup, "SERVER_PORT").unwrap_or(defaults.server_port),
            cache_ttl: parse_var::<u64>(&lookup, "CACHE_TTL_SECS")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.cache_ttl),
            database_url: lookup("DATABASE_URL")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.database_url),
            collections: lookup("COLLECTIONS")
                .map(|v| parse_list(&v))
                .filter(|names| !names.is_empty())
                .unwrap_or(defaults.collections),
            standardize: lookup("STANDARDIZE")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.standardize),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions::uri(self.database_url.clone())
    }

    /// One [`CollectionConfig`] per configured name, in order.
    pub fn collection_configs(&self) -> Vec<CollectionConfig> {
        let rules = self
            .standardize
            .then(|| Arc::new(FieldRules::content_defaults()));

        self.collections
            .iter()
            .map(|name| {
                let config = CollectionConfig::new(name.clone()).with_ttl(self.cache_ttl());
                match &rules {
                    Some(rules) => config.with_standardizer(rules.clone()),
                    None => config,
                }
            })
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cache_ttl: 3600,
            database_url: "memory://default".to_string(),
            collections: vec!["items".to_string()],
            standardize: false,
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

fn parse_list(value: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in value.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }
    names
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cache_ttl, 3600);
        assert_eq!(config.database_url, "memory://default");
        assert_eq!(config.collections, vec!["items"]);
        assert!(!config.standardize);
    }

    #[test]
    fn test_config_from_empty_lookup_is_default() {
        assert_eq!(config_from(&[]), Config::default());
    }

    #[test]
    fn test_config_from_lookup() {
        let config = config_from(&[
            ("SERVER_PORT", "8080"),
            ("CACHE_TTL_SECS", "60"),
            ("DATABASE_URL", "memory://site"),
            ("COLLECTIONS", "services, solutions,,caseStudies,services"),
            ("STANDARDIZE", "TRUE"),
        ]);

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.database_url, "memory://site");
        assert_eq!(config.collections, vec!["services", "solutions", "caseStudies"]);
        assert!(config.standardize);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("SERVER_PORT", "not-a-port"),
            ("CACHE_TTL_SECS", "0"),
            ("COLLECTIONS", " , "),
            ("STANDARDIZE", "maybe"),
        ]);

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_unrelated_variables_ignored() {
        let config = config_from(&[("CLIENT_CACHE_TTL_SECS", "60"), ("PORT", "9000")]);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_collection_configs() {
        let config = config_from(&[("COLLECTIONS", "caseStudies,news"), ("STANDARDIZE", "1")]);
        let configs = config.collection_configs();

        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].name, "caseStudies");
        assert_eq!(configs[0].ttl, Duration::from_secs(3600));
        assert!(configs.iter().all(|c| c.standardizer.is_some()));

        let plain = Config::default().collection_configs();
        assert!(plain[0].standardizer.is_none());
    }
}

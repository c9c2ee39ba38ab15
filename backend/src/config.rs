//! Service configuration, read from the environment (and `.env` if present).

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// JSON snapshot file; groups live only in memory when unset.
    pub persist_path: Option<PathBuf>,
    pub log_level: String,
    /// Fixed seed for every draw. Makes assignments predictable, so only for
    /// demos and tests.
    pub draw_seed: Option<u64>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid SANTA_BIND_ADDR {0:?}")]
    InvalidBindAddr(String),
    #[error("invalid SANTA_DRAW_SEED {0:?}")]
    InvalidDrawSeed(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw = lookup("SANTA_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_addr = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_raw.clone()))?;

        let persist_path = lookup("SANTA_PERSIST_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let log_level = lookup("SANTA_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let draw_seed = match lookup("SANTA_DRAW_SEED") {
            Some(raw) => Some(
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidDrawSeed(raw.clone()))?,
            ),
            None => None,
        };

        Ok(Self {
            bind_addr,
            persist_path,
            log_level,
            draw_seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3000");
        assert!(config.persist_path.is_none());
        assert_eq!(config.log_level, "info");
        assert!(config.draw_seed.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("SANTA_BIND_ADDR", "127.0.0.1:8080"),
            ("SANTA_PERSIST_PATH", "/tmp/santa.json"),
            ("SANTA_LOG_LEVEL", "debug"),
            ("SANTA_DRAW_SEED", "42"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.persist_path, Some(PathBuf::from("/tmp/santa.json")));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.draw_seed, Some(42));
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            Config::from_lookup(lookup(&[("SANTA_BIND_ADDR", "nowhere")])).unwrap_err(),
            ConfigError::InvalidBindAddr("nowhere".into())
        );
        assert_eq!(
            Config::from_lookup(lookup(&[("SANTA_DRAW_SEED", "abc")])).unwrap_err(),
            ConfigError::InvalidDrawSeed("abc".into())
        );
    }
}

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub auth: Auth,
    pub database: Database,
    pub limits: Limits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Auth {
    /// Secret the session token signatures are verified against.
    pub token_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub url: String,
    /// Per-call timeout for account store I/O.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Limits {
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_max_request_size() -> usize {
    1024 * 1024
}

impl Config {
    /// Read configuration from `config.toml` (if present) overlaid with
    /// `OWNBIN`-prefixed environment variables.
    pub fn load() -> anyhow::Result<Self> {
        ::config::Config::builder()
            .add_source(::config::File::with_name("config.toml").required(false))
            .add_source(::config::Environment::with_prefix("OWNBIN").separator("__"))
            .build()
            .context("failed to read config")?
            .try_deserialize()
            .context("failed to deserialize config")
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Config {
            port: 0,
            auth: Auth {
                token_secret: "test-secret".into(),
            },
            database: Database {
                url: String::new(),
                timeout_secs: default_timeout_secs(),
            },
            limits: Limits {
                max_request_size: default_max_request_size(),
            },
        }
    }
}

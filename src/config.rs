use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};

use crate::error::BookswapError;

/// Secret used when nothing is configured. Only good for local development.
pub const DEV_SECRET_KEY: &str = "CHANGE_ME_TO_A_STRONG_SECRET_OF_32_BYTES_OR_MORE";

/// Runtime configuration, resolved once at startup and handed to the router.
///
/// Sources, lowest to highest precedence:
/// - built-in defaults (`Config::default`)
/// - `DATABASE_URL` / `SECRET_KEY`
/// - `BOOKSWAP_*` variables (e.g. `BOOKSWAP_BCRYPT_COST=10`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub listen_addr: String,
    pub database_url: String,
    pub secret_key: String,
    pub access_token_ttl_minutes: u64,
    pub bcrypt_cost: u32,
    pub loglevel: String,
    /// Empty means any origin.
    pub cors_allow_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            database_url: "sqlite://bookswap.db".to_string(),
            secret_key: DEV_SECRET_KEY.to_string(),
            access_token_ttl_minutes: 60,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            loglevel: "info".to_string(),
            cors_allow_origins: Vec::new(),
        }
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::raw().only(&["database_url", "secret_key"]))
            .merge(Env::prefixed("BOOKSWAP_"))
    }

    pub fn load() -> Result<Self, BookswapError> {
        Self::figment()
            .extract()
            .map_err(|e| BookswapError::Config(e.to_string()))
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.secret_key == DEV_SECRET_KEY
    }
}

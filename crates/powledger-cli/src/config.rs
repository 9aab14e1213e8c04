//! Runtime configuration read from the environment.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use powledger_core::PowConfig;

pub const ENV_DB: &str = "POWLEDGER_DB";
pub const ENV_DIFFICULTY: &str = "POWLEDGER_DIFFICULTY";
pub const ENV_MAX_NONCE: &str = "POWLEDGER_MAX_NONCE";
pub const DEFAULT_DB_PATH: &str = "./powledger.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Directory of the sled database.
    pub db_path: PathBuf,
    pub pow: PowConfig,
}

impl CliConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset variables fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let db_path = lookup(ENV_DB)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let mut pow = defaults.pow;
        if let Some(raw) = lookup(ENV_DIFFICULTY) {
            let bits: u32 = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_DIFFICULTY}={raw:?} is not a number"))?;
            pow = PowConfig::new(bits).with_context(|| format!("{ENV_DIFFICULTY}={raw:?}"))?;
        }
        if let Some(raw) = lookup(ENV_MAX_NONCE) {
            let max_nonce: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_MAX_NONCE}={raw:?} is not a number"))?;
            pow = pow.with_max_nonce(max_nonce);
        }

        Ok(Self { db_path, pow })
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            pow: PowConfig::default(),
        }
    }
}

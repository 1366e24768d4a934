use crate::error::ConfigError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "http://localhost:5000";
const DEFAULT_CONFIRMATION_MS: u64 = 1500;
const DEFAULT_DATA_DIR: &str = ".ballot";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiometricMode {
    Enrolled,
    Unenrolled,
    Absent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base: String,
    pub confirmation_window: Duration,
    pub data_dir: PathBuf,
    pub seed_token: Option<String>,
    pub biometrics: BiometricMode,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base = lookup("BALLOT_API_BASE")
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let confirmation_ms = match lookup("BALLOT_CONFIRMATION_MS") {
            Some(value) => value.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                key: "BALLOT_CONFIRMATION_MS",
                value,
            })?,
            None => DEFAULT_CONFIRMATION_MS,
        };

        let data_dir = lookup("BALLOT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let seed_token = lookup("BALLOT_TOKEN").filter(|t| !t.trim().is_empty());

        let biometrics = match lookup("BALLOT_BIOMETRICS").as_deref().map(str::trim) {
            None | Some("enrolled") => BiometricMode::Enrolled,
            Some("unenrolled") => BiometricMode::Unenrolled,
            Some("absent") => BiometricMode::Absent,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "BALLOT_BIOMETRICS",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            api_base,
            confirmation_window: Duration::from_millis(confirmation_ms),
            data_dir,
            seed_token,
            biometrics,
        })
    }

    pub fn secure_store_path(&self) -> PathBuf {
        self.data_dir.join("secure_store.json")
    }

    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join("cache.json")
    }
}

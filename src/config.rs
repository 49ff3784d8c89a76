use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::AppError;

/// General client settings from conf/config.yaml
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Host (and optional port) of the Harbor service
    pub dstip: String,
    /// Accept invalid TLS certificates
    #[serde(default)]
    pub insecure: bool,
}

fn default_scheme() -> String {
    "https".to_string()
}

impl GeneralConfig {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        load_yaml(path)
    }

    /// TLS setting for runs where `--url` replaces the configured host.
    /// A missing file means a secure client; a file that fails to parse is an error.
    pub fn insecure_flag(path: &Path) -> Result<bool, AppError> {
        match Self::load(path) {
            Ok(config) => Ok(config.insecure),
            Err(AppError::ConfigRead { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.dstip.trim_end_matches('/'))
    }
}

/// Read and deserialize a YAML file, mapping failures onto config errors
pub fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let contents = fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| AppError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

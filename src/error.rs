use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("no session found at {}, run `login` first: {source}", .path.display())]
    NoSession {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("{method} {url}: expected a 2xx status, got {status}: {body}")]
    UnexpectedStatus {
        method: &'static str,
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("the number is out of range: {0} (valid range is (0, 50])")]
    CountOutOfRange(i64),

    #[error("login response did not carry a beegosessionID cookie")]
    SessionCookieMissing,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

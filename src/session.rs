use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

const SESSION_COOKIE: &str = "beegosessionID";

/// Session credential obtained at login and replayed as a cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "beegosessionID")]
    pub session_id: String,
}

impl Session {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }

    /// Load the session saved by `login`. A missing file means nobody logged in.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let contents = fs::read_to_string(path).map_err(|source| AppError::NoSession {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| AppError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overwrite the session file, creating its parent directory if needed
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_yaml::to_string(self).map_err(|source| AppError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn remove(path: &Path) -> Result<(), AppError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn cookie_header(&self) -> String {
        format!("{}={}", SESSION_COOKIE, self.session_id)
    }

    /// Pick the session id out of a set of `Set-Cookie` header values
    pub fn from_set_cookie<'a, I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        values.into_iter().find_map(|value| {
            value.split(';').find_map(|part| {
                let (name, id) = part.trim().split_once('=')?;
                (name == SESSION_COOKIE && !id.is_empty()).then(|| Session::new(id))
            })
        })
    }
}

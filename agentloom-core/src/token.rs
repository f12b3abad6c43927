//! Bearer token persistence.
//!
//! A remembered login is written to a small JSON file under a fixed key, the
//! counterpart of a browser's `localStorage`. A session-only login lives in
//! memory for the lifetime of the process and is never written out.

use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::AgentloomConfig;
use crate::error::{AgentloomError, AgentloomResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPersistence {
    Remembered,
    SessionOnly,
}

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: Option<PathBuf>,
    key: String,
    session_token: Option<String>,
}

impl TokenStore {
    pub fn new(path: Option<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path,
            key: key.into(),
            session_token: None,
        }
    }

    pub fn from_config(config: &AgentloomConfig) -> Self {
        Self::new(config.token_path(), config.auth.token_key.clone())
    }

    /// In-memory store that never touches the filesystem.
    pub fn ephemeral() -> Self {
        Self::new(None, "auth_token")
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Session token first, then the remembered one.
    pub fn load(&self) -> AgentloomResult<Option<String>> {
        if let Some(token) = &self.session_token {
            return Ok(Some(token.clone()));
        }

        let Some(path) = &self.path else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|e| AgentloomError::TokenStorage(e.to_string()))?;
        let value: Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                warn!("Ignoring unreadable token file {}: {}", path.display(), e);
                return Ok(None);
            }
        };

        Ok(value
            .get(&self.key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string))
    }

    pub fn save(&mut self, token: &str, persistence: TokenPersistence) -> AgentloomResult<()> {
        match persistence {
            TokenPersistence::SessionOnly => {
                self.session_token = Some(token.to_string());
                self.remove_file()?;
                debug!("Stored session-only token");
            }
            TokenPersistence::Remembered => {
                self.session_token = None;
                let path = self.path.as_ref().ok_or_else(|| {
                    AgentloomError::TokenStorage("No location to persist the token".to_string())
                })?;
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| AgentloomError::TokenStorage(e.to_string()))?;
                }
                let mut map = Map::new();
                map.insert(self.key.clone(), Value::String(token.to_string()));
                write_private(path, &serde_json::to_string_pretty(&Value::Object(map))?)
                    .map_err(|e| AgentloomError::TokenStorage(e.to_string()))?;
                debug!("Persisted token to {}", path.display());
            }
        }
        Ok(())
    }

    pub fn clear(&mut self) -> AgentloomResult<()> {
        self.session_token = None;
        self.remove_file()
    }

    fn remove_file(&self) -> AgentloomResult<()> {
        if let Some(path) = &self.path {
            if path.exists() {
                std::fs::remove_file(path)
                    .map_err(|e| AgentloomError::TokenStorage(e.to_string()))?;
            }
        }
        Ok(())
    }
}

/// Write `contents` readable by the owner only.
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // `mode` only applies when the file is created.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents.as_bytes())
}

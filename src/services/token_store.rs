//! Durable storage for the bearer token

use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Key the bearer token is stored under
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Persisted token slot. Absence of a token means logged out.
#[cfg_attr(test, mockall::automock)]
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, StoreError>;

    fn save(&self, token: &str) -> Result<(), StoreError>;

    /// Removing an absent token is not an error
    fn clear(&self) -> Result<(), StoreError>;
}

/// Token kept in a small JSON key/value file.
///
/// Other keys in the file are preserved. Writes go to a sibling temp file
/// which is then renamed over the original.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_entries(&self) -> Result<Map<String, Value>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Map::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let contents = serde_json::to_vec_pretty(entries)?;
        {
            let mut file = fs::File::create(&tmp_path).map_err(|e| self.io_error(e))?;
            restrict_permissions(&file).map_err(|e| self.io_error(e))?;
            file.write_all(&contents).map_err(|e| self.io_error(e))?;
            file.sync_all().map_err(|e| self.io_error(e))?;
        }
        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))
    }
}

#[cfg(unix)]
fn restrict_permissions(file: &fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &fs::File) -> std::io::Result<()> {
    Ok(())
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(ACCESS_TOKEN_KEY)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string))
    }

    fn save(&self, token: &str) -> Result<(), StoreError> {
        let mut entries = self.read_entries().unwrap_or_else(|e| {
            tracing::warn!("Overwriting unreadable session file: {}", e);
            Map::new()
        });
        entries.insert(ACCESS_TOKEN_KEY.to_string(), Value::String(token.to_string()));
        self.write_entries(&entries)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(StoreError::Corrupt(_)) => Map::new(),
            Err(e) => return Err(e),
        };
        if entries.remove(ACCESS_TOKEN_KEY).is_none() && !entries.is_empty() {
            return Ok(());
        }
        if entries.is_empty() {
            match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(self.io_error(e)),
            }
        } else {
            self.write_entries(&entries)
        }
    }
}

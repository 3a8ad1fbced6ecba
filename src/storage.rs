//! Local key/value storage.
//!
//! Every durable record lives under one fixed key and is read and rewritten in
//! full.  [`FileStorage`] keeps one file per key inside a data directory;
//! [`MemoryStorage`] keeps everything in process.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};

/// Key holding the JSON array of interview sessions.
pub const SESSIONS_KEY: &str = "mimid_sessions";

/// Key holding the cumulative per-model usage record.
pub const USAGE_KEY: &str = "mimid_usage_cumulative";

/// Key holding the Anthropic API key.
pub const API_KEY_KEY: &str = "mimid_anthropic_api_key";

/// Environment variable that overrides the default data directory.
pub const HOME_ENV: &str = "MIMID_HOME";

/// Synchronous string storage addressed by key.
pub trait Storage: Send + Sync {
    /// Returns the value stored under `key`, or `None` when the key is absent.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`.  Removing an absent key succeeds.
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Storage backed by one file per key.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Use `root` as the data directory.  It is created on first write.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Open the default data directory.
    ///
    /// `$MIMID_HOME`, then `$XDG_DATA_HOME/mimid`, then `$HOME/.local/share/mimid`.
    pub fn open_default() -> Result<Self> {
        default_data_dir().map(Self::new)
    }

    /// The data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::storage("invalid storage key", Some(key.to_string())));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::storage(
                format!("failed to read {}: {err}", path.display()),
                Some(key.to_string()),
            )),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let write = || -> io::Result<()> {
            fs::create_dir_all(&self.root)?;
            let tmp = self.root.join(format!(".{key}.json.tmp"));
            fs::write(&tmp, value)?;
            fs::rename(&tmp, &path)
        };
        write().map_err(|err| {
            Error::storage(
                format!("failed to write {}: {err}", path.display()),
                Some(key.to_string()),
            )
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::storage(
                format!("failed to remove {}: {err}", path.display()),
                Some(key.to_string()),
            )),
        }
    }
}

/// In-process storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set_item` fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    fn items(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.items
            .lock()
            .map_err(|_| Error::storage("storage lock poisoned", None))
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(Error::storage("quota exceeded", Some(key.to_string())));
        }
        self.items()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items()?.remove(key);
        Ok(())
    }
}

fn default_data_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir).join("mimid"));
    }
    match env::var_os("HOME").filter(|v| !v.is_empty()) {
        Some(home) => Ok(PathBuf::from(home).join(".local/share/mimid")),
        None => Err(Error::storage(
            "cannot locate a data directory; set MIMID_HOME or pass --data-dir",
            None,
        )),
    }
}

//! Durable client-side key/value storage.
//!
//! Each key is one JSON document under the data directory. Writes go through a
//! temporary file and a rename so a crash never leaves a half-written value.

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{AppError, AppResult};

/// Storage key of the persisted session object.
pub const SESSION_KEY: &str = "session";
/// Storage key of the set of notification ids already shown as toasts.
pub const SHOWN_TOASTS_KEY: &str = "shownToastIds";

const APP_DIR: &str = "deskline";

#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Opens (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "local store opened");
        Ok(Self { dir })
    }

    /// Opens the store in the platform data directory.
    pub fn open_default() -> AppResult<Self> {
        let dir = default_data_dir()
            .ok_or_else(|| AppError::internal("no platform data directory available"))?;
        Self::open(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reads and decodes the value stored under `key`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let reader = BufReader::new(fs::File::open(&path)?);
        let value = serde_json::from_reader(reader)?;
        Ok(Some(value))
    }

    /// Encodes and stores `value` under `key`, replacing any previous value.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> AppResult<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        {
            let mut writer = BufWriter::new(fs::File::create(&tmp)?);
            serde_json::to_writer(&mut writer, value)?;
            writer.flush()?;
        }

        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Removes `key`. Missing keys are not an error.
    pub fn remove(&self, key: &str) -> AppResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

/// `<platform data dir>/deskline`, e.g. `~/.local/share/deskline` on Linux.
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|mut dir| {
        dir.push(APP_DIR);
        dir
    })
}
